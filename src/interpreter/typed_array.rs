//! ArrayBuffer storage and typed array exotic objects (§10.4.5, §25.1).
//!
//! Buffers are fixed length and never detached, so an integer-indexed
//! element is valid exactly when it falls below the view's length.

use super::*;
use num_bigint::BigInt;
use num_traits::ToPrimitive;

/// Largest byte length a single buffer may hold.
pub(crate) const MAX_BYTE_LENGTH: u64 = 1 << 31;

pub(crate) struct ArrayBufferData {
    pub(crate) bytes: Vec<u8>,
}

pub(crate) struct TypedArrayData {
    pub(crate) buffer: ObjectId,
    pub(crate) kind: TypedArrayKind,
    pub(crate) byte_offset: usize,
    /// Element count.
    pub(crate) length: usize,
}

/// The numeric index a key denotes, if it is a CanonicalNumericIndexString.
fn numeric_index(key: &PropertyKey) -> Option<f64> {
    match key {
        PropertyKey::String(s) => canonical_numeric_index_string(s),
        PropertyKey::Symbol(_) => None,
    }
}

fn bigint_to_u64_modular(value: &BigInt) -> u64 {
    let modulus = BigInt::from(1u128 << 64);
    let wrapped = ((value % &modulus) + &modulus) % &modulus;
    wrapped.to_u64().unwrap_or(0)
}

// §25.1.3.17 NumericToRawBytes(type, value, isLittleEndian)
fn number_to_raw_bytes(kind: TypedArrayKind, n: f64) -> Vec<u8> {
    match kind {
        TypedArrayKind::Int8 => number_ops::to_int8(n).to_le_bytes().to_vec(),
        TypedArrayKind::Uint8 => number_ops::to_uint8(n).to_le_bytes().to_vec(),
        TypedArrayKind::Uint8Clamped => number_ops::to_uint8_clamp(n).to_le_bytes().to_vec(),
        TypedArrayKind::Int16 => number_ops::to_int16(n).to_le_bytes().to_vec(),
        TypedArrayKind::Uint16 => number_ops::to_uint16(n).to_le_bytes().to_vec(),
        TypedArrayKind::Int32 => number_ops::to_int32(n).to_le_bytes().to_vec(),
        TypedArrayKind::Uint32 => number_ops::to_uint32(n).to_le_bytes().to_vec(),
        TypedArrayKind::Float32 => (n as f32).to_le_bytes().to_vec(),
        TypedArrayKind::Float64 | TypedArrayKind::BigInt64 | TypedArrayKind::BigUint64 => n.to_le_bytes().to_vec(),
    }
}

// §25.1.3.15 RawBytesToNumeric(type, rawBytes, isLittleEndian)
fn raw_bytes_to_numeric(kind: TypedArrayKind, raw: &[u8]) -> JsValue {
    let mut buf = [0u8; 8];
    buf[..raw.len()].copy_from_slice(raw);
    let n = match kind {
        TypedArrayKind::Int8 => f64::from(raw[0] as i8),
        TypedArrayKind::Uint8 | TypedArrayKind::Uint8Clamped => f64::from(raw[0]),
        TypedArrayKind::Int16 => f64::from(i16::from_le_bytes([buf[0], buf[1]])),
        TypedArrayKind::Uint16 => f64::from(u16::from_le_bytes([buf[0], buf[1]])),
        TypedArrayKind::Int32 => f64::from(i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]])),
        TypedArrayKind::Uint32 => f64::from(u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]])),
        TypedArrayKind::Float32 => f64::from(f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]])),
        TypedArrayKind::Float64 => f64::from_le_bytes(buf),
        TypedArrayKind::BigInt64 => return JsValue::BigInt(JsBigInt::new(BigInt::from(i64::from_le_bytes(buf)))),
        TypedArrayKind::BigUint64 => return JsValue::BigInt(JsBigInt::new(BigInt::from(u64::from_le_bytes(buf)))),
    };
    JsValue::Number(n)
}

impl Interpreter {
    // §25.1.3.1 AllocateArrayBuffer(constructor, byteLength)
    pub(crate) fn allocate_array_buffer(&mut self, constructor: ObjectId, byte_length: u64) -> JsResult<ObjectId> {
        let proto = self.get_prototype_from_constructor(constructor, Intrinsic::ArrayBufferPrototype)?;
        let size = match usize::try_from(byte_length) {
            Ok(size) if byte_length <= MAX_BYTE_LENGTH => size,
            _ => return Err(self.range_error("Array buffer allocation failed")),
        };
        let mut bytes = Vec::new();
        if bytes.try_reserve_exact(size).is_err() {
            return Err(self.range_error("Array buffer allocation failed"));
        }
        bytes.resize(size, 0u8);
        Ok(self.object_with_kind(Some(proto), ObjectKind::ArrayBuffer(ArrayBufferData { bytes })))
    }

    pub(crate) fn array_buffer_byte_length(&self, buffer: ObjectId) -> EngineResult<Option<usize>> {
        match &self.heap.object(buffer)?.kind {
            ObjectKind::ArrayBuffer(b) => Ok(Some(b.bytes.len())),
            _ => Ok(None),
        }
    }

    /// A typed array viewing `length` elements of `buffer` from `byte_offset`.
    pub(crate) fn typed_array_create(
        &mut self,
        proto: ObjectId,
        kind: TypedArrayKind,
        buffer: ObjectId,
        byte_offset: usize,
        length: usize,
    ) -> ObjectId {
        let data = TypedArrayData {
            buffer,
            kind,
            byte_offset,
            length,
        };
        self.object_with_kind(Some(proto), ObjectKind::TypedArray(data))
    }

    pub(crate) fn typed_array_data(&self, o: ObjectId) -> EngineResult<&TypedArrayData> {
        match &self.heap.object(o)?.kind {
            ObjectKind::TypedArray(t) => Ok(t),
            _ => Err(EngineError::Internal("expected a typed array")),
        }
    }

    // §10.4.5.14 IsValidIntegerIndex(O, index)
    fn is_valid_integer_index(&self, o: ObjectId, index: f64) -> EngineResult<Option<usize>> {
        if index.fract() != 0.0 || (index == 0.0 && index.is_sign_negative()) || index < 0.0 {
            return Ok(None);
        }
        let length = self.typed_array_data(o)?.length;
        if index >= length as f64 {
            return Ok(None);
        }
        Ok(Some(index as usize))
    }

    // §10.4.5.15 TypedArrayGetElement(O, index)
    pub(crate) fn typed_array_get_element(&self, o: ObjectId, index: f64) -> EngineResult<JsValue> {
        let Some(i) = self.is_valid_integer_index(o, index)? else {
            return Ok(JsValue::Undefined);
        };
        let ta = self.typed_array_data(o)?;
        let size = ta.kind.element_size();
        let start = ta.byte_offset + i * size;
        let kind = ta.kind;
        let ObjectKind::ArrayBuffer(buffer) = &self.heap.object(ta.buffer)?.kind else {
            return Err(EngineError::Internal("typed array over a non-buffer"));
        };
        let raw = buffer
            .bytes
            .get(start..start + size)
            .ok_or(EngineError::Internal("typed array view out of bounds"))?;
        Ok(raw_bytes_to_numeric(kind, raw))
    }

    // §10.4.5.16 TypedArraySetElement(O, index, value)
    pub(crate) fn typed_array_set_element(&mut self, o: ObjectId, index: f64, value: &JsValue) -> JsResult<()> {
        let kind = self.typed_array_data(o)?.kind;
        let raw = if kind.is_bigint() {
            let n = bigint_to_u64_modular(&self.to_bigint(value)?);
            n.to_le_bytes().to_vec()
        } else {
            let n = self.to_number(value)?;
            number_to_raw_bytes(kind, n)
        };
        let Some(i) = self.is_valid_integer_index(o, index)? else {
            return Ok(());
        };
        let ta = self.typed_array_data(o)?;
        let start = ta.byte_offset + i * kind.element_size();
        let buffer = ta.buffer;
        let ObjectKind::ArrayBuffer(buffer) = &mut self.heap.object_mut(buffer)?.kind else {
            return Err(EngineError::Internal("typed array over a non-buffer").into());
        };
        let slot = buffer
            .bytes
            .get_mut(start..start + raw.len())
            .ok_or(EngineError::Internal("typed array view out of bounds"))?;
        slot.copy_from_slice(&raw);
        Ok(())
    }

    // §10.4.5.1 [[GetOwnProperty]](P)
    pub(crate) fn typed_array_get_own_property(&mut self, o: ObjectId, key: &PropertyKey) -> JsResult<Option<Property>> {
        let Some(index) = numeric_index(key) else {
            return Ok(self.ordinary_get_own_property(o, key)?);
        };
        let value = self.typed_array_get_element(o, index)?;
        if value.is_undefined() {
            return Ok(None);
        }
        Ok(Some(Property::data(value, true, true, true)))
    }

    // §10.4.5.2 [[HasProperty]](P)
    pub(crate) fn typed_array_has_property(&mut self, o: ObjectId, key: &PropertyKey) -> JsResult<bool> {
        match numeric_index(key) {
            Some(index) => Ok(self.is_valid_integer_index(o, index)?.is_some()),
            None => self.ordinary_has_property(o, key),
        }
    }

    // §10.4.5.3 [[DefineOwnProperty]](P, Desc)
    pub(crate) fn typed_array_define_own_property(
        &mut self,
        o: ObjectId,
        key: PropertyKey,
        desc: PropertyDescriptor,
    ) -> JsResult<bool> {
        let Some(index) = numeric_index(&key) else {
            return self.ordinary_define_own_property(o, key, desc);
        };
        if self.is_valid_integer_index(o, index)?.is_none() {
            return Ok(false);
        }
        if desc.configurable == Some(false)
            || desc.enumerable == Some(false)
            || desc.is_accessor_descriptor()
            || desc.writable == Some(false)
        {
            return Ok(false);
        }
        if let Some(value) = &desc.value {
            self.typed_array_set_element(o, index, value)?;
        }
        Ok(true)
    }

    // §10.4.5.4 [[Get]](P, Receiver)
    pub(crate) fn typed_array_get(&mut self, o: ObjectId, key: &PropertyKey, receiver: &JsValue) -> JsResult<JsValue> {
        match numeric_index(key) {
            Some(index) => Ok(self.typed_array_get_element(o, index)?),
            None => self.ordinary_get(o, key, receiver),
        }
    }

    // §10.4.5.5 [[Set]](P, V, Receiver)
    pub(crate) fn typed_array_set(
        &mut self,
        o: ObjectId,
        key: PropertyKey,
        value: JsValue,
        receiver: &JsValue,
    ) -> JsResult<bool> {
        if let Some(index) = numeric_index(&key) {
            if matches!(receiver, JsValue::Object(r) if *r == o) {
                self.typed_array_set_element(o, index, &value)?;
                return Ok(true);
            }
            if self.is_valid_integer_index(o, index)?.is_none() {
                return Ok(true);
            }
        }
        self.ordinary_set(o, key, value, receiver)
    }

    // §10.4.5.6 [[Delete]](P)
    pub(crate) fn typed_array_delete(&mut self, o: ObjectId, key: &PropertyKey) -> JsResult<bool> {
        match numeric_index(key) {
            Some(index) => Ok(self.is_valid_integer_index(o, index)?.is_none()),
            None => self.ordinary_delete(o, key),
        }
    }

    // §10.4.5.7 [[OwnPropertyKeys]]()
    pub(crate) fn typed_array_own_property_keys(&self, o: ObjectId) -> EngineResult<Vec<PropertyKey>> {
        let length = self.typed_array_data(o)?.length;
        let mut keys: Vec<PropertyKey> = (0..length as u32).map(PropertyKey::from_index).collect();
        keys.extend(self.heap.object(o)?.properties.ordered_keys());
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uint8(interp: &mut Interpreter, len: usize, kind: TypedArrayKind) -> ObjectId {
        let ctor = interp.intrinsic(Intrinsic::ArrayBuffer).unwrap();
        let buffer = interp.allocate_array_buffer(ctor, (len * kind.element_size()) as u64).unwrap();
        let proto = interp.intrinsic(Intrinsic::TypedArrayConstructorPrototype(kind)).unwrap();
        interp.typed_array_create(proto, kind, buffer, 0, len)
    }

    #[test]
    fn oversized_buffers_throw_instead_of_allocating() {
        let mut interp = Interpreter::new().unwrap();
        let ctor = interp.intrinsic(Intrinsic::ArrayBuffer).unwrap();
        let err = interp.allocate_array_buffer(ctor, 8_000_000_000_000_000).unwrap_err();
        assert!(err.thrown().is_some());
        let err = interp.allocate_array_buffer(ctor, MAX_BYTE_LENGTH + 1).unwrap_err();
        assert!(err.thrown().is_some());
        let ok = interp.allocate_array_buffer(ctor, 16).unwrap();
        assert_eq!(interp.array_buffer_byte_length(ok).unwrap(), Some(16));
    }

    #[test]
    fn stores_wrap_to_the_element_type() {
        let mut interp = Interpreter::new().unwrap();
        let ta = uint8(&mut interp, 2, TypedArrayKind::Uint8);
        interp.set(ta, PropertyKey::from_index(0), JsValue::Number(257.0), true).unwrap();
        interp.set(ta, PropertyKey::from_index(1), JsValue::Number(-1.0), true).unwrap();
        assert_eq!(interp.get(ta, &PropertyKey::from_index(0)).unwrap().as_number(), Some(1.0));
        assert_eq!(interp.get(ta, &PropertyKey::from_index(1)).unwrap().as_number(), Some(255.0));
    }

    #[test]
    fn clamped_and_float_elements() {
        let mut interp = Interpreter::new().unwrap();
        let clamped = uint8(&mut interp, 1, TypedArrayKind::Uint8Clamped);
        interp.set(clamped, PropertyKey::from_index(0), JsValue::Number(300.0), true).unwrap();
        assert_eq!(interp.get(clamped, &PropertyKey::from_index(0)).unwrap().as_number(), Some(255.0));

        let floats = uint8(&mut interp, 1, TypedArrayKind::Float32);
        interp.set(floats, PropertyKey::from_index(0), JsValue::Number(0.1), true).unwrap();
        assert_eq!(
            interp.get(floats, &PropertyKey::from_index(0)).unwrap().as_number(),
            Some(f64::from(0.1f32))
        );
    }

    #[test]
    fn out_of_range_indices_are_absent() {
        let mut interp = Interpreter::new().unwrap();
        let ta = uint8(&mut interp, 1, TypedArrayKind::Int16);
        assert!(interp.get(ta, &PropertyKey::from_index(4)).unwrap().is_undefined());
        assert!(!interp.has_property(ta, &"1.5".into()).unwrap());
        assert!(!interp.has_property(ta, &"-0".into()).unwrap());
        // Non-canonical numeric strings are ordinary keys.
        interp.set(ta, "01".into(), JsValue::Null, true).unwrap();
        assert!(interp.has_own_property(ta, &"01".into()).unwrap());
        // Writes to invalid indices vanish.
        interp.set(ta, PropertyKey::from_index(9), JsValue::Number(1.0), true).unwrap();
        assert!(!interp.has_own_property(ta, &PropertyKey::from_index(9)).unwrap());
    }

    #[test]
    fn elements_cannot_become_non_writable() {
        let mut interp = Interpreter::new().unwrap();
        let ta = uint8(&mut interp, 1, TypedArrayKind::Int32);
        let frozen = PropertyDescriptor::data(JsValue::Number(1.0), false, true, true);
        assert!(!interp.define_own_property(ta, PropertyKey::from_index(0), frozen).unwrap());
        assert!(!interp.delete(ta, &PropertyKey::from_index(0)).unwrap());
        assert!(interp.delete(ta, &PropertyKey::from_index(3)).unwrap());
    }

    #[test]
    fn bigint_elements_wrap_modulo_two_to_the_64() {
        let mut interp = Interpreter::new().unwrap();
        let ta = uint8(&mut interp, 1, TypedArrayKind::BigInt64);
        let minus_one = JsValue::BigInt(JsBigInt::new(BigInt::from(u64::MAX)));
        interp.set(ta, PropertyKey::from_index(0), minus_one, true).unwrap();
        match interp.get(ta, &PropertyKey::from_index(0)).unwrap() {
            JsValue::BigInt(b) => assert_eq!(b.value, BigInt::from(-1)),
            other => panic!("expected a BigInt, got {other}"),
        }
        let err = interp.set(ta, PropertyKey::from_index(0), JsValue::Number(1.0), true).unwrap_err();
        assert!(err.thrown().is_some());
    }

    #[test]
    fn own_keys_list_indices_first() {
        let mut interp = Interpreter::new().unwrap();
        let ta = uint8(&mut interp, 2, TypedArrayKind::Uint16);
        interp.create_data_property(ta, "tag".into(), JsValue::Null).unwrap();
        let keys: Vec<String> = interp.own_property_keys(ta).unwrap().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, ["0", "1", "tag"]);
    }
}
