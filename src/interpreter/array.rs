//! Array exotic objects (§10.4.2).
//!
//! `length` is stored as an ordinary non-configurable data property; the
//! overrides below keep it in step with the index keys.

use super::*;

/// 2^32 - 1, one past the largest array index.
const MAX_ARRAY_LENGTH: u64 = u32::MAX as u64;

impl Interpreter {
    // §10.4.2.2 ArrayCreate(length [, proto])
    pub(crate) fn array_create(&mut self, length: u64, proto: Option<ObjectId>) -> JsResult<ObjectId> {
        if length > MAX_ARRAY_LENGTH {
            return Err(self.range_error("Invalid array length"));
        }
        let proto = match proto {
            Some(p) => p,
            None => self.intrinsic(Intrinsic::ArrayPrototype)?,
        };
        let mut data = ObjectData::new(Some(proto), ObjectKind::Array);
        data.properties.insert(
            "length".into(),
            Property::data(JsValue::Number(length as f64), true, false, false),
        );
        Ok(self.alloc_object(data))
    }

    // §7.3.18 CreateArrayFromList(elements)
    pub(crate) fn create_array_from_list(&mut self, elements: Vec<JsValue>) -> JsResult<ObjectId> {
        let array = self.array_create(0, None)?;
        let len = elements.len();
        let data = self.heap.object_mut(array)?;
        for (i, value) in elements.into_iter().enumerate() {
            data.properties
                .insert(PropertyKey::from_index(i as u32), Property::data(value, true, true, true));
        }
        if let Some(length) = data.properties.get_mut(&"length".into()) {
            length.value = PropertyValue::Data {
                value: JsValue::Number(len as f64),
                writable: true,
            };
        }
        Ok(array)
    }

    /// Current `length` of an array object, read without side effects.
    pub(crate) fn array_length(&self, array: ObjectId) -> EngineResult<u32> {
        match self.heap.object(array)?.properties.get(&"length".into()).map(|p| &p.value) {
            Some(PropertyValue::Data {
                value: JsValue::Number(n),
                ..
            }) => Ok(*n as u32),
            _ => Err(EngineError::Internal("array without a numeric length")),
        }
    }

    // §10.4.2.1 [[DefineOwnProperty]](P, Desc)
    pub(crate) fn array_define_own_property(
        &mut self,
        a: ObjectId,
        key: PropertyKey,
        desc: PropertyDescriptor,
    ) -> JsResult<bool> {
        if key.is_string("length") {
            return self.array_set_length(a, desc);
        }
        let Some(index) = key.as_array_index() else {
            return self.ordinary_define_own_property(a, key, desc);
        };
        let length_desc = self
            .ordinary_get_own_property(a, &"length".into())?
            .ok_or(EngineError::Internal("array without length"))?;
        let length = self.array_length(a)?;
        if index >= length && length_desc.writable() == Some(false) {
            return Ok(false);
        }
        if !self.ordinary_define_own_property(a, key, desc)? {
            return Ok(false);
        }
        if index >= length {
            self.write_array_length(a, index as u64 + 1, None)?;
        }
        Ok(true)
    }

    // §10.4.2.4 ArraySetLength(A, Desc)
    pub(crate) fn array_set_length(&mut self, a: ObjectId, desc: PropertyDescriptor) -> JsResult<bool> {
        let Some(value) = desc.value.clone() else {
            return self.ordinary_define_own_property(a, "length".into(), desc);
        };
        let new_len = self.to_uint32(&value)?;
        let number_len = self.to_number(&value)?;
        if new_len as f64 != number_len {
            return Err(self.range_error("Invalid array length"));
        }
        let old_len_desc = self
            .ordinary_get_own_property(a, &"length".into())?
            .ok_or(EngineError::Internal("array without length"))?;
        let old_len = self.array_length(a)?;
        let mut new_len_desc = desc;
        new_len_desc.value = Some(JsValue::Number(new_len as f64));
        if new_len >= old_len {
            return self.ordinary_define_own_property(a, "length".into(), new_len_desc);
        }
        if old_len_desc.writable() == Some(false) {
            return Ok(false);
        }
        // Writability is dropped only after the deletions succeed.
        let new_writable = new_len_desc.writable != Some(false);
        if !new_writable {
            new_len_desc.writable = Some(true);
        }
        if !self.ordinary_define_own_property(a, "length".into(), new_len_desc)? {
            return Ok(false);
        }
        let doomed = self.heap.object(a)?.properties.indices_from(new_len);
        for index in doomed {
            let deleted = self.delete(a, &PropertyKey::from_index(index))?;
            if !deleted {
                self.write_array_length(a, index as u64 + 1, (!new_writable).then_some(false))?;
                return Ok(false);
            }
        }
        if !new_writable {
            let freeze = PropertyDescriptor {
                writable: Some(false),
                ..Default::default()
            };
            self.ordinary_define_own_property(a, "length".into(), freeze)?;
        }
        Ok(true)
    }

    fn write_array_length(&mut self, a: ObjectId, length: u64, writable: Option<bool>) -> JsResult<bool> {
        let desc = PropertyDescriptor {
            value: Some(JsValue::Number(length as f64)),
            writable,
            ..Default::default()
        };
        self.ordinary_define_own_property(a, "length".into(), desc)
    }
}
