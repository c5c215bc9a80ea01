//! %ArrayBuffer% (§25.1.4), %TypedArray% (§23.2.1) and the concrete
//! typed array constructors (§23.2.5).

use super::*;

pub(super) fn init(interp: &mut Interpreter, realm: RealmId) -> JsResult<()> {
    init_array_buffer(interp, realm)?;

    let proto = interp.new_prototype_object(realm, None)?;
    let abstract_ctor = interp.create_builtin_constructor(typed_array_constructor, 0, "TypedArray", proto, None)?;
    interp.define_builtin_getter(proto, "buffer", typed_array_buffer)?;
    interp.define_builtin_getter(proto, "byteLength", typed_array_byte_length)?;
    interp.define_builtin_getter(proto, "byteOffset", typed_array_byte_offset)?;
    interp.define_builtin_getter(proto, "length", typed_array_length)?;
    interp.define_builtin_method(proto, "entries", typed_array_entries, 0)?;
    interp.define_builtin_method(proto, "join", typed_array_join, 1)?;
    interp.define_builtin_method(proto, "keys", typed_array_keys, 0)?;
    let values = interp.define_builtin_method(proto, "values", typed_array_values, 0)?;
    let iterator_key = PropertyKey::Symbol(interp.well_known_symbol(WellKnownSymbol::Iterator));
    interp.define_builtin_value(proto, iterator_key, JsValue::Object(values))?;
    let tag_key = PropertyKey::Symbol(interp.well_known_symbol(WellKnownSymbol::ToStringTag));
    interp.define_builtin_getter(proto, tag_key, typed_array_to_string_tag)?;
    interp.set_intrinsic(realm, Intrinsic::TypedArray, abstract_ctor)?;
    interp.set_intrinsic(realm, Intrinsic::TypedArrayPrototype, proto)?;

    for (index, kind) in TypedArrayKind::ALL.iter().copied().enumerate() {
        let concrete_proto = interp.new_prototype_object(realm, Some(proto))?;
        let ctor = interp.create_builtin_constructor(
            concrete_typed_array_constructor,
            3,
            kind.name(),
            concrete_proto,
            Some(abstract_ctor),
        )?;
        interp.set_builtin_slots(ctor, vec![JsValue::Number(index as f64)])?;
        let size = JsValue::Number(kind.element_size() as f64);
        interp.define_builtin_constant(ctor, "BYTES_PER_ELEMENT", size.clone())?;
        interp.define_builtin_constant(concrete_proto, "BYTES_PER_ELEMENT", size)?;
        interp.set_intrinsic(realm, Intrinsic::TypedArrayConstructor(kind), ctor)?;
        interp.set_intrinsic(realm, Intrinsic::TypedArrayConstructorPrototype(kind), concrete_proto)?;
    }
    Ok(())
}

fn init_array_buffer(interp: &mut Interpreter, realm: RealmId) -> JsResult<()> {
    let proto = interp.new_prototype_object(realm, None)?;
    let ctor = interp.create_builtin_constructor(array_buffer_constructor, 1, "ArrayBuffer", proto, None)?;
    interp.define_builtin_method(ctor, "isView", array_buffer_is_view, 1)?;
    interp.define_builtin_getter(proto, "byteLength", array_buffer_byte_length)?;
    interp.define_builtin_method(proto, "slice", array_buffer_slice, 2)?;
    interp.define_to_string_tag(proto, "ArrayBuffer")?;
    interp.set_intrinsic(realm, Intrinsic::ArrayBuffer, ctor)?;
    interp.set_intrinsic(realm, Intrinsic::ArrayBufferPrototype, proto)?;
    Ok(())
}

// ---- ArrayBuffer ----

// §25.1.4.1 ArrayBuffer(length)
fn array_buffer_constructor(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let Some(new_target) = call.new_target else {
        return Err(interp.type_error("Constructor ArrayBuffer requires 'new'"));
    };
    let byte_length = interp.to_index(&call.arg(0))?;
    Ok(JsValue::Object(interp.allocate_array_buffer(new_target, byte_length)?))
}

// §25.1.5.1 ArrayBuffer.isView(arg)
fn array_buffer_is_view(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let is_view = match call.arg(0) {
        JsValue::Object(o) => matches!(interp.heap.object(o)?.kind, ObjectKind::TypedArray(_)),
        _ => false,
    };
    Ok(JsValue::Boolean(is_view))
}

fn this_array_buffer(interp: &mut Interpreter, value: &JsValue, method: &str) -> JsResult<(ObjectId, usize)> {
    if let JsValue::Object(o) = value
        && let Some(len) = interp.array_buffer_byte_length(*o)?
    {
        return Ok((*o, len));
    }
    Err(interp.type_error(format!("ArrayBuffer.prototype.{method} called on incompatible receiver")))
}

// §25.1.6.1 get ArrayBuffer.prototype.byteLength
fn array_buffer_byte_length(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let (_, len) = this_array_buffer(interp, call.this, "byteLength")?;
    Ok(JsValue::Number(len as f64))
}

/// Resolves a relative index argument against `len` (negative counts from
/// the end), clamped to `0..=len`.
fn relative_index(interp: &mut Interpreter, value: &JsValue, len: usize, default: usize) -> JsResult<usize> {
    if value.is_undefined() {
        return Ok(default);
    }
    let relative = interp.to_integer_or_infinity(value)?;
    let len_f = len as f64;
    let resolved = if relative < 0.0 {
        (len_f + relative).max(0.0)
    } else {
        relative.min(len_f)
    };
    Ok(resolved as usize)
}

// §25.1.6.6 ArrayBuffer.prototype.slice(start, end)
fn array_buffer_slice(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let (buffer, len) = this_array_buffer(interp, call.this, "slice")?;
    let first = relative_index(interp, &call.arg(0), len, 0)?;
    let last = relative_index(interp, &call.arg(1), len, len)?;
    let new_len = last.saturating_sub(first);
    let ctor = interp.intrinsic(Intrinsic::ArrayBuffer)?;
    let new = interp.allocate_array_buffer(ctor, new_len as u64)?;
    let bytes = match &interp.heap.object(buffer)?.kind {
        ObjectKind::ArrayBuffer(data) => data.bytes[first..first + new_len].to_vec(),
        _ => return Err(EngineError::Internal("slice source is not a buffer").into()),
    };
    if let ObjectKind::ArrayBuffer(data) = &mut interp.heap.object_mut(new)?.kind {
        data.bytes.copy_from_slice(&bytes);
    }
    Ok(JsValue::Object(new))
}

// ---- %TypedArray% ----

// §23.2.1.1 %TypedArray%()
fn typed_array_constructor(interp: &mut Interpreter, _call: &NativeCall<'_>) -> JsResult<JsValue> {
    Err(interp.type_error("Abstract class TypedArray not directly constructable"))
}

// §23.2.4.4 ValidateTypedArray(O, order)
fn validate_typed_array(interp: &mut Interpreter, value: &JsValue) -> JsResult<ObjectId> {
    if let JsValue::Object(o) = value
        && matches!(interp.heap.object(*o)?.kind, ObjectKind::TypedArray(_))
    {
        return Ok(*o);
    }
    Err(interp.type_error("this is not a typed array"))
}

// §23.2.3.2 get %TypedArray%.prototype.buffer
fn typed_array_buffer(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let o = validate_typed_array(interp, call.this)?;
    Ok(JsValue::Object(interp.typed_array_data(o)?.buffer))
}

// §23.2.3.3 get %TypedArray%.prototype.byteLength
fn typed_array_byte_length(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let o = validate_typed_array(interp, call.this)?;
    let ta = interp.typed_array_data(o)?;
    Ok(JsValue::Number((ta.length * ta.kind.element_size()) as f64))
}

// §23.2.3.4 get %TypedArray%.prototype.byteOffset
fn typed_array_byte_offset(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let o = validate_typed_array(interp, call.this)?;
    Ok(JsValue::Number(interp.typed_array_data(o)?.byte_offset as f64))
}

// §23.2.3.21 get %TypedArray%.prototype.length
fn typed_array_length(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let o = validate_typed_array(interp, call.this)?;
    Ok(JsValue::Number(interp.typed_array_data(o)?.length as f64))
}

// §23.2.3.7 %TypedArray%.prototype.entries()
fn typed_array_entries(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let o = validate_typed_array(interp, call.this)?;
    Ok(JsValue::Object(interp.create_array_iterator(o, EnumerableKind::KeyValue)?))
}

// §23.2.3.18 %TypedArray%.prototype.join(separator)
fn typed_array_join(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    validate_typed_array(interp, call.this)?;
    super::array::array_proto_join(interp, call)
}

// §23.2.3.19 %TypedArray%.prototype.keys()
fn typed_array_keys(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let o = validate_typed_array(interp, call.this)?;
    Ok(JsValue::Object(interp.create_array_iterator(o, EnumerableKind::Key)?))
}

// §23.2.3.35 %TypedArray%.prototype.values()
fn typed_array_values(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let o = validate_typed_array(interp, call.this)?;
    Ok(JsValue::Object(interp.create_array_iterator(o, EnumerableKind::Value)?))
}

// §23.2.3.38 get %TypedArray%.prototype[@@toStringTag]
fn typed_array_to_string_tag(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let JsValue::Object(o) = call.this else {
        return Ok(JsValue::Undefined);
    };
    Ok(match &interp.heap.object(*o)?.kind {
        ObjectKind::TypedArray(ta) => JsValue::string(ta.kind.name()),
        _ => JsValue::Undefined,
    })
}

// ---- concrete constructors ----

fn constructor_kind(interp: &Interpreter, callee: ObjectId) -> JsResult<TypedArrayKind> {
    let index = interp.builtin_slot(callee, 0)?.as_number().unwrap_or(0.0) as usize;
    TypedArrayKind::ALL
        .get(index)
        .copied()
        .ok_or_else(|| EngineError::Internal("typed array constructor without a kind").into())
}

// §23.2.5.1 TypedArray(...args)
fn concrete_typed_array_constructor(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let kind = constructor_kind(interp, call.callee)?;
    let Some(new_target) = call.new_target else {
        return Err(interp.type_error(format!("Constructor {} requires 'new'", kind.name())));
    };
    let proto = interp.get_prototype_from_constructor(new_target, Intrinsic::TypedArrayConstructorPrototype(kind))?;
    let first = call.arg(0);
    let JsValue::Object(source) = first else {
        let length = interp.to_index(&first)?;
        return Ok(JsValue::Object(allocate_typed_array(interp, proto, kind, length)?));
    };
    let (is_typed_array, is_buffer) = match &interp.heap.object(source)?.kind {
        ObjectKind::TypedArray(_) => (true, false),
        ObjectKind::ArrayBuffer(_) => (false, true),
        _ => (false, false),
    };
    if is_typed_array {
        return Ok(JsValue::Object(initialize_from_typed_array(interp, proto, kind, source)?));
    }
    if is_buffer {
        let view = initialize_from_array_buffer(interp, proto, kind, source, &call.arg(1), &call.arg(2))?;
        return Ok(JsValue::Object(view));
    }
    let iterator_key = PropertyKey::Symbol(interp.well_known_symbol(WellKnownSymbol::Iterator));
    let values = match interp.get_method(&first, &iterator_key)? {
        Some(method) => {
            let mut record = interp.get_iterator_from_method(&first, &method)?;
            let mut values = Vec::new();
            while let Some(v) = interp.iterator_step_value(&mut record)? {
                values.push(v);
            }
            values
        }
        None => array_like_values(interp, source)?,
    };
    let o = allocate_typed_array(interp, proto, kind, values.len() as u64)?;
    for (k, value) in values.into_iter().enumerate() {
        let key = interp.index_key(k as u64);
        interp.set(o, key, value, true)?;
    }
    Ok(JsValue::Object(o))
}

// §23.2.5.1.1 AllocateTypedArray(constructorName, newTarget, defaultProto, length)
fn allocate_typed_array(interp: &mut Interpreter, proto: ObjectId, kind: TypedArrayKind, length: u64) -> JsResult<ObjectId> {
    let Some(byte_length) = length.checked_mul(kind.element_size() as u64) else {
        return Err(interp.range_error("Invalid typed array length"));
    };
    let buffer_ctor = interp.intrinsic(Intrinsic::ArrayBuffer)?;
    let buffer = interp.allocate_array_buffer(buffer_ctor, byte_length)?;
    Ok(interp.typed_array_create(proto, kind, buffer, 0, length as usize))
}

// §23.2.5.1.2 InitializeTypedArrayFromTypedArray(O, srcArray)
fn initialize_from_typed_array(
    interp: &mut Interpreter,
    proto: ObjectId,
    kind: TypedArrayKind,
    source: ObjectId,
) -> JsResult<ObjectId> {
    let src = interp.typed_array_data(source)?;
    let (src_kind, length) = (src.kind, src.length);
    if src_kind.is_bigint() != kind.is_bigint() {
        return Err(interp.type_error(format!("Cannot mix BigInt and other types converting {} to {}", src_kind.name(), kind.name())));
    }
    let o = allocate_typed_array(interp, proto, kind, length as u64)?;
    for k in 0..length {
        let value = interp.typed_array_get_element(source, k as f64)?;
        interp.typed_array_set_element(o, k as f64, &value)?;
    }
    Ok(o)
}

// §23.2.5.1.3 InitializeTypedArrayFromArrayBuffer(O, buffer, byteOffset, length)
fn initialize_from_array_buffer(
    interp: &mut Interpreter,
    proto: ObjectId,
    kind: TypedArrayKind,
    buffer: ObjectId,
    byte_offset: &JsValue,
    length: &JsValue,
) -> JsResult<ObjectId> {
    let size = kind.element_size() as u64;
    let offset = interp.to_index(byte_offset)?;
    if offset % size != 0 {
        return Err(interp.range_error(format!("start offset of {} should be a multiple of {size}", kind.name())));
    }
    let new_length = match length {
        JsValue::Undefined => None,
        v => Some(interp.to_index(v)?),
    };
    let buffer_byte_length = interp.array_buffer_byte_length(buffer)?.unwrap_or(0) as u64;
    let new_byte_length = match new_length {
        None => {
            if buffer_byte_length % size != 0 {
                return Err(interp.range_error(format!("byte length of {} should be a multiple of {size}", kind.name())));
            }
            if offset > buffer_byte_length {
                return Err(interp.range_error(format!("Start offset {offset} is outside the bounds of the buffer")));
            }
            buffer_byte_length - offset
        }
        Some(n) => {
            let new_byte_length = n.saturating_mul(size);
            if offset.saturating_add(new_byte_length) > buffer_byte_length {
                return Err(interp.range_error(format!("Invalid typed array length: {n}")));
            }
            new_byte_length
        }
    };
    let length = (new_byte_length / size) as usize;
    Ok(interp.typed_array_create(proto, kind, buffer, offset as usize, length))
}

// §23.2.5.1.5 InitializeTypedArrayFromArrayLike(O, arrayLike)
fn array_like_values(interp: &mut Interpreter, o: ObjectId) -> JsResult<Vec<JsValue>> {
    let len = interp.length_of_array_like(o)?;
    let mut values = Vec::new();
    for k in 0..len {
        let key = interp.index_key(k);
        values.push(interp.get(o, &key)?);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::*;

    fn run(body: Vec<Statement>) -> JsValue {
        let mut interp = Interpreter::new().unwrap();
        interp.run(&script(body)).unwrap()
    }

    fn run_str(body: Vec<Statement>) -> String {
        run(body).as_string().map(|s| s.to_rust_string()).unwrap_or_default()
    }

    fn run_err(body: Vec<Statement>) -> String {
        let mut interp = Interpreter::new().unwrap();
        interp.run(&script(body)).unwrap_err().to_string()
    }

    #[test]
    fn elements_wrap_to_the_element_type() {
        // var a = new Uint8Array(2); a[0] = 257; a[1] = -1; a[0] + "," + a[1]
        let v = run_str(vec![
            var("a", new(ident("Uint8Array"), vec![num(2.0)])),
            expr_stmt(assign(index(ident("a"), num(0.0)), num(257.0))),
            expr_stmt(assign(index(ident("a"), num(1.0)), num(-1.0))),
            expr_stmt(method_call(ident("a"), "join", vec![])),
        ]);
        assert_eq!(v, "1,255");
    }

    #[test]
    fn clamped_arrays_saturate() {
        let v = run_str(vec![
            var("a", new(ident("Uint8ClampedArray"), vec![array(vec![num(300.0), num(-5.0), num(1.5)])])),
            expr_stmt(method_call(ident("a"), "join", vec![])),
        ]);
        assert_eq!(v, "255,0,2");
    }

    #[test]
    fn views_share_the_buffer() {
        // var b = new ArrayBuffer(4); var x = new Uint8Array(b); var y = new Uint32Array(b); x[0] = 1; x[1] = 1; y[0]
        let v = run(vec![
            var("b", new(ident("ArrayBuffer"), vec![num(4.0)])),
            var("x", new(ident("Uint8Array"), vec![ident("b")])),
            var("y", new(ident("Uint32Array"), vec![ident("b")])),
            expr_stmt(assign(index(ident("x"), num(0.0)), num(1.0))),
            expr_stmt(assign(index(ident("x"), num(1.0)), num(1.0))),
            expr_stmt(index(ident("y"), num(0.0))),
        ]);
        assert_eq!(v.as_number(), Some(257.0));
    }

    #[test]
    fn misaligned_offsets_are_range_errors() {
        let err = run_err(vec![expr_stmt(new(
            ident("Int16Array"),
            vec![new(ident("ArrayBuffer"), vec![num(4.0)]), num(1.0)],
        ))]);
        assert!(err.contains("RangeError"));
        let err = run_err(vec![expr_stmt(new(
            ident("Int32Array"),
            vec![new(ident("ArrayBuffer"), vec![num(8.0)]), num(4.0), num(2.0)],
        ))]);
        assert!(err.contains("RangeError"));
    }

    #[test]
    fn huge_lengths_are_range_errors() {
        let err = run_err(vec![expr_stmt(new(ident("Float64Array"), vec![num(1e15)]))]);
        assert!(err.contains("RangeError"));
        let err = run_err(vec![expr_stmt(new(ident("ArrayBuffer"), vec![num(9e15)]))]);
        assert!(err.contains("RangeError"));
    }

    #[test]
    fn out_of_range_indices_are_ignored() {
        // var a = new Int8Array(1); a[5] = 1; a[5] === undefined && !("5" in a)
        let v = run(vec![
            var("a", new(ident("Int8Array"), vec![num(1.0)])),
            expr_stmt(assign(index(ident("a"), num(5.0)), num(1.0))),
            expr_stmt(logical(
                LogicalOp::And,
                binary(BinaryOp::StrictEq, index(ident("a"), num(5.0)), undefined()),
                not(binary(BinaryOp::In, string("5"), ident("a"))),
            )),
        ]);
        assert_eq!(v.as_boolean(), Some(true));
    }

    #[test]
    fn bigint_arrays_reject_number_sources() {
        let err = run_err(vec![expr_stmt(new(
            ident("BigInt64Array"),
            vec![new(ident("Int8Array"), vec![num(1.0)])],
        ))]);
        assert!(err.contains("TypeError"));
        let err = run_err(vec![
            var("a", new(ident("BigInt64Array"), vec![num(1.0)])),
            expr_stmt(assign(index(ident("a"), num(0.0)), num(1.0))),
        ]);
        assert!(err.contains("TypeError"));
    }

    #[test]
    fn accessors_and_tag() {
        // var a = new Float64Array(new ArrayBuffer(32), 8, 2);
        // a.length + a.byteLength + a.byteOffset + Object.prototype.toString.call(a)
        let v = run_str(vec![
            var("a", new(ident("Float64Array"), vec![new(ident("ArrayBuffer"), vec![num(32.0)]), num(8.0), num(2.0)])),
            expr_stmt(binary(
                BinaryOp::Add,
                binary(
                    BinaryOp::Add,
                    binary(BinaryOp::Add, member(ident("a"), "length"), member(ident("a"), "byteLength")),
                    member(ident("a"), "byteOffset"),
                ),
                method_call(
                    member(member(ident("Object"), "prototype"), "toString"),
                    "call",
                    vec![ident("a")],
                ),
            )),
        ]);
        assert_eq!(v, "26[object Float64Array]");
    }

    #[test]
    fn abstract_constructor_and_call_without_new_throw() {
        assert!(run_err(vec![expr_stmt(call(ident("Int8Array"), vec![num(1.0)]))]).contains("requires 'new'"));
        let err = run_err(vec![expr_stmt(new(
            method_call(ident("Object"), "getPrototypeOf", vec![ident("Int8Array")]),
            vec![],
        ))]);
        assert!(err.contains("TypeError"));
    }

    #[test]
    fn typed_arrays_are_iterable() {
        // var s = 0; for (const x of new Int16Array([1, 2, 3])) s += x; s
        let v = run(vec![
            var("s", num(0.0)),
            for_of(
                VarKind::Const,
                pat("x"),
                new(ident("Int16Array"), vec![array(vec![num(1.0), num(2.0), num(3.0)])]),
                expr_stmt(assign_op(AssignOp::AddAssign, ident("s"), ident("x"))),
            ),
            expr_stmt(ident("s")),
        ]);
        assert_eq!(v.as_number(), Some(6.0));
    }

    #[test]
    fn array_buffer_slice_copies() {
        // var b = new ArrayBuffer(4); new Uint8Array(b)[3] = 9; var c = b.slice(-2); c.byteLength + "," + new Uint8Array(c)[1]
        let v = run_str(vec![
            var("b", new(ident("ArrayBuffer"), vec![num(4.0)])),
            expr_stmt(assign(index(new(ident("Uint8Array"), vec![ident("b")]), num(3.0)), num(9.0))),
            var("c", method_call(ident("b"), "slice", vec![num(-2.0)])),
            expr_stmt(binary(
                BinaryOp::Add,
                binary(BinaryOp::Add, member(ident("c"), "byteLength"), string(",")),
                index(new(ident("Uint8Array"), vec![ident("c")]), num(1.0)),
            )),
        ]);
        assert_eq!(v, "2,9");
    }
}
