//! %Array% and %Array.prototype% (§23.1).

use super::*;

const MAX_SAFE_LENGTH: u64 = (1 << 53) - 1;

pub(super) fn init(interp: &mut Interpreter, realm: RealmId) -> JsResult<()> {
    let object_proto = interp.realm_intrinsic(realm, Intrinsic::ObjectPrototype)?;
    // §23.1.3: %Array.prototype% is itself an Array exotic object.
    let proto = interp.array_create(0, Some(object_proto))?;
    let ctor = interp.create_builtin_constructor(array_constructor, 1, "Array", proto, None)?;
    interp.set_intrinsic(realm, Intrinsic::Array, ctor)?;
    interp.set_intrinsic(realm, Intrinsic::ArrayPrototype, proto)?;

    interp.define_builtin_method(ctor, "isArray", array_is_array, 1)?;
    interp.define_builtin_method(ctor, "of", array_of, 0)?;

    interp.define_builtin_method(proto, "entries", array_proto_entries, 0)?;
    interp.define_builtin_method(proto, "join", array_proto_join, 1)?;
    interp.define_builtin_method(proto, "keys", array_proto_keys, 0)?;
    interp.define_builtin_method(proto, "push", array_proto_push, 1)?;
    interp.define_builtin_method(proto, "toString", array_proto_to_string, 0)?;

    // §23.1.3.40 Array.prototype[@@iterator] is the same object as values.
    let values = interp.define_builtin_method(proto, "values", array_proto_values, 0)?;
    let iterator_key = PropertyKey::Symbol(interp.well_known_symbol(WellKnownSymbol::Iterator));
    interp.define_builtin_value(proto, iterator_key, JsValue::Object(values))?;
    interp.set_intrinsic(realm, Intrinsic::ArrayPrototypeValues, values)?;
    Ok(())
}

// §23.1.1.1 Array(...values)
fn array_constructor(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let new_target = call.new_target.unwrap_or(call.callee);
    let proto = interp.get_prototype_from_constructor(new_target, Intrinsic::ArrayPrototype)?;
    match call.args {
        [] => Ok(JsValue::Object(interp.array_create(0, Some(proto))?)),
        [len] => {
            let array = interp.array_create(0, Some(proto))?;
            let int_len = match len {
                JsValue::Number(n) => {
                    let int_len = interp.to_uint32(len)?;
                    if f64::from(int_len) != *n {
                        return Err(interp.range_error("Invalid array length"));
                    }
                    int_len
                }
                other => {
                    interp.create_data_property_or_throw(array, PropertyKey::from_index(0), other.clone())?;
                    1
                }
            };
            interp.set(array, "length".into(), JsValue::Number(f64::from(int_len)), true)?;
            Ok(JsValue::Object(array))
        }
        values => {
            let array = interp.array_create(values.len() as u64, Some(proto))?;
            for (k, value) in values.iter().enumerate() {
                interp.create_data_property_or_throw(array, PropertyKey::from_index(k as u32), value.clone())?;
            }
            Ok(JsValue::Object(array))
        }
    }
}

// §23.1.2.2 Array.isArray(arg)
fn array_is_array(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    Ok(JsValue::Boolean(interp.is_array(&call.arg(0))?))
}

// §23.1.2.3 Array.of(...items)
fn array_of(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let this = call.this.clone();
    let a = if interp.is_constructor(&this)?
        && let JsValue::Object(c) = this
    {
        interp.construct(c, &[JsValue::Number(call.args.len() as f64)], None)?
    } else {
        interp.array_create(call.args.len() as u64, None)?
    };
    for (k, item) in call.args.iter().enumerate() {
        interp.create_data_property_or_throw(a, PropertyKey::from_index(k as u32), item.clone())?;
    }
    interp.set(a, "length".into(), JsValue::Number(call.args.len() as f64), true)?;
    Ok(JsValue::Object(a))
}

// §23.1.3.5 Array.prototype.entries()
fn array_proto_entries(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let o = interp.to_object(call.this)?;
    Ok(JsValue::Object(interp.create_array_iterator(o, EnumerableKind::KeyValue)?))
}

// §23.1.3.19 Array.prototype.keys()
fn array_proto_keys(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let o = interp.to_object(call.this)?;
    Ok(JsValue::Object(interp.create_array_iterator(o, EnumerableKind::Key)?))
}

// §23.1.3.38 Array.prototype.values()
fn array_proto_values(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let o = interp.to_object(call.this)?;
    Ok(JsValue::Object(interp.create_array_iterator(o, EnumerableKind::Value)?))
}

// §23.1.3.18 Array.prototype.join(separator)
pub(super) fn array_proto_join(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let o = interp.to_object(call.this)?;
    let len = interp.length_of_array_like(o)?;
    let separator = match call.arg(0) {
        JsValue::Undefined => JsString::from_str(","),
        v => interp.to_string(&v)?,
    };
    let mut units: Vec<u16> = Vec::new();
    for k in 0..len {
        if k > 0 {
            units.extend_from_slice(separator.as_code_units());
        }
        let key = interp.index_key(k);
        let element = interp.get(o, &key)?;
        if !element.is_nullish() {
            let s = interp.to_string(&element)?;
            units.extend_from_slice(s.as_code_units());
        }
    }
    Ok(JsValue::String(JsString::from_code_units(units)))
}

// §23.1.3.23 Array.prototype.push(...items)
fn array_proto_push(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let o = interp.to_object(call.this)?;
    let mut len = interp.length_of_array_like(o)?;
    if len + call.args.len() as u64 > MAX_SAFE_LENGTH {
        return Err(interp.type_error("Pushing past the maximum array-like length"));
    }
    for item in call.args {
        let key = interp.index_key(len);
        interp.set(o, key, item.clone(), true)?;
        len += 1;
    }
    let len = JsValue::Number(len as f64);
    interp.set(o, "length".into(), len.clone(), true)?;
    Ok(len)
}

// §23.1.3.36 Array.prototype.toString()
fn array_proto_to_string(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let array = interp.to_object(call.this)?;
    let func = interp.get(array, &"join".into())?;
    if interp.is_callable(&func)? {
        return interp.call(&func, &JsValue::Object(array), &[]);
    }
    let to_string = interp.intrinsic(Intrinsic::ObjectPrototype)?;
    let to_string = interp.get(to_string, &"toString".into())?;
    interp.call(&to_string, &JsValue::Object(array), &[])
}
