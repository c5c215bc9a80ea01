//! The %Reflect% namespace object (§28.1). Each function forwards to the
//! corresponding internal method of its target.

use super::*;

pub(super) fn init(interp: &mut Interpreter, realm: RealmId) -> JsResult<()> {
    let reflect = interp.new_prototype_object(realm, None)?;
    let methods: [(&str, NativeFn, u32); 13] = [
        ("apply", reflect_apply, 3),
        ("construct", reflect_construct, 2),
        ("defineProperty", reflect_define_property, 3),
        ("deleteProperty", reflect_delete_property, 2),
        ("get", reflect_get, 2),
        ("getOwnPropertyDescriptor", reflect_get_own_property_descriptor, 2),
        ("getPrototypeOf", reflect_get_prototype_of, 1),
        ("has", reflect_has, 2),
        ("isExtensible", reflect_is_extensible, 1),
        ("ownKeys", reflect_own_keys, 1),
        ("preventExtensions", reflect_prevent_extensions, 1),
        ("set", reflect_set, 3),
        ("setPrototypeOf", reflect_set_prototype_of, 2),
    ];
    for (name, behavior, length) in methods {
        interp.define_builtin_method(reflect, name, behavior, length)?;
    }
    interp.define_to_string_tag(reflect, "Reflect")?;
    interp.set_intrinsic(realm, Intrinsic::Reflect, reflect)?;
    Ok(())
}

fn target_object(interp: &mut Interpreter, value: &JsValue, method: &str) -> JsResult<ObjectId> {
    match value {
        JsValue::Object(o) => Ok(*o),
        _ => Err(interp.type_error(format!("Reflect.{method} called on non-object"))),
    }
}

// §28.1.1 Reflect.apply(target, thisArgument, argumentsList)
fn reflect_apply(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let target = call.arg(0);
    if !interp.is_callable(&target)? {
        return Err(interp.type_error("Reflect.apply target is not callable"));
    }
    let args = interp.create_list_from_array_like(&call.arg(2))?;
    interp.call(&target, &call.arg(1), &args)
}

// §28.1.2 Reflect.construct(target, argumentsList [, newTarget])
fn reflect_construct(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let target = call.arg(0);
    let JsValue::Object(target_id) = target else {
        return Err(interp.type_error("Reflect.construct target is not a constructor"));
    };
    if !interp.is_constructor(&target)? {
        return Err(interp.type_error("Reflect.construct target is not a constructor"));
    }
    let new_target = match call.args.get(2) {
        None => target_id,
        Some(nt) => match nt {
            JsValue::Object(o) if interp.is_constructor(nt)? => *o,
            _ => return Err(interp.type_error("Reflect.construct newTarget is not a constructor")),
        },
    };
    let args = interp.create_list_from_array_like(&call.arg(1))?;
    Ok(JsValue::Object(interp.construct(target_id, &args, Some(new_target))?))
}

// §28.1.3 Reflect.defineProperty(target, propertyKey, attributes)
fn reflect_define_property(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let o = target_object(interp, &call.arg(0), "defineProperty")?;
    let key = interp.to_property_key(&call.arg(1))?;
    let desc = interp.to_property_descriptor(&call.arg(2))?;
    Ok(JsValue::Boolean(interp.define_own_property(o, key, desc)?))
}

// §28.1.4 Reflect.deleteProperty(target, propertyKey)
fn reflect_delete_property(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let o = target_object(interp, &call.arg(0), "deleteProperty")?;
    let key = interp.to_property_key(&call.arg(1))?;
    Ok(JsValue::Boolean(interp.delete(o, &key)?))
}

// §28.1.5 Reflect.get(target, propertyKey [, receiver])
fn reflect_get(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let o = target_object(interp, &call.arg(0), "get")?;
    let key = interp.to_property_key(&call.arg(1))?;
    let receiver = call.args.get(2).cloned().unwrap_or(JsValue::Object(o));
    interp.internal_get(o, &key, &receiver)
}

// §28.1.6 Reflect.getOwnPropertyDescriptor(target, propertyKey)
fn reflect_get_own_property_descriptor(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let o = target_object(interp, &call.arg(0), "getOwnPropertyDescriptor")?;
    let key = interp.to_property_key(&call.arg(1))?;
    let desc = interp.get_own_property(o, &key)?.map(|p| PropertyDescriptor::from(&p));
    interp.from_property_descriptor(desc.as_ref())
}

// §28.1.7 Reflect.getPrototypeOf(target)
fn reflect_get_prototype_of(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let o = target_object(interp, &call.arg(0), "getPrototypeOf")?;
    Ok(interp.get_prototype_of(o)?.into())
}

// §28.1.8 Reflect.has(target, propertyKey)
fn reflect_has(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let o = target_object(interp, &call.arg(0), "has")?;
    let key = interp.to_property_key(&call.arg(1))?;
    Ok(JsValue::Boolean(interp.has_property(o, &key)?))
}

// §28.1.9 Reflect.isExtensible(target)
fn reflect_is_extensible(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let o = target_object(interp, &call.arg(0), "isExtensible")?;
    Ok(JsValue::Boolean(interp.is_extensible(o)?))
}

// §28.1.10 Reflect.ownKeys(target)
fn reflect_own_keys(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let o = target_object(interp, &call.arg(0), "ownKeys")?;
    let keys = interp.own_property_keys(o)?.into_iter().map(|k| k.to_value()).collect();
    Ok(JsValue::Object(interp.create_array_from_list(keys)?))
}

// §28.1.11 Reflect.preventExtensions(target)
fn reflect_prevent_extensions(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let o = target_object(interp, &call.arg(0), "preventExtensions")?;
    Ok(JsValue::Boolean(interp.prevent_extensions(o)?))
}

// §28.1.12 Reflect.set(target, propertyKey, V [, receiver])
fn reflect_set(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let o = target_object(interp, &call.arg(0), "set")?;
    let key = interp.to_property_key(&call.arg(1))?;
    let receiver = call.args.get(3).cloned().unwrap_or(JsValue::Object(o));
    Ok(JsValue::Boolean(interp.internal_set(o, key, call.arg(2), &receiver)?))
}

// §28.1.13 Reflect.setPrototypeOf(target, proto)
fn reflect_set_prototype_of(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let o = target_object(interp, &call.arg(0), "setPrototypeOf")?;
    let proto = match call.arg(1) {
        JsValue::Object(p) => Some(p),
        JsValue::Null => None,
        _ => return Err(interp.type_error("Object prototype may only be an Object or null")),
    };
    Ok(JsValue::Boolean(interp.set_prototype_of(o, proto)?))
}
