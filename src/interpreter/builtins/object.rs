//! %Object% and %Object.prototype% (§20.1).

use super::*;

pub(super) fn init(interp: &mut Interpreter, realm: RealmId) -> JsResult<()> {
    let proto = interp.realm_intrinsic(realm, Intrinsic::ObjectPrototype)?;
    let ctor = interp.create_builtin_constructor(object_constructor, 1, "Object", proto, None)?;
    interp.set_intrinsic(realm, Intrinsic::Object, ctor)?;

    let statics: [(&str, NativeFn, u32); 16] = [
        ("create", object_create, 2),
        ("defineProperties", object_define_properties, 2),
        ("defineProperty", object_define_property, 3),
        ("freeze", object_freeze, 1),
        ("getOwnPropertyDescriptor", object_get_own_property_descriptor, 2),
        ("getOwnPropertyNames", object_get_own_property_names, 1),
        ("getOwnPropertySymbols", object_get_own_property_symbols, 1),
        ("getPrototypeOf", object_get_prototype_of, 1),
        ("is", object_is, 2),
        ("isExtensible", object_is_extensible, 1),
        ("isFrozen", object_is_frozen, 1),
        ("isSealed", object_is_sealed, 1),
        ("keys", object_keys, 1),
        ("preventExtensions", object_prevent_extensions, 1),
        ("seal", object_seal, 1),
        ("setPrototypeOf", object_set_prototype_of, 2),
    ];
    for (name, behavior, length) in statics {
        interp.define_builtin_method(ctor, name, behavior, length)?;
    }

    let methods: [(&str, NativeFn, u32); 5] = [
        ("hasOwnProperty", object_proto_has_own_property, 1),
        ("isPrototypeOf", object_proto_is_prototype_of, 1),
        ("propertyIsEnumerable", object_proto_property_is_enumerable, 1),
        ("toString", object_proto_to_string, 0),
        ("valueOf", object_proto_value_of, 0),
    ];
    for (name, behavior, length) in methods {
        interp.define_builtin_method(proto, name, behavior, length)?;
    }
    Ok(())
}

// §20.1.1.1 Object([value])
fn object_constructor(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    if let Some(new_target) = call.new_target
        && new_target != call.callee
    {
        let o = interp.ordinary_create_from_constructor(new_target, Intrinsic::ObjectPrototype, ObjectKind::Ordinary)?;
        return Ok(JsValue::Object(o));
    }
    let value = call.arg(0);
    if value.is_nullish() {
        return Ok(JsValue::Object(interp.new_plain_object()?));
    }
    Ok(JsValue::Object(interp.to_object(&value)?))
}

fn require_object(interp: &mut Interpreter, value: &JsValue, method: &str) -> JsResult<ObjectId> {
    match value {
        JsValue::Object(o) => Ok(*o),
        _ => Err(interp.type_error(format!("Object.{method} called on non-object"))),
    }
}

// §20.1.2.2 Object.create(O, Properties)
fn object_create(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let proto = match call.arg(0) {
        JsValue::Object(p) => Some(p),
        JsValue::Null => None,
        other => return Err(interp.type_error(format!("Object prototype may only be an Object or null: {other}"))),
    };
    let o = interp.ordinary_object_create(proto);
    let properties = call.arg(1);
    if !properties.is_undefined() {
        interp.object_define_properties(o, &properties)?;
    }
    Ok(JsValue::Object(o))
}

// §20.1.2.3 Object.defineProperties(O, Properties)
fn object_define_properties(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let o = require_object(interp, &call.arg(0), "defineProperties")?;
    interp.object_define_properties(o, &call.arg(1))?;
    Ok(JsValue::Object(o))
}

// §20.1.2.4 Object.defineProperty(O, P, Attributes)
fn object_define_property(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let o = require_object(interp, &call.arg(0), "defineProperty")?;
    let key = interp.to_property_key(&call.arg(1))?;
    let desc = interp.to_property_descriptor(&call.arg(2))?;
    interp.define_property_or_throw(o, key, desc)?;
    Ok(JsValue::Object(o))
}

fn set_level(interp: &mut Interpreter, call: &NativeCall<'_>, level: IntegrityLevel) -> JsResult<JsValue> {
    let value = call.arg(0);
    let JsValue::Object(o) = value else {
        return Ok(value);
    };
    if !interp.set_integrity_level(o, level)? {
        return Err(interp.type_error("Cannot change the integrity level of this object"));
    }
    Ok(value)
}

fn test_level(interp: &mut Interpreter, call: &NativeCall<'_>, level: IntegrityLevel) -> JsResult<JsValue> {
    match call.arg(0) {
        JsValue::Object(o) => Ok(JsValue::Boolean(interp.test_integrity_level(o, level)?)),
        _ => Ok(JsValue::Boolean(true)),
    }
}

// §20.1.2.6 Object.freeze(O)
fn object_freeze(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    set_level(interp, call, IntegrityLevel::Frozen)
}

// §20.1.2.22 Object.seal(O)
fn object_seal(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    set_level(interp, call, IntegrityLevel::Sealed)
}

// §20.1.2.15 Object.isFrozen(O)
fn object_is_frozen(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    test_level(interp, call, IntegrityLevel::Frozen)
}

// §20.1.2.16 Object.isSealed(O)
fn object_is_sealed(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    test_level(interp, call, IntegrityLevel::Sealed)
}

// §20.1.2.8 Object.getOwnPropertyDescriptor(O, P)
fn object_get_own_property_descriptor(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let o = interp.to_object(&call.arg(0))?;
    let key = interp.to_property_key(&call.arg(1))?;
    let desc = interp.get_own_property(o, &key)?.map(|p| PropertyDescriptor::from(&p));
    interp.from_property_descriptor(desc.as_ref())
}

// §20.1.2.11.1 GetOwnPropertyKeys(O, type)
fn own_keys_of_type(interp: &mut Interpreter, value: &JsValue, symbols: bool) -> JsResult<JsValue> {
    let o = interp.to_object(value)?;
    let keys = interp
        .own_property_keys(o)?
        .into_iter()
        .filter(|k| k.is_symbol() == symbols)
        .map(|k| k.to_value())
        .collect();
    Ok(JsValue::Object(interp.create_array_from_list(keys)?))
}

// §20.1.2.10 Object.getOwnPropertyNames(O)
fn object_get_own_property_names(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    own_keys_of_type(interp, &call.arg(0), false)
}

// §20.1.2.11 Object.getOwnPropertySymbols(O)
fn object_get_own_property_symbols(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    own_keys_of_type(interp, &call.arg(0), true)
}

// §20.1.2.12 Object.getPrototypeOf(O)
fn object_get_prototype_of(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let o = interp.to_object(&call.arg(0))?;
    Ok(interp.get_prototype_of(o)?.into())
}

// §20.1.2.13 Object.is(value1, value2)
fn object_is(_interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    Ok(JsValue::Boolean(same_value(&call.arg(0), &call.arg(1))))
}

// §20.1.2.14 Object.isExtensible(O)
fn object_is_extensible(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    match call.arg(0) {
        JsValue::Object(o) => Ok(JsValue::Boolean(interp.is_extensible(o)?)),
        _ => Ok(JsValue::Boolean(false)),
    }
}

// §20.1.2.18 Object.keys(O)
fn object_keys(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let o = interp.to_object(&call.arg(0))?;
    let keys = interp.enumerable_own_properties(o, EnumerableKind::Key)?;
    Ok(JsValue::Object(interp.create_array_from_list(keys)?))
}

// §20.1.2.20 Object.preventExtensions(O)
fn object_prevent_extensions(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let value = call.arg(0);
    let JsValue::Object(o) = value else {
        return Ok(value);
    };
    if !interp.prevent_extensions(o)? {
        return Err(interp.type_error("Cannot prevent extensions"));
    }
    Ok(value)
}

// §20.1.2.23 Object.setPrototypeOf(O, proto)
fn object_set_prototype_of(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let value = call.arg(0);
    interp.require_object_coercible(&value)?;
    let proto = match call.arg(1) {
        JsValue::Object(p) => Some(p),
        JsValue::Null => None,
        other => return Err(interp.type_error(format!("Object prototype may only be an Object or null: {other}"))),
    };
    let JsValue::Object(o) = value else {
        return Ok(value);
    };
    if !interp.set_prototype_of(o, proto)? {
        return Err(interp.type_error("Cannot set the prototype of this object"));
    }
    Ok(value)
}

// §20.1.3.2 Object.prototype.hasOwnProperty(V)
fn object_proto_has_own_property(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let key = interp.to_property_key(&call.arg(0))?;
    let o = interp.to_object(call.this)?;
    Ok(JsValue::Boolean(interp.has_own_property(o, &key)?))
}

// §20.1.3.3 Object.prototype.isPrototypeOf(V)
fn object_proto_is_prototype_of(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let JsValue::Object(mut v) = call.arg(0) else {
        return Ok(JsValue::Boolean(false));
    };
    let o = interp.to_object(call.this)?;
    while let Some(proto) = interp.get_prototype_of(v)? {
        if proto == o {
            return Ok(JsValue::Boolean(true));
        }
        v = proto;
    }
    Ok(JsValue::Boolean(false))
}

// §20.1.3.4 Object.prototype.propertyIsEnumerable(V)
fn object_proto_property_is_enumerable(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let key = interp.to_property_key(&call.arg(0))?;
    let o = interp.to_object(call.this)?;
    let enumerable = interp.get_own_property(o, &key)?.is_some_and(|p| p.enumerable);
    Ok(JsValue::Boolean(enumerable))
}

// §20.1.3.6 Object.prototype.toString()
fn object_proto_to_string(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let tag = match call.this {
        JsValue::Undefined => "Undefined".to_string(),
        JsValue::Null => "Null".to_string(),
        this => {
            let o = interp.to_object(this)?;
            let builtin_tag = interp.builtin_tag(o)?;
            let key = PropertyKey::Symbol(interp.well_known_symbol(WellKnownSymbol::ToStringTag));
            match interp.get(o, &key)? {
                JsValue::String(s) => s.to_rust_string(),
                _ => builtin_tag.to_string(),
            }
        }
    };
    Ok(JsValue::String(JsString::from_str(&format!("[object {tag}]"))))
}

// §20.1.3.7 Object.prototype.valueOf()
fn object_proto_value_of(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    Ok(JsValue::Object(interp.to_object(call.this)?))
}

impl Interpreter {
    // §20.1.2.3.1 ObjectDefineProperties(O, Properties)
    //
    // All descriptors are read before any is applied.
    pub(crate) fn object_define_properties(&mut self, o: ObjectId, properties: &JsValue) -> JsResult<()> {
        let props = self.to_object(properties)?;
        let mut descriptors = Vec::new();
        for key in self.own_property_keys(props)? {
            if let Some(prop) = self.get_own_property(props, &key)?
                && prop.enumerable
            {
                let desc_obj = self.get(props, &key)?;
                let desc = self.to_property_descriptor(&desc_obj)?;
                descriptors.push((key, desc));
            }
        }
        for (key, desc) in descriptors {
            self.define_property_or_throw(o, key, desc)?;
        }
        Ok(())
    }
}
