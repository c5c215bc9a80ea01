//! %Symbol% and %Symbol.prototype% (§20.4).

use super::*;

pub(super) fn init(interp: &mut Interpreter, realm: RealmId) -> JsResult<()> {
    let proto = interp.new_prototype_object(realm, None)?;
    let ctor = interp.create_builtin_constructor(symbol_constructor, 0, "Symbol", proto, None)?;
    interp.set_intrinsic(realm, Intrinsic::Symbol, ctor)?;
    interp.set_intrinsic(realm, Intrinsic::SymbolPrototype, proto)?;

    for which in WellKnownSymbol::ALL {
        let sym = interp.well_known_symbol(which);
        interp.define_builtin_constant(ctor, which.name(), JsValue::Symbol(sym))?;
    }
    interp.define_builtin_method(ctor, "for", symbol_for, 1)?;
    interp.define_builtin_method(ctor, "keyFor", symbol_key_for, 1)?;

    interp.define_builtin_method(proto, "toString", symbol_to_string, 0)?;
    interp.define_builtin_method(proto, "valueOf", symbol_value_of, 0)?;
    interp.define_builtin_getter(proto, "description", symbol_description)?;

    let to_primitive = PropertyKey::Symbol(interp.well_known_symbol(WellKnownSymbol::ToPrimitive));
    let f = interp.create_builtin_function(symbol_value_of, 1, to_primitive.clone(), None, None)?;
    interp.define_property_or_throw(proto, to_primitive, PropertyDescriptor::data(JsValue::Object(f), false, false, true))?;
    interp.define_to_string_tag(proto, "Symbol")
}

// §20.4.1.1 Symbol([description])
fn symbol_constructor(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    if call.new_target.is_some() {
        return Err(interp.type_error("Symbol is not a constructor"));
    }
    let description = match call.arg(0) {
        JsValue::Undefined => None,
        v => Some(interp.to_string(&v)?),
    };
    Ok(JsValue::Symbol(interp.new_symbol(description)))
}

// §20.4.2.2 Symbol.for(key)
fn symbol_for(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let key = interp.to_string(&call.arg(0))?;
    Ok(JsValue::Symbol(interp.registered_symbol(key)))
}

// §20.4.2.6 Symbol.keyFor(sym)
fn symbol_key_for(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let JsValue::Symbol(sym) = call.arg(0) else {
        return Err(interp.type_error("Symbol.keyFor requires a symbol"));
    };
    Ok(interp
        .registered_symbol_key(&sym)
        .map_or(JsValue::Undefined, JsValue::String))
}

// §20.4.3.4.1 ThisSymbolValue(value)
fn this_symbol_value(interp: &mut Interpreter, value: &JsValue) -> JsResult<JsSymbol> {
    match value {
        JsValue::Symbol(s) => return Ok(s.clone()),
        JsValue::Object(o) => {
            if let ObjectKind::Symbol(s) = &interp.heap.object(*o)?.kind {
                return Ok(s.clone());
            }
        }
        _ => {}
    }
    Err(interp.type_error("Symbol.prototype method called on incompatible receiver"))
}

// §20.4.3.3 Symbol.prototype.toString()
fn symbol_to_string(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let sym = this_symbol_value(interp, call.this)?;
    Ok(JsValue::String(JsString::from_str(&sym.descriptive_string())))
}

// §20.4.3.4 Symbol.prototype.valueOf(), also §20.4.3.5 @@toPrimitive
fn symbol_value_of(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    Ok(JsValue::Symbol(this_symbol_value(interp, call.this)?))
}

// §20.4.3.2 get Symbol.prototype.description
fn symbol_description(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let sym = this_symbol_value(interp, call.this)?;
    Ok(sym.description().cloned().map_or(JsValue::Undefined, JsValue::String))
}
