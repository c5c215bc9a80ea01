//! Constructors and prototypes of the primitive wrapper types: %Boolean%
//! (§20.3), %Number% (§21.1), %String% (§22.1) and %BigInt% (§21.2).

use super::*;
use num_bigint::BigInt;

pub(super) fn init(interp: &mut Interpreter, realm: RealmId) -> JsResult<()> {
    init_boolean(interp, realm)?;
    init_number(interp, realm)?;
    init_string(interp, realm)?;
    init_bigint(interp, realm)
}

fn init_boolean(interp: &mut Interpreter, realm: RealmId) -> JsResult<()> {
    let object_proto = interp.realm_intrinsic(realm, Intrinsic::ObjectPrototype)?;
    let proto = interp.object_with_kind(Some(object_proto), ObjectKind::Boolean(false));
    let ctor = interp.create_builtin_constructor(boolean_constructor, 1, "Boolean", proto, None)?;
    interp.define_builtin_method(proto, "toString", boolean_to_string, 0)?;
    interp.define_builtin_method(proto, "valueOf", boolean_value_of, 0)?;
    interp.set_intrinsic(realm, Intrinsic::Boolean, ctor)?;
    interp.set_intrinsic(realm, Intrinsic::BooleanPrototype, proto)?;
    Ok(())
}

fn init_number(interp: &mut Interpreter, realm: RealmId) -> JsResult<()> {
    let object_proto = interp.realm_intrinsic(realm, Intrinsic::ObjectPrototype)?;
    let proto = interp.object_with_kind(Some(object_proto), ObjectKind::Number(0.0));
    let ctor = interp.create_builtin_constructor(number_constructor, 1, "Number", proto, None)?;
    let constants = [
        ("EPSILON", f64::EPSILON),
        ("MAX_SAFE_INTEGER", 9007199254740991.0),
        ("MAX_VALUE", f64::MAX),
        ("MIN_SAFE_INTEGER", -9007199254740991.0),
        ("MIN_VALUE", 5e-324),
        ("NaN", f64::NAN),
        ("NEGATIVE_INFINITY", f64::NEG_INFINITY),
        ("POSITIVE_INFINITY", f64::INFINITY),
    ];
    for (name, value) in constants {
        interp.define_builtin_constant(ctor, name, JsValue::Number(value))?;
    }
    interp.define_builtin_method(ctor, "isFinite", number_is_finite, 1)?;
    interp.define_builtin_method(ctor, "isInteger", number_is_integer, 1)?;
    interp.define_builtin_method(ctor, "isNaN", number_is_nan, 1)?;
    interp.define_builtin_method(proto, "toString", number_to_string, 1)?;
    interp.define_builtin_method(proto, "valueOf", number_value_of, 0)?;
    interp.set_intrinsic(realm, Intrinsic::Number, ctor)?;
    interp.set_intrinsic(realm, Intrinsic::NumberPrototype, proto)?;
    Ok(())
}

fn init_string(interp: &mut Interpreter, realm: RealmId) -> JsResult<()> {
    let object_proto = interp.realm_intrinsic(realm, Intrinsic::ObjectPrototype)?;
    let proto = interp.string_create(JsString::empty(), Some(object_proto))?;
    let ctor = interp.create_builtin_constructor(string_constructor, 1, "String", proto, None)?;
    interp.define_builtin_method(proto, "toString", string_value_of, 0)?;
    interp.define_builtin_method(proto, "valueOf", string_value_of, 0)?;
    let iterator_key = PropertyKey::Symbol(interp.well_known_symbol(WellKnownSymbol::Iterator));
    interp.define_builtin_method(proto, iterator_key, string_iterator, 0)?;
    interp.set_intrinsic(realm, Intrinsic::String, ctor)?;
    interp.set_intrinsic(realm, Intrinsic::StringPrototype, proto)?;
    Ok(())
}

fn init_bigint(interp: &mut Interpreter, realm: RealmId) -> JsResult<()> {
    let proto = interp.new_prototype_object(realm, None)?;
    let ctor = interp.create_builtin_constructor(bigint_constructor, 1, "BigInt", proto, None)?;
    interp.define_builtin_method(proto, "toString", bigint_to_string, 0)?;
    interp.define_builtin_method(proto, "valueOf", bigint_value_of, 0)?;
    interp.define_to_string_tag(proto, "BigInt")?;
    interp.set_intrinsic(realm, Intrinsic::BigInt, ctor)?;
    interp.set_intrinsic(realm, Intrinsic::BigIntPrototype, proto)?;
    Ok(())
}

/// Unwraps `value` when it is the primitive itself or a wrapper object
/// holding one; `unwrap` picks the payload out of the wrapper kind.
fn this_primitive<T>(
    interp: &mut Interpreter,
    value: &JsValue,
    direct: Option<T>,
    unwrap: fn(&ObjectKind) -> Option<T>,
    type_name: &str,
) -> JsResult<T> {
    if let Some(v) = direct {
        return Ok(v);
    }
    if let JsValue::Object(o) = value
        && let Some(v) = unwrap(&interp.heap.object(*o)?.kind)
    {
        return Ok(v);
    }
    Err(interp.type_error(format!("{type_name}.prototype method called on incompatible receiver")))
}

// ---- Boolean ----

// §20.3.1.1 Boolean(value)
fn boolean_constructor(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let b = to_boolean(&call.arg(0));
    let Some(new_target) = call.new_target else {
        return Ok(JsValue::Boolean(b));
    };
    let o = interp.ordinary_create_from_constructor(new_target, Intrinsic::BooleanPrototype, ObjectKind::Boolean(b))?;
    Ok(JsValue::Object(o))
}

// §20.3.3.3.1 ThisBooleanValue(value)
fn this_boolean_value(interp: &mut Interpreter, value: &JsValue) -> JsResult<bool> {
    let unwrap = |kind: &ObjectKind| match kind {
        ObjectKind::Boolean(b) => Some(*b),
        _ => None,
    };
    this_primitive(interp, value, value.as_boolean(), unwrap, "Boolean")
}

// §20.3.3.2 Boolean.prototype.toString()
fn boolean_to_string(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let b = this_boolean_value(interp, call.this)?;
    Ok(JsValue::string(if b { "true" } else { "false" }))
}

// §20.3.3.3 Boolean.prototype.valueOf()
fn boolean_value_of(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    Ok(JsValue::Boolean(this_boolean_value(interp, call.this)?))
}

// ---- Number ----

// §21.1.1.1 Number(value)
fn number_constructor(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let n = match call.args.first() {
        None => 0.0,
        Some(value) => match interp.to_numeric(value)? {
            Numeric::Number(n) => n,
            Numeric::BigInt(b) => bigint_to_f64(&b),
        },
    };
    let Some(new_target) = call.new_target else {
        return Ok(JsValue::Number(n));
    };
    let o = interp.ordinary_create_from_constructor(new_target, Intrinsic::NumberPrototype, ObjectKind::Number(n))?;
    Ok(JsValue::Object(o))
}

fn bigint_to_f64(b: &BigInt) -> f64 {
    use num_traits::ToPrimitive;
    b.to_f64().unwrap_or(f64::NAN)
}

// §21.1.2.2 Number.isFinite(number)
fn number_is_finite(_interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    Ok(JsValue::Boolean(call.arg(0).as_number().is_some_and(f64::is_finite)))
}

// §21.1.2.3 Number.isInteger(number)
fn number_is_integer(_interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let integral = call.arg(0).as_number().is_some_and(|n| n.is_finite() && n.trunc() == n);
    Ok(JsValue::Boolean(integral))
}

// §21.1.2.4 Number.isNaN(number)
fn number_is_nan(_interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    Ok(JsValue::Boolean(call.arg(0).as_number().is_some_and(f64::is_nan)))
}

// §21.1.3.7.1 ThisNumberValue(value)
fn this_number_value(interp: &mut Interpreter, value: &JsValue) -> JsResult<f64> {
    let unwrap = |kind: &ObjectKind| match kind {
        ObjectKind::Number(n) => Some(*n),
        _ => None,
    };
    this_primitive(interp, value, value.as_number(), unwrap, "Number")
}

// §21.1.3.6 Number.prototype.toString([radix])
fn number_to_string(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let x = this_number_value(interp, call.this)?;
    let radix = match call.arg(0) {
        JsValue::Undefined => 10.0,
        v => interp.to_integer_or_infinity(&v)?,
    };
    if !(2.0..=36.0).contains(&radix) {
        return Err(interp.range_error("toString() radix must be between 2 and 36"));
    }
    if radix == 10.0 {
        return Ok(JsValue::String(JsString::from_str(&number_ops::to_string(x))));
    }
    Ok(JsValue::String(JsString::from_str(&number_to_radix_string(x, radix as u32))))
}

/// Digits of `x` in `radix`. The fraction is expanded until it is exhausted
/// or the digits stop carrying information at double precision.
fn number_to_radix_string(x: f64, radix: u32) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let negative = x < 0.0;
    let x = x.abs();
    let int_part = x.trunc();
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if int_part < 9.0e15 {
        out.push_str(&format_radix(int_part as i64, radix));
    } else {
        let mut digits = Vec::new();
        let mut rest = int_part;
        while rest >= 1.0 {
            let d = (rest % f64::from(radix)) as u32;
            digits.push(char::from_digit(d, radix).unwrap_or('0'));
            rest = (rest / f64::from(radix)).trunc();
        }
        out.extend(digits.iter().rev());
    }
    let mut fraction = x - int_part;
    if fraction > 0.0 {
        out.push('.');
        let max_digits = (52.0 / f64::from(radix).log2()).ceil() as usize + 1;
        for _ in 0..max_digits {
            fraction *= f64::from(radix);
            let d = fraction.trunc() as u32;
            out.push(char::from_digit(d, radix).unwrap_or('0'));
            fraction -= f64::from(d);
            if fraction == 0.0 {
                break;
            }
        }
    }
    out
}

// §21.1.3.7 Number.prototype.valueOf()
fn number_value_of(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    Ok(JsValue::Number(this_number_value(interp, call.this)?))
}

// ---- String ----

// §22.1.1.1 String(value)
fn string_constructor(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let s = match call.args.first() {
        None => JsString::empty(),
        Some(JsValue::Symbol(sym)) if call.new_target.is_none() => JsString::from_str(&sym.descriptive_string()),
        Some(value) => interp.to_string(value)?,
    };
    let Some(new_target) = call.new_target else {
        return Ok(JsValue::String(s));
    };
    let proto = interp.get_prototype_from_constructor(new_target, Intrinsic::StringPrototype)?;
    Ok(JsValue::Object(interp.string_create(s, Some(proto))?))
}

// §22.1.3.35.1 ThisStringValue(value)
fn this_string_value(interp: &mut Interpreter, value: &JsValue) -> JsResult<JsString> {
    let unwrap = |kind: &ObjectKind| match kind {
        ObjectKind::String(s) => Some(s.clone()),
        _ => None,
    };
    this_primitive(interp, value, value.as_string().cloned(), unwrap, "String")
}

// §22.1.3.29 String.prototype.toString(), §22.1.3.35 String.prototype.valueOf()
fn string_value_of(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    Ok(JsValue::String(this_string_value(interp, call.this)?))
}

// §22.1.3.36 String.prototype[@@iterator]()
fn string_iterator(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    interp.require_object_coercible(call.this)?;
    let s = interp.to_string(call.this)?;
    Ok(JsValue::Object(interp.create_string_iterator(s)?))
}

// ---- BigInt ----

// §21.2.1.1 BigInt(value)
fn bigint_constructor(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    if call.new_target.is_some() {
        return Err(interp.type_error("BigInt is not a constructor"));
    }
    let prim = interp.to_primitive(&call.arg(0), PreferredType::Number)?;
    let value = match prim {
        JsValue::Number(n) => interp.number_to_bigint(n)?,
        other => interp.to_bigint(&other)?,
    };
    Ok(JsValue::BigInt(JsBigInt::new(value)))
}

// §21.2.3.4.1 ThisBigIntValue(value)
fn this_bigint_value(interp: &mut Interpreter, value: &JsValue) -> JsResult<JsBigInt> {
    let direct = match value {
        JsValue::BigInt(b) => Some(b.clone()),
        _ => None,
    };
    let unwrap = |kind: &ObjectKind| match kind {
        ObjectKind::BigInt(b) => Some(b.clone()),
        _ => None,
    };
    this_primitive(interp, value, direct, unwrap, "BigInt")
}

// §21.2.3.3 BigInt.prototype.toString([radix])
fn bigint_to_string(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    let x = this_bigint_value(interp, call.this)?;
    let radix = match call.arg(0) {
        JsValue::Undefined => 10.0,
        v => interp.to_integer_or_infinity(&v)?,
    };
    if !(2.0..=36.0).contains(&radix) {
        return Err(interp.range_error("toString() radix must be between 2 and 36"));
    }
    Ok(JsValue::String(JsString::from_str(&x.value.to_str_radix(radix as u32))))
}

// §21.2.3.4 BigInt.prototype.valueOf()
fn bigint_value_of(interp: &mut Interpreter, call: &NativeCall<'_>) -> JsResult<JsValue> {
    Ok(JsValue::BigInt(this_bigint_value(interp, call.this)?))
}
