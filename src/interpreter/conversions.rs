use super::*;
use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive, Zero};
use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PreferredType {
    Default,
    String,
    Number,
}

/// Result of ToNumeric.
#[derive(Clone, Debug)]
pub(crate) enum Numeric {
    Number(f64),
    BigInt(BigInt),
}

pub(crate) fn to_integer_or_infinity(n: f64) -> f64 {
    if n.is_nan() || n == 0.0 {
        0.0
    } else if n.is_infinite() {
        n
    } else {
        n.trunc()
    }
}

pub(crate) fn format_radix(mut n: i64, radix: u32) -> String {
    if !(2..=36).contains(&radix) {
        return n.to_string();
    }
    if n == 0 {
        return "0".to_string();
    }
    let negative = n < 0;
    if negative {
        n = -n;
    }
    let mut digits = Vec::new();
    while n > 0 {
        let d = (n % radix as i64) as u32;
        digits.push(char::from_digit(d, radix).unwrap_or('?'));
        n /= radix as i64;
    }
    if negative {
        digits.push('-');
    }
    digits.iter().rev().collect()
}

// §7.1.2 ToBoolean
pub(crate) fn to_boolean(val: &JsValue) -> bool {
    match val {
        JsValue::Undefined | JsValue::Null => false,
        JsValue::Boolean(b) => *b,
        JsValue::Number(n) => *n != 0.0 && !n.is_nan(),
        JsValue::String(s) => !s.is_empty(),
        JsValue::BigInt(b) => !b.value.is_zero(),
        JsValue::Symbol(_) | JsValue::Object(_) => true,
    }
}

// WhiteSpace and LineTerminator code points (§12.2, §12.3)
pub(crate) fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        '\u{0009}'
            | '\u{000B}'
            | '\u{000C}'
            | '\u{0020}'
            | '\u{00A0}'
            | '\u{FEFF}'
            | '\u{000A}'
            | '\u{000D}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
    )
}

fn parse_radix_digits(digits: &str, radix: u32) -> Option<BigInt> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    BigInt::parse_bytes(digits.as_bytes(), radix)
}

fn is_decimal_literal(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        digits += i - frac_start;
    }
    if digits == 0 {
        return false;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }
    i == bytes.len()
}

// §7.1.4.1.1 StringToNumber
pub(crate) fn string_to_number(s: &JsString) -> f64 {
    let rust_str = s.to_rust_string();
    let trimmed = rust_str.trim_matches(is_js_whitespace);
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    let radix = match trimmed.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return parse_radix_digits(&trimmed[2..], radix)
            .and_then(|b| b.to_f64())
            .unwrap_or(f64::NAN);
    }
    if !is_decimal_literal(trimmed) {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

// §7.1.14 StringToBigInt
pub(crate) fn string_to_bigint(s: &JsString) -> Option<BigInt> {
    let rust_str = s.to_rust_string();
    let trimmed = rust_str.trim_matches(is_js_whitespace);
    if trimmed.is_empty() {
        return Some(BigInt::zero());
    }
    let radix = match trimmed.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return parse_radix_digits(&trimmed[2..], radix);
    }
    let (negative, digits) = match trimmed.as_bytes()[0] {
        b'-' => (true, &trimmed[1..]),
        b'+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let value = parse_radix_digits(digits, 10)?;
    Some(if negative { -value } else { value })
}

/// Parses the digits of a BigInt literal (`123`, `0x1f`, ...).
pub(crate) fn parse_bigint_literal(digits: &str) -> Option<BigInt> {
    let digits = digits.strip_suffix('n').unwrap_or(digits).replace('_', "");
    let radix = match digits.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    match radix {
        Some(r) => parse_radix_digits(&digits[2..], r),
        None => parse_radix_digits(&digits, 10),
    }
}

/// Orders a BigInt against a Number; `None` when the Number is NaN.
pub(crate) fn compare_bigint_number(b: &BigInt, n: f64) -> Option<Ordering> {
    if n.is_nan() {
        return None;
    }
    if n == f64::INFINITY {
        return Some(Ordering::Less);
    }
    if n == f64::NEG_INFINITY {
        return Some(Ordering::Greater);
    }
    let floor = n.floor();
    let floor_big = BigInt::from_f64(floor)?;
    Some(match b.cmp(&floor_big) {
        Ordering::Equal if floor != n => Ordering::Less,
        other => other,
    })
}

// §7.1.21 CanonicalNumericIndexString
pub(crate) fn canonical_numeric_index_string(s: &JsString) -> Option<f64> {
    if s == "-0" {
        return Some(-0.0);
    }
    let n = string_to_number(s);
    if number_ops::to_string(n) == s.to_rust_string() {
        Some(n)
    } else {
        None
    }
}

// §7.2.10 SameValue
pub(crate) fn same_value(left: &JsValue, right: &JsValue) -> bool {
    match (left, right) {
        (JsValue::Number(a), JsValue::Number(b)) => number_ops::same_value(*a, *b),
        _ => same_value_non_number(left, right),
    }
}

// §7.2.11 SameValueZero
pub(crate) fn same_value_zero(left: &JsValue, right: &JsValue) -> bool {
    match (left, right) {
        (JsValue::Number(a), JsValue::Number(b)) => number_ops::same_value_zero(*a, *b),
        _ => same_value_non_number(left, right),
    }
}

// §7.2.12 SameValueNonNumber
fn same_value_non_number(left: &JsValue, right: &JsValue) -> bool {
    match (left, right) {
        (JsValue::Undefined, JsValue::Undefined) => true,
        (JsValue::Null, JsValue::Null) => true,
        (JsValue::Boolean(a), JsValue::Boolean(b)) => a == b,
        (JsValue::String(a), JsValue::String(b)) => a == b,
        (JsValue::Symbol(a), JsValue::Symbol(b)) => a == b,
        (JsValue::BigInt(a), JsValue::BigInt(b)) => a.value == b.value,
        (JsValue::Object(a), JsValue::Object(b)) => a == b,
        _ => false,
    }
}

// §7.2.15 IsStrictlyEqual
pub(crate) fn is_strictly_equal(left: &JsValue, right: &JsValue) -> bool {
    match (left, right) {
        (JsValue::Number(a), JsValue::Number(b)) => number_ops::equal(*a, *b),
        _ => same_value_non_number(left, right),
    }
}

fn same_type(a: &JsValue, b: &JsValue) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

impl Interpreter {
    // §7.1.1 ToPrimitive
    pub(crate) fn to_primitive(&mut self, input: &JsValue, preferred: PreferredType) -> JsResult<JsValue> {
        let JsValue::Object(obj) = input else {
            return Ok(input.clone());
        };
        let obj = *obj;
        let key = PropertyKey::Symbol(self.well_known_symbol(WellKnownSymbol::ToPrimitive));
        if let Some(exotic) = self.get_method(input, &key)? {
            let hint = match preferred {
                PreferredType::Default => "default",
                PreferredType::String => "string",
                PreferredType::Number => "number",
            };
            let result = self.call(&exotic, input, &[JsValue::string(hint)])?;
            if result.is_object() {
                return Err(self.type_error("Cannot convert object to primitive value"));
            }
            return Ok(result);
        }
        let hint = if preferred == PreferredType::String {
            PreferredType::String
        } else {
            PreferredType::Number
        };
        self.ordinary_to_primitive(obj, hint)
    }

    // §7.1.1.1 OrdinaryToPrimitive
    pub(crate) fn ordinary_to_primitive(&mut self, obj: ObjectId, hint: PreferredType) -> JsResult<JsValue> {
        let names = if hint == PreferredType::String {
            ["toString", "valueOf"]
        } else {
            ["valueOf", "toString"]
        };
        for name in names {
            let method = self.get(obj, &name.into())?;
            if self.is_callable(&method)? {
                let result = self.call(&method, &JsValue::Object(obj), &[])?;
                if !result.is_object() {
                    return Ok(result);
                }
            }
        }
        Err(self.type_error("Cannot convert object to primitive value"))
    }

    // §7.1.3 ToNumeric
    pub(crate) fn to_numeric(&mut self, value: &JsValue) -> JsResult<Numeric> {
        let prim = self.to_primitive(value, PreferredType::Number)?;
        if let JsValue::BigInt(b) = prim {
            return Ok(Numeric::BigInt(b.value));
        }
        Ok(Numeric::Number(self.to_number(&prim)?))
    }

    // §7.1.4 ToNumber
    pub fn to_number(&mut self, value: &JsValue) -> JsResult<f64> {
        match value {
            JsValue::Undefined => Ok(f64::NAN),
            JsValue::Null => Ok(0.0),
            JsValue::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            JsValue::Number(n) => Ok(*n),
            JsValue::String(s) => Ok(string_to_number(s)),
            JsValue::Symbol(_) => Err(self.type_error("Cannot convert a Symbol value to a number")),
            JsValue::BigInt(_) => Err(self.type_error("Cannot convert a BigInt value to a number")),
            JsValue::Object(_) => {
                let prim = self.to_primitive(value, PreferredType::Number)?;
                self.to_number(&prim)
            }
        }
    }

    // §7.1.5 ToIntegerOrInfinity
    pub(crate) fn to_integer_or_infinity(&mut self, value: &JsValue) -> JsResult<f64> {
        let n = self.to_number(value)?;
        Ok(to_integer_or_infinity(n))
    }

    // §7.1.6 ToInt32
    pub(crate) fn to_int32(&mut self, value: &JsValue) -> JsResult<i32> {
        let n = self.to_number(value)?;
        Ok(number_ops::to_int32(n))
    }

    // §7.1.7 ToUint32
    pub(crate) fn to_uint32(&mut self, value: &JsValue) -> JsResult<u32> {
        let n = self.to_number(value)?;
        Ok(number_ops::to_uint32(n))
    }

    // §7.1.13 ToBigInt
    pub(crate) fn to_bigint(&mut self, value: &JsValue) -> JsResult<BigInt> {
        let prim = self.to_primitive(value, PreferredType::Number)?;
        match prim {
            JsValue::Undefined | JsValue::Null => {
                Err(self.type_error(format!("Cannot convert {prim} to a BigInt")))
            }
            JsValue::Boolean(b) => Ok(BigInt::from(u8::from(b))),
            JsValue::BigInt(b) => Ok(b.value),
            JsValue::Number(n) => Err(self.type_error(format!(
                "Cannot convert {} to a BigInt",
                number_ops::to_string(n)
            ))),
            JsValue::String(s) => match string_to_bigint(&s) {
                Some(b) => Ok(b),
                None => Err(self.syntax_error(format!("Cannot convert {s} to a BigInt"))),
            },
            JsValue::Symbol(_) => Err(self.type_error("Cannot convert a Symbol value to a BigInt")),
            JsValue::Object(_) => Err(self.type_error("Cannot convert object to a BigInt")),
        }
    }

    // §21.2.1.1.1 NumberToBigInt
    pub(crate) fn number_to_bigint(&mut self, n: f64) -> JsResult<BigInt> {
        if !n.is_finite() || n.trunc() != n {
            return Err(self.range_error(format!(
                "The number {} cannot be converted to a BigInt because it is not an integer",
                number_ops::to_string(n)
            )));
        }
        BigInt::from_f64(n).ok_or_else(|| self.range_error("Cannot convert number to a BigInt"))
    }

    // §7.1.17 ToString
    pub fn to_string(&mut self, value: &JsValue) -> JsResult<JsString> {
        match value {
            JsValue::Undefined => Ok(JsString::from_str("undefined")),
            JsValue::Null => Ok(JsString::from_str("null")),
            JsValue::Boolean(b) => Ok(JsString::from_str(if *b { "true" } else { "false" })),
            JsValue::Number(n) => Ok(JsString::from_str(&number_ops::to_string(*n))),
            JsValue::String(s) => Ok(s.clone()),
            JsValue::Symbol(_) => Err(self.type_error("Cannot convert a Symbol value to a string")),
            JsValue::BigInt(b) => Ok(JsString::from_str(&bigint_ops::to_string(&b.value))),
            JsValue::Object(_) => {
                let prim = self.to_primitive(value, PreferredType::String)?;
                self.to_string(&prim)
            }
        }
    }

    // §7.1.18 ToObject
    pub fn to_object(&mut self, value: &JsValue) -> JsResult<ObjectId> {
        let (proto, kind) = match value {
            JsValue::Object(o) => return Ok(*o),
            JsValue::Undefined | JsValue::Null => {
                return Err(self.type_error(format!("Cannot convert {value} to object")));
            }
            JsValue::Boolean(b) => (Intrinsic::BooleanPrototype, ObjectKind::Boolean(*b)),
            JsValue::Number(n) => (Intrinsic::NumberPrototype, ObjectKind::Number(*n)),
            JsValue::String(s) => return self.string_create(s.clone(), None),
            JsValue::Symbol(s) => (Intrinsic::SymbolPrototype, ObjectKind::Symbol(s.clone())),
            JsValue::BigInt(b) => (Intrinsic::BigIntPrototype, ObjectKind::BigInt(b.clone())),
        };
        let proto = self.intrinsic(proto)?;
        Ok(self.object_with_kind(Some(proto), kind))
    }

    // §7.1.19 ToPropertyKey
    pub fn to_property_key(&mut self, value: &JsValue) -> JsResult<PropertyKey> {
        let key = self.to_primitive(value, PreferredType::String)?;
        if let JsValue::Symbol(s) = key {
            return Ok(PropertyKey::Symbol(s));
        }
        Ok(PropertyKey::String(self.to_string(&key)?))
    }

    // §7.1.20 ToLength
    pub(crate) fn to_length(&mut self, value: &JsValue) -> JsResult<u64> {
        let len = self.to_integer_or_infinity(value)?;
        if len <= 0.0 {
            return Ok(0);
        }
        Ok(len.min(9007199254740991.0) as u64)
    }

    // §7.1.22 ToIndex
    pub(crate) fn to_index(&mut self, value: &JsValue) -> JsResult<u64> {
        if value.is_undefined() {
            return Ok(0);
        }
        let integer = self.to_integer_or_infinity(value)?;
        if !(0.0..=9007199254740991.0).contains(&integer) {
            return Err(self.range_error("Invalid index"));
        }
        Ok(integer as u64)
    }

    // §7.2.1 RequireObjectCoercible
    pub(crate) fn require_object_coercible(&mut self, value: &JsValue) -> JsResult<()> {
        if value.is_nullish() {
            return Err(self.type_error(format!("Cannot convert {value} to object")));
        }
        Ok(())
    }

    // §7.2.3 IsCallable
    pub fn is_callable(&self, value: &JsValue) -> EngineResult<bool> {
        let JsValue::Object(o) = value else {
            return Ok(false);
        };
        Ok(match &self.heap.object(*o)?.kind {
            ObjectKind::Function(_) | ObjectKind::Builtin(_) | ObjectKind::BoundFunction(_) => true,
            ObjectKind::Proxy(p) => p.callable,
            _ => false,
        })
    }

    // §7.2.4 IsConstructor
    pub fn is_constructor(&self, value: &JsValue) -> EngineResult<bool> {
        let JsValue::Object(o) = value else {
            return Ok(false);
        };
        Ok(match &self.heap.object(*o)?.kind {
            ObjectKind::Function(f) => f.is_constructor,
            ObjectKind::Builtin(b) => b.is_constructor,
            ObjectKind::BoundFunction(b) => b.is_constructor,
            ObjectKind::Proxy(p) => p.constructor,
            _ => false,
        })
    }

    // §7.2.14 IsLooselyEqual
    pub fn is_loosely_equal(&mut self, x: &JsValue, y: &JsValue) -> JsResult<bool> {
        if same_type(x, y) {
            return Ok(is_strictly_equal(x, y));
        }
        match (x, y) {
            (JsValue::Null, JsValue::Undefined) | (JsValue::Undefined, JsValue::Null) => Ok(true),
            (JsValue::Number(_), JsValue::String(s)) => {
                Ok(is_strictly_equal(x, &JsValue::Number(string_to_number(s))))
            }
            (JsValue::String(s), JsValue::Number(_)) => {
                Ok(is_strictly_equal(&JsValue::Number(string_to_number(s)), y))
            }
            (JsValue::BigInt(b), JsValue::String(s)) | (JsValue::String(s), JsValue::BigInt(b)) => {
                Ok(string_to_bigint(s).is_some_and(|n| n == b.value))
            }
            (JsValue::Boolean(b), _) => {
                let n = JsValue::Number(if *b { 1.0 } else { 0.0 });
                self.is_loosely_equal(&n, y)
            }
            (_, JsValue::Boolean(b)) => {
                let n = JsValue::Number(if *b { 1.0 } else { 0.0 });
                self.is_loosely_equal(x, &n)
            }
            (
                JsValue::String(_) | JsValue::Number(_) | JsValue::BigInt(_) | JsValue::Symbol(_),
                JsValue::Object(_),
            ) => {
                let prim = self.to_primitive(y, PreferredType::Default)?;
                self.is_loosely_equal(x, &prim)
            }
            (
                JsValue::Object(_),
                JsValue::String(_) | JsValue::Number(_) | JsValue::BigInt(_) | JsValue::Symbol(_),
            ) => {
                let prim = self.to_primitive(x, PreferredType::Default)?;
                self.is_loosely_equal(&prim, y)
            }
            (JsValue::BigInt(b), JsValue::Number(n)) | (JsValue::Number(n), JsValue::BigInt(b)) => {
                Ok(compare_bigint_number(&b.value, *n) == Some(Ordering::Equal))
            }
            _ => Ok(false),
        }
    }

    // §7.2.13 IsLessThan(x, y, LeftFirst); `None` is an undefined result.
    pub(crate) fn is_less_than(&mut self, x: &JsValue, y: &JsValue, left_first: bool) -> JsResult<Option<bool>> {
        let (px, py) = if left_first {
            let px = self.to_primitive(x, PreferredType::Number)?;
            let py = self.to_primitive(y, PreferredType::Number)?;
            (px, py)
        } else {
            let py = self.to_primitive(y, PreferredType::Number)?;
            let px = self.to_primitive(x, PreferredType::Number)?;
            (px, py)
        };
        match (&px, &py) {
            (JsValue::String(a), JsValue::String(b)) => return Ok(Some(a < b)),
            (JsValue::BigInt(a), JsValue::String(b)) => {
                return Ok(string_to_bigint(b).map(|nb| a.value < nb));
            }
            (JsValue::String(a), JsValue::BigInt(b)) => {
                return Ok(string_to_bigint(a).map(|na| na < b.value));
            }
            _ => {}
        }
        let nx = self.to_numeric(&px)?;
        let ny = self.to_numeric(&py)?;
        Ok(match (nx, ny) {
            (Numeric::Number(a), Numeric::Number(b)) => number_ops::less_than(a, b),
            (Numeric::BigInt(a), Numeric::BigInt(b)) => bigint_ops::less_than(&a, &b),
            (Numeric::BigInt(a), Numeric::Number(b)) => compare_bigint_number(&a, b).map(|o| o == Ordering::Less),
            (Numeric::Number(a), Numeric::BigInt(b)) => {
                compare_bigint_number(&b, a).map(|o| o == Ordering::Greater)
            }
        })
    }

    // §13.5.3 The typeof Operator
    pub fn typeof_value(&self, value: &JsValue) -> EngineResult<&'static str> {
        Ok(match value {
            JsValue::Undefined => "undefined",
            JsValue::Null => "object",
            JsValue::Boolean(_) => "boolean",
            JsValue::Number(_) => "number",
            JsValue::String(_) => "string",
            JsValue::Symbol(_) => "symbol",
            JsValue::BigInt(_) => "bigint",
            JsValue::Object(_) => {
                if self.is_callable(value)? {
                    "function"
                } else {
                    "object"
                }
            }
        })
    }

    // §13.10.2 InstanceofOperator(V, target)
    pub(crate) fn instanceof_operator(&mut self, value: &JsValue, target: &JsValue) -> JsResult<bool> {
        if !target.is_object() {
            return Err(self.type_error("Right-hand side of 'instanceof' is not an object"));
        }
        let key = PropertyKey::Symbol(self.well_known_symbol(WellKnownSymbol::HasInstance));
        if let Some(handler) = self.get_method(target, &key)? {
            let result = self.call(&handler, target, &[value.clone()])?;
            return Ok(to_boolean(&result));
        }
        if !self.is_callable(target)? {
            return Err(self.type_error("Right-hand side of 'instanceof' is not callable"));
        }
        self.ordinary_has_instance(target, value)
    }

    // §7.3.21 OrdinaryHasInstance(C, O)
    pub(crate) fn ordinary_has_instance(&mut self, c: &JsValue, o: &JsValue) -> JsResult<bool> {
        if !self.is_callable(c)? {
            return Ok(false);
        }
        let JsValue::Object(cid) = c else {
            return Ok(false);
        };
        if let ObjectKind::BoundFunction(b) = &self.heap.object(*cid)?.kind {
            let target = JsValue::Object(b.target);
            return self.instanceof_operator(o, &target);
        }
        let JsValue::Object(mut current) = o.clone() else {
            return Ok(false);
        };
        let proto = self.get(*cid, &"prototype".into())?;
        let JsValue::Object(proto) = proto else {
            return Err(self.type_error("Function has non-object prototype in instanceof check"));
        };
        loop {
            match self.get_prototype_of(current)? {
                None => return Ok(false),
                Some(p) if p == proto => return Ok(true),
                Some(p) => current = p,
            }
        }
    }
}
