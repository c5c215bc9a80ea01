use crate::interpreter::ObjectId;
use num_bigint::BigInt;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// An ECMAScript language value.
///
/// Objects are referenced by handle into the interpreter heap; every other
/// variant is an immutable primitive. Cloning a value never copies an object.
#[derive(Clone, Debug)]
pub enum JsValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    BigInt(JsBigInt),
    String(JsString),
    Symbol(JsSymbol),
    Object(ObjectId),
}

// §6.1.4 The String Type: a sequence of UTF-16 code units
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct JsString {
    code_units: Rc<[u16]>,
}

impl JsString {
    pub fn from_str(s: &str) -> Self {
        Self {
            code_units: s.encode_utf16().collect(),
        }
    }

    pub fn from_code_units(units: Vec<u16>) -> Self {
        Self {
            code_units: units.into(),
        }
    }

    pub fn empty() -> Self {
        Self::from_code_units(Vec::new())
    }

    pub fn as_code_units(&self) -> &[u16] {
        &self.code_units
    }

    pub fn is_empty(&self) -> bool {
        self.code_units.is_empty()
    }

    pub fn len(&self) -> usize {
        self.code_units.len()
    }

    pub fn to_rust_string(&self) -> String {
        String::from_utf16_lossy(&self.code_units)
    }

    pub fn concat(&self, other: &JsString) -> JsString {
        let mut units = Vec::with_capacity(self.len() + other.len());
        units.extend_from_slice(&self.code_units);
        units.extend_from_slice(&other.code_units);
        JsString::from_code_units(units)
    }

    pub fn slice_utf16(&self, start: usize, end: usize) -> JsString {
        let s = start.min(self.code_units.len());
        let e = end.min(self.code_units.len());
        if s >= e {
            return JsString::empty();
        }
        JsString::from_code_units(self.code_units[s..e].to_vec())
    }

    pub fn code_unit_at(&self, index: usize) -> Option<u16> {
        self.code_units.get(index).copied()
    }

    // §6.1.4.1 StringIndexOf(string, searchValue, fromIndex)
    pub fn index_of(&self, search: &JsString, from: usize) -> Option<usize> {
        let s_len = self.code_units.len();
        let search_len = search.code_units.len();
        if search_len == 0 {
            return if from <= s_len { Some(from) } else { None };
        }
        if from + search_len > s_len {
            return None;
        }
        (from..=(s_len - search_len))
            .find(|&i| self.code_units[i..i + search_len] == search.code_units[..])
    }

    /// Parses the string as a canonical array index (`ToString(ToUint32(P)) === P`
    /// and not `2^32 - 1`).
    pub fn as_array_index(&self) -> Option<u32> {
        let units = &self.code_units;
        if units.is_empty() || units.len() > 10 {
            return None;
        }
        if units.len() > 1 && units[0] == b'0' as u16 {
            return None;
        }
        let mut value: u64 = 0;
        for &u in units.iter() {
            if !(b'0' as u16..=b'9' as u16).contains(&u) {
                return None;
            }
            value = value * 10 + u64::from(u - b'0' as u16);
        }
        if value >= u64::from(u32::MAX) {
            return None;
        }
        Some(value as u32)
    }
}

impl PartialOrd for JsString {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for JsString {
    // String comparison is by code unit, not by code point.
    fn cmp(&self, other: &Self) -> Ordering {
        self.code_units.cmp(&other.code_units)
    }
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        JsString::from_str(s)
    }
}

impl From<String> for JsString {
    fn from(s: String) -> Self {
        JsString::from_str(&s)
    }
}

impl PartialEq<str> for JsString {
    fn eq(&self, other: &str) -> bool {
        self.code_units.iter().copied().eq(other.encode_utf16())
    }
}

impl PartialEq<&str> for JsString {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rust_string())
    }
}

impl fmt::Debug for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_rust_string())
    }
}

/// A symbol value. Identity is the `id`; the description is informational.
#[derive(Clone, Debug)]
pub struct JsSymbol {
    id: u64,
    description: Option<JsString>,
}

impl JsSymbol {
    pub(crate) fn new(id: u64, description: Option<JsString>) -> Self {
        Self { id, description }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn description(&self) -> Option<&JsString> {
        self.description.as_ref()
    }

    // §20.4.3.3.1 SymbolDescriptiveString
    pub fn descriptive_string(&self) -> String {
        match &self.description {
            Some(desc) => format!("Symbol({desc})"),
            None => "Symbol()".to_string(),
        }
    }
}

impl PartialEq for JsSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for JsSymbol {}

impl Hash for JsSymbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// Well-known symbols (§6.1.5.1)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WellKnownSymbol {
    HasInstance,
    IsConcatSpreadable,
    Iterator,
    Species,
    ToPrimitive,
    ToStringTag,
    Unscopables,
}

impl WellKnownSymbol {
    pub const ALL: [WellKnownSymbol; 7] = [
        WellKnownSymbol::HasInstance,
        WellKnownSymbol::IsConcatSpreadable,
        WellKnownSymbol::Iterator,
        WellKnownSymbol::Species,
        WellKnownSymbol::ToPrimitive,
        WellKnownSymbol::ToStringTag,
        WellKnownSymbol::Unscopables,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WellKnownSymbol::HasInstance => "hasInstance",
            WellKnownSymbol::IsConcatSpreadable => "isConcatSpreadable",
            WellKnownSymbol::Iterator => "iterator",
            WellKnownSymbol::Species => "species",
            WellKnownSymbol::ToPrimitive => "toPrimitive",
            WellKnownSymbol::ToStringTag => "toStringTag",
            WellKnownSymbol::Unscopables => "unscopables",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JsBigInt {
    pub value: BigInt,
}

impl JsBigInt {
    pub fn new(value: BigInt) -> Self {
        Self { value }
    }
}

impl From<i64> for JsBigInt {
    fn from(v: i64) -> Self {
        JsBigInt::new(BigInt::from(v))
    }
}

// Type tests and accessors
impl JsValue {
    pub fn is_undefined(&self) -> bool {
        matches!(self, JsValue::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, JsValue::Null)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, JsValue::Boolean(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, JsValue::Number(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, JsValue::String(_))
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, JsValue::Symbol(_))
    }

    pub fn is_bigint(&self) -> bool {
        matches!(self, JsValue::BigInt(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, JsValue::Object(_))
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, JsValue::Undefined | JsValue::Null)
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, JsValue::Number(n) if n.is_nan())
    }

    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            JsValue::Object(o) => Some(*o),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            JsValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            JsValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&JsString> {
        match self {
            JsValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn string(s: &str) -> JsValue {
        JsValue::String(JsString::from_str(s))
    }
}

impl From<bool> for JsValue {
    fn from(b: bool) -> Self {
        JsValue::Boolean(b)
    }
}

impl From<f64> for JsValue {
    fn from(n: f64) -> Self {
        JsValue::Number(n)
    }
}

impl From<JsString> for JsValue {
    fn from(s: JsString) -> Self {
        JsValue::String(s)
    }
}

impl From<ObjectId> for JsValue {
    fn from(o: ObjectId) -> Self {
        JsValue::Object(o)
    }
}

impl From<Option<ObjectId>> for JsValue {
    fn from(o: Option<ObjectId>) -> Self {
        o.map_or(JsValue::Null, JsValue::Object)
    }
}

// §6.1.6.1 Number type operations
pub mod number_ops {
    pub fn unary_minus(x: f64) -> f64 {
        -x
    }

    pub fn bitwise_not(x: f64) -> f64 {
        f64::from(!to_int32(x))
    }

    // §6.1.6.1.3 Number::exponentiate differs from powf only for a unit base
    // raised to an infinite exponent and for a NaN exponent.
    pub fn exponentiate(base: f64, exponent: f64) -> f64 {
        match () {
            _ if exponent.is_nan() => f64::NAN,
            _ if exponent == 0.0 => 1.0,
            _ if base.abs() == 1.0 && exponent.is_infinite() => f64::NAN,
            _ => base.powf(exponent),
        }
    }

    pub fn multiply(x: f64, y: f64) -> f64 {
        x * y
    }

    pub fn divide(x: f64, y: f64) -> f64 {
        x / y
    }

    /// Rust's `%` on floats truncates toward zero, as Number::remainder does.
    pub fn remainder(n: f64, d: f64) -> f64 {
        n % d
    }

    pub fn add(x: f64, y: f64) -> f64 {
        x + y
    }

    pub fn subtract(x: f64, y: f64) -> f64 {
        x - y
    }

    fn shift_count(y: f64) -> u32 {
        to_uint32(y) % 32
    }

    pub fn left_shift(x: f64, y: f64) -> f64 {
        f64::from(to_int32(x) << shift_count(y))
    }

    pub fn signed_right_shift(x: f64, y: f64) -> f64 {
        f64::from(to_int32(x) >> shift_count(y))
    }

    pub fn unsigned_right_shift(x: f64, y: f64) -> f64 {
        f64::from(to_uint32(x) >> shift_count(y))
    }

    /// `None` is the `undefined` outcome produced by a NaN operand.
    pub fn less_than(x: f64, y: f64) -> Option<bool> {
        x.partial_cmp(&y).map(|ordering| ordering.is_lt())
    }

    pub fn equal(x: f64, y: f64) -> bool {
        x == y
    }

    pub fn same_value(x: f64, y: f64) -> bool {
        match (x.is_nan(), y.is_nan()) {
            (true, true) => true,
            (false, false) => x == y && x.is_sign_negative() == y.is_sign_negative(),
            _ => false,
        }
    }

    pub fn same_value_zero(x: f64, y: f64) -> bool {
        (x.is_nan() && y.is_nan()) || x == y
    }

    pub fn bitwise_and(x: f64, y: f64) -> f64 {
        f64::from(to_int32(x) & to_int32(y))
    }

    pub fn bitwise_xor(x: f64, y: f64) -> f64 {
        f64::from(to_int32(x) ^ to_int32(y))
    }

    pub fn bitwise_or(x: f64, y: f64) -> f64 {
        f64::from(to_int32(x) | to_int32(y))
    }

    // §6.1.6.1.20 Number::toString(x, 10)
    pub fn to_string(x: f64) -> String {
        if x.is_nan() {
            "NaN".into()
        } else if x == 0.0 {
            "0".into()
        } else if x.is_infinite() {
            if x.is_sign_positive() { "Infinity" } else { "-Infinity" }.into()
        } else {
            ryu_js::Buffer::new().format(x).to_owned()
        }
    }

    /// Truncates `x` and reduces it modulo 2^32; non-finite values map to 0.
    fn modulo_2_32(x: f64) -> u32 {
        if x.is_finite() { x.trunc().rem_euclid(4_294_967_296.0) as u32 } else { 0 }
    }

    // §7.1.6 ToInt32 - §7.1.11 ToUint8: all narrow the same modular value.
    pub fn to_int32(x: f64) -> i32 {
        modulo_2_32(x) as i32
    }

    pub fn to_uint32(x: f64) -> u32 {
        modulo_2_32(x)
    }

    pub fn to_int16(x: f64) -> i16 {
        modulo_2_32(x) as i16
    }

    pub fn to_uint16(x: f64) -> u16 {
        modulo_2_32(x) as u16
    }

    pub fn to_int8(x: f64) -> i8 {
        modulo_2_32(x) as i8
    }

    pub fn to_uint8(x: f64) -> u8 {
        modulo_2_32(x) as u8
    }

    // §7.1.12 ToUint8Clamp
    pub fn to_uint8_clamp(x: f64) -> u8 {
        if x.is_nan() {
            0
        } else {
            x.clamp(0.0, 255.0).round_ties_even() as u8
        }
    }
}

// §6.1.6.2 BigInt type operations
//
// Fallible operations return the message of the RangeError (TypeError for
// `>>>`) the evaluator raises.
pub mod bigint_ops {
    use num_bigint::{BigInt, Sign};
    use num_traits::{One, ToPrimitive, Zero};

    pub fn unary_minus(x: &BigInt) -> BigInt {
        -x
    }

    pub fn bitwise_not(x: &BigInt) -> BigInt {
        !x
    }

    /// Upper bound on the bit length of any computed BigInt.
    pub const MAX_BITS: u64 = 1 << 30;

    const TOO_LARGE: &str = "Maximum BigInt size exceeded";

    pub fn exponentiate(base: &BigInt, exponent: &BigInt) -> Result<BigInt, &'static str> {
        if exponent.sign() == Sign::Minus {
            return Err("Exponent must be non-negative");
        }
        if base.is_zero() {
            return Ok(if exponent.is_zero() { BigInt::one() } else { BigInt::zero() });
        }
        if base.magnitude().is_one() {
            let negative = base.sign() == Sign::Minus && exponent.bit(0);
            return Ok(if negative { -BigInt::one() } else { BigInt::one() });
        }
        // |base| >= 2, so every unit of exponent adds at least one bit.
        let exponent = exponent.to_u64().filter(|e| (base.bits() - 1).saturating_mul(*e) <= MAX_BITS).ok_or(TOO_LARGE)?;
        let exponent = u32::try_from(exponent).map_err(|_| TOO_LARGE)?;
        Ok(base.pow(exponent))
    }

    pub fn multiply(x: &BigInt, y: &BigInt) -> BigInt {
        x * y
    }

    pub fn divide(n: &BigInt, d: &BigInt) -> Result<BigInt, &'static str> {
        if d.is_zero() { Err("Division by zero") } else { Ok(n / d) }
    }

    pub fn remainder(n: &BigInt, d: &BigInt) -> Result<BigInt, &'static str> {
        if d.is_zero() { Err("Division by zero") } else { Ok(n % d) }
    }

    pub fn add(x: &BigInt, y: &BigInt) -> BigInt {
        x + y
    }

    pub fn subtract(x: &BigInt, y: &BigInt) -> BigInt {
        x - y
    }

    /// Shifts left by a signed count; counts are saturated to the i64 range.
    fn shift(x: &BigInt, count: &BigInt) -> Result<BigInt, &'static str> {
        if x.is_zero() {
            return Ok(BigInt::zero());
        }
        let count = count.to_i64().unwrap_or(if count.sign() == Sign::Minus { i64::MIN } else { i64::MAX });
        if count < 0 {
            return Ok(x >> count.unsigned_abs());
        }
        let count = count.unsigned_abs();
        if x.bits().saturating_add(count) > MAX_BITS {
            return Err(TOO_LARGE);
        }
        Ok(x << count)
    }

    pub fn left_shift(x: &BigInt, y: &BigInt) -> Result<BigInt, &'static str> {
        shift(x, y)
    }

    pub fn signed_right_shift(x: &BigInt, y: &BigInt) -> Result<BigInt, &'static str> {
        shift(x, &-y)
    }

    pub fn unsigned_right_shift(_x: &BigInt, _y: &BigInt) -> Result<BigInt, &'static str> {
        Err("BigInts have no unsigned right shift, use >> instead")
    }

    pub fn less_than(x: &BigInt, y: &BigInt) -> Option<bool> {
        Some(x < y)
    }

    pub fn equal(x: &BigInt, y: &BigInt) -> bool {
        x == y
    }

    pub fn bitwise_and(x: &BigInt, y: &BigInt) -> BigInt {
        x & y
    }

    pub fn bitwise_xor(x: &BigInt, y: &BigInt) -> BigInt {
        x ^ y
    }

    pub fn bitwise_or(x: &BigInt, y: &BigInt) -> BigInt {
        x | y
    }

    pub fn to_string(x: &BigInt) -> String {
        x.to_str_radix(10)
    }
}

impl fmt::Display for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "undefined"),
            JsValue::Null => write!(f, "null"),
            JsValue::Boolean(b) => write!(f, "{b}"),
            JsValue::Number(n) => write!(f, "{}", number_ops::to_string(*n)),
            JsValue::String(s) => write!(f, "{s}"),
            JsValue::Symbol(s) => write!(f, "{}", s.descriptive_string()),
            JsValue::BigInt(b) => write!(f, "{}n", b.value),
            JsValue::Object(_) => write!(f, "[object Object]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_string_index_of() {
        let s = JsString::from_str("hello world");
        let search = JsString::from_str("world");
        assert_eq!(s.index_of(&search, 0), Some(6));
        assert_eq!(s.index_of(&search, 7), None);

        let empty = JsString::from_str("");
        assert_eq!(s.index_of(&empty, 5), Some(5));
    }

    #[test]
    fn array_index_parsing() {
        assert_eq!(JsString::from_str("0").as_array_index(), Some(0));
        assert_eq!(JsString::from_str("42").as_array_index(), Some(42));
        assert_eq!(JsString::from_str("042").as_array_index(), None);
        assert_eq!(JsString::from_str("-1").as_array_index(), None);
        assert_eq!(JsString::from_str("4294967294").as_array_index(), Some(4294967294));
        assert_eq!(JsString::from_str("4294967295").as_array_index(), None);
        assert_eq!(JsString::from_str("1.5").as_array_index(), None);
    }

    #[test]
    fn strings_order_by_code_unit() {
        let a = JsString::from_str("a");
        let b = JsString::from_str("b");
        let upper = JsString::from_str("Z");
        assert!(a < b);
        assert!(upper < a);
        assert!(JsString::from_str("ab") > a);
    }

    #[test]
    fn number_special_values() {
        assert_eq!(number_ops::to_string(f64::NAN), "NaN");
        assert_eq!(number_ops::to_string(0.0), "0");
        assert_eq!(number_ops::to_string(-0.0), "0");
        assert_eq!(number_ops::to_string(f64::INFINITY), "Infinity");
        assert_eq!(number_ops::to_string(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(number_ops::to_string(1.5), "1.5");
        assert_eq!(number_ops::to_string(100.0), "100");
    }

    #[test]
    fn number_same_value() {
        assert!(number_ops::same_value(f64::NAN, f64::NAN));
        assert!(!number_ops::same_value(0.0, -0.0));
        assert!(number_ops::same_value(0.0, 0.0));
        assert!(!number_ops::equal(f64::NAN, f64::NAN));
    }

    #[test]
    fn number_same_value_zero() {
        assert!(number_ops::same_value_zero(f64::NAN, f64::NAN));
        assert!(number_ops::same_value_zero(0.0, -0.0));
    }

    #[test]
    fn to_int32_basics() {
        assert_eq!(number_ops::to_int32(f64::NAN), 0);
        assert_eq!(number_ops::to_int32(f64::INFINITY), 0);
        assert_eq!(number_ops::to_int32(0.0), 0);
        assert_eq!(number_ops::to_int32(42.9), 42);
        assert_eq!(number_ops::to_int32(-42.9), -42);
        assert_eq!(number_ops::to_int32(4294967296.0 + 5.0), 5);
        assert_eq!(number_ops::to_uint32(-1.0), 4294967295);
    }

    #[test]
    fn uint8_clamp_rounds_half_to_even() {
        assert_eq!(number_ops::to_uint8_clamp(1.5), 2);
        assert_eq!(number_ops::to_uint8_clamp(2.5), 2);
        assert_eq!(number_ops::to_uint8_clamp(-3.0), 0);
        assert_eq!(number_ops::to_uint8_clamp(300.0), 255);
    }

    #[test]
    fn exponentiate_edge_cases() {
        assert!(number_ops::exponentiate(1.0, f64::INFINITY).is_nan());
        assert_eq!(number_ops::exponentiate(f64::NAN, 0.0), 1.0);
        assert_eq!(number_ops::exponentiate(2.0, 10.0), 1024.0);
    }

    #[test]
    fn bitwise_ops() {
        assert_eq!(number_ops::bitwise_and(15.0, 9.0), 9.0);
        assert_eq!(number_ops::bitwise_or(15.0, 9.0), 15.0);
        assert_eq!(number_ops::bitwise_xor(15.0, 9.0), 6.0);
        assert_eq!(number_ops::bitwise_not(0.0), -1.0);
    }

    #[test]
    fn shift_ops() {
        assert_eq!(number_ops::left_shift(1.0, 4.0), 16.0);
        assert_eq!(number_ops::signed_right_shift(16.0, 2.0), 4.0);
        assert_eq!(number_ops::unsigned_right_shift(-1.0, 0.0), 4294967295.0);
    }

    #[test]
    fn bigint_basic_ops() {
        let a = BigInt::from(10);
        let b = BigInt::from(3);
        assert_eq!(bigint_ops::add(&a, &b), BigInt::from(13));
        assert_eq!(bigint_ops::subtract(&a, &b), BigInt::from(7));
        assert_eq!(bigint_ops::multiply(&a, &b), BigInt::from(30));
        assert_eq!(bigint_ops::divide(&a, &b).unwrap(), BigInt::from(3));
        assert_eq!(bigint_ops::remainder(&a, &b).unwrap(), BigInt::from(1));
        assert_eq!(bigint_ops::unary_minus(&a), BigInt::from(-10));
    }

    #[test]
    fn bigint_shift_ops() {
        assert_eq!(
            bigint_ops::left_shift(&BigInt::from(1), &BigInt::from(4)),
            Ok(BigInt::from(16))
        );
        assert_eq!(
            bigint_ops::signed_right_shift(&BigInt::from(16), &BigInt::from(2)),
            Ok(BigInt::from(4))
        );
        assert_eq!(
            bigint_ops::signed_right_shift(&BigInt::from(-1), &BigInt::from(100_000_000_000i64)),
            Ok(BigInt::from(-1))
        );
        assert!(bigint_ops::unsigned_right_shift(&BigInt::from(1), &BigInt::from(1)).is_err());
    }

    #[test]
    fn bigint_results_are_size_bounded() {
        let huge = BigInt::from(100_000_000_000i64);
        assert_eq!(
            bigint_ops::left_shift(&BigInt::from(1), &huge),
            Err("Maximum BigInt size exceeded")
        );
        assert_eq!(
            bigint_ops::signed_right_shift(&BigInt::from(1), &-&huge),
            Err("Maximum BigInt size exceeded")
        );
        assert_eq!(bigint_ops::left_shift(&BigInt::from(0), &huge), Ok(BigInt::from(0)));
        assert_eq!(
            bigint_ops::exponentiate(&BigInt::from(2), &huge),
            Err("Maximum BigInt size exceeded")
        );
        assert_eq!(bigint_ops::exponentiate(&BigInt::from(-1), &huge), Ok(BigInt::from(1)));
        assert_eq!(bigint_ops::exponentiate(&BigInt::from(-1), &(&huge + 1)), Ok(BigInt::from(-1)));
        assert_eq!(bigint_ops::exponentiate(&BigInt::from(0), &huge), Ok(BigInt::from(0)));
        assert_eq!(bigint_ops::exponentiate(&BigInt::from(3), &BigInt::from(4)), Ok(BigInt::from(81)));
    }

    #[test]
    fn bigint_division_by_zero() {
        assert!(bigint_ops::divide(&BigInt::from(1), &BigInt::from(0)).is_err());
        assert!(bigint_ops::remainder(&BigInt::from(1), &BigInt::from(0)).is_err());
        assert!(bigint_ops::exponentiate(&BigInt::from(2), &BigInt::from(-1)).is_err());
    }

    #[test]
    fn display_values() {
        assert_eq!(format!("{}", JsValue::Undefined), "undefined");
        assert_eq!(format!("{}", JsValue::Null), "null");
        assert_eq!(format!("{}", JsValue::Boolean(true)), "true");
        assert_eq!(format!("{}", JsValue::Number(42.0)), "42");
        assert_eq!(format!("{}", JsValue::string("hi")), "hi");
        assert_eq!(format!("{}", JsValue::BigInt(JsBigInt::from(7))), "7n");
    }
}
