//! The coercion matrix: best-effort conversion of a single node into each
//! primitive target.
//!
//! None of these functions fail. When no reasonable conversion exists the
//! result degrades to zero, `false`, or the empty string.

use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::{Number, Value};
use tracing::trace;

/// Lower-cased strings that coerce to `true`.
const TRUTHY: [&str; 4] = ["1", "yes", "y", "true"];

/// A node read as a number before narrowing to a target width.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Numeric {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

impl Numeric {
    fn from_number(n: &Number) -> Self {
        if let Some(i) = n.as_i64() {
            Self::Signed(i)
        } else if let Some(u) = n.as_u64() {
            Self::Unsigned(u)
        } else {
            Self::Float(n.as_f64().unwrap_or(0.0))
        }
    }

    fn from_text(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Ok(i) = text.parse::<i64>() {
            return Some(Self::Signed(i));
        }
        if let Ok(u) = text.parse::<u64>() {
            return Some(Self::Unsigned(u));
        }
        match text.parse::<f64>() {
            Ok(f) if f.is_finite() => Some(Self::Float(f)),
            _ => {
                trace!(text, "numeric string did not parse, using zero");
                None
            }
        }
    }

    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(Self::from_number(n)),
            Value::String(s) => Self::from_text(s),
            Value::Bool(b) => Some(Self::Signed(i64::from(*b))),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Widest signed view; floats truncate toward zero and saturate.
    fn as_i128(self) -> i128 {
        match self {
            Self::Signed(i) => i128::from(i),
            Self::Unsigned(u) => i128::from(u),
            Self::Float(f) => f as i128,
        }
    }
}

/// Coerce a node to `bool`.
///
/// `true` for `true`, any non-zero number, and the strings `"1"`, `"yes"`,
/// `"y"`, `"true"` in any case. Everything else is `false`.
pub fn to_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => TRUTHY.contains(&s.to_lowercase().as_str()),
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}

macro_rules! integer_coercions {
    ($($(#[$doc:meta])* $name:ident => $ty:ty;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(value: &Value) -> $ty {
                Numeric::of(value).map_or(0, |n| n.as_i128() as $ty)
            }
        )*
    };
}

integer_coercions! {
    /// Coerce a node to `i8`, truncating to the target width.
    to_i8 => i8;
    to_i16 => i16;
    to_i32 => i32;
    /// Coerce a node to `i64`.
    ///
    /// Numbers truncate, numeric strings parse, booleans are `1`/`0`, and
    /// anything else is `0`.
    to_i64 => i64;
    to_i128 => i128;
    to_isize => isize;
    to_u8 => u8;
    to_u16 => u16;
    to_u32 => u32;
    to_u64 => u64;
    to_usize => usize;
}

/// Coerce a node to `u128`.
///
/// Kept apart from the other widths since `i128` cannot hold every `u128`.
pub fn to_u128(value: &Value) -> u128 {
    match Numeric::of(value) {
        Some(Numeric::Unsigned(u)) => u128::from(u),
        Some(n) => n.as_i128() as u128,
        None => 0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FloatToken {
    Infinity,
    NegInfinity,
    Nan,
}

fn float_token(text: &str) -> Option<FloatToken> {
    match text.to_lowercase().as_str() {
        "infinity" | "inf" => Some(FloatToken::Infinity),
        "-infinity" | "-inf" => Some(FloatToken::NegInfinity),
        "nan" => Some(FloatToken::Nan),
        _ => None,
    }
}

/// Coerce a node to `f64`.
///
/// Strings accept the tokens `infinity`/`inf`, `-infinity`/`-inf` and `nan`
/// in any case, then any finite decimal literal; anything else is `0.0`.
pub fn to_f64(value: &Value) -> f64 {
    match value {
        Value::String(s) => match float_token(s) {
            Some(FloatToken::Infinity) => f64::INFINITY,
            Some(FloatToken::NegInfinity) => f64::NEG_INFINITY,
            Some(FloatToken::Nan) => f64::NAN,
            None => match s.trim().parse::<f64>() {
                Ok(f) if f.is_finite() => f,
                _ => {
                    trace!(text = s.as_str(), "float string did not parse, using zero");
                    0.0
                }
            },
        },
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null | Value::Array(_) | Value::Object(_) => 0.0,
    }
}

/// Coerce a node to `f32`. Same rules as [`to_f64`].
pub fn to_f32(value: &Value) -> f32 {
    if let Value::String(s) = value {
        match float_token(s) {
            Some(FloatToken::Infinity) => return f32::INFINITY,
            Some(FloatToken::NegInfinity) => return f32::NEG_INFINITY,
            Some(FloatToken::Nan) => return f32::NAN,
            None => {}
        }
    }
    to_f64(value) as f32
}

/// Canonical text of a number: integral floats print without a fraction.
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if !n.is_i64() && !n.is_u64() && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", f as i64)
        }
        _ => n.to_string(),
    }
}

/// Coerce a node to `String`.
///
/// Strings pass through, numbers and booleans print in their canonical form,
/// and null, arrays, and objects become the empty string.
pub fn to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => number_text(n),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// Coerce a node to `char`: the first character of [`to_string`], or `'\0'`.
pub fn to_char(value: &Value) -> char {
    to_string(value).chars().next().unwrap_or('\0')
}

fn decimal_from_text(text: &str) -> Option<Decimal> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Coerce a node to an arbitrary-precision decimal.
///
/// Numbers convert from their textual form so `0.1` stays exactly `0.1`.
pub fn to_decimal(value: &Value) -> Decimal {
    match value {
        Value::Number(n) => decimal_from_text(&n.to_string())
            .or_else(|| n.as_f64().and_then(Decimal::from_f64))
            .unwrap_or_default(),
        Value::String(s) => decimal_from_text(s).unwrap_or_default(),
        Value::Bool(b) => Decimal::from(u8::from(*b)),
        Value::Null | Value::Array(_) | Value::Object(_) => Decimal::ZERO,
    }
}

/// Name of a node's kind, for error messages.
pub(crate) fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bool_truthy_forms() {
        for v in [json!(1), json!("1"), json!("yes"), json!("Y"), json!("TRUE"), json!(true), json!(10)] {
            assert!(to_bool(&v), "{v} should be true");
        }
    }

    #[test]
    fn test_bool_falsy_forms() {
        for v in [json!(0), json!("0"), json!(false), json!("bcd"), json!(null), json!("false"), json!([1]), json!({})] {
            assert!(!to_bool(&v), "{v} should be false");
        }
    }

    #[test]
    fn test_integer_from_strings() {
        assert_eq!(to_i64(&json!("42")), 42);
        assert_eq!(to_i64(&json!(" -7 ")), -7);
        assert_eq!(to_i64(&json!("3.9")), 3);
        assert_eq!(to_i64(&json!("abc")), 0);
        assert_eq!(to_i64(&json!("inf")), 0);
        assert_eq!(to_u64(&json!("18446744073709551615")), u64::MAX);
    }

    #[test]
    fn test_integer_truncates_width() {
        assert_eq!(to_u8(&json!(300)), 44);
        assert_eq!(to_i8(&json!(-129)), 127);
        assert_eq!(to_i32(&json!(2.99)), 2);
        assert_eq!(to_u32(&json!(true)), 1);
        assert_eq!(to_u32(&json!(null)), 0);
        assert_eq!(to_u128(&json!(u64::MAX)), u128::from(u64::MAX));
    }

    #[test]
    fn test_float_tokens() {
        assert_eq!(to_f64(&json!("Infinity")), f64::INFINITY);
        assert_eq!(to_f64(&json!("-INF")), f64::NEG_INFINITY);
        assert!(to_f64(&json!("NaN")).is_nan());
        assert_eq!(to_f64(&json!("ohter")), 0.0);
        assert_eq!(to_f64(&json!("2.5")), 2.5);
        assert_eq!(to_f32(&json!("inf")), f32::INFINITY);
        assert_eq!(to_f32(&json!(1)), 1.0);
    }

    #[test]
    fn test_string_canonical_text() {
        assert_eq!(to_string(&json!(1)), "1");
        assert_eq!(to_string(&json!(1.5)), "1.5");
        assert_eq!(to_string(&json!(2.0)), "2");
        assert_eq!(to_string(&json!(true)), "true");
        assert_eq!(to_string(&json!(null)), "");
        assert_eq!(to_string(&json!({"a": 1})), "");
        assert_eq!(to_char(&json!("xyz")), 'x');
        assert_eq!(to_char(&json!("")), '\0');
    }

    #[test]
    fn test_decimal_is_exact() {
        assert_eq!(to_decimal(&json!(0.1)), Decimal::from_str("0.1").unwrap());
        assert_eq!(to_decimal(&json!("12.340")), Decimal::from_str("12.340").unwrap());
        assert_eq!(to_decimal(&json!("1e3")), Decimal::from(1000));
        assert_eq!(to_decimal(&json!("nope")), Decimal::ZERO);
        assert_eq!(to_decimal(&json!(true)), Decimal::ONE);
    }
}
