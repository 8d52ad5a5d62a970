// Expression Values
// Tagged result variant and the weak-typing coercion rules

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as Json;

/// A string that looks like a plain decimal number: optional sign,
/// digits, optional fractional part. No exponents, no hex.
static NUMERIC_LIKE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?\d+(\.\d+)?$").expect("numeric-like pattern")
});

/// Result of evaluating an expression.
///
/// Structured values (objects and arrays) are opaque: they can be
/// stringified or tested for truthiness, never used in arithmetic.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent-value marker produced by failed lookups. Distinct from
    /// JSON `null`: `null` is a value the context contains, `Undefined`
    /// means the path led nowhere.
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Structured(Json),
}

impl Value {
    /// Convert a resolved JSON value into an evaluation value.
    pub fn from_json(value: &Json) -> Value {
        match value {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::String(s.clone()),
            structured => Value::Structured(structured.clone()),
        }
    }

    /// Convert back to JSON. `Undefined` collapses to `null`; NaN and
    /// infinite numbers have no JSON representation and also become
    /// `null`.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Undefined | Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::String(s) => Json::String(s.clone()),
            Value::Structured(v) => v.clone(),
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Weak-typing truthiness: falsy iff `false`, nil, empty string,
    /// `0`, or NaN. Structured values are always truthy, even when
    /// empty.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Structured(_) => true,
        }
    }

    /// Numeric coercion: numbers pass through, strings parse as decimal
    /// (empty string is 0, anything non-numeric is NaN), booleans map
    /// to 1/0, nil and structured values map to NaN.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Bool(true) => 1.0,
            Value::Bool(false) => 0.0,
            Value::String(s) => parse_decimal(s),
            _ => f64::NAN,
        }
    }

    /// A number, or a string shaped like one.
    pub fn is_numeric_like(&self) -> bool {
        match self {
            Value::Number(_) => true,
            Value::String(s) => NUMERIC_LIKE.is_match(s),
            _ => false,
        }
    }

    /// Numeric-string coercion shared by the equality operators: a
    /// string shaped like a decimal number becomes that number,
    /// everything else passes through unchanged.
    pub fn coerce_numeric(self) -> Value {
        match self {
            Value::String(ref s) if NUMERIC_LIKE.is_match(s) => Value::Number(parse_decimal(s)),
            other => other,
        }
    }

    /// String conversion used by `+` concatenation and loose-equality
    /// string comparison: nil spells itself out, numbers drop a
    /// trailing `.0`, structured values print as canonical JSON.
    pub fn as_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Structured(v) => v.to_string(),
        }
    }

    /// Template stringification: nil renders as the empty string,
    /// everything else as [`Value::as_string`].
    pub fn render_string(&self) -> String {
        match self {
            Value::Undefined | Value::Null => String::new(),
            other => other.as_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

/// Loose equality (`==`): nil equals nil; booleans force numeric
/// comparison; two numeric-likes compare as numbers; otherwise same-type
/// value equality or string-representation equality. Both operands pass
/// through the numeric-string coercion first.
pub fn loose_equal(left: &Value, right: &Value) -> bool {
    let a = left.clone().coerce_numeric();
    let b = right.clone().coerce_numeric();

    if a.is_nil() && b.is_nil() {
        return true;
    }
    if matches!(a, Value::Bool(_)) || matches!(b, Value::Bool(_)) {
        return a.to_number() == b.to_number();
    }
    if a.is_numeric_like() && b.is_numeric_like() {
        return a.to_number() == b.to_number();
    }
    same_type_equal(&a, &b) || a.as_string() == b.as_string()
}

/// Strict equality (`===`): numeric-string coercion on both operands,
/// then same-type value equality. No cross-type equality; in particular
/// `null` and `Undefined` are not strictly equal to each other.
pub fn strict_equal(left: &Value, right: &Value) -> bool {
    same_type_equal(
        &left.clone().coerce_numeric(),
        &right.clone().coerce_numeric(),
    )
}

fn same_type_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) => true,
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        // f64 equality, so NaN is not equal to itself
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Structured(x), Value::Structured(y)) => x == y,
        _ => false,
    }
}

fn parse_decimal(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Undefined.is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());

        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Number(-1.0).is_truthy());
        assert!(Value::String("0".to_string()).is_truthy());
        assert!(Value::Structured(json!([])).is_truthy());
        assert!(Value::Structured(json!({})).is_truthy());
    }

    #[test]
    fn test_to_number() {
        assert_eq!(Value::Number(2.5).to_number(), 2.5);
        assert_eq!(Value::Bool(true).to_number(), 1.0);
        assert_eq!(Value::Bool(false).to_number(), 0.0);
        assert_eq!(Value::String("42".to_string()).to_number(), 42.0);
        assert_eq!(Value::String("  42 ".to_string()).to_number(), 42.0);
        assert_eq!(Value::String(String::new()).to_number(), 0.0);
        assert!(Value::String("abc".to_string()).to_number().is_nan());
        assert!(Value::Null.to_number().is_nan());
        assert!(Value::Undefined.to_number().is_nan());
        assert!(Value::Structured(json!([1])).to_number().is_nan());
    }

    #[test]
    fn test_numeric_like() {
        assert!(Value::Number(1.0).is_numeric_like());
        assert!(Value::String("-12.5".to_string()).is_numeric_like());
        assert!(Value::String("007".to_string()).is_numeric_like());
        assert!(!Value::String("1e3".to_string()).is_numeric_like());
        assert!(!Value::String("1.".to_string()).is_numeric_like());
        assert!(!Value::String("".to_string()).is_numeric_like());
        assert!(!Value::Bool(true).is_numeric_like());
    }

    #[test]
    fn test_loose_equality() {
        assert!(loose_equal(&Value::Null, &Value::Undefined));
        assert!(loose_equal(
            &Value::Number(1.0),
            &Value::String("1".to_string())
        ));
        assert!(loose_equal(
            &Value::Bool(true),
            &Value::String("1".to_string())
        ));
        assert!(!loose_equal(
            &Value::Bool(true),
            &Value::String("true".to_string())
        ));
        assert!(loose_equal(
            &Value::Null,
            &Value::String("null".to_string())
        ));
        assert!(!loose_equal(
            &Value::String("abc".to_string()),
            &Value::String("ABC".to_string())
        ));
        assert!(!loose_equal(&Value::Number(f64::NAN), &Value::Number(f64::NAN)));
    }

    #[test]
    fn test_strict_equality() {
        assert!(strict_equal(
            &Value::Number(1.0),
            &Value::String("1".to_string())
        ));
        assert!(!strict_equal(
            &Value::Number(1.0),
            &Value::String("a".to_string())
        ));
        assert!(!strict_equal(&Value::Bool(true), &Value::Number(1.0)));
        assert!(!strict_equal(&Value::Null, &Value::Undefined));
        assert!(strict_equal(
            &Value::Structured(json!({"a": 1})),
            &Value::Structured(json!({"a": 1}))
        ));
    }

    #[test]
    fn test_as_string() {
        assert_eq!(Value::Number(1.0).as_string(), "1");
        assert_eq!(Value::Number(1.5).as_string(), "1.5");
        assert_eq!(Value::Number(f64::NAN).as_string(), "NaN");
        assert_eq!(Value::Number(f64::INFINITY).as_string(), "Infinity");
        assert_eq!(Value::Null.as_string(), "null");
        assert_eq!(Value::Undefined.as_string(), "undefined");
        assert_eq!(Value::Bool(true).as_string(), "true");
        assert_eq!(
            Value::Structured(json!({"a": [1, 2]})).as_string(),
            r#"{"a":[1,2]}"#
        );
    }

    #[test]
    fn test_render_string_blanks_nil() {
        assert_eq!(Value::Undefined.render_string(), "");
        assert_eq!(Value::Null.render_string(), "");
        assert_eq!(Value::Number(3.0).render_string(), "3");
    }

    #[test]
    fn test_to_json_round_trip() {
        assert_eq!(Value::Undefined.to_json(), json!(null));
        assert_eq!(Value::Number(f64::NAN).to_json(), json!(null));
        assert_eq!(Value::Number(2.0).to_json(), json!(2.0));
        assert_eq!(Value::from_json(&json!("x")), Value::String("x".to_string()));
        assert_eq!(
            Value::from_json(&json!([1, 2])),
            Value::Structured(json!([1, 2]))
        );
    }
}
