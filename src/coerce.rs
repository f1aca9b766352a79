//! Scalar coercion and emptiness rules.
//!
//! Every input category has a defined result for every target kind:
//!
//! | input   | int                     | float          | string             | bool                 |
//! |---------|-------------------------|----------------|--------------------|----------------------|
//! | null    | 0                       | 0.0            | ""                 | false                |
//! | bool    | 0 / 1                   | 0.0 / 1.0      | "1" / ""           | unchanged            |
//! | integer | unchanged               | widened        | decimal            | non-zero             |
//! | float   | truncated, 0 if not finite | unchanged   | shortest form      | non-zero             |
//! | string  | numeric prefix          | numeric prefix | unchanged          | false for "" and "0" |
//!
//! The numeric prefix of a string is optional leading whitespace, a sign,
//! digits with an optional fraction, and an optional exponent. A string with
//! no numeric prefix converts to zero.

use regex::Regex;
use serde_json::Value as JsonValue;
use std::sync::OnceLock;

use crate::schema::types::ScalarKind;
use crate::value::FieldValue;

fn numeric_prefix_regex() -> &'static Regex {
    static NUMERIC_PREFIX: OnceLock<Regex> = OnceLock::new();
    NUMERIC_PREFIX.get_or_init(|| {
        Regex::new(r"^\s*([+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?)")
            .expect("numeric prefix pattern is valid")
    })
}

/// True for values that are not arrays or objects. Null counts as scalar.
pub fn is_scalar(value: &JsonValue) -> bool {
    !matches!(value, JsonValue::Array(_) | JsonValue::Object(_))
}

/// Whether a value counts as empty for the not-empty constraint.
///
/// Empty values: null, false, any zero number, `""`, `"0"`, `[]` and `{}`.
pub fn is_empty_value(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::Bool(b) => !b,
        JsonValue::Number(n) => n.as_f64().map_or(false, |f| f == 0.0),
        JsonValue::String(s) => s.is_empty() || s == "0",
        JsonValue::Array(items) => items.is_empty(),
        JsonValue::Object(map) => map.is_empty(),
    }
}

/// Coerce a scalar JSON value to the given kind.
///
/// Callers check [`is_scalar`] first; composite values coerce as if they
/// were null.
pub fn coerce_scalar(value: &JsonValue, kind: ScalarKind) -> FieldValue {
    match kind {
        ScalarKind::Int => FieldValue::Int(to_int(value)),
        ScalarKind::Float => FieldValue::Float(to_float(value)),
        ScalarKind::String => FieldValue::String(to_string(value)),
        ScalarKind::Bool => FieldValue::Bool(to_bool(value)),
    }
}

fn float_to_int(f: f64) -> i64 {
    if f.is_finite() {
        // `as` truncates toward zero and saturates at the i64 bounds
        f as i64
    } else {
        0
    }
}

fn to_int(value: &JsonValue) -> i64 {
    match value {
        JsonValue::Bool(b) => i64::from(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                i
            } else if n.as_u64().is_some() {
                i64::MAX
            } else {
                n.as_f64().map_or(0, float_to_int)
            }
        }
        JsonValue::String(s) => string_to_int(s),
        _ => 0,
    }
}

fn to_float(value: &JsonValue) -> f64 {
    match value {
        JsonValue::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        JsonValue::Number(n) => n.as_f64().unwrap_or(0.0),
        JsonValue::String(s) => string_to_float(s),
        _ => 0.0,
    }
}

fn to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(true) => "1".to_string(),
        JsonValue::Bool(false) => String::new(),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                n.as_f64().map(|f| f.to_string()).unwrap_or_default()
            }
        }
        _ => String::new(),
    }
}

fn to_bool(value: &JsonValue) -> bool {
    match value {
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        JsonValue::String(s) => !(s.is_empty() || s == "0"),
        _ => false,
    }
}

fn string_to_int(s: &str) -> i64 {
    let Some(caps) = numeric_prefix_regex().captures(s) else {
        return 0;
    };
    let number = &caps[1];
    if !number.contains(['.', 'e', 'E']) {
        match number.parse::<i64>() {
            Ok(i) => i,
            // Only overflow can fail here; saturate by sign
            Err(_) if number.starts_with('-') => i64::MIN,
            Err(_) => i64::MAX,
        }
    } else {
        float_to_int(number.parse::<f64>().unwrap_or(0.0))
    }
}

fn string_to_float(s: &str) -> f64 {
    numeric_prefix_regex()
        .captures(s)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .unwrap_or(0.0)
}
