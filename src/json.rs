//! JSON flavor selection and shared number coercion helpers.

use crate::error::DecodeError;
use serde_json::Value;
use soia_wire::wire::Numeric;

/// Largest integer magnitude that survives a round-trip through a JSON
/// number (2^53 - 1).
pub(crate) const MAX_SAFE_JSON_INT: i64 = 9_007_199_254_740_991;

/// Selects between the two JSON forms.
///
/// Dense JSON indexes record fields by number and is safe under renames;
/// readable JSON indexes by name and is meant for human inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonFlavor {
    Dense,
    Readable,
}

/// Names the JSON type of `value` for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(crate) fn type_mismatch(expected: &'static str, actual: &Value) -> DecodeError {
    DecodeError::TypeMismatch {
        expected,
        actual: json_kind(actual).to_string(),
    }
}

/// Reads a JSON number or numeric string. Decimal strings beyond the 64-bit
/// integer ranges fall back to float parsing, so they clamp during the
/// integer narrowing that follows.
pub(crate) fn number_from_json(value: &Value) -> Result<Numeric, DecodeError> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Numeric::I64(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Numeric::U64(u))
            } else {
                Ok(Numeric::F64(n.as_f64().unwrap_or(0.0)))
            }
        }
        Value::String(s) => numeric_from_str(s).ok_or_else(|| type_mismatch("number", value)),
        _ => Err(type_mismatch("number", value)),
    }
}

fn numeric_from_str(s: &str) -> Option<Numeric> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(Numeric::I64(i));
    }
    if let Ok(u) = s.parse::<u64>() {
        return Some(Numeric::U64(u));
    }
    s.parse::<f64>().ok().map(Numeric::F64)
}

/// Emits a float as a JSON number, or as one of the literals `"NaN"`,
/// `"Infinity"`, `"-Infinity"` when it is not finite.
pub(crate) fn float_to_json(value: f64) -> Value {
    if value.is_nan() {
        Value::String("NaN".to_owned())
    } else if value == f64::INFINITY {
        Value::String("Infinity".to_owned())
    } else if value == f64::NEG_INFINITY {
        Value::String("-Infinity".to_owned())
    } else {
        serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::from(0))
    }
}

pub(crate) fn float_from_json(value: &Value) -> Result<f64, DecodeError> {
    match value {
        Value::String(s) => match s.as_str() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            _ => Ok(number_from_json(value)?.to_f64()),
        },
        _ => Ok(number_from_json(value)?.to_f64()),
    }
}

/// Whether a dense JSON slot holds the number zero (the spelling of "default"
/// in dense form).
pub(crate) fn is_json_zero(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

/// Emits a 64-bit signed integer as a JSON number when it is safely
/// representable, and as a decimal string otherwise.
pub(crate) fn i64_to_json(value: i64) -> Value {
    if value.abs() <= MAX_SAFE_JSON_INT {
        Value::from(value)
    } else {
        Value::String(value.to_string())
    }
}

pub(crate) fn u64_to_json(value: u64) -> Value {
    if value <= MAX_SAFE_JSON_INT as u64 {
        Value::from(value)
    } else {
        Value::String(value.to_string())
    }
}
