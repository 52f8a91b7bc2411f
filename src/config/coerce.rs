//! Lenient conversion of merged values to the type a getter asks for.
//!
//! A value that cannot be read as the requested type yields that type's zero
//! value instead of an error: numeric strings parse, booleans read as 1/0,
//! floats truncate toward zero. Values outside the target range read as 0.

use serde_json::Value;

pub(crate) fn to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

pub(crate) fn to_i64(value: &Value) -> i64 {
    match value {
        Value::Number(n) if n.is_f64() => n
            .as_f64()
            .map(f64::trunc)
            .filter(|f| *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
            .unwrap_or(0),
        Value::Number(n) => n.as_i64().unwrap_or(0),
        Value::String(s) => s.trim().parse::<i64>().unwrap_or(0),
        Value::Bool(b) => i64::from(*b),
        _ => 0,
    }
}

pub(crate) fn to_i32(value: &Value) -> i32 {
    i32::try_from(to_i64(value)).unwrap_or(0)
}

pub(crate) fn to_u64(value: &Value) -> u64 {
    match value {
        Value::Number(n) if n.is_f64() => n
            .as_f64()
            .map(f64::trunc)
            .filter(|f| *f >= 0.0 && *f < u64::MAX as f64)
            .map(|f| f as u64)
            .unwrap_or(0),
        Value::Number(n) => n.as_u64().unwrap_or(0),
        Value::String(s) => s.trim().parse::<u64>().unwrap_or(0),
        Value::Bool(b) => u64::from(*b),
        _ => 0,
    }
}

pub(crate) fn to_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

pub(crate) fn to_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => parse_bool(s.trim()).unwrap_or(false),
        _ => false,
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" => Some(true),
        "0" | "f" | "F" => Some(false),
        _ if text.eq_ignore_ascii_case("true") => Some(true),
        _ if text.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}
