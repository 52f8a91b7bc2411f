//! Typed default values for registered configuration keys.

use std::fmt;

use serde::Serialize;

/// A default value accepted at registration time.
///
/// The set of variants is closed: only these kinds can back a configuration
/// key and its command-line flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Int(i32),
    Int64(i64),
    Uint64(u64),
    String(String),
    Float64(f64),
    Bool(bool),
}

/// The kind tag of a [`ConfigValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Int64,
    Uint64,
    String,
    Float64,
    Bool,
}

impl ConfigValue {
    /// Kind of this value, which also decides the flag's parser.
    pub fn kind(&self) -> ValueKind {
        match self {
            ConfigValue::Int(_) => ValueKind::Int,
            ConfigValue::Int64(_) => ValueKind::Int64,
            ConfigValue::Uint64(_) => ValueKind::Uint64,
            ConfigValue::String(_) => ValueKind::String,
            ConfigValue::Float64(_) => ValueKind::Float64,
            ConfigValue::Bool(_) => ValueKind::Bool,
        }
    }

    /// Convert a dynamically typed JSON value.
    ///
    /// Returns `None` for null, arrays and objects. Integers that fit in
    /// `i32` become [`ConfigValue::Int`], larger signed ones `Int64`, and
    /// only values above `i64::MAX` become `Uint64`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(ConfigValue::Bool(*b)),
            serde_json::Value::String(s) => Some(ConfigValue::String(s.clone())),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(match i32::try_from(i) {
                        Ok(small) => ConfigValue::Int(small),
                        Err(_) => ConfigValue::Int64(i),
                    })
                } else if let Some(u) = n.as_u64() {
                    Some(ConfigValue::Uint64(u))
                } else {
                    n.as_f64().map(ConfigValue::Float64)
                }
            }
            serde_json::Value::Null
            | serde_json::Value::Array(_)
            | serde_json::Value::Object(_) => None,
        }
    }

    /// The value as JSON, used for dumps and coercion.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ConfigValue::Int(v) => serde_json::Value::from(*v),
            ConfigValue::Int64(v) => serde_json::Value::from(*v),
            ConfigValue::Uint64(v) => serde_json::Value::from(*v),
            ConfigValue::String(v) => serde_json::Value::from(v.as_str()),
            ConfigValue::Float64(v) => serde_json::Value::from(*v),
            ConfigValue::Bool(v) => serde_json::Value::from(*v),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Int(v) => write!(f, "{}", v),
            ConfigValue::Int64(v) => write!(f, "{}", v),
            ConfigValue::Uint64(v) => write!(f, "{}", v),
            ConfigValue::String(v) => f.write_str(v),
            ConfigValue::Float64(v) => write!(f, "{}", v),
            ConfigValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Int => "int",
            ValueKind::Int64 => "int64",
            ValueKind::Uint64 => "uint64",
            ValueKind::String => "string",
            ValueKind::Float64 => "float64",
            ValueKind::Bool => "bool",
        };
        f.write_str(name)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        ConfigValue::Int(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Int64(value)
    }
}

impl From<u64> for ConfigValue {
    fn from(value: u64) -> Self {
        ConfigValue::Uint64(value)
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Float64(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_rust_types() {
        assert_eq!(ConfigValue::from(8080).kind(), ValueKind::Int);
        assert_eq!(ConfigValue::from(1_i64 << 40).kind(), ValueKind::Int64);
        assert_eq!(ConfigValue::from(7_u64).kind(), ValueKind::Uint64);
        assert_eq!(ConfigValue::from("x").kind(), ValueKind::String);
        assert_eq!(ConfigValue::from(0.5).kind(), ValueKind::Float64);
        assert_eq!(ConfigValue::from(true).kind(), ValueKind::Bool);
    }

    #[test]
    fn test_from_json() {
        assert_eq!(ConfigValue::from_json(&json!(42)), Some(ConfigValue::Int(42)));
        assert_eq!(
            ConfigValue::from_json(&json!(5_000_000_000_i64)),
            Some(ConfigValue::Int64(5_000_000_000))
        );
        assert_eq!(
            ConfigValue::from_json(&json!(u64::MAX)),
            Some(ConfigValue::Uint64(u64::MAX))
        );
        assert_eq!(ConfigValue::from_json(&json!(1.5)), Some(ConfigValue::Float64(1.5)));
        assert_eq!(
            ConfigValue::from_json(&json!("info")),
            Some(ConfigValue::String("info".into()))
        );

        // Unsupported shapes
        assert!(ConfigValue::from_json(&json!(null)).is_none());
        assert!(ConfigValue::from_json(&json!([1, 2])).is_none());
        assert!(ConfigValue::from_json(&json!({"a": 1})).is_none());
    }

    #[test]
    fn test_serializes_untagged() {
        let encoded = serde_json::to_string(&ConfigValue::Int(9090)).unwrap();
        assert_eq!(encoded, "9090");
        let encoded = serde_json::to_string(&ConfigValue::String("a".into())).unwrap();
        assert_eq!(encoded, "\"a\"");
    }
}
