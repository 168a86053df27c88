//! Setting values accepted by the farm tool's flat `Key=Value` files.
//!
//! The job and plugin files are plain text with one pair per line, so only
//! scalars and flat lists of scalars can be written. [`SettingValue::from_json`]
//! is the capability check used everywhere a JSON value is about to end up in
//! one of those files.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A value that cannot be written to a flat settings file.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("value of type {kind} cannot be written as a flat setting")]
pub struct Unrepresentable {
    /// JSON type that was rejected ("null", "object", "nested list")
    pub kind: &'static str,
}

/// A single scalar setting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    /// Convert a JSON value, rejecting anything that is not a scalar
    pub fn from_json(value: &Value) -> Result<Self, Unrepresentable> {
        match value {
            Value::Bool(b) => Ok(Scalar::Bool(*b)),
            Value::Number(n) => Ok(Scalar::Number(n.clone())),
            Value::String(s) => Ok(Scalar::Text(s.clone())),
            Value::Null => Err(Unrepresentable { kind: "null" }),
            Value::Array(_) => Err(Unrepresentable { kind: "nested list" }),
            Value::Object(_) => Err(Unrepresentable { kind: "object" }),
        }
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // The farm tool parses booleans case-insensitively, but the
            // capitalised form is what existing submitters emit.
            Scalar::Bool(true) => write!(f, "True"),
            Scalar::Bool(false) => write!(f, "False"),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value.into())
    }
}

/// A job or plugin setting: a scalar or a flat list of scalars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl SettingValue {
    /// Check that a JSON value fits the flat file format and convert it.
    pub fn from_json(value: &Value) -> Result<Self, Unrepresentable> {
        match value {
            Value::Array(items) => items
                .iter()
                .map(Scalar::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(SettingValue::List),
            other => Scalar::from_json(other).map(SettingValue::Scalar),
        }
    }

    /// Whether a JSON value passes the capability check
    pub fn is_representable(value: &Value) -> bool {
        Self::from_json(value).is_ok()
    }
}

impl std::fmt::Display for SettingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingValue::Scalar(s) => write!(f, "{}", s),
            SettingValue::List(items) => {
                let joined: Vec<String> = items.iter().map(|s| s.to_string()).collect();
                write!(f, "{}", joined.join(","))
            }
        }
    }
}

impl From<Scalar> for SettingValue {
    fn from(value: Scalar) -> Self {
        SettingValue::Scalar(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Scalar(value.into())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::Scalar(value.into())
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Scalar(value.into())
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Scalar(value.into())
    }
}
