//! Attribute values
//!
//! The values carried between an instance, the CRUD binder and the resource
//! client:
//! - string
//! - integer (i64)
//! - boolean
//! - sequence (lists and sets; sets are sent in enumeration order)
//! - mapping (maps and nested objects, keyed by string)
//!
//! There is no `null`: a JSON `null` for a whole attribute means "unset".

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Attribute name -> value
pub type AttrMap = BTreeMap<String, AttrValue>;

/// All possible attribute value types
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    String(String),
    Int(i64),
    Bool(bool),
    Sequence(Vec<AttrValue>),
    Mapping(BTreeMap<String, AttrValue>),
}

/// A JSON value with no attribute-value representation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    #[error("fractional number {0} is not an integer")]
    Fractional(f64),
    #[error("number {0} is out of integer range")]
    OutOfRange(String),
    #[error("null is not allowed inside a sequence")]
    NullElement,
}

impl AttrValue {
    /// Convert a JSON value. `Ok(None)` means the value was `null`.
    ///
    /// Null entries inside mappings are dropped; null elements inside
    /// sequences are rejected since dropping them would shift positions.
    pub fn from_json(value: &Value) -> Result<Option<Self>, ValueError> {
        let converted = match value {
            Value::Null => return Ok(None),
            Value::String(s) => AttrValue::String(s.clone()),
            Value::Bool(b) => AttrValue::Bool(*b),
            Value::Number(n) => AttrValue::Int(number_to_int(n)?),
            Value::Array(items) => AttrValue::Sequence(
                items
                    .iter()
                    .map(|item| AttrValue::from_json(item)?.ok_or(ValueError::NullElement))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(fields) => {
                let mut mapping = BTreeMap::new();
                for (key, field) in fields {
                    if let Some(v) = AttrValue::from_json(field)? {
                        mapping.insert(key.clone(), v);
                    }
                }
                AttrValue::Mapping(mapping)
            }
        };
        Ok(Some(converted))
    }

    /// Parse a command-line literal: JSON if it parses, otherwise a string
    pub fn parse_literal(raw: &str) -> Result<Self, ValueError> {
        match serde_json::from_str::<Value>(raw) {
            Ok(json) => Ok(AttrValue::from_json(&json)?.unwrap_or_else(|| raw.into())),
            Err(_) => Ok(raw.into()),
        }
    }

    /// Short name of the value's variant, for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            AttrValue::String(_) => "string",
            AttrValue::Int(_) => "int",
            AttrValue::Bool(_) => "bool",
            AttrValue::Sequence(_) => "sequence",
            AttrValue::Mapping(_) => "mapping",
        }
    }
}

fn number_to_int(n: &serde_json::Number) -> Result<i64, ValueError> {
    if let Some(i) = n.as_i64() {
        return Ok(i);
    }
    if n.is_u64() {
        return Err(ValueError::OutOfRange(n.to_string()));
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => Ok(f as i64),
        Some(f) if f.fract() != 0.0 => Err(ValueError::Fractional(f)),
        _ => Err(ValueError::OutOfRange(n.to_string())),
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::String(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.to_string())
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<Vec<AttrValue>> for AttrValue {
    fn from(value: Vec<AttrValue>) -> Self {
        AttrValue::Sequence(value)
    }
}

impl From<BTreeMap<String, AttrValue>> for AttrValue {
    fn from(value: BTreeMap<String, AttrValue>) -> Self {
        AttrValue::Mapping(value)
    }
}
