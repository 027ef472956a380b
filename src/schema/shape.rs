//! Type descriptor parser
//!
//! Turns the compact type language used by provider schema dumps into
//! [`ShapeToken`]s:
//!
//! - `"string"`, `"number"`, `"bool"` are primitives
//! - `["list", T]`, `["set", T]`, `["map", T]` are collections of `T`
//! - `["object", {"field": T, ...}]` is a structured object
//!
//! Parsing never fails. Anything unrecognized (unknown scalar names, unknown
//! parametrized kinds, malformed arrays, collections of collections) becomes a
//! string primitive so one odd descriptor cannot block the rest of the
//! provider from compiling.

use super::types::Kind;
use serde_json::Value;
use std::collections::BTreeMap;

/// Scalar type named by a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    String,
    Number,
    Bool,
}

impl Primitive {
    /// Compiled kind; numbers are integers in the compiled schema
    pub fn kind(self) -> Kind {
        match self {
            Primitive::String => Kind::String,
            Primitive::Number => Kind::Int,
            Primitive::Bool => Kind::Bool,
        }
    }
}

/// Parsed type descriptor
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeToken {
    Primitive(Primitive),
    List(Box<ShapeToken>),
    Set(Box<ShapeToken>),
    Map(Box<ShapeToken>),
    Object(BTreeMap<String, ShapeToken>),
}

impl ShapeToken {
    /// The shape everything unrecognized degrades to
    pub const STRING: ShapeToken = ShapeToken::Primitive(Primitive::String);
}

/// Parse a raw type descriptor
pub fn parse_shape(raw: &Value) -> ShapeToken {
    match raw {
        Value::String(name) => ShapeToken::Primitive(parse_primitive(name)),
        Value::Array(parts) => parse_parametrized(parts),
        _ => ShapeToken::STRING,
    }
}

fn parse_primitive(name: &str) -> Primitive {
    match name {
        "number" => Primitive::Number,
        "bool" => Primitive::Bool,
        // "string" and every scalar kind we don't know yet
        _ => Primitive::String,
    }
}

fn parse_parametrized(parts: &[Value]) -> ShapeToken {
    let [Value::String(kind), payload, ..] = parts else {
        return ShapeToken::STRING;
    };

    match kind.as_str() {
        "object" => ShapeToken::Object(parse_fields(payload)),
        "list" => ShapeToken::List(Box::new(parse_element(payload))),
        "set" => ShapeToken::Set(Box::new(parse_element(payload))),
        "map" => ShapeToken::Map(Box::new(parse_element(payload))),
        _ => ShapeToken::STRING,
    }
}

/// Collection elements are either primitives or objects
fn parse_element(payload: &Value) -> ShapeToken {
    match parse_shape(payload) {
        shape @ (ShapeToken::Primitive(_) | ShapeToken::Object(_)) => shape,
        _ => ShapeToken::STRING,
    }
}

fn parse_fields(payload: &Value) -> BTreeMap<String, ShapeToken> {
    match payload {
        Value::Object(fields) => fields
            .iter()
            .map(|(name, raw)| (name.clone(), parse_shape(raw)))
            .collect(),
        _ => BTreeMap::new(),
    }
}
