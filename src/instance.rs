//! Resource instance state
//!
//! One concrete resource's attribute values plus its identity, as handed to
//! the CRUD binder by the orchestration host. Writes go through
//! [`Instance::set`], which conforms the value to the attribute's compiled
//! schema before storing it.

use crate::schema::{AttributeSchema, Element, Kind, SchemaMap};
use crate::value::{AttrMap, AttrValue, ValueError};
use std::collections::BTreeMap;

/// Why a value could not be written onto an instance
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApplyError {
    #[error("expected {expected}, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("expected at most {max} items, got {found}")]
    TooManyItems { max: u32, found: usize },
    #[error(transparent)]
    InvalidValue(#[from] ValueError),
    #[error("{field}: {source}")]
    Field {
        field: String,
        #[source]
        source: Box<ApplyError>,
    },
}

impl ApplyError {
    fn at(self, field: impl Into<String>) -> Self {
        ApplyError::Field {
            field: field.into(),
            source: Box::new(self),
        }
    }

    fn mismatch(expected: Kind, found: &AttrValue) -> Self {
        ApplyError::TypeMismatch {
            expected: expected.as_str(),
            found: found.kind_name(),
        }
    }
}

/// In-memory state of one resource
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Instance {
    id: Option<String>,
    state: AttrMap,
}

impl Instance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instance that already exists remotely under `id`
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            state: AttrMap::new(),
        }
    }

    /// Seed a value as supplied by the host, without schema conformance
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.state.insert(name.into(), value.into());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Signals the host that the resource no longer exists
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.state.get(name)
    }

    pub fn state(&self) -> &AttrMap {
        &self.state
    }

    /// Conform `value` to `schema` and store it under `name`
    pub fn set(
        &mut self,
        name: &str,
        value: AttrValue,
        schema: &AttributeSchema,
    ) -> Result<(), ApplyError> {
        let conformed = conform(value, schema)?;
        self.state.insert(name.to_string(), conformed);
        Ok(())
    }

    pub fn unset(&mut self, name: &str) {
        self.state.remove(name);
    }
}

/// Check a value against a compiled schema node, normalizing where the
/// representation is flexible (scalar coercion, set deduplication, singleton
/// objects given as a one-element sequence).
pub fn conform(value: AttrValue, schema: &AttributeSchema) -> Result<AttrValue, ApplyError> {
    match schema.kind {
        Kind::String | Kind::Int | Kind::Bool => conform_primitive(value, schema.kind),
        Kind::List => conform_sequence(value, schema, false),
        Kind::Set => conform_sequence(value, schema, true),
        Kind::Map => conform_map(value, schema),
        Kind::NestedObject => conform_object(value, schema),
    }
}

fn conform_primitive(value: AttrValue, kind: Kind) -> Result<AttrValue, ApplyError> {
    match (kind, value) {
        (Kind::String, v @ AttrValue::String(_)) => Ok(v),
        (Kind::String, AttrValue::Int(i)) => Ok(AttrValue::String(i.to_string())),
        (Kind::String, AttrValue::Bool(b)) => Ok(AttrValue::String(b.to_string())),
        (Kind::Int, v @ AttrValue::Int(_)) => Ok(v),
        (Kind::Int, AttrValue::String(s)) => s
            .parse::<i64>()
            .map(AttrValue::Int)
            .map_err(|_| ApplyError::mismatch(Kind::Int, &AttrValue::String(s))),
        (Kind::Bool, v @ AttrValue::Bool(_)) => Ok(v),
        (Kind::Bool, AttrValue::String(s)) => match s.as_str() {
            "true" => Ok(AttrValue::Bool(true)),
            "false" => Ok(AttrValue::Bool(false)),
            _ => Err(ApplyError::mismatch(Kind::Bool, &AttrValue::String(s))),
        },
        (kind, other) => Err(ApplyError::mismatch(kind, &other)),
    }
}

fn conform_element(value: AttrValue, element: Option<&Element>) -> Result<AttrValue, ApplyError> {
    match element {
        Some(Element::Primitive(kind)) => conform_primitive(value, *kind),
        Some(Element::Nested(inner)) => match inner.children.as_ref() {
            Some(children) => conform_fields(value, children),
            None => Ok(value),
        },
        None => Ok(value),
    }
}

fn conform_sequence(
    value: AttrValue,
    schema: &AttributeSchema,
    dedupe: bool,
) -> Result<AttrValue, ApplyError> {
    let items = match value {
        AttrValue::Sequence(items) => items,
        other => return Err(ApplyError::mismatch(schema.kind, &other)),
    };

    if let Some(max) = schema.max_items() {
        if items.len() > max as usize {
            return Err(ApplyError::TooManyItems {
                max,
                found: items.len(),
            });
        }
    }

    let mut conformed: Vec<AttrValue> = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let item = conform_element(item, schema.element.as_ref()).map_err(|e| e.at(index.to_string()))?;
        if dedupe && conformed.contains(&item) {
            continue;
        }
        conformed.push(item);
    }
    Ok(AttrValue::Sequence(conformed))
}

fn conform_map(value: AttrValue, schema: &AttributeSchema) -> Result<AttrValue, ApplyError> {
    let entries = match value {
        AttrValue::Mapping(entries) => entries,
        other => return Err(ApplyError::mismatch(Kind::Map, &other)),
    };

    let mut conformed = BTreeMap::new();
    for (key, entry) in entries {
        let entry = conform_element(entry, schema.element.as_ref()).map_err(|e| e.at(key.as_str()))?;
        conformed.insert(key, entry);
    }
    Ok(AttrValue::Mapping(conformed))
}

fn conform_object(value: AttrValue, schema: &AttributeSchema) -> Result<AttrValue, ApplyError> {
    let empty = SchemaMap::new();
    let children = schema.children.as_ref().unwrap_or(&empty);

    match value {
        mapping @ AttrValue::Mapping(_) => conform_fields(mapping, children),
        AttrValue::Sequence(mut items) if items.len() <= 1 => match items.pop() {
            Some(only) => conform_fields(only, children).map_err(|e| e.at("0")),
            None => Ok(AttrValue::Mapping(BTreeMap::new())),
        },
        AttrValue::Sequence(items) => Err(ApplyError::TooManyItems {
            max: 1,
            found: items.len(),
        }),
        other => Err(ApplyError::mismatch(Kind::NestedObject, &other)),
    }
}

// Unknown keys are dropped, matching how top-level attributes outside the
// schema are ignored.
fn conform_fields(value: AttrValue, children: &SchemaMap) -> Result<AttrValue, ApplyError> {
    let fields = match value {
        AttrValue::Mapping(fields) => fields,
        other => return Err(ApplyError::mismatch(Kind::NestedObject, &other)),
    };

    let mut conformed = BTreeMap::new();
    for (name, field) in fields {
        let Some(child) = children.get(&name) else {
            continue;
        };
        let field = conform(field, child).map_err(|e| e.at(name.as_str()))?;
        conformed.insert(name, field);
    }
    Ok(AttrValue::Mapping(conformed))
}
