//! Schema compiler
//!
//! Converts parsed shapes and provider block descriptors into
//! [`AttributeSchema`] trees.

use super::shape::{parse_shape, ShapeToken};
use super::types::{AttributeSchema, Cardinality, Element, Kind, Mutability, SchemaMap};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Identity is managed outside the attribute schema
pub const IDENTITY_ATTRIBUTE: &str = "id";

/// Operational metadata, never resource state
pub const TIMEOUTS_BLOCK: &str = "timeouts";

/// Treat an explicit `null` like a missing field
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A block as it appears in a provider schema dump
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockDescriptor {
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: BTreeMap<String, AttributeDescriptor>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub block_types: BTreeMap<String, NestedBlockDescriptor>,
}

/// One leaf attribute of a block
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttributeDescriptor {
    /// Raw type descriptor, parsed with [`parse_shape`]
    #[serde(rename = "type", default)]
    pub shape: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub required: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub optional: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub computed: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sensitive: bool,
}

/// A nested repeatable block
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NestedBlockDescriptor {
    #[serde(default)]
    pub nesting_mode: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub block: BlockDescriptor,
    #[serde(default)]
    pub min_items: Option<u32>,
    #[serde(default)]
    pub max_items: Option<u32>,
}

/// Compile one attribute shape with the given mutability.
///
/// A bare object here is a singleton nested block (`max_items = 1`); the same
/// object inside a list or set is one element of a multi-valued collection
/// and gets no cardinality.
pub fn compile_attribute(shape: &ShapeToken, mutability: Mutability) -> AttributeSchema {
    match shape {
        ShapeToken::Primitive(primitive) => AttributeSchema::primitive(primitive.kind(), mutability),
        ShapeToken::Object(fields) => {
            compile_object(fields, mutability).with_cardinality(Cardinality::singleton())
        }
        ShapeToken::List(inner) => compile_collection(Kind::List, inner, mutability),
        ShapeToken::Set(inner) => compile_collection(Kind::Set, inner, mutability),
        ShapeToken::Map(inner) => compile_collection(Kind::Map, inner, mutability),
    }
}

// Fields of a free-form object are never required; the enclosing
// attribute's own flags govern presence.
fn compile_object(fields: &BTreeMap<String, ShapeToken>, mutability: Mutability) -> AttributeSchema {
    let children = fields
        .iter()
        .map(|(name, shape)| {
            (
                name.clone(),
                compile_attribute(shape, Mutability::OptionalComputed),
            )
        })
        .collect();
    AttributeSchema::nested_object(children, mutability)
}

fn compile_collection(kind: Kind, inner: &ShapeToken, mutability: Mutability) -> AttributeSchema {
    let element = match inner {
        ShapeToken::Primitive(primitive) => Element::Primitive(primitive.kind()),
        ShapeToken::Object(fields) => Element::Nested(Box::new(compile_object(fields, mutability))),
        // The parser already flattens nested collections
        _ => Element::Primitive(Kind::String),
    };
    AttributeSchema::collection(kind, element, mutability)
}

/// Compile a whole block into a name -> schema mapping.
///
/// `id` attributes and `timeouts` blocks are dropped at every level. Leaf
/// flags are taken verbatim; nested block mutability comes from `min_items`.
pub fn compile_block(block: &BlockDescriptor) -> SchemaMap {
    let mut result = SchemaMap::new();

    for (name, attribute) in &block.attributes {
        if name == IDENTITY_ATTRIBUTE {
            continue;
        }

        let mutability =
            Mutability::from_flags(attribute.required, attribute.optional, attribute.computed);
        let schema = compile_attribute(&parse_shape(&attribute.shape), mutability)
            .with_sensitive(attribute.sensitive);
        result.insert(name.clone(), schema);
    }

    for (name, nested) in &block.block_types {
        if name == TIMEOUTS_BLOCK {
            continue;
        }
        result.insert(name.clone(), compile_nested_block(nested));
    }

    result
}

fn compile_nested_block(nested: &NestedBlockDescriptor) -> AttributeSchema {
    let min_items = nested.min_items.filter(|&n| n > 0);
    let mutability = if min_items.is_some() {
        Mutability::RequiredInput
    } else {
        Mutability::OptionalComputed
    };

    let (kind, mut cardinality) = match nested.nesting_mode.as_deref() {
        Some("set") => (Kind::Set, Cardinality::default()),
        Some("single") => (Kind::List, Cardinality::singleton()),
        _ => (Kind::List, Cardinality::default()),
    };

    if let Some(max) = nested.max_items.filter(|&n| n > 0) {
        cardinality.max_items = Some(max);
    }
    if min_items.is_some() {
        cardinality.min_items = min_items;
    }

    let children = compile_block(&nested.block);
    let schema = AttributeSchema::block(kind, children, mutability);

    if cardinality == Cardinality::default() {
        schema
    } else {
        schema.with_cardinality(cardinality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compile_raw(raw: Value) -> AttributeSchema {
        compile_attribute(&parse_shape(&raw), Mutability::OptionalInput)
    }

    fn block(raw: Value) -> BlockDescriptor {
        serde_json::from_value(raw).expect("valid block descriptor")
    }

    #[test]
    fn test_primitive_kinds() {
        for (raw, kind) in [("string", Kind::String), ("number", Kind::Int), ("bool", Kind::Bool)] {
            let schema = compile_raw(json!(raw));
            assert_eq!(schema.kind, kind);
            assert!(schema.element.is_none());
            assert!(schema.children.is_none());
        }
    }

    #[test]
    fn test_unknown_scalar_compiles_to_string() {
        assert_eq!(compile_raw(json!("dynamic")).kind, Kind::String);
    }

    #[test]
    fn test_collection_kinds() {
        let cases = [
            (json!(["list", "string"]), Kind::List, Kind::String),
            (json!(["set", "string"]), Kind::Set, Kind::String),
            (json!(["map", "string"]), Kind::Map, Kind::String),
            (json!(["list", "number"]), Kind::List, Kind::Int),
            (json!(["set", "bool"]), Kind::Set, Kind::Bool),
        ];

        for (raw, kind, element) in cases {
            let schema = compile_raw(raw);
            assert_eq!(schema.kind, kind);
            assert_eq!(schema.element, Some(Element::Primitive(element)));
            assert_eq!(schema.mutability, Mutability::OptionalInput);
        }
    }

    #[test]
    fn test_set_of_objects() {
        let schema = compile_raw(json!(["set", ["object", {"name": "string", "count": "number"}]]));
        assert_eq!(schema.kind, Kind::Set);

        let Some(Element::Nested(element)) = &schema.element else {
            panic!("expected nested element");
        };
        assert_eq!(element.kind, Kind::NestedObject);
        assert!(element.cardinality.is_none());

        let children = element.children.as_ref().unwrap();
        assert_eq!(children["name"].kind, Kind::String);
        assert_eq!(children["count"].kind, Kind::Int);
        assert_eq!(children["name"].mutability, Mutability::OptionalComputed);
    }

    #[test]
    fn test_bare_object_is_singleton() {
        let schema = compile_attribute(
            &parse_shape(&json!(["object", {"bucket": "string", "prefix": "string"}])),
            Mutability::RequiredInput,
        );
        assert_eq!(schema.kind, Kind::NestedObject);
        assert_eq!(schema.max_items(), Some(1));
        assert_eq!(schema.mutability, Mutability::RequiredInput);

        let children = schema.children.as_ref().unwrap();
        assert_eq!(children.len(), 2);
        assert!(children
            .values()
            .all(|c| c.mutability == Mutability::OptionalComputed));
    }

    #[test]
    fn test_block_skips_id() {
        let schemas = compile_block(&block(json!({
            "attributes": {
                "bucket": {"type": "string", "optional": true, "computed": true},
                "id": {"type": "string", "required": true}
            }
        })));

        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas["bucket"].mutability, Mutability::OptionalComputed);
    }

    #[test]
    fn test_block_skips_timeouts() {
        let schemas = compile_block(&block(json!({
            "attributes": {"name": {"type": "string", "required": true}},
            "block_types": {
                "timeouts": {"nesting_mode": "single", "block": {"attributes": {
                    "create": {"type": "string", "optional": true}
                }}}
            }
        })));

        assert!(!schemas.contains_key("timeouts"));
        assert!(schemas.contains_key("name"));
    }

    #[test]
    fn test_leaf_flags_are_verbatim() {
        let schemas = compile_block(&block(json!({
            "attributes": {
                "arn": {"type": "string", "computed": true},
                "password": {"type": "string", "optional": true, "sensitive": true},
                "name": {"type": "string", "required": true}
            }
        })));

        assert_eq!(schemas["arn"].mutability, Mutability::ComputedOnly);
        assert_eq!(schemas["password"].mutability, Mutability::OptionalInput);
        assert!(schemas["password"].sensitive);
        assert!(!schemas["name"].sensitive);
        assert_eq!(schemas["name"].mutability, Mutability::RequiredInput);
    }

    #[test]
    fn test_nested_block_nesting_modes() {
        let schemas = compile_block(&block(json!({
            "block_types": {
                "ingress": {"nesting_mode": "set", "block": {}},
                "versioning": {"nesting_mode": "single", "block": {}},
                "rule": {"nesting_mode": "list", "block": {}},
                "other": {"block": {}}
            }
        })));

        assert_eq!(schemas["ingress"].kind, Kind::Set);
        assert_eq!(schemas["ingress"].max_items(), None);
        assert_eq!(schemas["versioning"].kind, Kind::List);
        assert_eq!(schemas["versioning"].max_items(), Some(1));
        assert_eq!(schemas["rule"].kind, Kind::List);
        assert_eq!(schemas["other"].kind, Kind::List);
        assert!(schemas["other"].cardinality.is_none());
    }

    #[test]
    fn test_nested_block_cardinality_and_mutability() {
        let schemas = compile_block(&block(json!({
            "block_types": {
                "required_rule": {"nesting_mode": "list", "min_items": 1, "max_items": 5, "block": {}},
                "zero_min": {"nesting_mode": "list", "min_items": 0, "block": {}},
                "absent_min": {"nesting_mode": "set", "block": {}},
                "single_capped": {"nesting_mode": "single", "max_items": 3, "block": {}}
            }
        })));

        let required = &schemas["required_rule"];
        assert_eq!(required.mutability, Mutability::RequiredInput);
        assert_eq!(
            required.cardinality,
            Some(Cardinality {
                min_items: Some(1),
                max_items: Some(5)
            })
        );

        assert_eq!(schemas["zero_min"].mutability, Mutability::OptionalComputed);
        assert_eq!(schemas["absent_min"].mutability, Mutability::OptionalComputed);
        assert_eq!(schemas["single_capped"].max_items(), Some(3));
    }

    #[test]
    fn test_nested_block_recurses() {
        let schemas = compile_block(&block(json!({
            "block_types": {
                "rule": {
                    "nesting_mode": "list",
                    "block": {
                        "attributes": {
                            "id": {"type": "string", "optional": true},
                            "days": {"type": "number", "required": true}
                        },
                        "block_types": {
                            "filter": {"nesting_mode": "single", "block": {
                                "attributes": {"prefix": {"type": "string", "optional": true}}
                            }},
                            "timeouts": {"nesting_mode": "single", "block": {}}
                        }
                    }
                }
            }
        })));

        let children = schemas["rule"].nested_children().unwrap();
        assert!(!children.contains_key("id"));
        assert!(!children.contains_key("timeouts"));
        assert_eq!(children["days"].kind, Kind::Int);
        assert_eq!(children["days"].mutability, Mutability::RequiredInput);

        let filter = children["filter"].nested_children().unwrap();
        assert_eq!(filter["prefix"].mutability, Mutability::OptionalInput);
    }

    #[test]
    fn test_null_metadata_is_treated_as_missing() {
        let schemas = compile_block(&block(json!({
            "attributes": {
                "name": {"type": "string", "required": null, "optional": true, "computed": null},
                "arn": {"type": "string", "computed": true, "sensitive": null}
            },
            "block_types": {
                "rule": {"nesting_mode": "list", "block": null, "min_items": null},
                "filter": {"nesting_mode": "single", "block": {"attributes": null, "block_types": null}}
            }
        })));

        assert_eq!(schemas["name"].mutability, Mutability::OptionalInput);
        assert_eq!(schemas["arn"].mutability, Mutability::ComputedOnly);
        assert!(!schemas["arn"].sensitive);
        assert_eq!(schemas["rule"].mutability, Mutability::OptionalComputed);
        assert!(schemas["rule"].nested_children().unwrap().is_empty());
        assert!(schemas["filter"].nested_children().unwrap().is_empty());
    }

    #[test]
    fn test_attribute_without_type_degrades() {
        let schemas = compile_block(&block(json!({
            "attributes": {"nested": {"optional": true}}
        })));
        assert_eq!(schemas["nested"].kind, Kind::String);
    }
}
