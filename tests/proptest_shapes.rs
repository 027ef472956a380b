//! Property-based tests using proptest
//!
//! These tests verify that descriptor parsing and schema compilation are
//! total over arbitrary input, that reserved names never leak into compiled
//! schemas, and that mutability is derived consistently.

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use tf_mock_provider::schema::{
    compile_attribute, compile_block, parse_shape, AttributeSchema, BlockDescriptor, Element,
    Kind, Mutability, SchemaMap,
};
use tf_mock_provider::{instance::conform, AttrValue};

/// Arbitrary JSON biased towards descriptor-like values
fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        prop_oneof![
            Just("string"),
            Just("number"),
            Just("bool"),
            Just("list"),
            Just("set"),
            Just("map"),
            Just("object"),
            Just("dynamic"),
        ]
        .prop_map(Value::from),
        "[a-z]{0,8}".prop_map(Value::from),
    ];

    leaf.prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|fields| Value::Object(fields.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

fn arb_attribute() -> impl Strategy<Value = Value> {
    (arb_json(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(shape, required, optional, computed)| {
            json!({
                "type": shape,
                "required": required,
                "optional": optional,
                "computed": computed
            })
        },
    )
}

fn arb_attribute_name() -> impl Strategy<Value = String> {
    prop_oneof![Just("id".to_string()), "[a-z]{1,8}"]
}

fn arb_block_name() -> impl Strategy<Value = String> {
    prop_oneof![Just("timeouts".to_string()), "blk_[a-z]{1,6}"]
}

/// Raw block descriptors with nested blocks up to three levels deep
fn arb_block() -> impl Strategy<Value = Value> {
    let leaf = prop::collection::btree_map(arb_attribute_name(), arb_attribute(), 0..6)
        .prop_map(|attributes| json!({ "attributes": attributes }));

    leaf.prop_recursive(3, 16, 3, |inner| {
        let nested = (
            inner,
            prop_oneof![Just("list"), Just("set"), Just("single"), Just("group")],
            proptest::option::of(0u32..3),
            proptest::option::of(0u32..4),
        )
            .prop_map(|(block, mode, min_items, max_items)| {
                json!({
                    "nesting_mode": mode,
                    "block": block,
                    "min_items": min_items,
                    "max_items": max_items
                })
            });

        (
            prop::collection::btree_map(arb_attribute_name(), arb_attribute(), 0..4),
            prop::collection::btree_map(arb_block_name(), nested, 0..3),
        )
            .prop_map(|(attributes, block_types)| {
                json!({ "attributes": attributes, "block_types": block_types })
            })
    })
}

fn keys(raw: &Value, field: &str) -> BTreeSet<String> {
    raw.get(field)
        .and_then(Value::as_object)
        .map(|fields| fields.keys().cloned().collect())
        .unwrap_or_default()
}

/// Check a compiled block against its raw descriptor, recursively
fn check_block(raw: &Value, compiled: &SchemaMap) -> Result<(), TestCaseError> {
    let mut expected: BTreeSet<String> = keys(raw, "attributes");
    expected.remove("id");
    let mut blocks = keys(raw, "block_types");
    blocks.remove("timeouts");
    expected.extend(blocks.iter().cloned());

    let actual: BTreeSet<String> = compiled.keys().cloned().collect();
    prop_assert_eq!(actual, expected);

    for name in &blocks {
        let nested = &raw["block_types"][name.as_str()];
        let schema = &compiled[name.as_str()];

        let required = nested["min_items"].as_u64().is_some_and(|n| n > 0);
        let expected_mutability = if required {
            Mutability::RequiredInput
        } else {
            Mutability::OptionalComputed
        };
        prop_assert_eq!(schema.mutability, expected_mutability);

        let expected_kind = if nested["nesting_mode"] == "set" {
            Kind::Set
        } else {
            Kind::List
        };
        prop_assert_eq!(schema.kind, expected_kind);

        let children = schema
            .nested_children()
            .ok_or_else(|| TestCaseError::fail("nested block without children"))?;
        check_block(&nested["block"], children)?;
    }

    Ok(())
}

/// Structural well-formedness of a compiled node
fn check_shape(schema: &AttributeSchema) -> Result<(), TestCaseError> {
    match schema.kind {
        Kind::String | Kind::Int | Kind::Bool => {
            prop_assert!(schema.element.is_none());
            prop_assert!(schema.children.is_none());
        }
        Kind::List | Kind::Set | Kind::Map => {
            prop_assert!(schema.children.is_none());
            match &schema.element {
                Some(Element::Primitive(kind)) => prop_assert!(kind.is_primitive()),
                Some(Element::Nested(inner)) => {
                    prop_assert_eq!(inner.kind, Kind::NestedObject);
                    check_shape(inner)?;
                }
                None => return Err(TestCaseError::fail("collection without element")),
            }
        }
        Kind::NestedObject => {
            prop_assert!(schema.element.is_none());
            let children = schema
                .children
                .as_ref()
                .ok_or_else(|| TestCaseError::fail("object without children"))?;
            for child in children.values() {
                prop_assert_eq!(child.mutability, Mutability::OptionalComputed);
                check_shape(child)?;
            }
        }
    }
    Ok(())
}

proptest! {
    /// Any JSON value parses and compiles to a well-formed schema
    #[test]
    fn compilation_is_total(raw in arb_json()) {
        let schema = compile_attribute(&parse_shape(&raw), Mutability::OptionalInput);
        prop_assert_eq!(schema.mutability, Mutability::OptionalInput);
        check_shape(&schema)?;
    }

    /// Non-array, non-string descriptors always degrade to a string
    #[test]
    fn scalars_degrade_to_string(n in any::<i64>(), b in any::<bool>()) {
        for raw in [json!(n), json!(b), Value::Null, json!({})] {
            let schema = compile_attribute(&parse_shape(&raw), Mutability::ComputedOnly);
            prop_assert_eq!(schema.kind, Kind::String);
        }
    }

    /// Reserved names are dropped at every level and nothing else is
    #[test]
    fn reserved_names_never_compiled(raw in arb_block()) {
        let block: BlockDescriptor = serde_json::from_value(raw.clone())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let compiled = compile_block(&block);
        check_block(&raw, &compiled)?;
    }

    /// Compilation is deterministic
    #[test]
    fn compile_block_is_deterministic(raw in arb_block()) {
        let block: BlockDescriptor = serde_json::from_value(raw)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(compile_block(&block), compile_block(&block));
    }

    /// Flag combinations map onto mutability consistently
    #[test]
    fn mutability_from_flags(required in any::<bool>(), optional in any::<bool>(), computed in any::<bool>()) {
        let mutability = Mutability::from_flags(required, optional, computed);

        if required {
            prop_assert_eq!(mutability, Mutability::RequiredInput);
        }
        prop_assert_eq!(
            mutability == Mutability::ComputedOnly,
            computed && !required && !optional
        );
        prop_assert_eq!(mutability.accepts_input(), mutability != Mutability::ComputedOnly);
    }

    /// Set conformance removes duplicates but keeps first-seen order
    #[test]
    fn sets_are_deduplicated(items in prop::collection::vec(0i64..10, 0..20)) {
        let schema = AttributeSchema::collection(
            Kind::Set,
            Element::Primitive(Kind::Int),
            Mutability::OptionalInput,
        );
        let value = AttrValue::Sequence(items.iter().copied().map(AttrValue::Int).collect());

        let AttrValue::Sequence(conformed) = conform(value, &schema).unwrap() else {
            return Err(TestCaseError::fail("set did not conform to a sequence"));
        };

        let mut expected: Vec<i64> = Vec::new();
        for item in items {
            if !expected.contains(&item) {
                expected.push(item);
            }
        }
        let expected: Vec<AttrValue> = expected.into_iter().map(AttrValue::Int).collect();
        prop_assert_eq!(conformed, expected);
    }
}
