//! Compiled attribute schema types
//!
//! The normalized tree every resource type is compiled into. A node carries
//! its value kind, the element schema for collections, the children for
//! nested objects, and the mutability flags the orchestration host needs.

use serde::Serialize;
use std::collections::BTreeMap;

/// Attribute name -> compiled schema
pub type SchemaMap = BTreeMap<String, AttributeSchema>;

/// Value kind of a compiled attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    String,
    Int,
    Bool,
    List,
    Set,
    Map,
    NestedObject,
}

impl Kind {
    /// Scalar kinds (string, int, bool)
    pub fn is_primitive(self) -> bool {
        matches!(self, Kind::String | Kind::Int | Kind::Bool)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Int => "int",
            Kind::Bool => "bool",
            Kind::List => "list",
            Kind::Set => "set",
            Kind::Map => "map",
            Kind::NestedObject => "nested_object",
        }
    }
}

/// Who may set an attribute: the caller, the backend, or both
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutability {
    /// Caller must supply a value
    RequiredInput,
    /// Caller may supply a value; the backend never fills it in
    OptionalInput,
    /// Caller may supply a value; otherwise the backend computes one
    OptionalComputed,
    /// Only the backend sets this value
    ComputedOnly,
}

impl Mutability {
    /// Derive mutability from declared descriptor flags.
    ///
    /// `required` wins over everything else. An attribute with no flag at
    /// all is treated as plain optional input.
    pub fn from_flags(required: bool, optional: bool, computed: bool) -> Self {
        match (required, optional, computed) {
            (true, _, _) => Mutability::RequiredInput,
            (false, true, true) => Mutability::OptionalComputed,
            (false, false, true) => Mutability::ComputedOnly,
            (false, _, false) => Mutability::OptionalInput,
        }
    }

    /// True for anything the caller may legitimately supply
    pub fn accepts_input(self) -> bool {
        !matches!(self, Mutability::ComputedOnly)
    }
}

/// Instance count constraints for nested blocks and singleton objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Cardinality {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
}

impl Cardinality {
    /// At most one instance
    pub fn singleton() -> Self {
        Self {
            min_items: None,
            max_items: Some(1),
        }
    }
}

/// Element type of a list, set or map
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    /// Scalar element
    Primitive(Kind),
    /// Structured element; the boxed schema is always a `NestedObject`
    Nested(Box<AttributeSchema>),
}

/// One compiled schema node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeSchema {
    pub kind: Kind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<Element>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<SchemaMap>,
    pub mutability: Mutability,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub sensitive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<Cardinality>,
}

impl AttributeSchema {
    pub fn primitive(kind: Kind, mutability: Mutability) -> Self {
        Self {
            kind,
            element: None,
            children: None,
            mutability,
            sensitive: false,
            cardinality: None,
        }
    }

    pub fn string(mutability: Mutability) -> Self {
        Self::primitive(Kind::String, mutability)
    }

    pub fn int(mutability: Mutability) -> Self {
        Self::primitive(Kind::Int, mutability)
    }

    pub fn bool(mutability: Mutability) -> Self {
        Self::primitive(Kind::Bool, mutability)
    }

    /// List, set or map with the given element
    pub fn collection(kind: Kind, element: Element, mutability: Mutability) -> Self {
        Self {
            kind,
            element: Some(element),
            children: None,
            mutability,
            sensitive: false,
            cardinality: None,
        }
    }

    pub fn nested_object(children: SchemaMap, mutability: Mutability) -> Self {
        Self {
            kind: Kind::NestedObject,
            element: None,
            children: Some(children),
            mutability,
            sensitive: false,
            cardinality: None,
        }
    }

    /// Collection whose elements are nested objects with `children`
    pub fn block(kind: Kind, children: SchemaMap, mutability: Mutability) -> Self {
        let element = Element::Nested(Box::new(Self::nested_object(children, mutability)));
        Self::collection(kind, element, mutability)
    }

    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = Some(cardinality);
        self
    }

    pub fn with_sensitive(mut self, sensitive: bool) -> Self {
        self.sensitive = sensitive;
        self
    }

    pub fn max_items(&self) -> Option<u32> {
        self.cardinality.and_then(|c| c.max_items)
    }

    /// Children of a nested object, or of a collection's nested element
    pub fn nested_children(&self) -> Option<&SchemaMap> {
        match (&self.children, &self.element) {
            (Some(children), _) => Some(children),
            (None, Some(Element::Nested(inner))) => inner.children.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutability_from_flags() {
        assert_eq!(
            Mutability::from_flags(true, false, false),
            Mutability::RequiredInput
        );
        assert_eq!(
            Mutability::from_flags(true, true, true),
            Mutability::RequiredInput
        );
        assert_eq!(
            Mutability::from_flags(false, true, true),
            Mutability::OptionalComputed
        );
        assert_eq!(
            Mutability::from_flags(false, true, false),
            Mutability::OptionalInput
        );
        assert_eq!(
            Mutability::from_flags(false, false, true),
            Mutability::ComputedOnly
        );
        assert_eq!(
            Mutability::from_flags(false, false, false),
            Mutability::OptionalInput
        );
    }

    #[test]
    fn test_only_computed_only_rejects_input() {
        assert!(Mutability::RequiredInput.accepts_input());
        assert!(Mutability::OptionalInput.accepts_input());
        assert!(Mutability::OptionalComputed.accepts_input());
        assert!(!Mutability::ComputedOnly.accepts_input());
    }

    #[test]
    fn test_block_children_reachable_through_element() {
        let mut children = SchemaMap::new();
        children.insert(
            "enabled".to_string(),
            AttributeSchema::bool(Mutability::OptionalInput),
        );
        let block = AttributeSchema::block(Kind::List, children, Mutability::OptionalComputed);

        let nested = block.nested_children().unwrap();
        assert_eq!(nested["enabled"].kind, Kind::Bool);
        assert!(block.children.is_none());
    }

    #[test]
    fn test_serialized_schema_omits_empty_fields() {
        let schema = AttributeSchema::string(Mutability::ComputedOnly);
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["kind"], "string");
        assert_eq!(json["mutability"], "computed_only");
        assert!(json.get("element").is_none());
        assert!(json.get("sensitive").is_none());
    }
}
