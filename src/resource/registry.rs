//! Resource Registry - compiled resource definitions by type name
//!
//! The registry is built once at startup from the bulk descriptor set plus the
//! hand-authored definitions, and is immutable afterwards. It is passed by
//! reference to whatever needs to look a resource type up.

use super::descriptor::{
    embedded_descriptors, load_descriptors, InitError, ResourceDescriptor, ResourceDescriptors,
};
use super::overrides;
use crate::schema::{compile_block, SchemaMap};
use std::collections::BTreeMap;
use std::path::Path;

/// One resource type and its compiled attribute schema
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDefinition {
    pub resource_type: String,
    pub schema: SchemaMap,
}

impl ResourceDefinition {
    pub fn new(resource_type: impl Into<String>, schema: SchemaMap) -> Self {
        Self {
            resource_type: resource_type.into(),
            schema,
        }
    }

    /// Compile a bulk descriptor
    pub fn compile(resource_type: &str, descriptor: &ResourceDescriptor) -> Self {
        Self::new(resource_type, compile_block(&descriptor.block))
    }

    pub fn attributes(&self) -> &SchemaMap {
        &self.schema
    }
}

/// All known resource types
#[derive(Debug, Clone, Default)]
pub struct Registry {
    resources: BTreeMap<String, ResourceDefinition>,
}

impl Registry {
    /// Compile every bulk descriptor, then let hand-authored definitions
    /// replace entries of the same name wholesale
    pub fn build(bulk: &ResourceDescriptors, hand_authored: Vec<ResourceDefinition>) -> Self {
        let mut resources: BTreeMap<String, ResourceDefinition> = bulk
            .iter()
            .map(|(name, descriptor)| {
                (name.clone(), ResourceDefinition::compile(name, descriptor))
            })
            .collect();

        for definition in hand_authored {
            if resources.contains_key(&definition.resource_type) {
                tracing::debug!("Overriding compiled schema for {}", definition.resource_type);
            }
            resources.insert(definition.resource_type.clone(), definition);
        }

        Self { resources }
    }

    /// Load descriptors (from `path`, or the bundled set when `None`) and
    /// build the registry with the built-in hand-authored definitions
    pub fn load(path: Option<&Path>, provider: &str) -> Result<Self, InitError> {
        let bulk = match path {
            Some(path) => load_descriptors(path, provider)?,
            None => embedded_descriptors(provider)?,
        };
        let registry = Self::build(&bulk, overrides::hand_authored());
        tracing::info!(
            "Registry ready: {} resource types ({} from descriptors)",
            registry.len(),
            bulk.len()
        );
        Ok(registry)
    }

    /// Get a resource definition by type name
    pub fn get(&self, resource_type: &str) -> Option<&ResourceDefinition> {
        self.resources.get(resource_type)
    }

    /// All resource type names, sorted
    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Build a registry from bulk descriptors and hand-authored definitions
pub fn build_registry(
    bulk: &ResourceDescriptors,
    hand_authored: Vec<ResourceDefinition>,
) -> Registry {
    Registry::build(bulk, hand_authored)
}
