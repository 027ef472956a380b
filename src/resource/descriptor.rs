//! Bulk descriptor loading
//!
//! Reads a provider schema dump and returns the raw block descriptor of every
//! resource type for one provider identity. A dump is bundled into the binary
//! and used when no external file is configured.

use crate::schema::{null_as_default, BlockDescriptor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Provider identity the bundled descriptors are published under
pub const DEFAULT_PROVIDER: &str = "registry.terraform.io/hashicorp/aws";

/// Bundled descriptor dump (compiled into the binary)
const EMBEDDED_DESCRIPTORS: &str = include_str!("../resources/provider-schema.json");

/// Resource type name -> raw descriptor
pub type ResourceDescriptors = BTreeMap<String, ResourceDescriptor>;

/// Root of a provider schema dump
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSchemaFile {
    #[serde(default, deserialize_with = "null_as_default")]
    pub provider_schemas: BTreeMap<String, ProviderEntry>,
}

/// Schemas published by one provider
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderEntry {
    #[serde(default, deserialize_with = "null_entries_as_default")]
    pub resource_schemas: ResourceDescriptors,
}

/// One resource type's descriptor
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceDescriptor {
    #[serde(default, deserialize_with = "null_as_default")]
    pub block: BlockDescriptor,
}

// A `null` resource entry compiles to an empty schema rather than failing
// the whole document.
fn null_entries_as_default<'de, D>(deserializer: D) -> Result<ResourceDescriptors, D::Error>
where
    D: Deserializer<'de>,
{
    let entries: BTreeMap<String, Option<ResourceDescriptor>> = null_as_default(deserializer)?;
    Ok(entries
        .into_iter()
        .map(|(name, descriptor)| (name, descriptor.unwrap_or_default()))
        .collect())
}

/// Errors that abort registry initialization
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("failed to read descriptors from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed descriptor document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("provider {0} not found in descriptor document")]
    MissingProvider(String),
}

/// Parse a descriptor document and select `provider`'s resource schemas
pub fn parse_descriptors(raw: &str, provider: &str) -> Result<ResourceDescriptors, InitError> {
    let mut file: ProviderSchemaFile = serde_json::from_str(raw)?;
    let entry = file
        .provider_schemas
        .remove(provider)
        .ok_or_else(|| InitError::MissingProvider(provider.to_string()))?;

    tracing::debug!(
        "Loaded {} resource descriptors for {}",
        entry.resource_schemas.len(),
        provider
    );
    Ok(entry.resource_schemas)
}

/// Load descriptors from a file on disk
pub fn load_descriptors(path: &Path, provider: &str) -> Result<ResourceDescriptors, InitError> {
    let raw = std::fs::read_to_string(path).map_err(|source| InitError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_descriptors(&raw, provider)
}

/// Load the bundled descriptors
pub fn embedded_descriptors(provider: &str) -> Result<ResourceDescriptors, InitError> {
    parse_descriptors(EMBEDDED_DESCRIPTORS, provider)
}
