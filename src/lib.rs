//! Schema-driven mock provider for AWS resource types
//!
//! Resource types are described by a provider schema dump. Each description
//! is compiled into an attribute schema, and every type then gets the same
//! generic create/read/update/delete behaviour against a mock cloud backend.
//!
//! # Module Structure
//!
//! - [`schema`] - Type descriptor parsing and schema compilation
//! - [`resource`] - Descriptor loading, the registry and the CRUD binder
//! - [`client`] - Backend client trait and its HTTP implementation
//! - [`instance`] - Per-resource attribute state
//! - [`value`] - Attribute values
//! - [`diagnostics`] - Operation results reported to the host
//! - [`config`] - Persistent settings

pub mod client;
pub mod config;
pub mod diagnostics;
pub mod instance;
pub mod resource;
pub mod schema;
pub mod value;

pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use instance::{ApplyError, Instance};
pub use resource::{build_registry, Registry, ResourceDefinition};
pub use value::{AttrMap, AttrValue};
