//! Resource definitions and lifecycle
//!
//! Resource types are data-driven: every type in the descriptor set gets a
//! compiled schema and the same generic CRUD behaviour, so new types need no
//! code changes. A handful of types carry hand-authored schemas instead.
//!
//! # Architecture
//!
//! - [`descriptor`] - Loads provider schema dumps (bundled or from disk)
//! - [`registry`] - Compiles descriptors into [`ResourceDefinition`]s and applies overrides
//! - [`overrides`] - Hand-authored definitions
//! - [`binder`] - Generic create/read/update/delete against a [`crate::client::ResourceClient`]
//!
//! # Example
//!
//! ```ignore
//! use tf_mock_provider::client::http::HttpResourceClient;
//! use tf_mock_provider::resource::{Registry, DEFAULT_PROVIDER};
//! use tf_mock_provider::Instance;
//!
//! async fn create_queue() -> anyhow::Result<()> {
//!     let registry = Registry::load(None, DEFAULT_PROVIDER)?;
//!     let client = HttpResourceClient::new("http://localhost:3000")?;
//!     let queue = registry.get("aws_sqs_queue").unwrap();
//!     let mut instance = Instance::new().with_attribute("name", "jobs");
//!     let diagnostics = queue.create(&client, &mut instance).await;
//!     Ok(())
//! }
//! ```

pub mod binder;
pub mod descriptor;
pub mod overrides;
mod registry;

pub use binder::{apply, extract};
pub use descriptor::{
    embedded_descriptors, load_descriptors, parse_descriptors, InitError, ResourceDescriptor,
    ResourceDescriptors, DEFAULT_PROVIDER,
};
pub use registry::*;
