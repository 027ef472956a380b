//! Schema compilation
//!
//! Provider schema dumps describe each resource type as a block of typed
//! attributes plus nested repeatable blocks. This module turns those
//! descriptors into [`AttributeSchema`] trees the CRUD binder works with.
//!
//! # Module Structure
//!
//! - [`shape`] - Parses raw type descriptors into shape tokens
//! - [`compile`] - Compiles shapes and whole blocks into schema trees
//! - [`types`] - The compiled schema node types

pub mod compile;
pub mod shape;
pub mod types;

pub use compile::{
    compile_attribute, compile_block, null_as_default, AttributeDescriptor, BlockDescriptor,
    NestedBlockDescriptor, IDENTITY_ATTRIBUTE, TIMEOUTS_BLOCK,
};
pub use shape::{parse_shape, Primitive, ShapeToken};
pub use types::{AttributeSchema, Cardinality, Element, Kind, Mutability, SchemaMap};
