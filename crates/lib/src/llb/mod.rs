//! Build graph construction.
//!
//! Operations are content addressed: each one is encoded to canonical bytes
//! and identified by the digest of those bytes. Later operations reference
//! earlier ones by digest, so a [`Definition`] is always a DAG.
//!
//! # Submodules
//!
//! - [`definition`] - the graph, its append-only builder, and its wire form
//! - [`layer`] - typed per-layer configuration
//! - [`source`] - local-context source nodes
//! - [`types`] - operations, inputs, mounts and metadata

pub mod definition;
pub mod layer;
pub mod source;
pub mod types;

pub use definition::{Definition, DefinitionBuilder, GraphError};
pub use layer::LayerConfig;
pub use source::LocalSource;
pub use types::*;
