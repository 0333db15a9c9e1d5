//! Data model types for typed model graphs.
//!
//! This module contains the runtime representation of a model:
//! - Identifiers and arena handles
//! - Property values
//! - Nodes and their per-feature storage
//! - The graph arena and its id mapping
//! - Deltas and delta handlers

pub mod delta;
pub mod graph;
pub mod id;
pub mod node;
pub mod value;

pub use delta::{Delta, DeltaCollector, DeltaHandler};
pub use graph::{Graph, IdMapping};
pub use id::{derived_id, validate_id, Id, NodeHandle};
pub use node::{Link, Node, Parentage, ReferenceTarget};
pub use value::PropertyValue;
