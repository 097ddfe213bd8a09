//! Relation definition module for storing relationship metadata.
//!
//! This module provides the types used to describe relationships between entity types:
//! the `RelationType` enum, the `RelationStep` hop, and the `RelationDef` chain.

pub mod types;
pub mod struct_def;

// Re-export public types
#[doc(inline)]
pub use types::RelationType;
#[doc(inline)]
pub use struct_def::{RelationDef, RelationStep, RelationTarget};
