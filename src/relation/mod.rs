//! Relation module for entity relationships.
//!
//! This module provides the relationship metadata the explorer walks:
//! - belongs_to: Many-to-one relationship (owning; holds the foreign key)
//! - has_one: One-to-one relationship
//! - has_many: One-to-many relationship
//! - has_many_through: Relationship reached through an intermediate relation
//! - has_and_belongs_to_many: Many-to-many relationship via a bare join table
//!
//! # Architecture
//!
//! - **Def**: Relation definition types (`RelationDef`, `RelationStep`, `RelationType`)
//! - **Classifier**: Traversal and dependency decisions for a relation

// Relation definitions
pub mod def;
#[doc(inline)]
pub use def::{RelationDef, RelationStep, RelationTarget, RelationType};

// Traversal decisions
pub mod classifier;
#[doc(inline)]
pub use classifier::{is_dependency_source, should_traverse};
