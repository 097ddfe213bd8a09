//! Relation type definitions.
//!
//! This module provides the `RelationType` enum which represents the kind
//! of relationship between entities, plus the two predicates the explorer
//! cares about: does it fan out into a collection, and does it hold the
//! foreign key.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of relationship between entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    /// One-to-one relationship
    HasOne,
    /// One-to-many relationship
    HasMany,
    /// Many-to-one relationship (`belongs_to`)
    BelongsTo,
    /// Relationship reached through an intermediate relation
    HasManyThrough,
    /// Many-to-many relationship through a bare join table
    HasAndBelongsToMany,
}

impl RelationType {
    /// `true` for relationships that can yield a growable collection of records
    pub fn is_collection(self) -> bool {
        matches!(
            self,
            RelationType::HasMany | RelationType::HasManyThrough | RelationType::HasAndBelongsToMany
        )
    }

    /// `true` when the declaring record stores the foreign key (`belongs_to`)
    pub fn is_owning(self) -> bool {
        matches!(self, RelationType::BelongsTo)
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RelationType::HasOne => "has_one",
            RelationType::HasMany => "has_many",
            RelationType::BelongsTo => "belongs_to",
            RelationType::HasManyThrough => "has_many_through",
            RelationType::HasAndBelongsToMany => "has_and_belongs_to_many",
        };
        f.write_str(name)
    }
}
