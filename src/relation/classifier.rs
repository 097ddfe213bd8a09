//! Relationship classification
//!
//! Two questions are asked of every relationship the explorer meets: should it be followed at
//! all, and does following it establish an insert-ordering dependency.

use crate::entity::EntityType;
use crate::relation::def::RelationDef;
use std::collections::HashSet;

/// Whether `def`, resolved to `target` for the current record, should be expanded
///
/// Collection relationships (`has_many`, through, many-to-many) into a type that already has
/// visited records are not re-expanded. Single-record relationships are always eligible.
pub fn should_traverse(def: &RelationDef, target: &EntityType, visited_types: &HashSet<EntityType>) -> bool {
    !(def.rel_type().is_collection() && visited_types.contains(target))
}

/// Whether `def` makes the declaring type depend on its target
///
/// Only owning relationships qualify: the declaring record holds the foreign key and must be
/// inserted after the record it references.
pub fn is_dependency_source(def: &RelationDef) -> bool {
    def.rel_type().is_owning()
}
