//! Dependency graph between entity types
//!
//! Maps each entity type to the types it must be inserted after. Keys and each dependency set
//! keep their insertion order; the solver relies on that for a reproducible order.

use crate::entity::EntityType;
use std::collections::HashMap;

/// Insertion-ordered map from entity type to the ordered set of types it depends on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    order: Vec<EntityType>,
    deps: HashMap<EntityType, Vec<EntityType>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure `entity_type` is a key, with an empty dependency set if it is new
    ///
    /// Returns `true` if the type was added.
    pub fn ensure(&mut self, entity_type: &EntityType) -> bool {
        if self.deps.contains_key(entity_type) {
            return false;
        }
        self.order.push(entity_type.clone());
        self.deps.insert(entity_type.clone(), Vec::new());
        true
    }

    /// Record that `from` must be inserted after `to`
    ///
    /// Both types become keys. Self-dependencies and duplicates are ignored; returns `true`
    /// only when a new edge was recorded.
    pub fn add_dependency(&mut self, from: &EntityType, to: &EntityType) -> bool {
        self.ensure(from);
        self.ensure(to);
        if from == to {
            return false;
        }
        let Some(deps) = self.deps.get_mut(from) else {
            return false;
        };
        if deps.contains(to) {
            return false;
        }
        deps.push(to.clone());
        true
    }

    pub fn contains(&self, entity_type: &EntityType) -> bool {
        self.deps.contains_key(entity_type)
    }

    pub fn depends_on(&self, from: &EntityType, to: &EntityType) -> bool {
        self.deps.get(from).is_some_and(|deps| deps.contains(to))
    }

    /// The types `entity_type` depends on, in discovery order
    pub fn dependencies_of(&self, entity_type: &EntityType) -> Option<&[EntityType]> {
        self.deps.get(entity_type).map(Vec::as_slice)
    }

    /// All keys in insertion order
    pub fn types(&self) -> &[EntityType] {
        &self.order
    }

    /// Iterate `(type, dependencies)` in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&EntityType, &[EntityType])> + '_ {
        self.order
            .iter()
            .filter_map(move |t| self.deps.get(t).map(|deps| (t, deps.as_slice())))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Remove `entity_type` as a key and from every remaining dependency set
    pub(crate) fn remove(&mut self, entity_type: &EntityType) {
        if self.deps.remove(entity_type).is_none() {
            return;
        }
        self.order.retain(|t| t != entity_type);
        for deps in self.deps.values_mut() {
            deps.retain(|t| t != entity_type);
        }
    }

    /// First key (in insertion order) whose dependency set is empty
    pub(crate) fn first_ready(&self) -> Option<EntityType> {
        self.iter()
            .find(|(_, deps)| deps.is_empty())
            .map(|(t, _)| t.clone())
    }
}
