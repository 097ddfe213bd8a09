//! Insert collection
//!
//! Rendered insert statements grouped by entity type. Within a type, statements keep the
//! order in which their records were visited.

use crate::entity::EntityType;
use std::collections::HashMap;

/// Mapping from entity type to its rendered inserts, in visitation order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertCollection {
    order: Vec<EntityType>,
    statements: HashMap<EntityType, Vec<String>>,
}

impl InsertCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rendered insert for a record of `entity_type`
    pub fn push(&mut self, entity_type: &EntityType, statement: String) {
        match self.statements.get_mut(entity_type) {
            Some(existing) => existing.push(statement),
            None => {
                self.order.push(entity_type.clone());
                self.statements.insert(entity_type.clone(), vec![statement]);
            }
        }
    }

    /// Statements for `entity_type`; empty if none were collected
    pub fn get(&self, entity_type: &EntityType) -> &[String] {
        self.statements.get(entity_type).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Types with at least one statement, in first-visit order
    pub fn types(&self) -> &[EntityType] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityType, &[String])> + '_ {
        self.order
            .iter()
            .map(move |t| (t, self.get(t)))
    }

    /// Total number of statements across all types
    pub fn len(&self) -> usize {
        self.statements.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
