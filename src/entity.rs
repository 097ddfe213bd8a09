//! Entity identity types
//!
//! `EntityType` names a kind of record (a table or model) and is used both as a node label in
//! the dependency graph and as a map key. `EntityRef` identifies one concrete record and is what
//! the explorer tracks in its visited set.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for a record's kind (usually the table name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityType(String);

impl EntityType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityType {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for EntityType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for EntityType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identity of a single record: its type plus its primary key
///
/// Two refs are equal iff both the type and the key are equal. The key is kept in its
/// rendered string form so records with integer, UUID or text keys share one representation.
///
/// # Example
///
/// ```
/// use lifeguard_explorer::entity::EntityRef;
///
/// let order = EntityRef::new("orders", "42");
/// assert_eq!(order.to_string(), "orders/42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity_type: EntityType,
    pub key: String,
}

impl EntityRef {
    pub fn new(entity_type: impl Into<EntityType>, key: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.entity_type, self.key)
    }
}
