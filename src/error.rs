//! Error types for exploration runs
//!
//! `ProviderError` is raised by the schema/fetch collaborator. `ExploreError` is what escapes a
//! run: the seed could not be found, a relationship failed to resolve under the abort policy,
//! the insert order was left unresolved under the abort policy, or the run was stopped.

use crate::entity::{EntityRef, EntityType};
use crate::graph::DependencyGraph;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a [`SchemaProvider`](crate::provider::SchemaProvider)
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider has no metadata for this type
    #[error("Unknown entity type: {0}")]
    UnknownType(EntityType),

    /// A polymorphic relation could not be resolved to a concrete type
    #[error("Relation '{relation}' on {entity_type} has no resolvable target type")]
    UnresolvedTarget { entity_type: EntityType, relation: String },

    /// Related records could not be fetched
    #[error("Failed to fetch '{relation}' for {entity}: {reason}")]
    Fetch {
        entity: String,
        relation: String,
        reason: String,
    },

    /// A record is missing its primary key
    #[error("Record of type {entity_type} has no value for primary key column '{column}'")]
    MissingPrimaryKey { entity_type: EntityType, column: String },

    /// The record could not be rendered as an insert
    #[error("Failed to render insert for {entity}: {reason}")]
    Render { entity: String, reason: String },

    /// Anything else the collaborator reports
    #[error("{0}")]
    Other(String),
}

/// Errors that abort an exploration run
#[derive(Debug, Error)]
pub enum ExploreError {
    /// The seed record does not exist
    #[error("Seed record {entity_type}/{key} not found")]
    SeedNotFound { entity_type: EntityType, key: String },

    /// Looking up the seed record failed
    #[error("Failed to look up seed record {entity_type}/{key}: {source}")]
    SeedLookup {
        entity_type: EntityType,
        key: String,
        #[source]
        source: ProviderError,
    },

    /// A seed record handed in directly has no resolvable identity
    #[error("Failed to identify seed record of type {entity_type}: {source}")]
    SeedIdentity {
        entity_type: EntityType,
        #[source]
        source: ProviderError,
    },

    /// Relationship metadata or related records could not be resolved
    #[error("Relationship resolution failed while exploring {entity_type}: {source}")]
    RelationResolution {
        entity_type: EntityType,
        entity: Option<EntityRef>,
        #[source]
        source: ProviderError,
    },

    /// The dependency graph still had entries after ordering
    #[error("Insert order could not be derived for: {}", residual_summary(.residual))]
    UnresolvedDependencyOrder { residual: DependencyGraph },

    /// The run was cancelled between queue entries
    #[error("Exploration cancelled after visiting {visited} record(s)")]
    Cancelled { visited: usize },

    /// The run exceeded its time budget
    #[error("Exploration timed out after {elapsed:?} ({visited} record(s) visited)")]
    Timeout { elapsed: Duration, visited: usize },
}

fn residual_summary(residual: &DependencyGraph) -> String {
    residual
        .iter()
        .map(|(entity_type, deps)| {
            let deps: Vec<&str> = deps.iter().map(EntityType::as_str).collect();
            format!("{} -> [{}]", entity_type, deps.join(", "))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenient Result type using ExploreError
pub type Result<T> = std::result::Result<T, ExploreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_not_found_display() {
        let err = ExploreError::SeedNotFound {
            entity_type: "orders".into(),
            key: "9".to_string(),
        };
        assert_eq!(err.to_string(), "Seed record orders/9 not found");
    }

    #[test]
    fn test_seed_identity_display_has_no_key() {
        let err = ExploreError::SeedIdentity {
            entity_type: "orders".into(),
            source: ProviderError::MissingPrimaryKey {
                entity_type: "orders".into(),
                column: "id".to_string(),
            },
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to identify seed record of type orders:"), "{msg}");
        assert!(!msg.contains("orders/"), "{msg}");
    }

    #[test]
    fn test_unresolved_order_lists_residual() {
        let mut residual = DependencyGraph::new();
        residual.add_dependency(&"a".into(), &"b".into());
        residual.add_dependency(&"b".into(), &"a".into());

        let err = ExploreError::UnresolvedDependencyOrder { residual };
        let msg = err.to_string();
        assert!(msg.contains("a -> [b]"), "unexpected message: {msg}");
        assert!(msg.contains("b -> [a]"), "unexpected message: {msg}");
    }

    #[test]
    fn test_resolution_error_keeps_source() {
        use std::error::Error as _;

        let err = ExploreError::RelationResolution {
            entity_type: "orders".into(),
            entity: Some(EntityRef::new("orders", "1")),
            source: ProviderError::UnknownType("ghosts".into()),
        };
        assert!(err.to_string().contains("Unknown entity type: ghosts"));
        assert!(err.source().is_some());
    }
}
