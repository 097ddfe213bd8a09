//! # Lifeguard Explorer
//!
//! Extracts a connected subgraph of related records starting from one seed record and
//! produces the insert statements that recreate it elsewhere, ordered so that every record is
//! inserted after the records its foreign keys reference.
//!
//! - [`explorer`]: frontier-driven traversal with visited-state tracking and type blacklisting
//! - [`graph`]: type dependency graph and the insert-order solver
//! - [`provider`]: the schema/fetch contract the explorer runs against
//! - [`snapshot`]: a JSON-backed provider
//!
//! See [README on GitHub](https://github.com/microscaler/lifeguard) for the wider Lifeguard project.

pub mod config;
pub mod entity;
pub mod error;
pub mod explorer;
pub mod graph;
pub mod inserts;
pub mod metrics;
pub mod provider;
pub mod relation;
pub mod render;
pub mod snapshot;

pub use config::{ExplorerConfig, ResolutionPolicy, UnresolvedOrderPolicy};
pub use entity::{EntityRef, EntityType};
pub use error::{ExploreError, ProviderError};
pub use explorer::{CancelHandle, Exploration, Explorer, SkippedEntry};
pub use graph::{DependencyGraph, InsertPlan};
pub use inserts::InsertCollection;
pub use provider::SchemaProvider;
pub use relation::{RelationDef, RelationStep, RelationTarget, RelationType};
pub use snapshot::{Record, Snapshot, SnapshotError};
