//! Dependency graph and insert ordering
//!
//! - Extract dependencies between entity types while exploring
//! - Keep them in discovery order so ordering is reproducible
//! - Topologically order types for insertion, reporting what cannot be ordered

pub mod dependency;
pub mod order;

#[doc(inline)]
pub use dependency::DependencyGraph;
#[doc(inline)]
pub use order::{solve, InsertPlan};
