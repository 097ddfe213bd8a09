//! Explorer - seed-driven subgraph extraction
//!
//! Starting from one seed record, the explorer walks related records through a
//! [`SchemaProvider`], renders an insert for every record it visits, and records which entity
//! types must be inserted before which. When the work queue is exhausted the dependency graph
//! is ordered once to produce the insert order.
//!
//! Traversal is bounded three ways:
//! - every record identity is processed at most once
//! - collection relations into a type that already has visited records are not re-expanded
//! - a blacklist, seeded with the seed type, stops expansion into excluded types; an
//!   excluded type's owning references are excluded as well

use crate::config::{ExplorerConfig, ResolutionPolicy, UnresolvedOrderPolicy};
use crate::entity::{EntityRef, EntityType};
use crate::error::{ExploreError, ProviderError, Result};
use crate::graph::DependencyGraph;
use crate::inserts::InsertCollection;
use crate::metrics;
use crate::provider::SchemaProvider;
use crate::relation::{is_dependency_source, should_traverse, RelationDef, RelationStep};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Handle for cancelling a run from another thread
///
/// Cancellation is checked once per dequeued entry.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Clear a previous cancellation so the explorer can run again
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// A queue entry that was skipped under [`ResolutionPolicy::Continue`]
///
/// Skipping is not a rollback: if the record was rendered before the failure, its insert
/// stays in the result, as do the dependencies and queue entries from the relations walked
/// before the failing one. A render failure leaves nothing behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub entity_type: EntityType,
    /// Identity of the record, when it could be determined
    pub entity: Option<EntityRef>,
    pub reason: String,
}

/// Outcome of an exploration run
#[derive(Debug, Clone)]
pub struct Exploration {
    pub seed: EntityRef,
    /// Types in dependency-respecting insertion order
    pub insert_order: Vec<EntityType>,
    /// Dependencies that could not be ordered; empty for a complete run
    pub residual: DependencyGraph,
    /// The full dependency graph as discovered
    pub dependencies: DependencyGraph,
    /// Rendered inserts per type, in visitation order
    pub inserts: InsertCollection,
    pub visited: HashSet<EntityRef>,
    pub skipped: Vec<SkippedEntry>,
    pub elapsed: Duration,
}

impl Exploration {
    /// `true` when nothing was skipped and every type was ordered
    pub fn is_complete(&self) -> bool {
        self.residual.is_empty() && self.skipped.is_empty()
    }

    /// Statements in emission order: ordered types first, then residual types
    pub fn statements(&self) -> impl Iterator<Item = (&EntityType, &str)> + '_ {
        self.insert_order
            .iter()
            .chain(self.residual.types().iter())
            .flat_map(move |t| self.inserts.get(t).iter().map(move |s| (t, s.as_str())))
    }

    /// The SQL script recreating the extracted subgraph
    ///
    /// Types follow the insert order; each type's statements keep visitation order. Types left
    /// in the residual graph are appended after an `-- unresolved dependency order` marker.
    pub fn to_sql(&self) -> String {
        let mut script = String::new();
        let push_type = |script: &mut String, entity_type: &EntityType| {
            for statement in self.inserts.get(entity_type) {
                script.push_str(statement);
                script.push_str(";\n");
            }
        };

        for entity_type in &self.insert_order {
            push_type(&mut script, entity_type);
        }
        if !self.residual.is_empty() {
            script.push_str("-- unresolved dependency order\n");
            for entity_type in self.residual.types() {
                push_type(&mut script, entity_type);
            }
        }
        script
    }
}

/// Drives exploration runs over a provider
pub struct Explorer<P> {
    provider: P,
    config: ExplorerConfig,
    cancel: CancelHandle,
}

impl<P: SchemaProvider> Explorer<P> {
    pub fn new(provider: P, config: ExplorerConfig) -> Self {
        Self {
            provider,
            config,
            cancel: CancelHandle::default(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Share an existing cancellation handle, e.g. one wired to a signal handler
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Look up the seed record by type and primary key, then explore from it
    pub fn explore(&self, seed_type: impl Into<EntityType>, key: &str) -> Result<Exploration> {
        let seed_type = seed_type.into();
        let seed = self
            .provider
            .find(&seed_type, key)
            .map_err(|source| ExploreError::SeedLookup {
                entity_type: seed_type.clone(),
                key: key.to_string(),
                source,
            })?
            .ok_or_else(|| ExploreError::SeedNotFound {
                entity_type: seed_type.clone(),
                key: key.to_string(),
            })?;
        self.explore_from(seed_type, seed)
    }

    /// Explore from a seed record already in hand
    pub fn explore_from(&self, seed_type: impl Into<EntityType>, seed: P::Instance) -> Result<Exploration> {
        let seed_type = seed_type.into();
        let seed_ref = self
            .provider
            .identity_of(&seed)
            .map_err(|source| ExploreError::SeedIdentity {
                entity_type: seed_type.clone(),
                source,
            })?;

        #[cfg(feature = "tracing")]
        let _span = metrics::tracing_helpers::explore_span(seed_type.as_str(), &seed_ref.key).entered();

        let started = Instant::now();
        let timeout = self.config.timeout();
        log::info!("Exploring from {}", seed_ref);

        let mut session = Session::new(&self.provider, seed_type, seed);
        while let Some((entity_type, instance)) = session.queue.pop() {
            if self.cancel.is_cancelled() {
                return Err(ExploreError::Cancelled {
                    visited: session.visited.len(),
                });
            }
            if let Some(limit) = timeout {
                let elapsed = started.elapsed();
                if elapsed > limit {
                    return Err(ExploreError::Timeout {
                        elapsed,
                        visited: session.visited.len(),
                    });
                }
            }

            let Err(failure) = session.process(&entity_type, &instance) else {
                continue;
            };
            log::warn!(
                "Failed to explore {}: {}",
                failure.entity.as_ref().map_or_else(|| entity_type.to_string(), ToString::to_string),
                failure.source
            );
            match self.config.on_resolution_error {
                ResolutionPolicy::Abort => {
                    return Err(ExploreError::RelationResolution {
                        entity_type,
                        entity: failure.entity,
                        source: failure.source,
                    });
                }
                ResolutionPolicy::Continue => {
                    metrics::record_skip();
                    session.skipped.push(SkippedEntry {
                        entity_type,
                        entity: failure.entity,
                        reason: failure.source.to_string(),
                    });
                }
            }
        }

        let plan = session.dependencies.solve();
        let elapsed = started.elapsed();
        metrics::record_run(elapsed);
        log::info!("Finished in {:.3} seconds", elapsed.as_secs_f64());
        log::info!("Visited {} records", session.visited.len());

        if !plan.is_complete() {
            log::warn!(
                "Insert order left {} type(s) unresolved: {:?}",
                plan.residual.len(),
                plan.residual.types()
            );
            if self.config.on_unresolved_order == UnresolvedOrderPolicy::Abort {
                return Err(ExploreError::UnresolvedDependencyOrder {
                    residual: plan.residual,
                });
            }
        }

        Ok(Exploration {
            seed: seed_ref,
            insert_order: plan.order,
            residual: plan.residual,
            dependencies: session.dependencies,
            inserts: session.inserts,
            visited: session.visited,
            skipped: session.skipped,
            elapsed,
        })
    }
}

/// Failure while processing one queue entry
struct EntryFailure {
    entity: Option<EntityRef>,
    source: ProviderError,
}

/// State owned by a single run
struct Session<'p, P: SchemaProvider> {
    provider: &'p P,
    queue: Vec<(EntityType, P::Instance)>,
    visited: HashSet<EntityRef>,
    visited_types: HashSet<EntityType>,
    blacklist: HashSet<EntityType>,
    dependencies: DependencyGraph,
    inserts: InsertCollection,
    skipped: Vec<SkippedEntry>,
}

impl<'p, P: SchemaProvider> Session<'p, P> {
    fn new(provider: &'p P, seed_type: EntityType, seed: P::Instance) -> Self {
        let mut blacklist = HashSet::new();
        blacklist.insert(seed_type.clone());
        Self {
            provider,
            queue: vec![(seed_type, seed)],
            visited: HashSet::new(),
            visited_types: HashSet::new(),
            blacklist,
            dependencies: DependencyGraph::new(),
            inserts: InsertCollection::new(),
            skipped: Vec::new(),
        }
    }

    fn process(&mut self, entity_type: &EntityType, instance: &P::Instance) -> std::result::Result<(), EntryFailure> {
        let identity = self
            .provider
            .identity_of(instance)
            .map_err(|source| EntryFailure { entity: None, source })?;
        if self.visited.contains(&identity) {
            return Ok(());
        }

        let fail = |source: ProviderError| EntryFailure {
            entity: Some(identity.clone()),
            source,
        };

        // Rendered before marking so a failed render leaves the record unvisited
        let statement = self.provider.render_insert(instance).map_err(fail)?;
        log::debug!("Visiting {}", identity);
        self.visited.insert(identity.clone());
        self.visited_types.insert(entity_type.clone());
        self.inserts.push(entity_type, statement);
        self.dependencies.ensure(entity_type);
        metrics::record_visit();

        let relations = self.provider.relations_of(entity_type).map_err(fail)?;
        for def in &relations {
            let Some(target) = self.provider.resolve_target_type(&def.step, instance).map_err(fail)? else {
                continue;
            };
            if !should_traverse(def, &target, &self.visited_types) {
                continue;
            }
            for step in def.chain() {
                self.walk_step(entity_type, instance, def, step).map_err(fail)?;
            }
        }
        Ok(())
    }

    fn walk_step(
        &mut self,
        entity_type: &EntityType,
        instance: &P::Instance,
        def: &RelationDef,
        step: &RelationStep,
    ) -> std::result::Result<(), ProviderError> {
        let Some(target) = self.provider.resolve_target_type(step, instance)? else {
            return Ok(());
        };

        // An excluded type's owning references are excluded too
        if step.rel_type.is_owning() && self.blacklist.contains(entity_type) && self.blacklist.insert(target.clone()) {
            log::debug!("Blacklisted {} (owned by {})", target, entity_type);
        }

        let owning = is_dependency_source(def);
        let blacklisted = self.blacklist.contains(&target);
        if blacklisted && !owning {
            return Ok(());
        }

        if !self.provider.exposes(instance, step) {
            log::trace!("{} does not expose '{}', skipping", entity_type, step.name);
            return Ok(());
        }

        let related = self.provider.related(instance, step)?;
        if owning && !related.is_empty() && self.dependencies.add_dependency(entity_type, &target) {
            log::debug!("{} depends on {}", entity_type, target);
        }

        // Blacklisted targets only contribute their dependency edge
        if blacklisted {
            return Ok(());
        }
        self.queue
            .extend(related.into_iter().map(|record| (target.clone(), record)));
        Ok(())
    }
}
