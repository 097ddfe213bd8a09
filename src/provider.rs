//! `SchemaProvider` - the explorer's view of the schema and the data
//!
//! The explorer never inspects records itself. Everything it needs, from relationship
//! metadata to polymorphic target resolution, related-record fetching, identity and insert
//! rendering, goes through this trait, so the same engine can run over a live database layer,
//! an in-memory snapshot, or a test double.

use crate::entity::{EntityRef, EntityType};
use crate::error::ProviderError;
use crate::relation::{RelationDef, RelationStep, RelationTarget};

/// Trait for supplying entity metadata and related records
///
/// Implementations are expected to be read-only with respect to the source store and safe to
/// call repeatedly for the same arguments.
///
/// # Examples
///
/// ```no_run
/// use lifeguard_explorer::{Explorer, ExplorerConfig, Snapshot};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let snapshot = Snapshot::from_path("fixtures/shop.json")?;
/// let explorer = Explorer::new(&snapshot, ExplorerConfig::default());
/// let result = explorer.explore("orders", "1")?;
/// println!("{}", result.to_sql());
/// # Ok(())
/// # }
/// ```
pub trait SchemaProvider {
    /// Handle to one record; opaque to the explorer
    type Instance: Clone;

    /// Look up a record by type and primary key
    fn find(&self, entity_type: &EntityType, key: &str) -> Result<Option<Self::Instance>, ProviderError>;

    /// Relationships declared on `entity_type`; stable for the duration of a run
    fn relations_of(&self, entity_type: &EntityType) -> Result<Vec<RelationDef>, ProviderError>;

    /// Resolve the concrete target type of `step` for this particular record
    ///
    /// `Ok(None)` means the relationship points nowhere for this record (for example a
    /// polymorphic `belongs_to` whose type column is null). The default implementation
    /// handles fixed targets and rejects polymorphic ones.
    fn resolve_target_type(
        &self,
        step: &RelationStep,
        instance: &Self::Instance,
    ) -> Result<Option<EntityType>, ProviderError> {
        let _ = instance;
        match &step.target {
            RelationTarget::Fixed(entity_type) => Ok(Some(entity_type.clone())),
            RelationTarget::Polymorphic => Err(ProviderError::Other(format!(
                "polymorphic relation '{}' needs a provider-specific resolver",
                step.name
            ))),
        }
    }

    /// Whether the record actually exposes `step` at runtime
    ///
    /// Metadata can declare chain steps the record itself does not answer to; those are
    /// skipped without error.
    fn exposes(&self, instance: &Self::Instance, step: &RelationStep) -> bool {
        let _ = (instance, step);
        true
    }

    /// Records reached from `instance` through `step` (possibly none)
    fn related(&self, instance: &Self::Instance, step: &RelationStep) -> Result<Vec<Self::Instance>, ProviderError>;

    /// Stable identity of a record
    fn identity_of(&self, instance: &Self::Instance) -> Result<EntityRef, ProviderError>;

    /// Ready-to-persist insert representation of the record's current values
    fn render_insert(&self, instance: &Self::Instance) -> Result<String, ProviderError>;
}

impl<P: SchemaProvider + ?Sized> SchemaProvider for &P {
    type Instance = P::Instance;

    fn find(&self, entity_type: &EntityType, key: &str) -> Result<Option<Self::Instance>, ProviderError> {
        (**self).find(entity_type, key)
    }

    fn relations_of(&self, entity_type: &EntityType) -> Result<Vec<RelationDef>, ProviderError> {
        (**self).relations_of(entity_type)
    }

    fn resolve_target_type(
        &self,
        step: &RelationStep,
        instance: &Self::Instance,
    ) -> Result<Option<EntityType>, ProviderError> {
        (**self).resolve_target_type(step, instance)
    }

    fn exposes(&self, instance: &Self::Instance, step: &RelationStep) -> bool {
        (**self).exposes(instance, step)
    }

    fn related(&self, instance: &Self::Instance, step: &RelationStep) -> Result<Vec<Self::Instance>, ProviderError> {
        (**self).related(instance, step)
    }

    fn identity_of(&self, instance: &Self::Instance) -> Result<EntityRef, ProviderError> {
        (**self).identity_of(instance)
    }

    fn render_insert(&self, instance: &Self::Instance) -> Result<String, ProviderError> {
        (**self).render_insert(instance)
    }
}
