//! `RelationDef` and `RelationStep` for storing relationship metadata
//!
//! A `RelationDef` describes one declared relationship on an entity type. Walking it means
//! walking its chain: a direct relationship is a chain of one step (itself), a through
//! relationship walks the declared relationship itself, then the through relationship that
//! leads to the join records.

use super::types::RelationType;
use crate::entity::EntityType;

/// Where a relationship points
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RelationTarget {
    /// Always the same entity type
    Fixed(EntityType),
    /// Decided per record (e.g. a `*_type` discriminator column)
    Polymorphic,
}

impl RelationTarget {
    /// The statically known target, if any
    pub fn fixed(&self) -> Option<&EntityType> {
        match self {
            RelationTarget::Fixed(entity_type) => Some(entity_type),
            RelationTarget::Polymorphic => None,
        }
    }

    pub fn is_polymorphic(&self) -> bool {
        matches!(self, RelationTarget::Polymorphic)
    }
}

/// A single hop of a relationship chain
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationStep {
    /// Relation name as declared on its owning type
    pub name: String,
    /// Type of relationship
    pub rel_type: RelationType,
    /// Target entity type
    pub target: RelationTarget,
}

impl RelationStep {
    pub fn new(name: impl Into<String>, rel_type: RelationType, target: RelationTarget) -> Self {
        Self {
            name: name.into(),
            rel_type,
            target,
        }
    }

    pub fn belongs_to(name: impl Into<String>, target: impl Into<EntityType>) -> Self {
        Self::new(name, RelationType::BelongsTo, RelationTarget::Fixed(target.into()))
    }

    pub fn has_one(name: impl Into<String>, target: impl Into<EntityType>) -> Self {
        Self::new(name, RelationType::HasOne, RelationTarget::Fixed(target.into()))
    }

    pub fn has_many(name: impl Into<String>, target: impl Into<EntityType>) -> Self {
        Self::new(name, RelationType::HasMany, RelationTarget::Fixed(target.into()))
    }
}

/// Defines a relationship declared on an entity type
///
/// # Example
///
/// ```
/// use lifeguard_explorer::relation::{RelationDef, RelationStep, RelationTarget, RelationType};
///
/// // Post has_many tags through taggings
/// let step = RelationStep::new("tags", RelationType::HasManyThrough, RelationTarget::Fixed("tags".into()));
/// let tags = RelationDef::through(step.clone(), vec![step, RelationStep::has_many("taggings", "taggings")]);
/// assert_eq!(tags.chain().len(), 2);
/// assert_eq!(tags.rel_type(), RelationType::HasManyThrough);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDef {
    /// The declared relationship itself
    pub step: RelationStep,
    /// Steps to walk, in order; never empty
    chain: Vec<RelationStep>,
}

impl RelationDef {
    /// A direct relationship: its chain is the step itself
    pub fn direct(step: RelationStep) -> Self {
        Self {
            chain: vec![step.clone()],
            step,
        }
    }

    /// A relationship implemented by walking `chain`
    ///
    /// An empty `chain` degrades to [`RelationDef::direct`].
    pub fn through(step: RelationStep, chain: Vec<RelationStep>) -> Self {
        if chain.is_empty() {
            return Self::direct(step);
        }
        Self { step, chain }
    }

    pub fn name(&self) -> &str {
        &self.step.name
    }

    pub fn rel_type(&self) -> RelationType {
        self.step.rel_type
    }

    pub fn target(&self) -> &RelationTarget {
        &self.step.target
    }

    pub fn chain(&self) -> &[RelationStep] {
        &self.chain
    }
}

impl From<RelationStep> for RelationDef {
    fn from(step: RelationStep) -> Self {
        RelationDef::direct(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_chain_is_itself() {
        let def = RelationDef::direct(RelationStep::belongs_to("customer", "customers"));
        assert_eq!(def.chain().len(), 1);
        assert_eq!(def.chain()[0], def.step);
        assert_eq!(def.name(), "customer");
        assert!(def.rel_type().is_owning());
    }

    #[test]
    fn test_empty_through_chain_degrades_to_direct() {
        let step = RelationStep::has_many("line_items", "line_items");
        let def = RelationDef::through(step.clone(), Vec::new());
        assert_eq!(def.chain(), &[step]);
    }

    #[test]
    fn test_polymorphic_target_has_no_fixed_type() {
        let step = RelationStep::new("subject", RelationType::BelongsTo, RelationTarget::Polymorphic);
        assert!(step.target.is_polymorphic());
        assert!(step.target.fixed().is_none());

        let fixed = RelationStep::has_one("profile", "profiles");
        assert_eq!(fixed.target.fixed(), Some(&EntityType::from("profiles")));
    }
}
