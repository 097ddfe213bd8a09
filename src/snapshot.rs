//! JSON snapshot provider
//!
//! A complete [`SchemaProvider`] over an in-memory document holding table schemas (primary
//! key plus declared relations) and rows. It backs the command-line tool and makes the
//! explorer usable without a live connection.
//!
//! ```json
//! {
//!   "tables": {
//!     "orders": {
//!       "primary_key": "id",
//!       "relations": [
//!         {"name": "customer", "kind": "belongs_to", "target": "customers", "foreign_key": "customer_id"},
//!         {"name": "line_items", "kind": "has_many", "target": "line_items", "foreign_key": "order_id"}
//!       ]
//!     }
//!   },
//!   "rows": {"orders": [{"id": 1, "customer_id": 7}]}
//! }
//! ```

use crate::entity::{EntityRef, EntityType};
use crate::error::ProviderError;
use crate::provider::SchemaProvider;
use crate::relation::{RelationDef, RelationStep, RelationTarget, RelationType};
use crate::render;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while loading a snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to read snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid snapshot: {0}")]
    Invalid(String),
}

fn default_primary_key() -> String {
    "id".to_string()
}

/// Schema of one table
#[derive(Debug, Clone, Deserialize)]
pub struct TableSchema {
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    #[serde(default)]
    pub relations: Vec<RelationSpec>,
}

impl TableSchema {
    pub fn relation(&self, name: &str) -> Option<&RelationSpec> {
        self.relations.iter().find(|r| r.name == name)
    }
}

/// A relation as declared in the snapshot document
#[derive(Debug, Clone, Deserialize)]
pub struct RelationSpec {
    pub name: String,
    pub kind: RelationType,
    /// Target table; absent for polymorphic `belongs_to`
    #[serde(default)]
    pub target: Option<EntityType>,
    /// `belongs_to`: column on this table; `has_*`: column on the target table;
    /// many-to-many: join table column referencing this table
    #[serde(default)]
    pub foreign_key: Option<String>,
    /// Discriminator column naming the polymorphic type
    #[serde(default)]
    pub type_column: Option<String>,
    /// Through relations: relation on this table leading to the intermediate records
    #[serde(default)]
    pub through: Option<String>,
    /// Through relations: relation on the intermediate table leading to the target
    #[serde(default)]
    pub source: Option<String>,
    /// Many-to-many join table
    #[serde(default)]
    pub join_table: Option<EntityType>,
    /// Many-to-many: join table column referencing the target table
    #[serde(default)]
    pub association_foreign_key: Option<String>,
}

impl RelationSpec {
    fn step(&self) -> RelationStep {
        let target = match &self.target {
            Some(target) => RelationTarget::Fixed(target.clone()),
            None => RelationTarget::Polymorphic,
        };
        RelationStep::new(self.name.clone(), self.kind, target)
    }

    fn required<'a>(&'a self, field: &'a Option<String>, what: &str) -> Result<&'a str, ProviderError> {
        field.as_deref().ok_or_else(|| {
            ProviderError::Other(format!("relation '{}' is missing its {}", self.name, what))
        })
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotDocument {
    tables: BTreeMap<EntityType, TableSchema>,
    #[serde(default)]
    rows: BTreeMap<EntityType, Vec<Map<String, JsonValue>>>,
}

/// One row of a snapshot table
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    entity_type: EntityType,
    values: Arc<Map<String, JsonValue>>,
}

impl Record {
    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    pub fn get(&self, column: &str) -> Option<&JsonValue> {
        self.values.get(column)
    }

    pub fn values(&self) -> &Map<String, JsonValue> {
        &self.values
    }
}

/// Render a key cell the way identities are compared; `None` for null or missing values
fn key_string(value: Option<&JsonValue>) -> Option<String> {
    match value? {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// In-memory schema and data loaded from a JSON document
#[derive(Debug, Default)]
pub struct Snapshot {
    tables: BTreeMap<EntityType, TableSchema>,
    rows: HashMap<EntityType, Vec<Record>>,
    // table -> primary key -> row index
    by_key: HashMap<EntityType, HashMap<String, usize>>,
}

impl Snapshot {
    pub fn from_json_str(json: &str) -> Result<Self, SnapshotError> {
        let document: SnapshotDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    pub fn from_json_value(json: JsonValue) -> Result<Self, SnapshotError> {
        let document: SnapshotDocument = serde_json::from_value(json)?;
        Self::from_document(document)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot = Self::from_json_str(&json)?;
        log::debug!(
            "Loaded snapshot {} ({} tables, {} rows)",
            path.display(),
            snapshot.tables.len(),
            snapshot.row_count()
        );
        Ok(snapshot)
    }

    fn from_document(document: SnapshotDocument) -> Result<Self, SnapshotError> {
        validate_relations(&document)?;

        let mut rows = HashMap::new();
        let mut by_key = HashMap::new();
        for (entity_type, table_rows) in document.rows {
            let primary_key = document.tables.get(&entity_type).map(|t| t.primary_key.as_str());
            let mut index = HashMap::new();
            let mut records = Vec::with_capacity(table_rows.len());
            for (position, values) in table_rows.into_iter().enumerate() {
                // Join tables without a schema entry carry no identity
                if let Some(primary_key) = primary_key {
                    let key = key_string(values.get(primary_key)).ok_or_else(|| {
                        SnapshotError::Invalid(format!(
                            "row {} of '{}' has no value for primary key '{}'",
                            position, entity_type, primary_key
                        ))
                    })?;
                    if index.insert(key.clone(), position).is_some() {
                        return Err(SnapshotError::Invalid(format!(
                            "duplicate primary key {}/{}",
                            entity_type, key
                        )));
                    }
                }
                records.push(Record {
                    entity_type: entity_type.clone(),
                    values: Arc::new(values),
                });
            }
            by_key.insert(entity_type.clone(), index);
            rows.insert(entity_type, records);
        }

        Ok(Self {
            tables: document.tables,
            rows,
            by_key,
        })
    }

    /// Declared tables in name order
    pub fn tables(&self) -> impl Iterator<Item = (&EntityType, &TableSchema)> + '_ {
        self.tables.iter()
    }

    pub fn rows(&self, entity_type: &EntityType) -> &[Record] {
        self.rows.get(entity_type).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn row_count(&self) -> usize {
        self.rows.values().map(Vec::len).sum()
    }

    fn table(&self, entity_type: &EntityType) -> Result<&TableSchema, ProviderError> {
        self.tables
            .get(entity_type)
            .ok_or_else(|| ProviderError::UnknownType(entity_type.clone()))
    }

    fn by_primary_key(&self, entity_type: &EntityType, key: &str) -> Option<&Record> {
        let position = *self.by_key.get(entity_type)?.get(key)?;
        self.rows.get(entity_type)?.get(position)
    }

    fn primary_key_of(&self, record: &Record) -> Result<String, ProviderError> {
        let table = self.table(&record.entity_type)?;
        key_string(record.get(&table.primary_key)).ok_or_else(|| ProviderError::MissingPrimaryKey {
            entity_type: record.entity_type.clone(),
            column: table.primary_key.clone(),
        })
    }

    /// Target type named by a polymorphic relation's discriminator column
    fn polymorphic_target(&self, spec: &RelationSpec, record: &Record) -> Result<Option<EntityType>, ProviderError> {
        let type_column = spec.required(&spec.type_column, "type_column")?;
        match key_string(record.get(type_column)) {
            None => Ok(None),
            Some(name) => {
                let entity_type = EntityType::from(name);
                self.table(&entity_type).map_err(|_| ProviderError::UnresolvedTarget {
                    entity_type: record.entity_type.clone(),
                    relation: spec.name.clone(),
                })?;
                Ok(Some(entity_type))
            }
        }
    }

    fn belongs_to(&self, spec: &RelationSpec, record: &Record) -> Result<Vec<Record>, ProviderError> {
        let foreign_key = spec.required(&spec.foreign_key, "foreign_key")?;
        let Some(key) = key_string(record.get(foreign_key)) else {
            return Ok(Vec::new());
        };
        let target = match &spec.target {
            Some(target) => target.clone(),
            None => match self.polymorphic_target(spec, record)? {
                Some(target) => target,
                None => return Ok(Vec::new()),
            },
        };
        Ok(self.by_primary_key(&target, &key).cloned().into_iter().collect())
    }

    fn has_many(&self, spec: &RelationSpec, record: &Record) -> Result<Vec<Record>, ProviderError> {
        let foreign_key = spec.required(&spec.foreign_key, "foreign_key")?;
        let target = spec
            .target
            .as_ref()
            .ok_or_else(|| ProviderError::UnresolvedTarget {
                entity_type: record.entity_type.clone(),
                relation: spec.name.clone(),
            })?;
        let key = self.primary_key_of(record)?;

        let matches = self.rows(target).iter().filter(|row| {
            let key_matches = key_string(row.get(foreign_key)).as_deref() == Some(key.as_str());
            // "as" polymorphism: the child's type column must name this table
            let type_matches = spec.type_column.as_deref().map_or(true, |type_column| {
                key_string(row.get(type_column)).as_deref() == Some(record.entity_type.as_str())
            });
            key_matches && type_matches
        });

        let related: Vec<Record> = if spec.kind == RelationType::HasOne {
            matches.take(1).cloned().collect()
        } else {
            matches.cloned().collect()
        };
        Ok(related)
    }

    fn through(&self, spec: &RelationSpec, record: &Record) -> Result<Vec<Record>, ProviderError> {
        let through_name = spec.required(&spec.through, "through")?;
        let source_name = spec.required(&spec.source, "source")?;
        let through = self.table(&record.entity_type)?.relation(through_name).ok_or_else(|| {
            ProviderError::Other(format!("through relation '{}' is not declared", through_name))
        })?;

        let mut related = Vec::new();
        for intermediate in self.fetch(through, record)? {
            let Some(source) = self.table(&intermediate.entity_type)?.relation(source_name) else {
                continue;
            };
            related.extend(self.fetch(source, &intermediate)?);
        }
        Ok(related)
    }

    fn many_to_many(&self, spec: &RelationSpec, record: &Record) -> Result<Vec<Record>, ProviderError> {
        let join_table = spec.join_table.as_ref().ok_or_else(|| {
            ProviderError::Other(format!("relation '{}' is missing its join_table", spec.name))
        })?;
        let foreign_key = spec.required(&spec.foreign_key, "foreign_key")?;
        let association_key = spec.required(&spec.association_foreign_key, "association_foreign_key")?;
        let target = spec.target.as_ref().ok_or_else(|| ProviderError::UnresolvedTarget {
            entity_type: record.entity_type.clone(),
            relation: spec.name.clone(),
        })?;
        let key = self.primary_key_of(record)?;

        Ok(self
            .rows(join_table)
            .iter()
            .filter(|join| key_string(join.get(foreign_key)).as_deref() == Some(key.as_str()))
            .filter_map(|join| key_string(join.get(association_key)))
            .filter_map(|target_key| self.by_primary_key(target, &target_key).cloned())
            .collect())
    }

    fn fetch(&self, spec: &RelationSpec, record: &Record) -> Result<Vec<Record>, ProviderError> {
        match spec.kind {
            RelationType::BelongsTo => self.belongs_to(spec, record),
            RelationType::HasOne | RelationType::HasMany => self.has_many(spec, record),
            RelationType::HasManyThrough => self.through(spec, record),
            RelationType::HasAndBelongsToMany => self.many_to_many(spec, record),
        }
    }
}

impl SchemaProvider for Snapshot {
    type Instance = Record;

    fn find(&self, entity_type: &EntityType, key: &str) -> Result<Option<Record>, ProviderError> {
        self.table(entity_type)?;
        Ok(self.by_primary_key(entity_type, key).cloned())
    }

    fn relations_of(&self, entity_type: &EntityType) -> Result<Vec<RelationDef>, ProviderError> {
        let table = self.table(entity_type)?;
        let mut defs = Vec::with_capacity(table.relations.len());
        for spec in &table.relations {
            if spec.kind != RelationType::HasManyThrough {
                defs.push(RelationDef::direct(spec.step()));
                continue;
            }
            // Chain: the declared relation itself, then the through relation to the join records
            let through_name = spec.required(&spec.through, "through")?;
            let through = table.relation(through_name).ok_or_else(|| {
                ProviderError::Other(format!("through relation '{}' is not declared on {}", through_name, entity_type))
            })?;
            defs.push(RelationDef::through(spec.step(), vec![spec.step(), through.step()]));
        }
        Ok(defs)
    }

    fn resolve_target_type(&self, step: &RelationStep, instance: &Record) -> Result<Option<EntityType>, ProviderError> {
        if let RelationTarget::Fixed(entity_type) = &step.target {
            return Ok(Some(entity_type.clone()));
        }
        match self.table(&instance.entity_type)?.relation(&step.name) {
            Some(spec) => self.polymorphic_target(spec, instance),
            // Declared elsewhere in a chain; nothing to resolve against this record
            None => Ok(None),
        }
    }

    fn exposes(&self, instance: &Record, step: &RelationStep) -> bool {
        self.tables
            .get(&instance.entity_type)
            .is_some_and(|table| table.relation(&step.name).is_some())
    }

    fn related(&self, instance: &Record, step: &RelationStep) -> Result<Vec<Record>, ProviderError> {
        match self.table(&instance.entity_type)?.relation(&step.name) {
            Some(spec) => self.fetch(spec, instance),
            None => Ok(Vec::new()),
        }
    }

    fn identity_of(&self, instance: &Record) -> Result<EntityRef, ProviderError> {
        Ok(EntityRef::new(instance.entity_type.clone(), self.primary_key_of(instance)?))
    }

    fn render_insert(&self, instance: &Record) -> Result<String, ProviderError> {
        render::insert_statement(
            instance.entity_type.as_str(),
            instance.values.iter().map(|(column, value)| (column.as_str(), value)),
        )
    }
}

fn validate_relations(document: &SnapshotDocument) -> Result<(), SnapshotError> {
    let known = |entity_type: &EntityType| document.tables.contains_key(entity_type);

    for (entity_type, table) in &document.tables {
        for spec in &table.relations {
            let context = format!("{}.{}", entity_type, spec.name);
            if let Some(target) = &spec.target {
                if !known(target) {
                    return Err(SnapshotError::Invalid(format!(
                        "{} points at unknown table '{}'",
                        context, target
                    )));
                }
            }

            let missing = |what: &str| SnapshotError::Invalid(format!("{} is missing {}", context, what));
            match spec.kind {
                RelationType::BelongsTo => {
                    if spec.foreign_key.is_none() {
                        return Err(missing("foreign_key"));
                    }
                    if spec.target.is_none() && spec.type_column.is_none() {
                        return Err(missing("target or type_column"));
                    }
                }
                RelationType::HasOne | RelationType::HasMany => {
                    if spec.target.is_none() {
                        return Err(missing("target"));
                    }
                    if spec.foreign_key.is_none() {
                        return Err(missing("foreign_key"));
                    }
                }
                RelationType::HasManyThrough => {
                    let (Some(through), Some(source)) = (&spec.through, &spec.source) else {
                        return Err(missing("through and source"));
                    };
                    let through_target = table
                        .relation(through)
                        .and_then(|r| r.target.as_ref())
                        .ok_or_else(|| missing("a declared through relation with a target"))?;
                    let source_declared = document
                        .tables
                        .get(through_target)
                        .is_some_and(|t| t.relation(source).is_some());
                    if !source_declared {
                        return Err(SnapshotError::Invalid(format!(
                            "{}: source relation '{}' is not declared on '{}'",
                            context, source, through_target
                        )));
                    }
                }
                RelationType::HasAndBelongsToMany => {
                    if spec.target.is_none()
                        || spec.join_table.is_none()
                        || spec.foreign_key.is_none()
                        || spec.association_foreign_key.is_none()
                    {
                        return Err(missing("target, join_table, foreign_key and association_foreign_key"));
                    }
                }
            }
        }
    }
    Ok(())
}
