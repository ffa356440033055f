//! Shared table storage and the [`Model`] implementation over it

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::{RwLock, RwLockReadGuard};

use super::query::MemoryQuery;
use super::record::Record;
use super::schema::{TableSchema, CREATED_AT, ID_COLUMN, UPDATED_AT};
use crate::repository::{Attributes, Model, RepositoryError, RepositoryOperation, RepositoryResult};

#[derive(Debug)]
pub(crate) struct Table {
    pub(crate) schema: Arc<TableSchema>,
    pub(crate) rows: BTreeMap<i64, Record>,
    // None once an id of i64::MAX has been stored
    next_id: Option<i64>,
}

impl Table {
    fn new(schema: Arc<TableSchema>) -> Self {
        Self {
            schema,
            rows: BTreeMap::new(),
            next_id: Some(1),
        }
    }

    fn insert(&mut self, record: Record) {
        self.next_id = match (self.next_id, record.id.checked_add(1)) {
            (Some(next), Some(after)) => Some(next.max(after)),
            _ => None,
        };
        self.rows.insert(record.id, record);
    }
}

pub(crate) type Tables = BTreeMap<String, Table>;

pub(crate) fn unknown_table(operation: RepositoryOperation, table: &str) -> RepositoryError {
    RepositoryError::database_error(operation, format!("Unknown table: {table}")).with_entity_type(table)
}

/// Cloneable handle to a set of in-memory tables
///
/// Clones share the same tables.
///
/// ```rust
/// use model_repository::memory::{MemoryStore, TableSchema};
/// use model_repository::repository::Repository;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let users = store.define(TableSchema::new("users").columns(["name"])).await;
///
/// let mut repository = Repository::new(users);
/// repository.create(serde_json::json!({"name": "Ada"}).as_object().cloned().unwrap_or_default()).await?;
/// assert_eq!(repository.count().await?, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// An empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or replace, dropping its rows) a table and return its model
    pub async fn define(&self, schema: TableSchema) -> MemoryModel {
        let schema = Arc::new(schema);
        let mut tables = self.tables.write().await;
        let replaced = tables
            .insert(schema.name().to_string(), Table::new(Arc::clone(&schema)))
            .is_some();

        tracing::info!(
            table = schema.name(),
            columns = schema.column_names().len(),
            translated = schema.is_translatable(),
            replaced,
            "Defined in-memory table"
        );

        MemoryModel {
            store: self.clone(),
            schema,
        }
    }

    /// Model handle for an already defined table
    pub async fn model(&self, table: &str) -> RepositoryResult<MemoryModel> {
        let tables = self.tables.read().await;
        let schema = tables
            .get(table)
            .map(|existing| Arc::clone(&existing.schema))
            .ok_or_else(|| unknown_table(RepositoryOperation::Find, table))?;

        Ok(MemoryModel {
            store: self.clone(),
            schema,
        })
    }

    pub(crate) async fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().await
    }
}

/// Model handle for one table of a [`MemoryStore`]
#[derive(Debug, Clone)]
pub struct MemoryModel {
    store: MemoryStore,
    schema: Arc<TableSchema>,
}

impl MemoryModel {
    /// The table definition
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    fn check_columns(&self, operation: RepositoryOperation, attributes: &Attributes) -> RepositoryResult<()> {
        match attributes.keys().find(|column| !self.schema.has_column(column)) {
            Some(column) => {
                Err(RepositoryError::invalid_field(operation, column).with_entity_type(self.schema.name()))
            }
            None => Ok(()),
        }
    }

    fn touch(&self, attributes: &mut Attributes, creating: bool) {
        if !self.schema.uses_timestamps() {
            return;
        }
        let now = Value::String(Utc::now().to_rfc3339());
        if creating {
            attributes.entry(CREATED_AT).or_insert_with(|| now.clone());
        }
        attributes.entry(UPDATED_AT).or_insert(now);
    }
}

impl Model for MemoryModel {
    type Record = Record;
    type Id = i64;
    type Query = MemoryQuery;

    fn name(&self) -> &str {
        self.schema.name()
    }

    fn new_query(&self) -> MemoryQuery {
        MemoryQuery::new(self.store.clone(), Arc::clone(&self.schema))
    }

    async fn create(&self, mut attributes: Attributes) -> RepositoryResult<Record> {
        let operation = RepositoryOperation::Create;
        self.check_columns(operation, &attributes)?;

        let explicit_id = match attributes.remove(ID_COLUMN) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value.as_i64().ok_or_else(|| {
                RepositoryError::validation_failed(operation, format!("id must be an integer, got {value}"))
                    .with_entity_type(self.name())
            })?),
        };
        self.touch(&mut attributes, true);

        let mut tables = self.store.tables.write().await;
        let table = tables
            .get_mut(self.name())
            .ok_or_else(|| unknown_table(operation, self.name()))?;

        let id = match explicit_id {
            Some(id) if table.rows.contains_key(&id) => {
                return Err(RepositoryError::already_exists(self.name(), id.to_string()));
            }
            Some(id) => id,
            None => match table.next_id {
                Some(id) if table.rows.contains_key(&id) => {
                    return Err(RepositoryError::already_exists(self.name(), id.to_string()));
                }
                Some(id) => id,
                None => {
                    return Err(RepositoryError::validation_failed(operation, "No identity left to assign")
                        .with_entity_type(self.name()));
                }
            },
        };

        let record = Record::new(id, attributes);
        table.insert(record.clone());
        tracing::debug!(table = self.name(), id, "Inserted record");

        Ok(record)
    }

    async fn update_record(&self, record: Record, mut attributes: Attributes) -> RepositoryResult<Record> {
        let operation = RepositoryOperation::Update;
        self.check_columns(operation, &attributes)?;
        // The primary key is not reassignable
        attributes.remove(ID_COLUMN);
        self.touch(&mut attributes, false);

        let mut tables = self.store.tables.write().await;
        let table = tables
            .get_mut(self.name())
            .ok_or_else(|| unknown_table(operation, self.name()))?;
        let stored = table
            .rows
            .get_mut(&record.id)
            .ok_or_else(|| RepositoryError::not_found(self.name(), record.id.to_string()))?;

        stored.attributes.extend(attributes);
        tracing::debug!(table = self.name(), id = record.id, "Updated record");

        Ok(Record {
            relations: record.relations,
            ..stored.clone()
        })
    }

    async fn delete_record(&self, record: Record) -> RepositoryResult<()> {
        let operation = RepositoryOperation::Delete;
        let mut tables = self.store.tables.write().await;
        let table = tables
            .get_mut(self.name())
            .ok_or_else(|| unknown_table(operation, self.name()))?;

        match table.rows.remove(&record.id) {
            Some(_) => {
                tracing::debug!(table = self.name(), id = record.id, "Deleted record");
                Ok(())
            }
            None => Err(RepositoryError::not_found(self.name(), record.id.to_string()).with_operation(operation)),
        }
    }

    async fn force_save(&self, id: &i64, mut attributes: Attributes) -> RepositoryResult<Record> {
        let operation = RepositoryOperation::ForceUpdate;
        self.check_columns(operation, &attributes)?;
        attributes.remove(ID_COLUMN);

        let mut tables = self.store.tables.write().await;
        let table = tables
            .get_mut(self.name())
            .ok_or_else(|| unknown_table(operation, self.name()))?;

        if let Some(stored) = table.rows.get_mut(id) {
            self.touch(&mut attributes, false);
            stored.attributes.extend(attributes);
            tracing::debug!(table = self.name(), id, "Force-saved existing record");
            return Ok(stored.clone());
        }

        self.touch(&mut attributes, true);
        let record = Record::new(*id, attributes);
        table.insert(record.clone());
        tracing::debug!(table = self.name(), id, "Force-saved new record");

        Ok(record)
    }
}
