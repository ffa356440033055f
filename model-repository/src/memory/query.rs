//! Query execution over a [`MemoryStore`]

use std::cmp::Ordering;
use std::sync::Arc;

use serde_json::Value;

use super::matcher::{self, LikePattern};
use super::record::Record;
use super::schema::{RelationKind, TableSchema};
use super::store::{unknown_table, MemoryStore, Tables};
use crate::repository::{
    FilterOperator, FilterValue, OrderDirection, Page, QueryTarget, RepositoryError, RepositoryOperation,
    RepositoryResult, Translatable,
};

#[derive(Debug, Clone)]
enum Predicate {
    Compare {
        column: String,
        operator: FilterOperator,
        value: Value,
    },
    In {
        column: String,
        values: Vec<Value>,
    },
    Like {
        column: String,
        pattern: LikePattern,
    },
    Translation {
        column: String,
        values: Vec<Value>,
    },
    TranslationLike {
        column: String,
        pattern: LikePattern,
    },
}

impl Predicate {
    fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Compare {
                column,
                operator,
                value,
            } => matcher::satisfies(record.column(column).as_deref(), *operator, value),
            Self::In { column, values } => {
                let current = record.column(column);
                values.iter().any(|value| {
                    !value.is_null() && matcher::satisfies(current.as_deref(), FilterOperator::Equal, value)
                })
            }
            Self::Like { column, pattern } => record.column(column).is_some_and(|value| pattern.matches(&value)),
            Self::Translation { column, values } => matcher::localized_values(record.get(column))
                .into_iter()
                .any(|text| values.iter().any(|value| matcher::compare(text, value) == Some(Ordering::Equal))),
            Self::TranslationLike { column, pattern } => matcher::localized_values(record.get(column))
                .into_iter()
                .any(|text| pattern.matches(text)),
        }
    }
}

enum Window {
    All,
    Slice { offset: usize, limit: usize },
}

fn pattern_text(value: &FilterValue) -> String {
    match value.as_str() {
        Some(text) => text.to_string(),
        None => Value::from(value).to_string(),
    }
}

fn member_values(value: &FilterValue) -> Vec<Value> {
    value.members().into_iter().map(Value::from).collect()
}

/// An in-progress query against one table
///
/// Builder calls validate column and relation names against the table's
/// schema and fail with an `InvalidField` error on unknown ones. Nothing is
/// read until a terminal runs.
#[derive(Debug, Clone)]
pub struct MemoryQuery {
    store: MemoryStore,
    schema: Arc<TableSchema>,
    predicates: Vec<Predicate>,
    order: Vec<(String, OrderDirection)>,
    relations: Vec<String>,
}

impl MemoryQuery {
    pub(crate) fn new(store: MemoryStore, schema: Arc<TableSchema>) -> Self {
        Self {
            store,
            schema,
            predicates: Vec::new(),
            order: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Name of the queried table
    pub fn table(&self) -> &str {
        self.schema.name()
    }

    /// Whether no filter, ordering or eager load has been applied
    pub fn is_pristine(&self) -> bool {
        self.predicates.is_empty() && self.order.is_empty() && self.relations.is_empty()
    }

    fn ensure_column(&self, column: &str) -> RepositoryResult<()> {
        if self.schema.has_column(column) {
            Ok(())
        } else {
            Err(RepositoryError::invalid_field(RepositoryOperation::ApplyCriteria, column)
                .with_entity_type(self.schema.name()))
        }
    }

    fn ensure_translated(&self, column: &str) -> RepositoryResult<()> {
        if self.schema.is_translated_attribute(column) {
            Ok(())
        } else {
            Err(RepositoryError::invalid_field(RepositoryOperation::ApplyCriteria, column)
                .with_entity_type(self.schema.name()))
        }
    }

    fn compare_rows(&self, left: &Record, right: &Record) -> Ordering {
        self.order.iter().fold(Ordering::Equal, |ordering, (column, direction)| {
            ordering.then_with(|| {
                let by_column = matcher::sort_order(left.column(column).as_deref(), right.column(column).as_deref());
                match direction {
                    OrderDirection::Ascending => by_column,
                    OrderDirection::Descending => by_column.reverse(),
                }
            })
        })
    }

    fn load_relations(&self, tables: &Tables, mut record: Record) -> RepositoryResult<Record> {
        for name in &self.relations {
            let relation = self.schema.relation(name).ok_or_else(|| {
                RepositoryError::invalid_field(RepositoryOperation::EagerLoad, name).with_entity_type(self.table())
            })?;
            let related = tables
                .get(&relation.table)
                .ok_or_else(|| unknown_table(RepositoryOperation::EagerLoad, &relation.table))?;

            let loaded: Vec<Record> = match relation.kind {
                RelationKind::HasMany => related
                    .rows
                    .values()
                    .filter(|row| row.get(&relation.foreign_key).and_then(Value::as_i64) == Some(record.id))
                    .cloned()
                    .collect(),
                RelationKind::BelongsTo => record
                    .get(&relation.foreign_key)
                    .and_then(Value::as_i64)
                    .and_then(|key| related.rows.get(&key))
                    .cloned()
                    .into_iter()
                    .collect(),
            };
            record.relations.insert(name.clone(), loaded);
        }
        Ok(record)
    }

    /// Filter, sort and slice the table; returns the slice and the number of matching rows
    async fn fetch(
        self,
        operation: RepositoryOperation,
        id: Option<i64>,
        window: Window,
    ) -> RepositoryResult<(Vec<Record>, u64)> {
        let tables = self.store.read().await;
        let table = tables
            .get(self.table())
            .ok_or_else(|| unknown_table(operation, self.table()))?;

        let mut rows: Vec<&Record> = table
            .rows
            .values()
            .filter(|row| id.map_or(true, |id| row.id == id))
            .filter(|row| self.predicates.iter().all(|predicate| predicate.matches(row)))
            .collect();
        let total = rows.len() as u64;

        if !self.order.is_empty() {
            rows.sort_by(|left, right| self.compare_rows(left, right));
        }

        let selected: Vec<&Record> = match window {
            Window::All => rows,
            Window::Slice { offset, limit } => rows.into_iter().skip(offset).take(limit).collect(),
        };

        tracing::trace!(
            table = self.table(),
            %operation,
            matched = total,
            returned = selected.len(),
            "Executed in-memory query"
        );

        let records = selected
            .into_iter()
            .map(|row| self.load_relations(&tables, row.clone()))
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok((records, total))
    }
}

impl QueryTarget for MemoryQuery {
    type Record = Record;
    type Id = i64;

    fn where_cmp(mut self, field: &str, operator: FilterOperator, value: &FilterValue) -> RepositoryResult<Self> {
        self.ensure_column(field)?;
        let predicate = match operator {
            FilterOperator::In => return self.where_in(field, value),
            FilterOperator::Like => Predicate::Like {
                column: field.to_string(),
                pattern: LikePattern::new(&pattern_text(value))?,
            },
            operator => Predicate::Compare {
                column: field.to_string(),
                operator,
                value: Value::from(value),
            },
        };
        self.predicates.push(predicate);
        Ok(self)
    }

    fn where_in(mut self, field: &str, values: &FilterValue) -> RepositoryResult<Self> {
        self.ensure_column(field)?;
        self.predicates.push(Predicate::In {
            column: field.to_string(),
            values: member_values(values),
        });
        Ok(self)
    }

    fn order_by(mut self, field: &str, direction: OrderDirection) -> RepositoryResult<Self> {
        self.ensure_column(field)?;
        self.order.push((field.to_string(), direction));
        Ok(self)
    }

    fn with(mut self, relations: &[String]) -> RepositoryResult<Self> {
        for name in relations {
            if self.schema.relation(name).is_none() {
                return Err(RepositoryError::invalid_field(RepositoryOperation::EagerLoad, name)
                    .with_entity_type(self.table()));
            }
            if !self.relations.contains(name) {
                self.relations.push(name.clone());
            }
        }
        Ok(self)
    }

    fn translatable(&self) -> Option<&dyn Translatable> {
        self.schema
            .is_translatable()
            .then(|| self.schema.as_ref() as &dyn Translatable)
    }

    fn where_translation(mut self, field: &str, value: &FilterValue) -> RepositoryResult<Self> {
        self.ensure_translated(field)?;
        self.predicates.push(Predicate::Translation {
            column: field.to_string(),
            values: member_values(value),
        });
        Ok(self)
    }

    fn where_translation_like(mut self, field: &str, value: &FilterValue) -> RepositoryResult<Self> {
        self.ensure_translated(field)?;
        self.predicates.push(Predicate::TranslationLike {
            column: field.to_string(),
            pattern: LikePattern::new(&pattern_text(value))?,
        });
        Ok(self)
    }

    async fn find(self, id: &i64) -> RepositoryResult<Option<Record>> {
        let (records, _) = self.fetch(RepositoryOperation::Find, Some(*id), Window::All).await?;
        Ok(records.into_iter().next())
    }

    async fn get(self) -> RepositoryResult<Vec<Record>> {
        let (records, _) = self.fetch(RepositoryOperation::FindAll, None, Window::All).await?;
        Ok(records)
    }

    async fn first(self) -> RepositoryResult<Option<Record>> {
        let window = Window::Slice { offset: 0, limit: 1 };
        let (records, _) = self.fetch(RepositoryOperation::First, None, window).await?;
        Ok(records.into_iter().next())
    }

    async fn paginate(self, per_page: u64, page: u64) -> RepositoryResult<Page<Record>> {
        let per_page = per_page.max(1);
        let page = page.max(1);
        let offset = (page - 1).saturating_mul(per_page);
        let window = Window::Slice {
            offset: usize::try_from(offset).unwrap_or(usize::MAX),
            limit: usize::try_from(per_page).unwrap_or(usize::MAX),
        };

        let (records, total) = self.fetch(RepositoryOperation::Paginate, None, window).await?;
        Ok(Page::new(records, per_page, page, total))
    }

    async fn count(self) -> RepositoryResult<u64> {
        let window = Window::Slice { offset: 0, limit: 0 };
        let (_, total) = self.fetch(RepositoryOperation::Count, None, window).await?;
        Ok(total)
    }
}
