//! Filter and ordering accumulator
//!
//! [`Criteria`] collects conditions over several fluent calls and rewrites a
//! [`QueryTarget`] against them on demand. It knows nothing about the
//! repository that owns it and can be applied to any target.
//!
//! # Example
//!
//! ```rust
//! use model_repository::repository::{Criteria, FilterOperator, OrderDirection};
//!
//! let mut criteria = Criteria::new();
//! criteria
//!     .filter("status", "active")
//!     .filter_op("age", FilterOperator::GreaterThanOrEqual, 18_i64)
//!     .order("name", OrderDirection::Ascending)
//!     .order("created_at", OrderDirection::Descending);
//!
//! assert_eq!(criteria.filters().len(), 2);
//! assert_eq!(criteria.orders()[1].0, "created_at");
//! ```

use super::filter::{FilterCondition, FilterOperator, FilterValue, OrderDirection};
use super::traits::{QueryTarget, RepositoryResult};

/// Accumulated filter and order conditions
///
/// Filters apply in insertion order. Ordering keys are unique: ordering by a
/// field a second time replaces its direction but keeps its position, so the
/// first field ordered is always the primary sort key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    filters: Vec<FilterCondition>,
    order: Vec<(String, OrderDirection)>,
}

impl Criteria {
    /// Create empty criteria
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an equality filter
    pub fn filter(&mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> &mut Self {
        self.filter_op(field, FilterOperator::Equal, value)
    }

    /// Append a filter with an explicit operator
    pub fn filter_op(
        &mut self,
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<FilterValue>,
    ) -> &mut Self {
        self.push(FilterCondition::new(field, operator, value.into()))
    }

    /// Append a prepared condition
    pub fn push(&mut self, condition: FilterCondition) -> &mut Self {
        self.filters.push(condition);
        self
    }

    /// Order by `field`, replacing the direction if the field is already ordered
    pub fn order(&mut self, field: impl Into<String>, direction: OrderDirection) -> &mut Self {
        let field = field.into();
        match self.order.iter_mut().find(|(existing, _)| *existing == field) {
            Some(entry) => entry.1 = direction,
            None => self.order.push((field, direction)),
        }
        self
    }

    /// Accumulated filters in application order
    pub fn filters(&self) -> &[FilterCondition] {
        &self.filters
    }

    /// Accumulated ordering in precedence order
    pub fn orders(&self) -> &[(String, OrderDirection)] {
        &self.order
    }

    /// Whether neither filters nor ordering have been accumulated
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty() && self.order.is_empty()
    }

    /// Rewrite `target` with every accumulated filter, in insertion order
    ///
    /// On a translatable target, filters on translated attributes become
    /// locale-aware matches: `like` turns into a translated LIKE, any other
    /// operator into a translated equality. `in` becomes a set-membership
    /// filter and everything else a plain comparison.
    pub fn apply_filters<T: QueryTarget>(&self, mut target: T) -> RepositoryResult<T> {
        for condition in &self.filters {
            let field = condition.field.as_str();
            let translated = target
                .translatable()
                .is_some_and(|locales| locales.is_translated_attribute(field));

            target = if translated {
                match condition.operator {
                    FilterOperator::Like => target.where_translation_like(field, &condition.value)?,
                    _ => target.where_translation(field, &condition.value)?,
                }
            } else {
                match condition.operator {
                    FilterOperator::In => target.where_in(field, &condition.value)?,
                    operator => target.where_cmp(field, operator, &condition.value)?,
                }
            };
        }
        Ok(target)
    }

    /// Rewrite `target` with every accumulated sort key
    ///
    /// Translated attributes cannot be ordered and are skipped.
    pub fn apply_order<T: QueryTarget>(&self, mut target: T) -> RepositoryResult<T> {
        for (field, direction) in &self.order {
            let translated = target
                .translatable()
                .is_some_and(|locales| locales.is_translated_attribute(field));
            if translated {
                tracing::trace!(field = %field, "skipping order on translated attribute");
                continue;
            }
            target = target.order_by(field, *direction)?;
        }
        Ok(target)
    }

    /// Apply filters, then ordering
    pub fn apply<T: QueryTarget>(&self, target: T) -> RepositoryResult<T> {
        let target = self.apply_filters(target)?;
        self.apply_order(target)
    }

    /// Drop all accumulated filters
    pub fn reset_filters(&mut self) -> &mut Self {
        self.filters.clear();
        self
    }

    /// Drop all accumulated ordering
    pub fn reset_order(&mut self) -> &mut Self {
        self.order.clear();
        self
    }
}
