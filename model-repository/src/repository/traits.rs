//! Capability traits implemented by persistence backends
//!
//! The repository never talks to a database directly. It drives two traits
//! using RPITIT (Return Position Impl Trait In Traits), available since Rust 1.75:
//!
//! - [`Model`]: the canonical model handle captured when a repository is built.
//!   It manufactures fresh, criteria-free queries and performs writes.
//! - [`QueryTarget`]: an in-progress query. Builder methods consume the query
//!   and hand back the refined one, terminals execute it.
//!
//! Records whose attributes vary by locale opt into [`Translatable`] through
//! [`QueryTarget::translatable`].
//!
//! # Example
//!
//! ```rust,ignore
//! use model_repository::repository::{
//!     FilterOperator, FilterValue, Model, OrderDirection, QueryTarget, RepositoryResult,
//! };
//!
//! impl QueryTarget for UserQuery {
//!     type Record = User;
//!     type Id = i64;
//!
//!     fn where_cmp(
//!         mut self,
//!         field: &str,
//!         operator: FilterOperator,
//!         value: &FilterValue,
//!     ) -> RepositoryResult<Self> {
//!         self.builder.push_where(field, operator.as_str(), value)?;
//!         Ok(self)
//!     }
//!
//!     async fn get(self) -> RepositoryResult<Vec<User>> {
//!         self.builder.fetch_all(&self.pool).await.map_err(Into::into)
//!     }
//!     // ... other methods
//! }
//! ```

use std::fmt;
use std::future::Future;

use super::error::{RepositoryError, RepositoryOperation};
use super::filter::{FilterOperator, FilterValue, OrderDirection};
use super::page::Page;

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Attribute bag used for create and update payloads
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// Localized-attribute capability
///
/// A query target whose record type stores some fields per locale exposes
/// this through [`QueryTarget::translatable`]. Filters on those fields are
/// routed to [`QueryTarget::where_translation`] and
/// [`QueryTarget::where_translation_like`], and ordering on them is skipped.
pub trait Translatable {
    /// Names of the fields stored per locale
    fn translated_attributes(&self) -> &[String];

    /// Whether `field` is stored per locale
    fn is_translated_attribute(&self, field: &str) -> bool {
        self.translated_attributes().iter().any(|name| name == field)
    }
}

/// An in-progress query against one model
///
/// Builder methods take `self` by value and return the refined query;
/// callers must always continue with the returned value. A builder method
/// may fail (for instance on a field the model does not have), and that
/// failure propagates to whoever applied the criteria.
pub trait QueryTarget: Sized + Send {
    /// The record type produced by terminals
    type Record: Send;
    /// The identity type used by [`QueryTarget::find`]
    type Id: Send + Sync;

    /// Add a comparison filter: `field <operator> value`
    fn where_cmp(
        self,
        field: &str,
        operator: FilterOperator,
        value: &FilterValue,
    ) -> RepositoryResult<Self>;

    /// Add a set-membership filter: `field IN values`
    fn where_in(self, field: &str, values: &FilterValue) -> RepositoryResult<Self>;

    /// Add a sort key; earlier keys take precedence over later ones
    fn order_by(self, field: &str, direction: OrderDirection) -> RepositoryResult<Self>;

    /// Eager load the named relations on every record the query returns
    fn with(self, relations: &[String]) -> RepositoryResult<Self>;

    /// The localized-attribute capability, if the record type has one
    fn translatable(&self) -> Option<&dyn Translatable> {
        None
    }

    /// Match a localized field against a value in any locale
    fn where_translation(self, _field: &str, _value: &FilterValue) -> RepositoryResult<Self> {
        Err(RepositoryError::unsupported(
            RepositoryOperation::ApplyCriteria,
            "translated attributes",
        ))
    }

    /// Match a localized field against a LIKE pattern in any locale
    fn where_translation_like(self, _field: &str, _value: &FilterValue) -> RepositoryResult<Self> {
        Err(RepositoryError::unsupported(
            RepositoryOperation::ApplyCriteria,
            "translated attributes",
        ))
    }

    /// Fetch the record with the given identity, if it matches the query
    fn find(
        self,
        id: &Self::Id,
    ) -> impl Future<Output = RepositoryResult<Option<Self::Record>>> + Send;

    /// Fetch every matching record
    fn get(self) -> impl Future<Output = RepositoryResult<Vec<Self::Record>>> + Send;

    /// Fetch the first matching record
    fn first(self) -> impl Future<Output = RepositoryResult<Option<Self::Record>>> + Send;

    /// Fetch one page (1-indexed) of matching records along with the total count
    fn paginate(
        self,
        per_page: u64,
        page: u64,
    ) -> impl Future<Output = RepositoryResult<Page<Self::Record>>> + Send;

    /// Count matching records
    fn count(self) -> impl Future<Output = RepositoryResult<u64>> + Send;
}

/// The canonical model handle a repository is built around
///
/// Besides naming the model, it is the only way a repository obtains a
/// query: every terminal operation starts from [`Model::new_query`], which
/// must return a target with no filters, ordering or eager loads applied.
pub trait Model: Send + Sync {
    /// The record type
    type Record: Send + Sync;
    /// The identity type
    type Id: Clone + fmt::Display + Send + Sync;
    /// The query type produced by [`Model::new_query`]
    type Query: QueryTarget<Record = Self::Record, Id = Self::Id>;

    /// Model name used in logs and error context
    fn name(&self) -> &str;

    /// Manufacture a fresh, criteria-free query
    fn new_query(&self) -> Self::Query;

    /// Persist a new record built from `attributes`
    fn create(
        &self,
        attributes: Attributes,
    ) -> impl Future<Output = RepositoryResult<Self::Record>> + Send;

    /// Apply `attributes` to an existing record and persist it
    fn update_record(
        &self,
        record: Self::Record,
        attributes: Attributes,
    ) -> impl Future<Output = RepositoryResult<Self::Record>> + Send;

    /// Remove an existing record
    fn delete_record(
        &self,
        record: Self::Record,
    ) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// Force-assign `attributes` to the record with identity `id` and save it,
    /// inserting it when absent
    ///
    /// Must fail rather than silently skip the write.
    fn force_save(
        &self,
        id: &Self::Id,
        attributes: Attributes,
    ) -> impl Future<Output = RepositoryResult<Self::Record>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Locales(Vec<String>);

    impl Translatable for Locales {
        fn translated_attributes(&self) -> &[String] {
            &self.0
        }
    }

    #[test]
    fn test_is_translated_attribute() {
        let locales = Locales(vec!["title".to_string(), "summary".to_string()]);
        assert!(locales.is_translated_attribute("title"));
        assert!(!locales.is_translated_attribute("slug"));
    }

    #[test]
    fn test_repository_result_type() {
        let ok_result: RepositoryResult<i32> = Ok(42);
        assert!(ok_result.is_ok());

        let err_result: RepositoryResult<i32> = Err(RepositoryError::invalid_operation("x"));
        assert!(err_result.is_err());
    }
}
