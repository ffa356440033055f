//! Repository pattern over pluggable persistence backends
//!
//! This module decouples application code from the query builder of the
//! underlying store:
//!
//! - [`Criteria`] accumulates filter and ordering conditions and applies them
//!   to any [`QueryTarget`] on demand.
//! - [`Repository`] owns one model handle and one pending [`Scope`], exposes
//!   fluent accumulation, and guarantees each terminal call starts from a
//!   fresh, criteria-free query.
//! - [`Model`] and [`QueryTarget`] are implemented by backends. The crate
//!   ships an in-memory one in [`crate::memory`].
//!
//! # Example
//!
//! ```rust,ignore
//! use model_repository::prelude::*;
//!
//! async fn active_admins<M: Model>(repository: &mut Repository<M>) -> RepositoryResult<Vec<M::Record>> {
//!     repository
//!         .filter("role", "admin")
//!         .filter_op("last_login", FilterOperator::GreaterThan, "2024-01-01")
//!         .order("name", OrderDirection::Ascending)
//!         .with(["team"])
//!         .find_all()
//!         .await
//! }
//! ```

mod base;
mod criteria;
mod error;
mod filter;
mod page;
mod scope;
mod traits;

// Re-export all public types
pub use base::Repository;
pub use criteria::Criteria;
pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
pub use filter::{FilterCondition, FilterOperator, FilterValue, OrderDirection, ParseFilterError};
pub use page::{Page, PageRequest};
pub use scope::{Relations, Scope};
pub use traits::{Attributes, Model, QueryTarget, RepositoryResult, Translatable};
