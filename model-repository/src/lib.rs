//! # model-repository
//!
//! Criteria-driven repository layer over pluggable model backends.
//!
//! Application code talks to a [`Repository`](repository::Repository) instead of
//! a query builder. Filters, ordering and eager loads accumulate across fluent
//! calls and run with one terminal call, after which the repository's criteria
//! are cleared. Eager loads stay registered until replaced.
//!
//! ## Features
//!
//! - **Criteria**: ordered filters (`=`, `!=`, `<`, `<=`, `>`, `>=`, `like`, `in`) and
//!   multi-key ordering, applied to any [`QueryTarget`](repository::QueryTarget)
//! - **Scope reset**: every terminal call consumes the accumulated criteria, on success and on failure
//! - **Localized attributes**: filters on translated fields become any-locale matches
//! - **Pagination**: pages carry the caller's request parameters into their links
//! - **In-memory backend** (`memory` feature, on by default): a schema-checked store for tests and prototypes
//! - **Configuration**: Figment (defaults, TOML file, `MODEL_REPOSITORY_` environment)
//! - **Logging**: `tracing` events on every operation, JSON or plain output via `tracing-subscriber`
//!
//! ## Example
//!
//! ```rust
//! use model_repository::memory::{MemoryStore, TableSchema};
//! use model_repository::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!
//!     let store = MemoryStore::new();
//!     let users = store
//!         .define(TableSchema::new("users").columns(["name", "email", "status"]))
//!         .await;
//!     let mut users = Repository::configured(users, config.repository.clone());
//!
//!     let attributes: Attributes = serde_json::from_value(json!({
//!         "name": "Ada",
//!         "email": "ada@example.com",
//!         "status": "active",
//!     }))
//!     .map_err(RepositoryError::from)?;
//!     let ada = users.create(attributes).await?;
//!
//!     let found = users.dispatch("findByEmail", &["ada@example.com".into()]).await?;
//!     assert_eq!(found.map(|user| user.id), Some(ada.id));
//!
//!     let active = users.filter("status", "active").find_all().await?;
//!     assert_eq!(active.len(), 1);
//!
//!     // `count` ignores accumulated filters by default
//!     assert_eq!(users.filter("status", "banned").count().await?, 1);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod observability;
pub mod repository;

#[cfg(feature = "memory")]
pub mod memory;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Config, LoggingConfig, RepositoryConfig};
    pub use crate::error::{Error, Result};
    pub use crate::observability::init_tracing;
    pub use crate::repository::{
        Attributes, Criteria, FilterCondition, FilterOperator, FilterValue, Model, OrderDirection, Page,
        PageRequest, QueryTarget, Relations, Repository, RepositoryError, RepositoryErrorKind,
        RepositoryOperation, RepositoryResult, Translatable,
    };
}
