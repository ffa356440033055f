//! In-memory persistence backend
//!
//! A [`MemoryStore`] holds named tables of JSON rows. [`MemoryModel`]
//! implements [`Model`](crate::repository::Model) and [`MemoryQuery`]
//! implements [`QueryTarget`](crate::repository::QueryTarget), so a
//! [`Repository`](crate::repository::Repository) can run against it without a
//! database. It is meant for tests, examples and prototyping.
//!
//! Tables declare their columns up front. Filters, ordering and writes that
//! name an undeclared column fail with an `InvalidField` error, and columns
//! declared as translated hold one text per locale.
//!
//! # Example
//!
//! ```rust
//! use model_repository::memory::{MemoryStore, TableSchema};
//! use model_repository::repository::{Attributes, Repository};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! let users = store
//!     .define(TableSchema::new("users").columns(["name", "status"]))
//!     .await;
//!
//! let mut repository = Repository::new(users);
//! for (name, status) in [("Ada", "active"), ("Bob", "banned")] {
//!     let attributes: Attributes = serde_json::from_value(json!({"name": name, "status": status}))?;
//!     repository.create(attributes).await?;
//! }
//!
//! let active = repository.filter("status", "active").find_all().await?;
//! assert_eq!(active.len(), 1);
//! assert_eq!(active[0].get_str("name"), Some("Ada"));
//! # Ok(())
//! # }
//! ```

mod matcher;
mod query;
mod record;
mod schema;
mod store;

pub use query::MemoryQuery;
pub use record::Record;
pub use schema::{Relation, RelationKind, TableSchema, ID_COLUMN};
pub use store::{MemoryModel, MemoryStore};
