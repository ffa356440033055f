//! The repository: fluent criteria over a model, executed by terminal calls
//!
//! A [`Repository`] accumulates filters, ordering and eager loads through
//! `&mut self` calls, then runs them with exactly one terminal call (`find`,
//! `find_all`, `first`, `paginate`, `count`, `update`, `delete`). Every
//! terminal call starts from a fresh query manufactured by the model and
//! leaves the repository with empty criteria, whether it succeeds or fails.
//! Eager loads stay registered until replaced, unless `retain_eager_loads`
//! is turned off.
//!
//! A repository is scoped to one logical sequence of calls. Share the model,
//! not the repository.

use super::criteria::Criteria;
use super::error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
use super::filter::{FilterOperator, FilterValue, OrderDirection};
use super::page::{Page, PageRequest};
use super::scope::{Relations, Scope};
use super::traits::{Attributes, Model, QueryTarget, RepositoryResult};
use crate::config::RepositoryConfig;

/// Generic CRUD and query operations over one model
///
/// # Example
///
/// ```rust
/// use model_repository::memory::{MemoryStore, TableSchema};
/// use model_repository::repository::{Attributes, OrderDirection, Repository};
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let users = store.define(TableSchema::new("users").columns(["name", "status"])).await;
/// let mut users = Repository::new(users);
///
/// for (name, status) in [("Carol", "active"), ("Bob", "banned"), ("Ada", "active")] {
///     let attributes: Attributes = serde_json::from_value(json!({"name": name, "status": status}))?;
///     users.create(attributes).await?;
/// }
///
/// let page = users
///     .filter("status", "active")
///     .order("name", OrderDirection::Ascending)
///     .paginate(10)
///     .await?;
/// assert_eq!(page.total, 2);
/// assert_eq!(page.items[0].get_str("name"), Some("Ada"));
///
/// // The scope was reset: this page is unfiltered
/// assert_eq!(users.paginate(10).await?.total, 3);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Repository<M> {
    model: M,
    scope: Scope,
    config: RepositoryConfig,
}

impl<M: Model> Repository<M> {
    /// Create a repository with default configuration
    pub fn new(model: M) -> Self {
        Self::configured(model, RepositoryConfig::default())
    }

    /// Create a repository with explicit configuration
    pub fn configured(model: M, config: RepositoryConfig) -> Self {
        Self {
            model,
            scope: Scope::new(),
            config,
        }
    }

    /// The model this repository was built around
    pub fn model(&self) -> &M {
        &self.model
    }

    /// A fresh query for the model, unaffected by the accumulated scope
    pub fn new_query(&self) -> M::Query {
        self.model.new_query()
    }

    /// Active configuration
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Criteria accumulated since the last terminal call
    pub fn criteria(&self) -> &Criteria {
        self.scope.criteria()
    }

    /// Relations registered for the next read, if any
    pub fn pending_relations(&self) -> Option<&[String]> {
        self.scope.relations().map(Relations::names)
    }

    /// Add an equality filter
    pub fn filter(&mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> &mut Self {
        self.scope.criteria_mut().filter(field, value);
        self
    }

    /// Add a filter with an explicit operator
    pub fn filter_op(
        &mut self,
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<FilterValue>,
    ) -> &mut Self {
        self.scope.criteria_mut().filter_op(field, operator, value);
        self
    }

    /// Order by a field; ordering the same field again only changes its direction
    pub fn order(&mut self, field: impl Into<String>, direction: OrderDirection) -> &mut Self {
        self.scope.criteria_mut().order(field, direction);
        self
    }

    /// Eager load relations on subsequent reads, replacing any registered before
    pub fn with(&mut self, relations: impl Into<Relations>) -> &mut Self {
        self.scope.set_relations(relations.into());
        self
    }

    /// Fetch a record by identity, honouring the accumulated scope
    pub async fn find(&mut self, id: &M::Id) -> RepositoryResult<Option<M::Record>> {
        let operation = RepositoryOperation::Find;
        let scope = self.take_scope();
        tracing::debug!(model = self.model.name(), %id, "find");

        let query = self.prepare(operation, &scope)?;
        query.find(id).await.map_err(|error| self.failed(operation, error))
    }

    /// Fetch every record matching the accumulated scope
    pub async fn find_all(&mut self) -> RepositoryResult<Vec<M::Record>> {
        let operation = RepositoryOperation::FindAll;
        let scope = self.take_scope();

        let query = self.prepare(operation, &scope)?;
        query.get().await.map_err(|error| self.failed(operation, error))
    }

    /// Fetch the first record matching the accumulated scope
    pub async fn first(&mut self) -> RepositoryResult<Option<M::Record>> {
        let operation = RepositoryOperation::First;
        let scope = self.take_scope();

        let query = self.prepare(operation, &scope)?;
        query.first().await.map_err(|error| self.failed(operation, error))
    }

    /// Fetch the first page of records matching the accumulated scope
    ///
    /// A `per_page` of zero selects the configured default.
    pub async fn paginate(&mut self, per_page: u64) -> RepositoryResult<Page<M::Record>> {
        self.paginate_request(per_page, &PageRequest::default()).await
    }

    /// Fetch the requested page, carrying the request's query parameters into page links
    pub async fn paginate_request(
        &mut self,
        per_page: u64,
        request: &PageRequest,
    ) -> RepositoryResult<Page<M::Record>> {
        let operation = RepositoryOperation::Paginate;
        let scope = self.take_scope();
        let per_page = self.config.effective_per_page(per_page);
        let page_number = request.page();
        tracing::debug!(model = self.model.name(), per_page, page = page_number, "paginate");

        let query = self.prepare(operation, &scope)?;
        let mut page = query
            .paginate(per_page, page_number)
            .await
            .map_err(|error| self.failed(operation, error))?
            .appends(request.query().clone());
        if let Some(path) = request.path() {
            page = page.with_path(path);
        }
        Ok(page)
    }

    /// Count records
    ///
    /// Only eager loads are applied; accumulated filters and ordering are
    /// discarded unless `count_applies_criteria` is configured.
    pub async fn count(&mut self) -> RepositoryResult<u64> {
        let operation = RepositoryOperation::Count;
        let scope = self.take_scope();
        let scope = if self.config.count_applies_criteria {
            scope
        } else {
            scope.keep_relations_only()
        };

        let query = self.prepare(operation, &scope)?;
        query.count().await.map_err(|error| self.failed(operation, error))
    }

    /// Persist a new record; the accumulated scope is left untouched
    pub async fn create(&self, attributes: Attributes) -> RepositoryResult<M::Record> {
        tracing::debug!(model = self.model.name(), attributes = attributes.len(), "create");
        self.model
            .create(attributes)
            .await
            .map_err(|error| self.failed(RepositoryOperation::Create, error))
    }

    /// Persist a new record bypassing attribute guards
    ///
    /// Currently identical to [`Repository::create`].
    pub async fn force_create(&self, attributes: Attributes) -> RepositoryResult<M::Record> {
        tracing::debug!(model = self.model.name(), attributes = attributes.len(), "force_create");
        self.model
            .create(attributes)
            .await
            .map_err(|error| self.failed(RepositoryOperation::ForceCreate, error))
    }

    /// Update the record with identity `id`
    ///
    /// The lookup honours the accumulated scope. Returns `Ok(None)` when no
    /// record matches; nothing is written in that case.
    pub async fn update(&mut self, id: &M::Id, attributes: Attributes) -> RepositoryResult<Option<M::Record>> {
        let Some(record) = self.find(id).await? else {
            tracing::debug!(model = self.model.name(), %id, "update: no matching record");
            return Ok(None);
        };

        let updated = self
            .model
            .update_record(record, attributes)
            .await
            .map_err(|error| self.failed(RepositoryOperation::Update, error))?;
        Ok(Some(updated))
    }

    /// Persist `attributes` for identity `id` without a lookup
    ///
    /// The attributes are written at `id` rather than force-filled onto a new,
    /// id-less record: an existing row is overwritten field by field, a missing
    /// one is inserted with that identity. The accumulated scope is neither
    /// applied nor reset. Failures always propagate.
    pub async fn force_update(&self, id: &M::Id, attributes: Attributes) -> RepositoryResult<M::Record> {
        tracing::debug!(model = self.model.name(), %id, "force_update");
        self.model
            .force_save(id, attributes)
            .await
            .map_err(|error| self.failed(RepositoryOperation::ForceUpdate, error))
    }

    /// Delete the record with identity `id`
    ///
    /// The lookup honours the accumulated scope. Returns `Ok(false)` when no
    /// record matches.
    pub async fn delete(&mut self, id: &M::Id) -> RepositoryResult<bool> {
        let Some(record) = self.find(id).await? else {
            tracing::debug!(model = self.model.name(), %id, "delete: no matching record");
            return Ok(false);
        };

        self.model
            .delete_record(record)
            .await
            .map_err(|error| self.failed(RepositoryOperation::Delete, error))?;
        Ok(true)
    }

    /// First record whose `attribute` equals `value`
    ///
    /// Runs on a fresh query: the accumulated scope is neither applied nor reset.
    pub async fn find_by(
        &self,
        attribute: &str,
        value: impl Into<FilterValue>,
    ) -> RepositoryResult<Option<M::Record>> {
        let operation = RepositoryOperation::FindBy;
        let value = value.into();
        tracing::debug!(model = self.model.name(), attribute, %value, "find_by");

        let query = self
            .model
            .new_query()
            .where_cmp(attribute, FilterOperator::Equal, &value)
            .map_err(|error| self.failed(operation, error))?;
        query.first().await.map_err(|error| self.failed(operation, error))
    }

    /// Invoke a lookup by method name
    ///
    /// `findBy<Attribute>` and `find_by_<attribute>` resolve to
    /// [`Repository::find_by`] on the lowercased attribute with the first
    /// argument. Any other name, including the repository's own methods, is an
    /// `InvalidOperation` error.
    ///
    /// ```rust
    /// use model_repository::memory::{MemoryStore, TableSchema};
    /// use model_repository::repository::{Repository, RepositoryErrorKind};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let users = MemoryStore::new().define(TableSchema::new("users").columns(["email"])).await;
    /// let repository = Repository::new(users);
    ///
    /// let found = repository.dispatch("findByEmail", &["a@b.com".into()]).await;
    /// assert!(matches!(found, Ok(None)));
    ///
    /// let error = repository.dispatch("banana", &[]).await.unwrap_err();
    /// assert_eq!(error.kind, RepositoryErrorKind::InvalidOperation);
    /// # }
    /// ```
    pub async fn dispatch(&self, method: &str, args: &[FilterValue]) -> RepositoryResult<Option<M::Record>> {
        let operation = RepositoryOperation::Dispatch;
        let Some(attribute) = find_by_attribute(method) else {
            return Err(self.failed(operation, RepositoryError::invalid_operation(method)));
        };
        let Some(value) = args.first() else {
            let error = RepositoryError::new(
                operation,
                RepositoryErrorKind::InvalidOperation,
                format!("Method [{method}] expects a value to match"),
            );
            return Err(self.failed(operation, error));
        };

        self.find_by(&attribute, value.clone()).await
    }

    /// Move the accumulated scope out, leaving empty criteria behind
    ///
    /// Registered relations are copied back unless `retain_eager_loads` is off.
    fn take_scope(&mut self) -> Scope {
        let retained = if self.config.retain_eager_loads {
            self.scope.relations().cloned()
        } else {
            None
        };

        let scope = std::mem::take(&mut self.scope);
        if let Some(relations) = retained {
            self.scope.set_relations(relations);
        }
        scope
    }

    /// Fresh query with eager loads and criteria applied
    fn prepare(&self, operation: RepositoryOperation, scope: &Scope) -> RepositoryResult<M::Query> {
        let criteria = scope.criteria();
        tracing::debug!(
            model = self.model.name(),
            %operation,
            filters = criteria.filters().len(),
            orders = criteria.orders().len(),
            relations = scope.relations().map_or(0, |relations| relations.names().len()),
            "Applying scope"
        );

        scope
            .apply(self.model.new_query())
            .map_err(|error| self.failed(operation, error))
    }

    fn failed(&self, operation: RepositoryOperation, error: RepositoryError) -> RepositoryError {
        tracing::warn!(
            model = self.model.name(),
            %operation,
            kind = %error.kind,
            error = %error,
            "Repository operation failed"
        );
        error
    }
}

fn find_by_attribute(method: &str) -> Option<String> {
    let attribute = method
        .strip_prefix("findBy")
        .or_else(|| method.strip_prefix("find_by_"))?;
    (!attribute.is_empty()).then(|| attribute.to_lowercase())
}

#[cfg(all(test, feature = "memory"))]
mod tests {
    use super::*;
    use crate::memory::{MemoryModel, MemoryStore, Record, TableSchema};
    use serde_json::{json, Value};

    fn attrs(value: Value) -> Attributes {
        value.as_object().cloned().unwrap_or_default()
    }

    /// 13 users; ids divisible by 3 are banned. Names run backwards from
    /// `user13` (id 1) to `user01` (id 13).
    async fn seeded() -> (MemoryModel, MemoryModel) {
        let store = MemoryStore::new();
        let users = store
            .define(
                TableSchema::new("users")
                    .columns(["name", "email", "status"])
                    .has_many("posts", "posts", "user_id")
                    .has_many("teams", "teams", "user_id"),
            )
            .await;
        let posts = store
            .define(
                TableSchema::new("posts")
                    .columns(["slug"])
                    .translated(["title"])
                    .belongs_to("author", "users", "user_id"),
            )
            .await;

        for id in 1..=13_i64 {
            let status = if id % 3 == 0 { "banned" } else { "active" };
            users
                .create(attrs(json!({
                    "name": format!("user{:02}", 14 - id),
                    "email": format!("user{id}@example.com"),
                    "status": status,
                })))
                .await
                .unwrap();
        }
        for (slug, en, fr, user_id) in [
            ("intro", "Hello world", "Bonjour le monde", 1),
            ("rust", "Learning Rust", "Apprendre Rust", 1),
            ("misc", "Odds and ends", "Divers", 2),
        ] {
            posts
                .create(attrs(json!({"slug": slug, "title": {"en": en, "fr": fr}, "user_id": user_id})))
                .await
                .unwrap();
        }

        (users, posts)
    }

    async fn users() -> Repository<MemoryModel> {
        Repository::new(seeded().await.0)
    }

    fn names(records: &[Record]) -> Vec<&str> {
        records.iter().filter_map(|record| record.get_str("name")).collect()
    }

    #[tokio::test]
    async fn test_terminal_call_resets_scope() {
        let mut users = users().await;

        // User 1 is active, so the banned filter hides it
        let hidden = users.filter("status", "banned").find(&1).await.unwrap();
        assert!(hidden.is_none());
        assert!(users.criteria().is_empty());

        let everyone = users.find_all().await.unwrap();
        assert_eq!(everyone.len(), 13);
    }

    #[tokio::test]
    async fn test_filtered_find_all_and_first() {
        let mut users = users().await;

        let banned = users.filter("status", "banned").find_all().await.unwrap();
        assert_eq!(banned.iter().map(|user| user.id).collect::<Vec<_>>(), vec![3, 6, 9, 12]);

        let first = users
            .filter_op("name", FilterOperator::Like, "user0%")
            .order("name", OrderDirection::Ascending)
            .first()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.get_str("name"), Some("user01"));

        assert!(users.filter("status", "retired").first().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_in_filter() {
        let mut users = users().await;
        let found = users
            .filter_op("id", FilterOperator::In, vec![2_i64, 4, 99])
            .find_all()
            .await
            .unwrap();
        assert_eq!(found.iter().map(|user| user.id).collect::<Vec<_>>(), vec![2, 4]);
    }

    #[tokio::test]
    async fn test_count_ignores_filters() {
        let mut users = users().await;
        let total = users.filter("status", "active").count().await.unwrap();
        assert_eq!(total, 13);
        assert!(users.criteria().is_empty());
    }

    #[tokio::test]
    async fn test_count_can_apply_criteria() {
        let config = RepositoryConfig {
            count_applies_criteria: true,
            ..RepositoryConfig::default()
        };
        let mut users = Repository::configured(seeded().await.0, config);

        assert_eq!(users.filter("status", "active").count().await.unwrap(), 9);
        assert_eq!(users.count().await.unwrap(), 13);
    }

    #[tokio::test]
    async fn test_paginate_filtered_then_unfiltered() {
        let mut users = users().await;

        let page = users
            .filter("status", "active")
            .order("name", OrderDirection::Ascending)
            .paginate(10)
            .await
            .unwrap();
        assert_eq!(page.total, 9);
        assert_eq!(page.per_page, 10);
        assert_eq!(page.current_page, 1);
        assert!(page.items.iter().all(|user| user.get_str("status") == Some("active")));
        assert_eq!(
            names(&page.items),
            vec!["user01", "user03", "user04", "user06", "user07", "user09", "user10", "user12", "user13"]
        );

        let page = users.paginate(10).await.unwrap();
        assert_eq!(page.total, 13);
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.last_page, 2);
        assert_eq!(page.items[0].id, 1);
    }

    #[tokio::test]
    async fn test_paginate_page_size_defaults_and_caps() {
        let config = RepositoryConfig {
            default_per_page: 4,
            max_per_page: 5,
            ..RepositoryConfig::default()
        };
        let mut users = Repository::configured(seeded().await.0, config);

        assert_eq!(users.paginate(0).await.unwrap().items.len(), 4);
        let capped = users.paginate(50).await.unwrap();
        assert_eq!(capped.per_page, 5);
        assert_eq!(capped.items.len(), 5);
    }

    #[tokio::test]
    async fn test_paginate_request_carries_query_parameters() {
        let mut users = users().await;
        let request = PageRequest::from_query([("page", "2"), ("status", "active")]).with_path("/users");

        let page = users
            .filter("status", "active")
            .paginate_request(5, &request)
            .await
            .unwrap();
        assert_eq!(page.current_page, 2);
        assert_eq!(page.items.len(), 4);
        assert_eq!(page.previous_page_url().as_deref(), Some("/users?status=active&page=1"));
        assert!(page.next_page_url().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_record_returns_none() {
        let mut users = users().await;
        let updated = users.update(&42, attrs(json!({"name": "X"}))).await.unwrap();
        assert!(updated.is_none());
        assert_eq!(users.count().await.unwrap(), 13);
        assert!(users.find(&42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_existing_record() {
        let mut users = users().await;
        let updated = users.update(&2, attrs(json!({"name": "X"}))).await.unwrap().unwrap();
        assert_eq!(updated.get_str("name"), Some("X"));
        assert_eq!(updated.get_str("email"), Some("user2@example.com"));

        let reloaded = users.find(&2).await.unwrap().unwrap();
        assert_eq!(reloaded.get_str("name"), Some("X"));
    }

    #[tokio::test]
    async fn test_update_honours_scope() {
        let mut users = users().await;
        let updated = users
            .filter("status", "banned")
            .update(&2, attrs(json!({"name": "X"})))
            .await
            .unwrap();
        assert!(updated.is_none());
        assert_eq!(users.find(&2).await.unwrap().unwrap().get_str("name"), Some("user12"));
    }

    #[tokio::test]
    async fn test_delete_existing_record() {
        let mut users = users().await;
        assert!(users.delete(&7).await.unwrap());
        assert!(users.find(&7).await.unwrap().is_none());
        assert!(!users.delete(&7).await.unwrap());
        assert_eq!(users.count().await.unwrap(), 12);
    }

    #[tokio::test]
    async fn test_create_leaves_scope_untouched() {
        let mut users = users().await;
        users.filter("status", "banned");

        let created = users
            .create(attrs(json!({"name": "new", "status": "banned"})))
            .await
            .unwrap();
        assert_eq!(created.id, 14);
        assert_eq!(users.criteria().filters().len(), 1);

        let forced = users.force_create(attrs(json!({"name": "forced"}))).await.unwrap();
        assert_eq!(forced.id, 15);

        assert_eq!(users.find_all().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_create_failure_propagates() {
        let users = users().await;
        let err = users.create(attrs(json!({"colour": "red"}))).await.unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::InvalidField);
    }

    #[tokio::test]
    async fn test_force_update_persists_without_lookup() {
        let mut users = users().await;

        let saved = users.force_update(&100, attrs(json!({"name": "forced"}))).await.unwrap();
        assert_eq!(saved.id, 100);
        assert_eq!(users.find(&100).await.unwrap().unwrap().get_str("name"), Some("forced"));

        let saved = users.force_update(&1, attrs(json!({"status": "banned"}))).await.unwrap();
        assert_eq!(saved.get_str("name"), Some("user13"));
        assert_eq!(saved.get_str("status"), Some("banned"));

        let err = users.force_update(&1, attrs(json!({"colour": "red"}))).await.unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::InvalidField);
        assert_eq!(err.operation, RepositoryOperation::ForceUpdate);
    }

    #[tokio::test]
    async fn test_find_by_ignores_scope() {
        let mut users = users().await;
        users.filter("status", "banned");

        let found = users.find_by("email", "user1@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, 1);
        assert_eq!(users.criteria().filters().len(), 1);

        assert!(users.find_by("email", "nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dispatch_routes_find_by_methods() {
        let users = users().await;

        let by_magic = users
            .dispatch("findByEmail", &["user3@example.com".into()])
            .await
            .unwrap()
            .unwrap();
        let by_call = users.find_by("email", "user3@example.com").await.unwrap().unwrap();
        assert_eq!(by_magic, by_call);

        let snake = users
            .dispatch("find_by_status", &["banned".into()])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snake.id, 3);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_method_fails() {
        let users = users().await;

        let err = users.dispatch("banana", &[]).await.unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::InvalidOperation);
        assert!(err.to_string().contains("banana"));

        let err = users.dispatch("findByEmail", &[]).await.unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::InvalidOperation);

        let err = users.dispatch("findBy", &["x".into()]).await.unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::InvalidOperation);
    }

    #[tokio::test]
    async fn test_dispatch_rejects_defined_methods_as_lookups() {
        let users = users().await;

        for method in ["find", "count"] {
            let err = users.dispatch(method, &[1_i64.into()]).await.unwrap_err();
            assert_eq!(err.kind, RepositoryErrorKind::InvalidOperation);
            assert_eq!(err.message, format!("Method [{method}] is not a findBy<Attribute> lookup"));
        }
    }

    #[test]
    fn test_find_by_attribute_lowercases() {
        assert_eq!(find_by_attribute("findByEmail").as_deref(), Some("email"));
        assert_eq!(find_by_attribute("findByFirstName").as_deref(), Some("firstname"));
        assert_eq!(find_by_attribute("find_by_Status").as_deref(), Some("status"));
        assert_eq!(find_by_attribute("find"), None);
        assert_eq!(find_by_attribute("findBy"), None);
    }

    #[tokio::test]
    async fn test_failed_criteria_application_still_resets() {
        let mut users = users().await;

        let err = users
            .filter("colour", "red")
            .order("name", OrderDirection::Descending)
            .with("posts")
            .find_all()
            .await
            .unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::InvalidField);
        assert!(users.criteria().is_empty());
        assert_eq!(users.pending_relations(), Some(&["posts".to_string()][..]));

        assert_eq!(users.find_all().await.unwrap().len(), 13);
    }

    #[tokio::test]
    async fn test_store_failure_still_resets() {
        let mut users = users().await;

        // The relation is declared but its table was never defined
        let err = users
            .with("teams")
            .filter("status", "active")
            .find_all()
            .await
            .unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::DatabaseError);
        assert!(users.criteria().is_empty());
        assert_eq!(users.pending_relations(), Some(&["teams".to_string()][..]));

        assert_eq!(users.with("posts").find_all().await.unwrap().len(), 13);
    }

    #[tokio::test]
    async fn test_eager_loads_persist_across_terminal_calls() {
        let mut users = users().await;

        users.with(["posts"]).filter("status", "active");
        let user = users.find(&1).await.unwrap().unwrap();
        assert_eq!(user.related("posts").map(<[Record]>::len), Some(2));
        assert_eq!(users.pending_relations(), Some(&["posts".to_string()][..]));
        assert!(users.criteria().is_empty());

        let user = users.find(&2).await.unwrap().unwrap();
        assert_eq!(user.related("posts").map(<[Record]>::len), Some(1));

        // Only a new `with` changes them
        let user = users.with("teams").with("posts").find(&1).await.unwrap().unwrap();
        assert!(user.related("posts").is_some());
    }

    #[tokio::test]
    async fn test_eager_loads_can_be_consumed() {
        let config = RepositoryConfig {
            retain_eager_loads: false,
            ..RepositoryConfig::default()
        };
        let mut users = Repository::configured(seeded().await.0, config);

        let user = users.with("posts").find(&1).await.unwrap().unwrap();
        assert_eq!(user.related("posts").map(<[Record]>::len), Some(2));
        assert!(users.pending_relations().is_none());

        let user = users.find(&1).await.unwrap().unwrap();
        assert!(user.related("posts").is_none());
    }

    #[tokio::test]
    async fn test_with_replaces_previous_relations() {
        let mut users = users().await;
        users.with("teams").with(vec!["posts"]);
        assert_eq!(users.pending_relations(), Some(&["posts".to_string()][..]));
        assert!(users.find(&1).await.is_ok());
    }

    #[tokio::test]
    async fn test_translated_attributes_through_repository() {
        let (_, posts) = seeded().await;
        let mut posts = Repository::new(posts);

        let found = posts
            .filter_op("title", FilterOperator::Like, "%rust%")
            .order("title", OrderDirection::Descending)
            .find_all()
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get_str("slug"), Some("rust"));

        let found = posts
            .filter("title", "Bonjour le monde")
            .with("author")
            .first()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.get_str("slug"), Some("intro"));
        assert_eq!(found.related_one("author").map(|author| author.id), Some(1));
    }

    #[tokio::test]
    async fn test_order_overwrite_through_repository() {
        let mut users = users().await;
        users
            .order("status", OrderDirection::Ascending)
            .order("name", OrderDirection::Ascending)
            .order("status", OrderDirection::Descending);
        assert_eq!(users.criteria().orders()[0], ("status".to_string(), OrderDirection::Descending));

        let ordered = users.find_all().await.unwrap();
        // Banned first (descending status), then by name
        assert_eq!(names(&ordered[..2]), vec!["user02", "user05"]);
        assert_eq!(ordered[4].get_str("name"), Some("user01"));
    }

    #[tokio::test]
    async fn test_accessors() {
        let users = users().await;
        assert_eq!(users.model().name(), "users");
        assert!(users.new_query().is_pristine());
        assert_eq!(users.config(), &RepositoryConfig::default());
        assert!(users.pending_relations().is_none());
    }
}
