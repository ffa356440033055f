//! Errors raised by repositories and their backends
//!
//! Absence is not an error in this crate: lookups return `Ok(None)` and
//! `update`/`delete` report a missing record through their return value.
//! [`RepositoryError`] covers the hard failures: programmer errors such as an
//! unknown dynamic method, and failures raised by the persistence backend,
//! which pass through the repository unchanged.
//!
//! # Example
//!
//! ```rust
//! use model_repository::repository::{RepositoryError, RepositoryErrorKind};
//!
//! let error = RepositoryError::invalid_operation("banana");
//! assert_eq!(error.kind, RepositoryErrorKind::InvalidOperation);
//! assert!(error.to_string().contains("banana"));
//! ```

use std::fmt;

/// Where in the repository lifecycle an error arose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    /// Finding a single record by identity
    Find,
    /// Materializing every matching record
    FindAll,
    /// Fetching the first matching record
    First,
    /// Fetching one page of matching records
    Paginate,
    /// Counting records
    Count,
    /// Equality lookup on a single attribute
    FindBy,
    /// Creating a new record
    Create,
    /// Creating a new record, bypassing attribute guards
    ForceCreate,
    /// Updating an existing record
    Update,
    /// Persisting attributes for an identity without a lookup
    ForceUpdate,
    /// Deleting a record
    Delete,
    /// Applying accumulated filters and ordering to a query
    ApplyCriteria,
    /// Registering relations to eager load
    EagerLoad,
    /// Resolving a dynamically named method
    Dispatch,
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Find => write!(f, "find"),
            Self::FindAll => write!(f, "find_all"),
            Self::First => write!(f, "first"),
            Self::Paginate => write!(f, "paginate"),
            Self::Count => write!(f, "count"),
            Self::FindBy => write!(f, "find_by"),
            Self::Create => write!(f, "create"),
            Self::ForceCreate => write!(f, "force_create"),
            Self::Update => write!(f, "update"),
            Self::ForceUpdate => write!(f, "force_update"),
            Self::Delete => write!(f, "delete"),
            Self::ApplyCriteria => write!(f, "apply_criteria"),
            Self::EagerLoad => write!(f, "eager_load"),
            Self::Dispatch => write!(f, "dispatch"),
        }
    }
}

/// What kind of failure occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryErrorKind {
    /// The backend was asked to mutate a record that does not exist
    NotFound,
    /// Record already exists (duplicate key)
    AlreadyExists,
    /// A method that the repository does not provide was invoked
    InvalidOperation,
    /// A field or relation name is unknown to the model
    InvalidField,
    /// The query target lacks a capability the caller relied on
    Unsupported,
    /// Validation failed before reaching the store
    ValidationFailed,
    /// Failed to connect to the store
    ConnectionFailed,
    /// The store did not answer in time
    Timeout,
    /// Underlying store error
    DatabaseError,
    /// Attribute values could not be (de)serialized
    SerializationError,
    /// Anything else
    Other,
}

impl fmt::Display for RepositoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::AlreadyExists => write!(f, "already_exists"),
            Self::InvalidOperation => write!(f, "invalid_operation"),
            Self::InvalidField => write!(f, "invalid_field"),
            Self::Unsupported => write!(f, "unsupported"),
            Self::ValidationFailed => write!(f, "validation_failed"),
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Timeout => write!(f, "timeout"),
            Self::DatabaseError => write!(f, "database_error"),
            Self::SerializationError => write!(f, "serialization_error"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// A failed repository or backend operation
///
/// # Example
///
/// ```rust
/// use model_repository::repository::{RepositoryError, RepositoryOperation};
///
/// let error = RepositoryError::not_found("users", "42").with_operation(RepositoryOperation::Update);
/// assert_eq!(
///     error.to_string(),
///     "Repository not_found error during update: Record not found [users: 42]"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryError {
    /// Where the error arose
    pub operation: RepositoryOperation,
    /// The kind of failure
    pub kind: RepositoryErrorKind,
    /// What went wrong
    pub message: String,
    /// The model involved (e.g., "users")
    pub entity_type: Option<String>,
    /// The identity of the record involved
    pub entity_id: Option<String>,
}

impl RepositoryError {
    /// Build an error from its parts
    pub fn new(
        operation: RepositoryOperation,
        kind: RepositoryErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// A record the backend was asked to change does not exist
    pub fn not_found(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self::new(
            RepositoryOperation::Update,
            RepositoryErrorKind::NotFound,
            "Record not found",
        )
        .with_entity(entity_type, entity_id)
    }

    /// A record with the same identity already exists
    pub fn already_exists(entity_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::new(
            RepositoryOperation::Create,
            RepositoryErrorKind::AlreadyExists,
            "Record already exists",
        )
        .with_entity(entity_type, identifier)
    }

    /// A method name that cannot be resolved
    ///
    /// ```rust
    /// use model_repository::repository::RepositoryError;
    ///
    /// let error = RepositoryError::invalid_operation("banana");
    /// assert_eq!(error.message, "Method [banana] is not a findBy<Attribute> lookup");
    /// ```
    pub fn invalid_operation(method: &str) -> Self {
        Self::new(
            RepositoryOperation::Dispatch,
            RepositoryErrorKind::InvalidOperation,
            format!("Method [{method}] is not a findBy<Attribute> lookup"),
        )
    }

    /// A field or relation the model does not define
    pub fn invalid_field(operation: RepositoryOperation, field: &str) -> Self {
        Self::new(
            operation,
            RepositoryErrorKind::InvalidField,
            format!("Unknown field: {field}"),
        )
    }

    /// The query target does not provide a capability
    pub fn unsupported(operation: RepositoryOperation, capability: &str) -> Self {
        Self::new(
            operation,
            RepositoryErrorKind::Unsupported,
            format!("Query target does not support {capability}"),
        )
    }

    /// Input rejected before it reached the store
    pub fn validation_failed(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::ValidationFailed, message)
    }

    /// The backing store rejected or failed the operation
    pub fn database_error(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::DatabaseError, message)
    }

    /// A value could not be converted to or from its stored form
    pub fn serialization_error(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::SerializationError, message)
    }

    /// Attach the model name and record identity
    #[must_use]
    pub fn with_entity(
        mut self,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Add only the model name to an existing error
    #[must_use]
    pub fn with_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    /// Replace the operation recorded on the error
    #[must_use]
    pub fn with_operation(mut self, operation: RepositoryOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Whether the failure is transient (connection loss or timeout)
    ///
    /// The repository itself never retries; this is for callers that do.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            RepositoryErrorKind::ConnectionFailed | RepositoryErrorKind::Timeout
        )
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Repository {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        match (&self.entity_type, &self.entity_id) {
            (Some(entity_type), Some(entity_id)) => write!(f, " [{entity_type}: {entity_id}]")?,
            (Some(entity_type), None) => write!(f, " [{entity_type}]")?,
            _ => {}
        }
        Ok(())
    }
}

impl std::error::Error for RepositoryError {}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization_error(RepositoryOperation::Create, err.to_string())
    }
}
