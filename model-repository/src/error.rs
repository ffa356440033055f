//! Crate-level error types
//!
//! Repository operations return [`RepositoryError`](crate::repository::RepositoryError)
//! directly. [`Error`] is for the surrounding setup: loading configuration
//! and installing the log subscriber. It also absorbs repository errors so
//! applications can use one `?`-able type end to end.

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-level error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Repository operation failed
    #[error(transparent)]
    Repository(#[from] crate::repository::RepositoryError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Log subscriber could not be installed
    #[error("Tracing error: {0}")]
    Tracing(String),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::RepositoryError;

    #[test]
    fn test_repository_error_is_transparent() {
        let error: Error = RepositoryError::invalid_operation("banana").into();
        assert!(matches!(error, Error::Repository(_)));
        assert_eq!(
            error.to_string(),
            "Repository invalid_operation error during dispatch: Method [banana] is not a findBy<Attribute> lookup"
        );
    }

    #[test]
    fn test_io_error_display() {
        let error: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(error.to_string(), "I/O error: gone");
    }

    #[test]
    fn test_question_mark_converts_repository_errors() {
        fn lookup() -> Result<()> {
            let found: std::result::Result<(), RepositoryError> =
                Err(RepositoryError::invalid_operation("findBy"));
            found?;
            Ok(())
        }
        assert!(matches!(lookup(), Err(Error::Repository(_))));
    }
}
