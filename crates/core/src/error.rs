// Central Error Type for the Pending Queue

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    /// Lock contention or connection loss; safe to retry
    #[error("Transient error: {0}")]
    Transient(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the retry policy may attempt the operation again
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Transient(_))
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

// Note: sqlx::Error conversion is handled in infra-sqlite crate
// by mapping into AppError::Database / AppError::Transient

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_errors_are_retryable() {
        assert!(AppError::Transient("database is locked".into()).is_transient());
        assert!(!AppError::Database("no such table".into()).is_transient());
        assert!(!AppError::Validation("empty key".into()).is_transient());
    }

    #[test]
    fn test_domain_error_converts() {
        let err: AppError = crate::domain::DomainError::Validation("bad".into()).into();
        assert!(err.to_string().contains("bad"));
        assert!(!err.is_transient());
    }
}
