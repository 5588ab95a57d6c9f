use diesel::result::Error as DieselError;
use std::fmt::Display;
use std::time::Duration;
use thiserror::Error;

/// Error type for database pool initialization
#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("cannot init database pool : {0}")]
    Pool(String),
    #[error("cannot run database migrations : {0}")]
    Migration(String),
}

/// Unified database error type with context for runtime operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to get connection from pool for operation '{operation}': {message}")]
    PoolError { operation: String, message: String },

    #[error("Database interaction failed for operation '{operation}': {message}")]
    InteractionError { operation: String, message: String },

    #[error("Record not found in operation '{operation}'")]
    NotFound { operation: String },

    #[error("Database query error in operation '{operation}': {message}")]
    QueryError { operation: String, message: String },

    #[error("Operation '{operation}' timed out after {timeout:?}")]
    Timeout { operation: String, timeout: Duration },
}

impl DatabaseError {
    /// Create a `NotFound` error with operation context
    pub fn not_found(operation: impl Display) -> Self {
        Self::NotFound {
            operation: operation.to_string(),
        }
    }

    /// Create a `QueryError` with operation context
    pub fn query_error(operation: impl Display, message: impl Display) -> Self {
        Self::QueryError {
            operation: operation.to_string(),
            message: message.to_string(),
        }
    }

    /// Check if this error is a `NotFound` variant
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether the caller may retry the same operation later.
    pub const fn is_retryable(&self) -> bool {
        !self.is_not_found()
    }

    /// Extract the operation context from the error
    pub fn operation(&self) -> &str {
        match self {
            Self::PoolError { operation, .. }
            | Self::InteractionError { operation, .. }
            | Self::NotFound { operation }
            | Self::QueryError { operation, .. }
            | Self::Timeout { operation, .. } => operation,
        }
    }

    #[must_use]
    fn with_operation(self, operation: &str) -> Self {
        match self {
            Self::NotFound { .. } => Self::not_found(operation),
            Self::QueryError { message, .. } => Self::query_error(operation, message),
            other => other,
        }
    }
}

impl From<DieselError> for DatabaseError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => Self::NotFound {
                operation: "unknown".to_string(),
            },
            other => Self::QueryError {
                operation: "unknown".to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// Attach the operation name to errors converted from diesel, which carry none.
pub(crate) fn contextualize(err: DatabaseError, operation: &str) -> DatabaseError {
    if err.operation() == "unknown" {
        err.with_operation(operation)
    } else {
        err
    }
}
