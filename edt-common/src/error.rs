//! Common error types for the dispatch tracker

use serde::Serialize;
use thiserror::Error;

/// Common result type for dispatch tracker operations
pub type Result<T> = std::result::Result<T, Error>;

/// One failed field check in a request payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error taxonomy shared by the store, the workflow core and the HTTP layer
#[derive(Error, Debug)]
pub enum Error {
    /// Store failure (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Referenced entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Input failed shape checks
    #[error("Validation failed: {}", describe_fields(.0))]
    Validation(Vec<FieldError>),

    /// Precondition on current entity state not met
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Uniqueness guard tripped
    #[error("{field} already in use: {value}")]
    DuplicateValue { field: &'static str, value: String },

    /// Internal error (corrupt stored value, serialization failure)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation(vec![FieldError::new(field, message)])
    }

    /// Short machine-readable kind, stable across message changes
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "NOT_FOUND",
            Error::Validation(_) => "VALIDATION_FAILED",
            Error::InvalidState(_) => "INVALID_STATE",
            Error::DuplicateValue { .. } => "DUPLICATE_VALUE",
            Error::Database(_) => "STORE_FAILURE",
            Error::Io(_) | Error::Config(_) | Error::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True when a store error is a UNIQUE constraint violation
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }
}

fn describe_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}
