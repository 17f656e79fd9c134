//! Error types for edt-api
//!
//! Maps the shared error taxonomy onto HTTP status codes and a uniform
//! JSON body: `{"error": {"code", "message", "fields"?}}`.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use edt_common::FieldError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Referenced entity does not exist (404)
    #[error("{0}")]
    NotFound(String),

    /// Request failed validation (400)
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Entity state forbids the operation (409)
    #[error("{0}")]
    InvalidState(String),

    /// Uniqueness guard tripped (409)
    #[error("{0}")]
    Duplicate(String),

    /// Store failure (500); detail is logged, never returned
    #[error("Store failure: {0}")]
    Store(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<edt_common::Error> for ApiError {
    fn from(err: edt_common::Error) -> Self {
        use edt_common::Error;

        match err {
            Error::NotFound { .. } => ApiError::NotFound(err.to_string()),
            Error::Validation(fields) => ApiError::Validation(fields),
            Error::InvalidState(msg) => ApiError::InvalidState(msg),
            Error::DuplicateValue { .. } => ApiError::Duplicate(err.to_string()),
            Error::Database(ref e) => ApiError::Store(e.to_string()),
            Error::Io(_) | Error::Config(_) | Error::Internal(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(vec![FieldError::new("body", rejection.body_text())])
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(vec![FieldError::new("path", rejection.body_text())])
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(vec![FieldError::new("query", rejection.body_text())])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, fields) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            ApiError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_FAILED",
                "Request validation failed".to_string(),
                Some(fields),
            ),
            ApiError::InvalidState(msg) => (StatusCode::CONFLICT, "INVALID_STATE", msg, None),
            ApiError::Duplicate(msg) => (StatusCode::CONFLICT, "DUPLICATE_VALUE", msg, None),
            ApiError::Store(detail) => {
                error!(error = %detail, "Store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_FAILURE",
                    "The data store could not complete the request".to_string(),
                    None,
                )
            }
            ApiError::Internal(detail) => {
                error!(error = %detail, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = match fields {
            Some(fields) => json!({
                "error": {
                    "code": error_code,
                    "message": message,
                    "fields": fields,
                }
            }),
            None => json!({
                "error": {
                    "code": error_code,
                    "message": message,
                }
            }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
