//! Error taxonomy: service-layer failures and their HTTP projections.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::dao::storage::StorageError;

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unreachable; no partial results are returned.
    #[error("storage unavailable: {0}")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Invalid input provided by the client; nothing was mutated.
    #[error("{0}")]
    InvalidInput(String),
    /// The country pool has not been ingested yet.
    #[error("country pool not loaded")]
    PoolUnavailable,
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("{0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable (pool not yet ingested).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error, including storage failures.
    #[error("{0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::Internal(source.to_string()),
            ServiceError::Degraded => AppError::Internal("storage unavailable".into()),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::PoolUnavailable => {
                AppError::ServiceUnavailable("country pool not loaded".into())
            }
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
        }
    }
}

/// JSON error body used by every failing endpoint.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            error: self.to_string(),
        });

        (status, payload).into_response()
    }
}
