//! API error types with HTTP status code mapping.
//!
//! [`ApiError`] is the unified error type for all API endpoints. It implements
//! `axum::response::IntoResponse` to produce structured JSON error responses
//! with appropriate HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use tactivo_core::CoreError;
use tactivo_storage::StorageError;

/// Structured error detail in API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "BAD_REQUEST").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional structured details (e.g., violated invariants).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API errors with HTTP status code mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Entity not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid request (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Program state failed its invariant checks (422).
    #[error("validation failed")]
    ValidationFailed(Vec<String>),

    /// Internal server error (500).
    #[error("internal error: {0}")]
    InternalError(String),

    /// Resource conflict (409).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl ApiError {
    fn status_and_detail(&self) -> (StatusCode, ApiErrorDetail) {
        let (status, code, details) = match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", None),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", None),
            ApiError::ValidationFailed(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_FAILED",
                serde_json::to_value(errors).ok(),
            ),
            ApiError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", None)
            }
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT", None),
        };
        let message = match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::InternalError(msg)
            | ApiError::Conflict(msg) => msg.clone(),
            ApiError::ValidationFailed(errors) => {
                format!("{} validation error(s)", errors.len())
            }
        };
        (
            status,
            ApiErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = self.status_and_detail();

        let body = serde_json::json!({
            "success": false,
            "error": detail,
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match &err {
            CoreError::DayNotFound { .. } | CoreError::ExerciseNotFound { .. } => {
                ApiError::NotFound(err.to_string())
            }
            CoreError::DayLimitReached { .. } | CoreError::AlreadyPersisted { .. } => {
                ApiError::Conflict(err.to_string())
            }
            CoreError::InvalidDayLabel { .. }
            | CoreError::DayOutOfRange { .. }
            | CoreError::InvalidKey { .. } => ApiError::BadRequest(err.to_string()),
            CoreError::InvariantViolation { reason } => {
                ApiError::ValidationFailed(vec![reason.clone()])
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match &err {
            StorageError::ProgramNotFound(_)
            | StorageError::RowNotFound(_)
            | StorageError::ExerciseNotFound(_) => ApiError::NotFound(err.to_string()),
            StorageError::Rejected { .. }
            | StorageError::InsertRejected { .. }
            | StorageError::IntegrityError { .. } => {
                ApiError::Conflict(err.to_string())
            }
            _ => ApiError::InternalError(err.to_string()),
        }
    }
}
