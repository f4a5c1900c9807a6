//! HTTP-surface error type.
//!
//! Routing failures never reach this module — the router folds them into
//! the response body's `error_code`.  [`ApiError`] covers the admin and
//! request-envelope failures that map onto HTTP status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sentra_kernel::orchestration::ConfigError;
use serde_json::json;
use thiserror::Error;

/// Gateway-level errors surfaced as HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("backend not found: {0}")]
    BackendNotFound(String),

    #[error("capability already claimed: {0}")]
    CapabilityConflict(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<ConfigError> for ApiError {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::BackendNotFound(name) => ApiError::BackendNotFound(name),
            ConfigError::AmbiguousCapability { .. } => {
                ApiError::CapabilityConflict(error.to_string())
            }
            other => ApiError::InvalidRequest(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::BackendNotFound(name) => (
                StatusCode::NOT_FOUND,
                "BACKEND_NOT_FOUND",
                format!("backend '{}' not found", name),
            ),
            ApiError::CapabilityConflict(msg) => {
                (StatusCode::CONFLICT, "CAPABILITY_CONFLICT", msg.clone())
            }
            ApiError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg.clone())
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
