//! HTTP error mapping
//!
//! Every failure response has the body
//! `{"error": {"code": "<STABLE_TAG>", "message": "..."}}`.

use crate::generation::GenerationError;
use crate::ingest::IngestError;
use crate::storage::StorageError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

fn storage_status(err: &StorageError) -> (StatusCode, &'static str) {
    match err {
        StorageError::Connectivity(_) => (StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE"),
        StorageError::ConstraintViolation(_) => (StatusCode::CONFLICT, "CONSTRAINT_VIOLATION"),
        StorageError::Corrupt(_) | StorageError::Internal(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        }
    }
}

impl ApiError {
    /// Status code and stable error tag
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Ingest(err) => match err {
                IngestError::UnreadableFile(_) => (StatusCode::BAD_REQUEST, "UNREADABLE_FILE"),
                IngestError::NoHeader(_) => (StatusCode::BAD_REQUEST, "NO_HEADER"),
                IngestError::RequiredColumnMissing { .. } => {
                    (StatusCode::BAD_REQUEST, "REQUIRED_COLUMN_MISSING")
                }
                IngestError::Storage(err) => storage_status(err),
            },
            ApiError::Generation(err) => match err {
                GenerationError::NoData => (StatusCode::BAD_REQUEST, "NO_DATA"),
                GenerationError::Storage(err) => storage_status(err),
            },
            ApiError::Storage(err) => storage_status(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(code = error_code, error = %self, "Request failed");
        } else {
            tracing::debug!(code = error_code, error = %self, "Request rejected");
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
