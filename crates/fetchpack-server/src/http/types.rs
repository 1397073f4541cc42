//! HTTP API Request/Response Types

use fetchpack_core::store::StatusCounts;
use serde::{Deserialize, Serialize};

/// Body of `POST /jobs/:id/files`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachFileRequest {
    pub url: String,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub jobs: StatusCounts,
}

/// Error body returned by every failing route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable code, e.g. `JOB_NOT_FOUND`.
    pub error: String,
    /// Human-readable message
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }
}
