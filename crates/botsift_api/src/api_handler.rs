//! Shared API types and utilities
//!
//! Common request/response types, error handling, and conversions used
//! across the endpoints.

use axum::{http::StatusCode, response::Json};
use botsift_core::{BotVerdict, DetectionError, EmailStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for single-email classification
#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    /// Email address to classify
    pub email: String,
    /// Optional first name from the same record
    pub first_name: Option<String>,
    /// Optional last name from the same record
    pub last_name: Option<String>,
    /// Optional threshold override for this request
    pub bot_threshold: Option<f64>,
}

/// API response for single-email classification
#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    /// Request ID for tracking
    pub request_id: String,
    /// The email as submitted (normalized when scoring ran)
    pub email: String,
    /// Verification status
    pub email_status: EmailStatus,
    /// Whether the email is classified as a bot
    pub is_bot: bool,
}

/// API response for the verbose explanation endpoint
#[derive(Debug, Serialize)]
pub struct ExplainResponse {
    /// Request ID for tracking
    pub request_id: String,
    /// Full verdict with per-feature breakdown
    #[serde(flatten)]
    pub verdict: BotVerdict,
    /// Timestamp when classification was performed (ISO 8601)
    pub checked_at: String,
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    pub request_id: String,
    pub timestamp: String,
}

/// Result type for API handlers
pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    InvalidRequest(String),
    MissingColumn(String),
    UploadTooLarge,
    InternalError(String),
}

impl From<DetectionError> for ApiError {
    fn from(err: DetectionError) -> Self {
        match err {
            DetectionError::MissingColumn(column) => ApiError::MissingColumn(column),
            DetectionError::EmptyBatch
            | DetectionError::BatchTooLarge { .. }
            | DetectionError::MalformedBatch(_)
            | DetectionError::InvalidConfig(_) => ApiError::InvalidRequest(err.to_string()),
            DetectionError::Internal(e) => ApiError::InternalError(e.to_string()),
        }
    }
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_code, message) = match self {
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg),
            ApiError::MissingColumn(column) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "MISSING_COLUMN",
                format!("column '{}' not found in uploaded file", column),
            ),
            ApiError::UploadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "UPLOAD_TOO_LARGE",
                "Uploaded file too large".to_string(),
            ),
            ApiError::InternalError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
        };

        let request_id = Uuid::new_v4().to_string();
        let timestamp = chrono::Utc::now().to_rfc3339();

        let error_response = ErrorResponse {
            error: message,
            error_code: error_code.to_string(),
            request_id,
            timestamp,
        };

        (status, Json(error_response)).into_response()
    }
}

/// Convert a core verdict to the compact classification response.
pub fn convert_verdict(verdict: BotVerdict, request_id: String) -> ClassifyResponse {
    ClassifyResponse {
        request_id,
        email: verdict.email,
        email_status: verdict.email_status,
        is_bot: verdict.is_bot,
    }
}
