use crate::models::NormalizedResponse;
use crate::pipeline::validation::ALLOWED_EXTENSIONS;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Every way a relay request can end without a usable upstream body.
///
/// Each variant maps to exactly one status code and a JSON body with a
/// machine-readable `error` string.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Upstream base URL is not configured")]
    ConfigurationMissing,

    #[error("Malformed upload: {0}")]
    MalformedUpload(String),

    #[error("No image part in upload")]
    NoFileProvided,

    #[error("Upload temporary file missing")]
    MissingUploadPath,

    #[error("Disallowed file type")]
    DisallowedFileType,

    #[error("Malformed plan request: {0}")]
    MalformedPlanRequest(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Upstream did not respond in time")]
    UpstreamTimeout,

    #[error("Upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    #[error("Upstream returned a non-JSON body with status {status}")]
    UpstreamNonJson { status: StatusCode, raw: String },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<RelayError> for NormalizedResponse {
    fn from(err: RelayError) -> Self {
        let (status, body) = match err {
            RelayError::ConfigurationMissing => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Server configuration error" }),
            ),
            RelayError::MalformedUpload(details) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "File parsing failed", "details": details }),
            ),
            RelayError::NoFileProvided => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "No image uploaded (field 'image')" }),
            ),
            RelayError::MissingUploadPath => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Upload temporary file missing" }),
            ),
            RelayError::DisallowedFileType => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Invalid file type", "allowed": ALLOWED_EXTENSIONS }),
            ),
            RelayError::MalformedPlanRequest(details) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Invalid JSON body", "details": details }),
            ),
            RelayError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                json!({ "error": "Method not allowed" }),
            ),
            RelayError::UpstreamTimeout => (
                StatusCode::GATEWAY_TIMEOUT,
                json!({
                    "error": "Request timeout",
                    "details": "upstream did not respond in time"
                }),
            ),
            RelayError::UpstreamUnreachable(details) => (
                StatusCode::BAD_GATEWAY,
                json!({ "error": "Inference service unavailable", "details": details }),
            ),
            RelayError::UpstreamNonJson { status, raw } => (
                status,
                json!({ "error": "Invalid response from inference service", "raw": raw }),
            ),
            RelayError::Internal(err) => {
                tracing::error!(error = %err, "Relay request failed internally");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        NormalizedResponse { status, body }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        NormalizedResponse::from(self).into_response()
    }
}
