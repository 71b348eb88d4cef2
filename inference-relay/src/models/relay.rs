use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::Value;

/// Result of a single upstream attempt, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Any HTTP response, whatever its status.
    Success { status: StatusCode, raw_body: String },
    Timeout,
    TransportError { message: String },
}

impl RelayOutcome {
    /// Metric label for this outcome.
    pub fn label(&self) -> &'static str {
        match self {
            RelayOutcome::Success { .. } => "response",
            RelayOutcome::Timeout => "timeout",
            RelayOutcome::TransportError { .. } => "transport_error",
        }
    }
}

/// The only thing sent back to the caller: a status and a JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl IntoResponse for NormalizedResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
