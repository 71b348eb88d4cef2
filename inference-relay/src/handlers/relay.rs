//! Relay routes: `/api/analyze`, `/api/predict` and `/api/generate-plan`.
//!
//! Each request runs intake, validation, one upstream call and
//! normalization in order. The spooled upload is released before the
//! response is built, whichever way the request ends.

use crate::error::RelayError;
use crate::models::NormalizedResponse;
use crate::pipeline::intake::read_upload;
use crate::pipeline::normalize::{normalize, prediction_view};
use crate::pipeline::validation::{validate, ValidationResult};
use crate::services::UpstreamEndpoint;
use crate::AppState;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::{Extension, Json};
use serde_json::Value;
use service_core::middleware::tracing::RequestId;

pub async fn analyze(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<NormalizedResponse, RelayError> {
    relay_upload(
        &state,
        UpstreamEndpoint::Analyze,
        request_id.as_ref().map(|Extension(id)| id.as_str()),
        multipart,
    )
    .await
}

/// Like [`analyze`], with the prediction fields default-filled.
pub async fn predict(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<NormalizedResponse, RelayError> {
    relay_upload(
        &state,
        UpstreamEndpoint::Predict,
        request_id.as_ref().map(|Extension(id)| id.as_str()),
        multipart,
    )
    .await
    .map(prediction_view)
}

pub async fn generate_plan(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<NormalizedResponse, RelayError> {
    let client = state.client()?;
    let Json(body) =
        body.map_err(|rejection| RelayError::MalformedPlanRequest(rejection.body_text()))?;

    tracing::info!("Forwarding plan generation request");

    let outcome = client
        .relay_json(
            UpstreamEndpoint::GeneratePlan,
            &body,
            request_id.as_ref().map(|Extension(id)| id.as_str()),
        )
        .await;

    normalize(outcome)
}

/// Fallback for any method other than POST on the relay routes.
pub async fn method_not_allowed() -> RelayError {
    RelayError::MethodNotAllowed
}

async fn relay_upload(
    state: &AppState,
    endpoint: UpstreamEndpoint,
    request_id: Option<&str>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<NormalizedResponse, RelayError> {
    // Configuration is checked before the body is touched.
    let client = state.client()?;
    let multipart =
        multipart.map_err(|rejection| RelayError::MalformedUpload(rejection.body_text()))?;

    let upload = read_upload(multipart, state.spool_dir()).await?;

    let accepted = match validate(upload) {
        ValidationResult::Accepted(accepted) => accepted,
        ValidationResult::Rejected(reason) => return Err(reason.into()),
    };

    let outcome = client.relay_upload(endpoint, &accepted, request_id).await;
    accepted.release();

    normalize(outcome?)
}
