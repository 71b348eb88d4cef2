//! HTTP client for the externally hosted inference service.
//!
//! Makes exactly one attempt per call, bounded by the configured timeout,
//! and reports every HTTP response as a [`RelayOutcome::Success`] whatever
//! its status. Retries are the caller's business.

use crate::config::UpstreamSettings;
use crate::error::RelayError;
use crate::models::RelayOutcome;
use crate::pipeline::validation::AcceptedUpload;
use crate::services::metrics;
use anyhow::Context;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, RequestBuilder};
use serde_json::Value;
use service_core::error::AppError;
use service_core::observability::outbound_headers;
use std::error::Error as _;
use std::time::{Duration, Instant};
use tokio_util::io::ReaderStream;

/// Upstream routes the relay forwards to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamEndpoint {
    Analyze,
    Predict,
    GeneratePlan,
}

impl UpstreamEndpoint {
    pub fn path(self) -> &'static str {
        match self {
            UpstreamEndpoint::Analyze => "/analyze",
            UpstreamEndpoint::Predict => "/predict",
            UpstreamEndpoint::GeneratePlan => "/generate-plan",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UpstreamEndpoint::Analyze => "analyze",
            UpstreamEndpoint::Predict => "predict",
            UpstreamEndpoint::GeneratePlan => "generate_plan",
        }
    }
}

pub struct InferenceClient {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl InferenceClient {
    /// Build a client for `base_url` (already stripped of its trailing slash).
    pub fn new(base_url: &str, settings: &UpstreamSettings) -> Result<Self, AppError> {
        let http = Client::builder()
            .connect_timeout(settings.connect_timeout())
            .build()
            .map_err(|e| {
                AppError::InternalError(anyhow::anyhow!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            timeout: settings.timeout(),
        })
    }

    pub fn endpoint_url(&self, endpoint: UpstreamEndpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    /// Forward a validated upload as multipart: the image part first, then the
    /// allow-listed metadata fields verbatim.
    ///
    /// Errors only when the spooled file cannot be read back, before any
    /// network I/O.
    pub async fn relay_upload(
        &self,
        endpoint: UpstreamEndpoint,
        accepted: &AcceptedUpload,
        request_id: Option<&str>,
    ) -> Result<RelayOutcome, RelayError> {
        let form = build_form(accepted)?;

        let request = self
            .http
            .post(self.endpoint_url(endpoint))
            .headers(outbound_headers(request_id))
            .multipart(form);

        Ok(self.execute(endpoint, request).await)
    }

    /// Re-serialize the caller's JSON and post it with a JSON content type.
    pub async fn relay_json(
        &self,
        endpoint: UpstreamEndpoint,
        body: &Value,
        request_id: Option<&str>,
    ) -> RelayOutcome {
        let request = self
            .http
            .post(self.endpoint_url(endpoint))
            .headers(outbound_headers(request_id))
            .json(body);

        self.execute(endpoint, request).await
    }

    async fn execute(&self, endpoint: UpstreamEndpoint, request: RequestBuilder) -> RelayOutcome {
        let started = Instant::now();

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let raw_body = response.text().await?;
            Ok::<_, reqwest::Error>((status, raw_body))
        };

        // Dropping the exchange on expiry cancels the in-flight request.
        let outcome = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok((status, raw_body))) => RelayOutcome::Success { status, raw_body },
            Ok(Err(e)) if e.is_timeout() => RelayOutcome::Timeout,
            Ok(Err(e)) => RelayOutcome::TransportError {
                message: error_chain(&e),
            },
            Err(_) => RelayOutcome::Timeout,
        };

        let elapsed = started.elapsed();
        metrics::record_upstream(endpoint.label(), outcome.label(), elapsed);

        match &outcome {
            RelayOutcome::Success { status, .. } => tracing::info!(
                endpoint = endpoint.label(),
                status = status.as_u16(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Inference service responded"
            ),
            RelayOutcome::Timeout => tracing::warn!(
                endpoint = endpoint.label(),
                timeout_secs = self.timeout.as_secs(),
                "Inference service timed out"
            ),
            RelayOutcome::TransportError { message } => tracing::error!(
                endpoint = endpoint.label(),
                error = %message,
                "Error calling inference service"
            ),
        }

        outcome
    }
}

fn build_form(accepted: &AcceptedUpload) -> Result<Form, RelayError> {
    let attachment = &accepted.upload.attachment;

    let file = attachment
        .open()
        .context("Failed to reopen spooled upload")?;
    let body = Body::wrap_stream(ReaderStream::new(file));

    let image = Part::stream_with_length(body, attachment.size_bytes)
        .file_name(attachment.original_name.clone())
        .mime_str(accepted.kind.mime_type())
        .context("Invalid image content type")?;

    let mut form = Form::new().part(crate::models::IMAGE_FIELD, image);
    for (key, value) in accepted.upload.forwarded_fields() {
        form = form.text(key, value.to_string());
    }

    Ok(form)
}

/// `reqwest` keeps the useful part (connection refused, dns failure) in the
/// source chain, so flatten it into one message.
fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
