//! Prometheus metrics for the relay.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use service_core::error::AppError;
use std::sync::OnceLock;
use std::time::Duration;

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// HTTP metrics
pub static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

// Upstream metrics
pub static UPSTREAM_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static UPSTREAM_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

// Spooled upload files currently on disk
pub static SPOOLED_UPLOADS: OnceLock<IntGauge> = OnceLock::new();

/// Register all collectors. Later calls are no-ops.
pub fn init_metrics() -> Result<(), AppError> {
    if REGISTRY.get().is_some() {
        return Ok(());
    }

    let registry = Registry::new();

    let requests_total = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )
    .map_err(metric_error)?;

    let request_duration = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        ),
        &["method", "path", "status"],
    )
    .map_err(metric_error)?;

    let upstream_total = IntCounterVec::new(
        Opts::new(
            "relay_upstream_requests_total",
            "Upstream calls by endpoint and outcome",
        ),
        &["endpoint", "outcome"],
    )
    .map_err(metric_error)?;

    let upstream_duration = HistogramVec::new(
        HistogramOpts::new(
            "relay_upstream_duration_seconds",
            "Upstream call duration in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0]),
        &["endpoint"],
    )
    .map_err(metric_error)?;

    let spooled = IntGauge::new(
        "relay_spooled_uploads",
        "Uploaded files currently spooled to disk",
    )
    .map_err(metric_error)?;

    registry
        .register(Box::new(requests_total.clone()))
        .map_err(metric_error)?;
    registry
        .register(Box::new(request_duration.clone()))
        .map_err(metric_error)?;
    registry
        .register(Box::new(upstream_total.clone()))
        .map_err(metric_error)?;
    registry
        .register(Box::new(upstream_duration.clone()))
        .map_err(metric_error)?;
    registry
        .register(Box::new(spooled.clone()))
        .map_err(metric_error)?;

    let _ = REGISTRY.set(registry);
    let _ = HTTP_REQUESTS_TOTAL.set(requests_total);
    let _ = HTTP_REQUEST_DURATION_SECONDS.set(request_duration);
    let _ = UPSTREAM_REQUESTS_TOTAL.set(upstream_total);
    let _ = UPSTREAM_DURATION_SECONDS.set(upstream_duration);
    let _ = SPOOLED_UPLOADS.set(spooled);

    Ok(())
}

fn metric_error(e: prometheus::Error) -> AppError {
    AppError::InternalError(anyhow::anyhow!("Failed to set up metrics: {}", e))
}

pub fn record_upstream(endpoint: &str, outcome: &str, elapsed: Duration) {
    if let Some(counter) = UPSTREAM_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[endpoint, outcome]).inc();
    }
    if let Some(histogram) = UPSTREAM_DURATION_SECONDS.get() {
        histogram
            .with_label_values(&[endpoint])
            .observe(elapsed.as_secs_f64());
    }
}

pub fn spooled_upload_created() {
    if let Some(gauge) = SPOOLED_UPLOADS.get() {
        gauge.inc();
    }
}

pub fn spooled_upload_released() {
    if let Some(gauge) = SPOOLED_UPLOADS.get() {
        gauge.dec();
    }
}

/// Render the registry in the Prometheus text format.
pub fn get_metrics() -> Result<String, AppError> {
    let registry = REGISTRY.get().ok_or_else(|| {
        AppError::InternalError(anyhow::anyhow!("metrics registry not initialized"))
    })?;

    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&registry.gather(), &mut buffer)
        .map_err(metric_error)?;

    String::from_utf8(buffer).map_err(|e| AppError::InternalError(anyhow::Error::new(e)))
}
