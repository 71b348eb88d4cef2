//! W3C Trace Context propagation for calls leaving the service.
//!
//! See: https://www.w3.org/TR/trace-context/

use opentelemetry::trace::TraceContextExt;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Header name for W3C traceparent
pub const TRACEPARENT_HEADER: &str = "traceparent";

/// Header name for W3C tracestate
pub const TRACESTATE_HEADER: &str = "tracestate";

/// Header name for request correlation ID
pub use crate::middleware::tracing::REQUEST_ID_HEADER;

/// Inject the current span's trace context as `traceparent`/`tracestate`.
///
/// Does nothing when no OpenTelemetry span is active.
pub fn inject_trace_context(headers: &mut HeaderMap) {
    let span = Span::current();
    let context = span.context();
    let otel_span = context.span();
    let span_context = otel_span.span_context();

    if !span_context.is_valid() {
        return;
    }

    // version-trace_id-span_id-trace_flags
    let traceparent = format!(
        "00-{}-{}-{:02x}",
        span_context.trace_id(),
        span_context.span_id(),
        span_context.trace_flags().to_u8()
    );

    if let Ok(value) = HeaderValue::from_str(&traceparent) {
        headers.insert(TRACEPARENT_HEADER, value);
    }

    let tracestate = span_context.trace_state().header();
    if !tracestate.is_empty()
        && let Ok(value) = HeaderValue::from_str(&tracestate)
    {
        headers.insert(TRACESTATE_HEADER, value);
    }
}

/// Headers to attach to an outbound request: trace context plus the
/// caller's request id, when one is known.
pub fn outbound_headers(request_id: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    inject_trace_context(&mut headers);

    if let Some(id) = request_id
        && let Ok(value) = HeaderValue::from_str(id)
    {
        headers.insert(REQUEST_ID_HEADER, value);
    }

    headers
}
