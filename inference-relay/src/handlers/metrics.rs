use axum::response::IntoResponse;
use service_core::error::AppError;

pub async fn metrics() -> Result<impl IntoResponse, AppError> {
    let body = crate::services::metrics::get_metrics()?;
    Ok((
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    ))
}
