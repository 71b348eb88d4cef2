use crate::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "inference-relay",
        "version": env!("CARGO_PKG_VERSION"),
        "upstream_configured": state.client.is_some()
    }))
}
