use crate::error::RelayError;
use crate::models::{NormalizedResponse, RelayOutcome};
use serde_json::{json, Value};

/// Map an upstream outcome onto the caller-facing contract.
///
/// JSON bodies pass through with the upstream status untouched, 4xx/5xx
/// included. Anything else becomes a [`RelayError`].
pub fn normalize(outcome: RelayOutcome) -> Result<NormalizedResponse, RelayError> {
    match outcome {
        RelayOutcome::Success { status, raw_body } => {
            match serde_json::from_str::<Value>(&raw_body) {
                Ok(body) => Ok(NormalizedResponse { status, body }),
                Err(_) => Err(RelayError::UpstreamNonJson {
                    status,
                    raw: raw_body,
                }),
            }
        }
        RelayOutcome::Timeout => Err(RelayError::UpstreamTimeout),
        RelayOutcome::TransportError { message } => Err(RelayError::UpstreamUnreachable(message)),
    }
}

/// Fill the prediction fields the frontend always reads, keeping whatever
/// else the inference service sent. Only successful object bodies are
/// touched and the status never changes.
pub fn prediction_view(mut response: NormalizedResponse) -> NormalizedResponse {
    if !response.status.is_success() {
        return response;
    }

    if let Value::Object(body) = &mut response.body {
        let defaults = [
            ("predicted_body_type", json!("Unknown")),
            ("confidence", json!(0)),
            ("fallback_used", json!(true)),
            ("exercises", Value::Null),
            ("diet", Value::Null),
        ];

        for (key, default) in defaults {
            match body.get(key) {
                Some(value) if !value.is_null() => {}
                _ => {
                    body.insert(key.to_string(), default);
                }
            }
        }
    }

    response
}
