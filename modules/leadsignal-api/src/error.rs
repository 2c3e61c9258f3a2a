use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use leadsignal_common::LeadSignalError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Rate limit exceeded: max {max} requests per {window_secs}s")]
    RateLimited { max: usize, window_secs: u64 },

    #[error(transparent)]
    LeadSignal(#[from] LeadSignalError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, upstream) = match self {
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            err @ ApiError::RateLimited { .. } => {
                (StatusCode::TOO_MANY_REQUESTS, err.to_string(), None)
            }
            ApiError::LeadSignal(err) => match err {
                LeadSignalError::Input(msg) => (StatusCode::BAD_REQUEST, msg, None),
                LeadSignalError::Config(msg) => {
                    tracing::error!(error = msg.as_str(), "Configuration error");
                    (StatusCode::INTERNAL_SERVER_ERROR, msg, None)
                }
                LeadSignalError::Upstream { status, body } => {
                    tracing::warn!(upstream_status = ?status, "Upstream service error");
                    (
                        StatusCode::BAD_GATEWAY,
                        "Upstream service error".to_string(),
                        Some(json!({ "status": status, "body": body })),
                    )
                }
                LeadSignalError::Parse(msg) => {
                    tracing::warn!(error = msg.as_str(), "Unreadable upstream response");
                    (
                        StatusCode::BAD_GATEWAY,
                        "Upstream service error".to_string(),
                        Some(json!({ "status": null, "body": msg })),
                    )
                }
            },
        };

        let mut body = json!({
            "error": message,
            "status": status.as_u16(),
        });
        if let Some(upstream) = upstream {
            body["upstream"] = upstream;
        }

        (status, Json(body)).into_response()
    }
}
