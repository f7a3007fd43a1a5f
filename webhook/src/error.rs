use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("stale event: {age_secs}s old, limit is {max_age_secs}s")]
    Stale { age_secs: u64, max_age_secs: u64 },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl WebhookError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) | Self::Stale { .. } => StatusCode::UNAUTHORIZED,
            Self::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status_code(), body).into_response()
    }
}
