//! Error types for the broadcast gateway.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::radio::RadioError;

/// Errors surfaced to HTTP callers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Meshtastic interface not available. Check device connection.")]
    DeviceUnavailable,

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Failed to broadcast message: {0}")]
    DeviceFailure(#[from] RadioError),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::DeviceUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "device_unavailable"),
            Error::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            Error::InvalidBody(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_body"),
            Error::DeviceFailure(_) => (StatusCode::INTERNAL_SERVER_ERROR, "device_failure"),
        };

        let body = Json(json!({
            "detail": self.to_string(),
            "error_type": error_type
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidBody(rejection.body_text())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
