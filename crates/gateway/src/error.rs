//! Gateway error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use broker::BrokerError;
use thiserror::Error;

/// Errors raised inline with a caller's request.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request body is not a valid message.
    #[error("Malformed request body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The broker rejected the publish.
    #[error("Publish failed: {0}")]
    Publish(#[from] BrokerError),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Decode(_) | GatewayError::Publish(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

/// Convenience type alias for gateway results.
pub type Result<T> = std::result::Result<T, GatewayError>;
