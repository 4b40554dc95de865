//! Participant error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParticipantError {
    /// The callback was invoked without a required parameter.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The gateway could not be reached.
    #[error("Gateway call to {endpoint} failed: {reason}")]
    Gateway { endpoint: String, reason: String },

    /// The gateway answered with a non-success status.
    #[error("Gateway call to {endpoint} returned status {status}")]
    GatewayStatus { endpoint: String, status: u16 },
}

impl ParticipantError {
    pub fn status(&self) -> StatusCode {
        match self {
            ParticipantError::Validation(_) => StatusCode::BAD_REQUEST,
            ParticipantError::Gateway { .. } | ParticipantError::GatewayStatus { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ParticipantError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ParticipantError>;
