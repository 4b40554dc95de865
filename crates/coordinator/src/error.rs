//! Coordinator error types.

use broker::BrokerError;
use thiserror::Error;

/// Errors that can occur while driving a workflow.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// The callback address in a work request is not a usable URL.
    #[error("Invalid callback address '{url}': {reason}")]
    InvalidCallback { url: String, reason: String },

    /// The outbound callback could not be delivered.
    #[error("Callback to {url} failed: {reason}")]
    Callback { url: String, reason: String },

    /// The participant answered the callback with a non-success status.
    #[error("Callback to {url} returned status {status}")]
    CallbackStatus { url: String, status: u16 },

    /// Broker error (publish, read or malformed message).
    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),
}

/// Convenience type alias for coordinator results.
pub type Result<T> = std::result::Result<T, CoordinatorError>;
