use thiserror::Error;

use crate::Channel;

/// Errors that can occur when talking to the message broker.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Writing a message to a channel failed.
    #[error("Failed to publish to {channel}: {reason}")]
    Publish { channel: Channel, reason: String },

    /// Reading from a channel failed.
    #[error("Failed to read from {channel}: {reason}")]
    Read { channel: Channel, reason: String },

    /// The broker could not be reached.
    #[error("Broker connection error: {0}")]
    Connection(String),

    /// A message body could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A message body did not match the channel's contract.
    #[error("Malformed message on {channel}: {reason}")]
    Decode { channel: Channel, reason: String },
}

/// Result type for broker operations.
pub type Result<T> = std::result::Result<T, BrokerError>;
