use std::collections::BTreeMap;

use common::{CompletionEvent, Decision, ExecutionId, WorkRequest};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{BrokerError, Channel, Result};

/// Attribute that mirrors the body's execution id out of band.
pub const EXECUTION_ID_ATTRIBUTE: &str = "execution_id";

/// A single message on a channel.
///
/// `key` is the correlation id of the call that produced the message.
/// `attributes` travel beside the body (headers on the wire).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub channel: Channel,
    pub key: String,
    pub payload: Vec<u8>,
    pub attributes: BTreeMap<String, String>,
}

impl Message {
    /// Creates a message with a raw payload and no attributes.
    pub fn new(channel: Channel, key: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            channel,
            key: key.into(),
            payload,
            attributes: BTreeMap::new(),
        }
    }

    /// Creates a message with a JSON-encoded body.
    pub fn json<T: Serialize>(channel: Channel, key: impl Into<String>, body: &T) -> Result<Self> {
        Ok(Self::new(channel, key, serde_json::to_vec(body)?))
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Sets the out-of-band execution id attribute.
    pub fn with_execution_id(self, execution_id: &ExecutionId) -> Self {
        self.with_attribute(EXECUTION_ID_ATTRIBUTE, execution_id.as_str())
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Decodes the JSON body.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.payload).map_err(|e| BrokerError::Decode {
            channel: self.channel,
            reason: e.to_string(),
        })
    }

    /// Decodes the JSON body and applies [`resolve_execution_id`].
    pub fn decode_normalized<T>(&self) -> Result<T>
    where
        T: DeserializeOwned + ExecutionScoped,
    {
        let mut body: T = self.decode()?;
        let resolved =
            resolve_execution_id(self.attribute(EXECUTION_ID_ATTRIBUTE), body.execution_id());
        body.set_execution_id(resolved);
        Ok(body)
    }
}

/// Picks the authoritative execution id for a message.
///
/// The attribute overrides the body whenever it is present and non-empty;
/// otherwise the body's value stands.
pub fn resolve_execution_id(attribute: Option<&str>, body: &ExecutionId) -> ExecutionId {
    match attribute {
        Some(value) if !value.is_empty() => ExecutionId::from(value),
        _ => body.clone(),
    }
}

/// Message bodies that carry an execution id.
pub trait ExecutionScoped {
    fn execution_id(&self) -> &ExecutionId;
    fn set_execution_id(&mut self, execution_id: ExecutionId);
}

impl ExecutionScoped for WorkRequest {
    fn execution_id(&self) -> &ExecutionId {
        &self.execution_id
    }

    fn set_execution_id(&mut self, execution_id: ExecutionId) {
        self.execution_id = execution_id;
    }
}

impl ExecutionScoped for Decision {
    fn execution_id(&self) -> &ExecutionId {
        &self.execution_id
    }

    fn set_execution_id(&mut self, execution_id: ExecutionId) {
        self.execution_id = execution_id;
    }
}

impl ExecutionScoped for CompletionEvent {
    fn execution_id(&self) -> &ExecutionId {
        &self.execution_id
    }

    fn set_execution_id(&mut self, execution_id: ExecutionId) {
        self.execution_id = execution_id;
    }
}
