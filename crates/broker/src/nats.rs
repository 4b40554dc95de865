use std::collections::BTreeMap;

use async_nats::{Client, ConnectOptions, HeaderMap};
use async_trait::async_trait;
use futures_util::StreamExt;

use crate::{
    BrokerError, Channel, EXECUTION_ID_ATTRIBUTE, Message, Result,
    broker::{Broker, MessageStream},
};

/// Header carrying the message key.
pub const KEY_HEADER: &str = "key";

/// Attributes forwarded as NATS headers.
const ATTRIBUTES: [&str; 1] = [EXECUTION_ID_ATTRIBUTE];

/// NATS connection settings.
#[derive(Debug, Clone)]
pub struct NatsConfig {
    pub url: String,
    /// Client connection name, shown in server monitoring.
    pub name: Option<String>,
    /// Prepended to channel names: `{prefix}.{channel}`.
    pub subject_prefix: Option<String>,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
            name: None,
            subject_prefix: None,
        }
    }
}

impl NatsConfig {
    /// Maps a channel to its subject.
    pub fn subject(&self, channel: Channel) -> String {
        match self.subject_prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}.{channel}"),
            _ => channel.to_string(),
        }
    }
}

/// NATS-backed broker.
///
/// Each channel maps to one subject. The message key and attributes travel
/// as headers; the body is the raw JSON payload.
///
/// Subscriptions are core NATS subscriptions and only see messages published
/// after they open. Nothing is retained: a reader that starts late or
/// resubscribes after a failure misses whatever was published in between.
/// [`InMemoryBroker`](crate::InMemoryBroker) replays each channel from its
/// first message instead.
#[derive(Clone)]
pub struct NatsBroker {
    client: Client,
    config: NatsConfig,
}

impl NatsBroker {
    /// Connects to the NATS server named in `config`.
    pub async fn connect(config: NatsConfig) -> Result<Self> {
        let mut options = ConnectOptions::new();
        if let Some(name) = &config.name {
            options = options.name(name);
        }

        let client = async_nats::connect_with_options(config.url.as_str(), options)
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        tracing::info!(url = %config.url, "connected to NATS");
        Ok(Self { client, config })
    }

    /// Gets a reference to the underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn headers(message: &Message) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(KEY_HEADER, message.key.as_str());
        for (name, value) in &message.attributes {
            headers.insert(name.as_str(), value.as_str());
        }
        headers
    }

    fn from_nats(channel: Channel, message: async_nats::Message) -> Message {
        let mut key = String::new();
        let mut attributes = BTreeMap::new();

        if let Some(headers) = &message.headers {
            if let Some(value) = headers.get(KEY_HEADER) {
                key = value.as_str().to_string();
            }
            for name in ATTRIBUTES {
                if let Some(value) = headers.get(name) {
                    attributes.insert(name.to_string(), value.as_str().to_string());
                }
            }
        }

        Message {
            channel,
            key,
            payload: message.payload.to_vec(),
            attributes,
        }
    }
}

#[async_trait]
impl Broker for NatsBroker {
    #[tracing::instrument(skip(self, message), fields(channel = %message.channel, key = %message.key))]
    async fn publish(&self, message: Message) -> Result<()> {
        let channel = message.channel;
        let subject = self.config.subject(channel);
        let headers = Self::headers(&message);

        self.client
            .publish_with_headers(subject, headers, message.payload.into())
            .await
            .map_err(|e| BrokerError::Publish {
                channel,
                reason: e.to_string(),
            })?;

        // Surface write failures now rather than on the next publish.
        self.client
            .flush()
            .await
            .map_err(|e| BrokerError::Publish {
                channel,
                reason: e.to_string(),
            })?;

        metrics::counter!("broker_messages_published_total", "channel" => channel.as_str())
            .increment(1);
        Ok(())
    }

    /// Opens a live subscription; earlier messages on the subject are not delivered.
    async fn subscribe(&self, channel: Channel) -> Result<MessageStream> {
        let subject = self.config.subject(channel);
        let subscriber = self
            .client
            .subscribe(subject)
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        tracing::debug!(%channel, "subscribed");
        Ok(subscriber
            .map(move |message| Ok(Self::from_nats(channel, message)))
            .boxed())
    }
}
