use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::{Channel, Message, Result};

/// A stream of messages read from one channel.
///
/// Individual items may be read errors; the stream ending means the
/// subscription was closed.
pub type MessageStream = Pin<Box<dyn Stream<Item = Result<Message>> + Send>>;

/// Core trait for message broker implementations.
///
/// Channels are single-partition: a single reader observes messages in
/// publish order. Implementations must tolerate concurrent use from many
/// tasks.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Publishes one message to its channel.
    async fn publish(&self, message: Message) -> Result<()>;

    /// Opens a subscription on a channel.
    async fn subscribe(&self, channel: Channel) -> Result<MessageStream>;
}

#[async_trait]
impl<B: Broker + ?Sized> Broker for std::sync::Arc<B> {
    async fn publish(&self, message: Message) -> Result<()> {
        (**self).publish(message).await
    }

    async fn subscribe(&self, channel: Channel) -> Result<MessageStream> {
        (**self).subscribe(channel).await
    }
}
