use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;
use tokio::sync::{RwLock, broadcast};

use crate::{
    BrokerError, Channel, Message, Result,
    broker::{Broker, MessageStream},
};

const LIVE_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
enum Delivery {
    Message(Message),
    Fault(String),
}

struct ChannelState {
    log: Vec<Message>,
    live: broadcast::Sender<Delivery>,
}

impl Default for ChannelState {
    fn default() -> Self {
        let (live, _) = broadcast::channel(LIVE_CAPACITY);
        Self {
            log: Vec::new(),
            live,
        }
    }
}

/// In-memory broker for tests and single-process runs.
///
/// Each channel keeps an ordered log. A new subscription replays the log
/// from the first message and then follows live publishes, like a reader
/// attached to the first offset of a single partition.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    channels: Arc<RwLock<HashMap<Channel, ChannelState>>>,
    fail_on_publish: Arc<AtomicBool>,
    fail_on_subscribe: Arc<AtomicBool>,
}

impl InMemoryBroker {
    /// Creates a new empty in-memory broker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent publish fail until reset.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.fail_on_publish.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent subscribe fail until reset.
    pub fn set_fail_on_subscribe(&self, fail: bool) {
        self.fail_on_subscribe.store(fail, Ordering::SeqCst);
    }

    /// Returns every message published to `channel`, in order.
    pub async fn published(&self, channel: Channel) -> Vec<Message> {
        self.channels
            .read()
            .await
            .get(&channel)
            .map(|state| state.log.clone())
            .unwrap_or_default()
    }

    /// Returns the total number of messages across all channels.
    pub async fn message_count(&self) -> usize {
        self.channels
            .read()
            .await
            .values()
            .map(|state| state.log.len())
            .sum()
    }

    /// Delivers a read error to every live subscriber of `channel`.
    pub async fn inject_read_error(&self, channel: Channel, reason: impl Into<String>) {
        let mut channels = self.channels.write().await;
        let state = channels.entry(channel).or_default();
        let _ = state.live.send(Delivery::Fault(reason.into()));
    }
}

#[async_trait]
impl Broker for InMemoryBroker {
    async fn publish(&self, message: Message) -> Result<()> {
        if self.fail_on_publish.load(Ordering::SeqCst) {
            return Err(BrokerError::Publish {
                channel: message.channel,
                reason: "broker unavailable".to_string(),
            });
        }

        let mut channels = self.channels.write().await;
        let state = channels.entry(message.channel).or_default();
        state.log.push(message.clone());
        // No live subscribers is not an error; the log still has it.
        let _ = state.live.send(Delivery::Message(message));
        Ok(())
    }

    async fn subscribe(&self, channel: Channel) -> Result<MessageStream> {
        if self.fail_on_subscribe.load(Ordering::SeqCst) {
            return Err(BrokerError::Connection("broker unavailable".to_string()));
        }

        let (backlog, receiver) = {
            let mut channels = self.channels.write().await;
            let state = channels.entry(channel).or_default();
            (state.log.clone(), state.live.subscribe())
        };

        let live = stream::unfold(receiver, move |mut receiver| async move {
            let item = match receiver.recv().await {
                Ok(Delivery::Message(message)) => Ok(message),
                Ok(Delivery::Fault(reason)) => Err(BrokerError::Read { channel, reason }),
                Err(broadcast::error::RecvError::Lagged(skipped)) => Err(BrokerError::Read {
                    channel,
                    reason: format!("subscriber lagged, {skipped} messages dropped"),
                }),
                Err(broadcast::error::RecvError::Closed) => return None,
            };
            Some((item, receiver))
        });

        Ok(stream::iter(backlog.into_iter().map(Ok)).chain(live).boxed())
    }
}
