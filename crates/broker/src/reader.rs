//! Background channel reading with bounded buffering.
//!
//! A reader task owns the subscription and hands messages to the processing
//! task through a bounded queue. When that queue is full the reader blocks,
//! which in turn stops it from pulling from the broker. Read failures never
//! stop the reader: they go to a separate bounded error queue and the
//! reader carries on, resubscribing whenever the subscription is lost.

use std::time::Duration;

use common::{ErrorDetail, StageLogger};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{Broker, BrokerError, Channel, Message};

/// Tuning for a [`ChannelReader`].
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Messages buffered between the reader and the processing task.
    pub buffer_capacity: usize,
    /// Read errors buffered before the reader blocks on the error queue.
    pub error_capacity: usize,
    /// Pause before resubscribing after the subscription is lost.
    pub retry_delay: Duration,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 1000,
            error_capacity: 1000,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Handle to a spawned broker-read task for one channel.
pub struct ChannelReader {
    pub channel: Channel,
    pub messages: mpsc::Receiver<Message>,
    pub errors: mpsc::Receiver<BrokerError>,
    task: JoinHandle<()>,
}

impl ChannelReader {
    /// Spawns the read task for `channel`.
    ///
    /// The task runs until `messages` is dropped.
    pub fn spawn<B>(broker: B, channel: Channel, config: ReaderConfig) -> Self
    where
        B: Broker + 'static,
    {
        let (message_tx, messages) = mpsc::channel(config.buffer_capacity.max(1));
        let (error_tx, errors) = mpsc::channel(config.error_capacity.max(1));

        let task = tokio::spawn(read_loop(
            broker,
            channel,
            config.retry_delay,
            message_tx,
            error_tx,
        ));

        Self {
            channel,
            messages,
            errors,
            task,
        }
    }

    /// Stops the read task without draining it.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Splits off the two queues, leaving the read task running detached.
    pub fn into_parts(self) -> (mpsc::Receiver<Message>, mpsc::Receiver<BrokerError>) {
        (self.messages, self.errors)
    }
}

async fn read_loop<B: Broker>(
    broker: B,
    channel: Channel,
    retry_delay: Duration,
    messages: mpsc::Sender<Message>,
    errors: mpsc::Sender<BrokerError>,
) {
    loop {
        match broker.subscribe(channel).await {
            Ok(mut stream) => {
                while let Some(item) = stream.next().await {
                    match item {
                        Ok(message) => {
                            if messages.send(message).await.is_err() {
                                tracing::debug!(%channel, "message receiver dropped, reader exiting");
                                return;
                            }
                        }
                        Err(err) => report(&errors, err).await,
                    }
                }
                report(
                    &errors,
                    BrokerError::Read {
                        channel,
                        reason: "subscription closed".to_string(),
                    },
                )
                .await;
            }
            Err(err) => report(&errors, err).await,
        }

        if messages.is_closed() {
            return;
        }
        tokio::time::sleep(retry_delay).await;
    }
}

async fn report(errors: &mpsc::Sender<BrokerError>, err: BrokerError) {
    metrics::counter!("broker_read_errors_total").increment(1);
    if let Err(mpsc::error::SendError(err)) = errors.send(err).await {
        tracing::warn!(error = %err, "read error dropped, no error drain running");
    }
}

/// Logs every error queued by a channel reader.
///
/// Returns the number of errors logged once the reader has exited.
pub async fn drain_errors(
    channel: Channel,
    mut errors: mpsc::Receiver<BrokerError>,
    logger: StageLogger,
) -> usize {
    let mut drained = 0;
    while let Some(err) = errors.recv().await {
        logger
            .record(
                channel.as_str(),
                format!("error reading from {channel} channel: {err}"),
            )
            .with_error(ErrorDetail::from_error(&err))
            .emit();
        drained += 1;
    }
    drained
}
