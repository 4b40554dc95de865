//! Sink: logs every completion event read from the `event` channel.
//!
//! Nothing is persisted and nothing is published. The log record is the
//! only trace a committed workflow leaves.

pub mod config;

use std::sync::atomic::{AtomicUsize, Ordering};

use broker::{Broker, Channel, ChannelReader, Message, ReaderConfig, Result, drain_errors};
use common::{CompletionEvent, CorrelationId, ErrorDetail, StageLogger};
use tokio::sync::mpsc;

const TARGET: &str = "broker";

/// Observes completion events.
pub struct Sink<B: Broker> {
    broker: B,
    logger: StageLogger,
    observed: AtomicUsize,
}

impl<B: Broker + Clone + 'static> Sink<B> {
    pub fn new(broker: B, logger: StageLogger) -> Self {
        Self {
            broker,
            logger,
            observed: AtomicUsize::new(0),
        }
    }

    /// Number of events handled since this sink was created.
    pub fn observed(&self) -> usize {
        self.observed.load(Ordering::Relaxed)
    }

    /// Decodes one event, preferring the attribute's execution id, and logs it.
    #[tracing::instrument(skip(self, message), fields(key = %message.key))]
    pub fn handle_event(&self, message: &Message) -> Result<CompletionEvent> {
        let event: CompletionEvent = message.decode_normalized().map_err(|err| {
            self.logger
                .record(TARGET, "discarding malformed event")
                .with_correlation_id(&CorrelationId::from(message.key.as_str()))
                .with_error(ErrorDetail::from_error(&err))
                .emit();
            err
        })?;

        self.observed.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("sink_events_observed_total").increment(1);
        self.logger
            .record(
                TARGET,
                format!(
                    "received event {} from {}",
                    event.correlation_id, event.service_name
                ),
            )
            .with_ids(&event.correlation_id, &event.execution_id)
            .emit();
        Ok(event)
    }

    /// Drains `messages` until the reader goes away.
    ///
    /// Returns the number of events observed from this receiver.
    pub async fn consume(&self, mut messages: mpsc::Receiver<Message>) -> usize {
        let mut observed = 0;
        while let Some(message) = messages.recv().await {
            if self.handle_event(&message).is_ok() {
                observed += 1;
            }
        }
        observed
    }

    /// Reads `event` until the process exits.
    pub async fn run(&self, config: ReaderConfig) {
        let (messages, errors) =
            ChannelReader::spawn(self.broker.clone(), Channel::Event, config).into_parts();
        tokio::spawn(drain_errors(Channel::Event, errors, self.logger.clone()));

        tracing::info!("sink loop running");
        self.consume(messages).await;
    }
}
