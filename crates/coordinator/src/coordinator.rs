//! Coordinator consumption loops.

use std::sync::Arc;

use broker::{Broker, Channel, ChannelReader, Message, ReaderConfig, drain_errors};
use common::{
    CompletionEvent, CorrelationId, Decision, ErrorDetail, LogRecord, StageLogger, WorkRequest,
};

use crate::callback::CallbackClient;
use crate::error::{CoordinatorError, Result};
use crate::state::WorkflowState;

const TARGET: &str = "broker";

/// Drives the callback leg of each workflow and emits completion events.
///
/// Holds no per-workflow state: every message carries the identifiers it
/// needs, so the control and commit loops can run unordered relative to
/// each other.
pub struct Coordinator<B, C>
where
    B: Broker,
    C: CallbackClient,
{
    broker: B,
    callbacks: C,
    logger: StageLogger,
}

impl<B, C> Coordinator<B, C>
where
    B: Broker + Clone + 'static,
    C: CallbackClient + 'static,
{
    /// Creates a new coordinator.
    pub fn new(broker: B, callbacks: C, logger: StageLogger) -> Self {
        Self {
            broker,
            callbacks,
            logger,
        }
    }

    fn record(&self, state: WorkflowState, message: impl Into<String>) -> LogRecord {
        let message = message.into();
        self.logger.record(TARGET, format!("[{state}] {message}"))
    }

    /// Handles one control envelope: calls the participant back.
    ///
    /// Returns `CallbackInFlight` once the participant has acknowledged the
    /// callback, or `Failed` if the envelope is unusable or the call fails.
    /// A failed workflow is dropped here; nothing is retried or published.
    #[tracing::instrument(skip(self, message), fields(key = %message.key))]
    pub async fn handle_control(&self, message: Message) -> WorkflowState {
        let request: WorkRequest = match message.decode_normalized() {
            Ok(request) => request,
            Err(err) => {
                let state = WorkflowState::Requested.advance(WorkflowState::Failed);
                self.record(state, "discarding malformed data request")
                    .with_correlation_id(&CorrelationId::from(message.key.as_str()))
                    .with_error(ErrorDetail::from_error(&err))
                    .emit();
                return state;
            }
        };

        let correlation_id = request
            .correlation_id
            .clone()
            .unwrap_or_else(|| CorrelationId::from(message.key.as_str()));
        let execution_id = request.execution_id.clone();

        self.record(
            WorkflowState::Requested,
            format!("received data request {execution_id}"),
        )
        .with_ids(&correlation_id, &execution_id)
        .emit();

        match self
            .callbacks
            .invoke(&request.callback, &correlation_id, &execution_id)
            .await
        {
            Ok(status) => {
                metrics::counter!("coordinator_callbacks_total", "outcome" => "success")
                    .increment(1);
                let state = WorkflowState::Requested.advance(WorkflowState::CallbackInFlight);
                self.record(
                    state,
                    format!("got http status code from source system: {status}"),
                )
                .with_ids(&correlation_id, &execution_id)
                .emit();
                state
            }
            Err(err) => {
                metrics::counter!("coordinator_callbacks_total", "outcome" => "failure")
                    .increment(1);
                let state = WorkflowState::Requested.advance(WorkflowState::Failed);
                self.record(
                    state,
                    format!("error calling back the source system: {err}"),
                )
                .with_ids(&correlation_id, &execution_id)
                .with_error(ErrorDetail::from_error(&err))
                .emit();
                state
            }
        }
    }

    /// Handles one decision read from the commit channel.
    ///
    /// Publishes exactly one completion event for a committed decision and
    /// returns it. A decision with `commit = false` is ignored.
    #[tracing::instrument(skip(self, message), fields(key = %message.key))]
    pub async fn handle_commit(&self, message: Message) -> Result<Option<CompletionEvent>> {
        let decision: Decision = message.decode_normalized().map_err(|err| {
            self.record(
                WorkflowState::CallbackInFlight.advance(WorkflowState::Failed),
                "discarding malformed decision",
            )
            .with_correlation_id(&CorrelationId::from(message.key.as_str()))
            .with_error(ErrorDetail::from_error(&err))
            .emit();
            CoordinatorError::from(err)
        })?;

        let state =
            WorkflowState::CallbackInFlight.advance(WorkflowState::decided(decision.commit));
        if !decision.commit {
            self.record(state, "ignoring cancel decision delivered on commit channel")
                .with_ids(&decision.correlation_id, &decision.execution_id)
                .emit();
            return Ok(None);
        }

        let event = CompletionEvent::from_decision(&decision);
        self.record(state, format!("received event {}", event.correlation_id))
            .with_ids(&event.correlation_id, &event.execution_id)
            .emit();

        let outbound = Message::json(Channel::Event, event.correlation_id.as_str(), &event)?
            .with_execution_id(&event.execution_id);

        if let Err(err) = self.broker.publish(outbound).await {
            self.record(
                WorkflowState::CallbackInFlight.advance(WorkflowState::Failed),
                format!("error publishing event to event channel: {err}"),
            )
            .with_ids(&event.correlation_id, &event.execution_id)
            .with_error(ErrorDetail::from_error(&err))
            .emit();
            return Err(err.into());
        }

        metrics::counter!("coordinator_events_published_total").increment(1);
        self.record(
            state,
            format!("published event {} to event channel", event.correlation_id),
        )
        .with_ids(&event.correlation_id, &event.execution_id)
        .emit();

        Ok(Some(event))
    }

    /// Runs both consumption loops until the process exits.
    ///
    /// Spawns one reader and one error drain per input channel plus one
    /// sequential processing loop each. Nothing here returns on error.
    pub async fn run(self: Arc<Self>, config: ReaderConfig) {
        let (mut control, control_errors) =
            ChannelReader::spawn(self.broker.clone(), Channel::Control, config.clone())
                .into_parts();
        let (mut commits, commit_errors) =
            ChannelReader::spawn(self.broker.clone(), Channel::Commit, config).into_parts();

        let control_drain = tokio::spawn(drain_errors(
            Channel::Control,
            control_errors,
            self.logger.clone(),
        ));
        let commit_drain = tokio::spawn(drain_errors(
            Channel::Commit,
            commit_errors,
            self.logger.clone(),
        ));

        let this = Arc::clone(&self);
        let control_loop = tokio::spawn(async move {
            while let Some(message) = control.recv().await {
                if this.handle_control(message).await.is_terminal() {
                    metrics::counter!("coordinator_workflows_abandoned_total").increment(1);
                }
            }
        });

        let this = Arc::clone(&self);
        let commit_loop = tokio::spawn(async move {
            while let Some(message) = commits.recv().await {
                // Failures are already logged; the workflow is dropped.
                let _ = this.handle_commit(message).await;
            }
        });

        tracing::info!("coordinator loops running");
        let _ = tokio::join!(control_loop, commit_loop, control_drain, commit_drain);
    }
}
