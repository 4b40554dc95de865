//! Work-request and decision forwarding endpoints.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use broker::{Broker, Message};
use common::{Acknowledgement, Channel, CorrelationId, Decision, ErrorDetail, StageLogger, WorkRequest};

use crate::error::{GatewayError, Result};

const TARGET: &str = "broker";

/// Shared application state accessible from all handlers.
pub struct AppState<B: Broker> {
    pub broker: B,
    pub logger: StageLogger,
}

/// POST /request: stamp a work request and publish it onto `control`.
///
/// The publish is awaited so that a broker failure reaches the caller as a
/// 400. Nothing downstream of the publish is awaited.
#[tracing::instrument(skip(state, body))]
pub async fn submit_request<B: Broker + Clone + 'static>(
    State(state): State<Arc<AppState<B>>>,
    body: Bytes,
) -> Result<Json<Acknowledgement>> {
    let correlation_id = CorrelationId::new();
    metrics::counter!("gateway_requests_total").increment(1);

    let request: WorkRequest = serde_json::from_slice(&body).map_err(|e| {
        state
            .logger
            .record(TARGET, format!("error decoding data request: {e}"))
            .with_correlation_id(&correlation_id)
            .with_error(ErrorDetail::from_error(&e))
            .emit();
        GatewayError::Decode(e)
    })?;
    let request = request.with_correlation_id(correlation_id.clone());
    let execution_id = request.execution_id.clone();

    state
        .logger
        .record(
            TARGET,
            format!("publishing request with correlation id: {correlation_id}"),
        )
        .with_ids(&correlation_id, &execution_id)
        .emit();

    let message = Message::json(Channel::Control, correlation_id.as_str(), &request)?
        .with_execution_id(&execution_id);

    if let Err(err) = state.broker.publish(message).await {
        metrics::counter!("gateway_publish_failures_total").increment(1);
        state
            .logger
            .record(
                TARGET,
                format!("error when publishing to control channel: {err}"),
            )
            .with_ids(&correlation_id, &execution_id)
            .with_error(ErrorDetail::from_error(&err))
            .emit();
        return Err(GatewayError::Publish(err));
    }

    Ok(Json(Acknowledgement::ok(correlation_id)))
}

/// POST /commit: route a decision to `commit` or `cancel`.
///
/// Responds as soon as the body is decoded; the publish runs on its own
/// task and a failure there is only logged.
#[tracing::instrument(skip(state, body))]
pub async fn submit_decision<B: Broker + Clone + 'static>(
    State(state): State<Arc<AppState<B>>>,
    body: Bytes,
) -> Result<Json<Acknowledgement>> {
    let correlation_id = CorrelationId::new();

    let decision: Decision = serde_json::from_slice(&body).map_err(|e| {
        state
            .logger
            .record(TARGET, format!("error decoding commit request: {e}"))
            .with_correlation_id(&correlation_id)
            .with_error(ErrorDetail::from_error(&e))
            .emit();
        GatewayError::Decode(e)
    })?;

    let channel = decision.channel();
    metrics::counter!("gateway_decisions_total", "channel" => channel.as_str()).increment(1);
    state
        .logger
        .record(
            TARGET,
            format!("publishing {channel} with correlation id: {correlation_id}"),
        )
        .with_ids(&correlation_id, &decision.execution_id)
        .emit();

    let message = Message::json(channel, correlation_id.as_str(), &decision)?
        .with_execution_id(&decision.execution_id);

    let task_state = Arc::clone(&state);
    let key = correlation_id.clone();
    tokio::spawn(async move {
        if let Err(err) = task_state.broker.publish(message).await {
            metrics::counter!("gateway_publish_failures_total").increment(1);
            task_state
                .logger
                .record(
                    TARGET,
                    format!("error when publishing to {channel} channel: {err}"),
                )
                .with_ids(&key, &decision.execution_id)
                .with_error(ErrorDetail::from_error(&err))
                .emit();
        }
    });

    Ok(Json(Acknowledgement::ok(correlation_id)))
}
