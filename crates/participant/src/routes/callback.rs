//! Callback endpoint invoked by the coordinator.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use common::{CorrelationId, Decision, ErrorDetail, ExecutionId, StageLogger};
use serde::Deserialize;

use crate::decision::DecisionPolicy;
use crate::error::{ParticipantError, Result};
use crate::gateway::GatewayClient;

const TARGET: &str = "gateway";

/// Shared application state accessible from all handlers.
pub struct AppState<G: GatewayClient> {
    pub gateway: G,
    pub policy: Box<dyn DecisionPolicy>,
    pub service_name: String,
    pub logger: StageLogger,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub correlation_id: Option<String>,
    pub execution_id: Option<String>,
}

/// An empty parameter counts as missing.
fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// GET /callback: decide the workflow and report the verdict to the gateway.
///
/// Each invocation is handled on its own; repeated callbacks for the same
/// execution id each produce a decision.
#[tracing::instrument(skip_all)]
pub async fn handle<G: GatewayClient + 'static>(
    State(state): State<Arc<AppState<G>>>,
    Query(params): Query<CallbackParams>,
) -> Result<Json<Decision>> {
    let Some(correlation_id) = required(params.correlation_id) else {
        state.logger.record("error", "Missing correlation id").emit();
        return Err(ParticipantError::Validation(
            "missing correlation id".to_string(),
        ));
    };
    let Some(execution_id) = required(params.execution_id) else {
        state.logger.record("error", "Missing execution id").emit();
        return Err(ParticipantError::Validation(
            "missing execution id".to_string(),
        ));
    };
    let correlation_id = CorrelationId::from(correlation_id);
    let execution_id = ExecutionId::from(execution_id);

    let decision = Decision {
        commit: state.policy.decide(&correlation_id, &execution_id),
        correlation_id,
        execution_id,
        origin_service: state.service_name.clone(),
    };
    let verdict = if decision.commit { "commit" } else { "cancel" };
    metrics::counter!("participant_decisions_total", "decision" => verdict).increment(1);

    if let Err(err) = state.gateway.submit_decision(&decision).await {
        state
            .logger
            .record(
                "error",
                format!("error committing message to gateway: {err}"),
            )
            .with_ids(&decision.correlation_id, &decision.execution_id)
            .with_error(ErrorDetail::from_error(&err))
            .emit();
        return Err(err);
    }

    state
        .logger
        .record(TARGET, format!("decision {verdict} accepted by gateway"))
        .with_ids(&decision.correlation_id, &decision.execution_id)
        .emit();

    Ok(Json(decision))
}
