//! Participant: originates saga work and decides it when called back.
//!
//! Runs two independent halves. The [`Scheduler`](scheduler::Scheduler)
//! posts a new work request to the gateway on every tick. The HTTP surface
//! answers the coordinator's callback by posting a decision back through
//! the gateway. No state is kept between the two.

pub mod config;
pub mod decision;
pub mod error;
pub mod gateway;
pub mod routes;
pub mod scheduler;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use common::StageLogger;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use decision::{DecisionMode, DecisionPolicy, FixedDecision, RandomDecision};
pub use error::ParticipantError;
pub use gateway::{GatewayClient, HttpGatewayClient, RecordingGatewayClient};
pub use routes::callback::AppState;
pub use scheduler::Scheduler;

/// Creates the participant router.
pub fn create_app<G: GatewayClient + 'static>(
    state: Arc<AppState<G>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/callback", get(routes::callback::handle::<G>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state for the callback handler.
pub fn create_state<G: GatewayClient + 'static>(
    gateway: G,
    policy: Box<dyn DecisionPolicy>,
    service_name: impl Into<String>,
    friendly_name: impl Into<String>,
) -> Arc<AppState<G>> {
    Arc::new(AppState {
        gateway,
        policy,
        service_name: service_name.into(),
        logger: StageLogger::new(friendly_name),
    })
}
