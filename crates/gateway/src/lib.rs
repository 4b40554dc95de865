//! Gateway: synchronous HTTP ingress for the saga.
//!
//! Stamps each call with a fresh correlation id and republishes the body
//! onto a broker channel. Carries no business logic.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use broker::Broker;
use common::StageLogger;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::forward::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<B: Broker + Clone + 'static>(
    state: Arc<AppState<B>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/request", post(routes::forward::submit_request::<B>))
        .route("/commit", post(routes::forward::submit_decision::<B>))
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

/// Creates the application state around a broker handle.
pub fn create_state<B: Broker + Clone + 'static>(
    broker: B,
    friendly_name: impl Into<String>,
) -> Arc<AppState<B>> {
    Arc::new(AppState {
        broker,
        logger: StageLogger::new(friendly_name),
    })
}
