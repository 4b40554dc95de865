//! Participant entry point.

use common::StageLogger;
use participant::config::Config;
use participant::{HttpGatewayClient, Scheduler};
use tokio::signal;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

#[tokio::main]
async fn main() {
    common::init_tracing();
    let config = Config::from_env();

    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    let gateway = HttpGatewayClient::new(config.gateway_url.clone());

    // The scheduler runs detached and stops with the process.
    let scheduler = Scheduler::new(
        gateway.clone(),
        &config,
        StageLogger::new(config.friendly_name.clone()),
    );
    tokio::spawn(scheduler.run());

    let state = participant::create_state(
        gateway,
        config.decision.policy(),
        config.external_name.clone(),
        config.friendly_name.clone(),
    );
    let app = participant::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, callback = %config.callback_url(), "starting participant");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}
