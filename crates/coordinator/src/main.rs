//! Coordinator entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use broker::NatsBroker;
use common::StageLogger;
use coordinator::config::Config;
use coordinator::{Coordinator, HttpCallbackClient};

#[tokio::main]
async fn main() {
    // 1. Initialize tracing
    common::init_tracing();
    let config = Config::from_env();

    // 2. Expose Prometheus metrics on their own listener
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(SocketAddr::from(([0, 0, 0, 0], config.metrics_port)))
        .install()
        .expect("failed to install Prometheus exporter");

    // 3. Connect to the broker
    let broker = NatsBroker::connect(config.nats())
        .await
        .expect("failed to connect to broker");

    let coordinator = Arc::new(Coordinator::new(
        broker,
        HttpCallbackClient::new(),
        StageLogger::new(config.friendly_name.clone()),
    ));

    // 4. Run until interrupted. In-flight workflows are abandoned on exit.
    tokio::select! {
        () = coordinator.run(config.reader()) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received SIGINT, exiting without draining");
        }
    }
}
