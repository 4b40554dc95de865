//! Sink entry point.

use std::net::SocketAddr;

use broker::NatsBroker;
use common::StageLogger;
use sink::Sink;
use sink::config::Config;

#[tokio::main]
async fn main() {
    common::init_tracing();
    let config = Config::from_env();

    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(SocketAddr::from(([0, 0, 0, 0], config.metrics_port)))
        .install()
        .expect("failed to install Prometheus exporter");

    let broker = NatsBroker::connect(config.nats())
        .await
        .expect("failed to connect to broker");
    let sink = Sink::new(broker, StageLogger::new(config.friendly_name.clone()));

    tokio::select! {
        () = sink.run(config.reader()) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received SIGINT, exiting");
        }
    }
}
