//! Periodic origination of new workflows.

use std::time::Duration;

use common::{Acknowledgement, ErrorDetail, ExecutionId, StageLogger, WorkRequest};
use tokio::time::MissedTickBehavior;

use crate::config::Config;
use crate::error::Result;
use crate::gateway::GatewayClient;

const TARGET: &str = "gateway";

/// Issues one work request per tick.
///
/// Every tick mints a fresh execution id. A failed submission is logged and
/// the next tick proceeds on schedule.
pub struct Scheduler<G: GatewayClient> {
    gateway: G,
    service_name: String,
    callback: String,
    interval: Duration,
    logger: StageLogger,
}

impl<G: GatewayClient> Scheduler<G> {
    pub fn new(gateway: G, config: &Config, logger: StageLogger) -> Self {
        Self {
            gateway,
            service_name: config.external_name.clone(),
            callback: config.callback_url(),
            interval: config.tick_interval(),
            logger,
        }
    }

    /// Builds a request for a new workflow instance.
    pub fn build_request(&self) -> WorkRequest {
        WorkRequest::new(
            ExecutionId::new(),
            rand::random::<u32>().to_string(),
            self.service_name.clone(),
            self.callback.clone(),
        )
    }

    /// Builds and submits one work request.
    #[tracing::instrument(skip(self))]
    pub async fn tick(&self) -> Result<Acknowledgement> {
        let request = self.build_request();
        let execution_id = request.execution_id.clone();

        match self.gateway.submit_request(&request).await {
            Ok(ack) => {
                metrics::counter!("participant_requests_total", "outcome" => "success")
                    .increment(1);
                self.logger
                    .record(
                        TARGET,
                        format!("request accepted with status {}", ack.status),
                    )
                    .with_ids(&ack.correlation_id, &execution_id)
                    .emit();
                Ok(ack)
            }
            Err(err) => {
                metrics::counter!("participant_requests_total", "outcome" => "failure")
                    .increment(1);
                self.logger
                    .record(TARGET, format!("error sending data: {err}"))
                    .with_execution_id(&execution_id)
                    .with_error(ErrorDetail::from_error(&err))
                    .emit();
                Err(err)
            }
        }
    }

    /// Ticks forever. The first request goes out one interval after start.
    pub async fn run(self) {
        let period = self.interval.max(Duration::from_millis(1));
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            // Failures are logged by tick().
            let _ = self.tick().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::RecordingGatewayClient;

    fn scheduler(gateway: RecordingGatewayClient) -> Scheduler<RecordingGatewayClient> {
        let config = Config {
            external_name: "svc-a".to_string(),
            ..Config::default()
        };
        Scheduler::new(gateway, &config, StageLogger::new("participant-test"))
    }

    #[test]
    fn test_build_request_embeds_callback() {
        let scheduler = scheduler(RecordingGatewayClient::new());
        let request = scheduler.build_request();
        assert_eq!(request.service_name, "svc-a");
        assert_eq!(request.callback, "http://svc-a:8888/callback");
        assert!(request.correlation_id.is_none());
        assert!(request.timestamp.is_some());
        assert!(!request.execution_id.is_empty());
    }

    #[tokio::test]
    async fn test_each_tick_mints_a_fresh_execution_id() {
        let gateway = RecordingGatewayClient::new();
        let scheduler = scheduler(gateway.clone());

        scheduler.tick().await.unwrap();
        scheduler.tick().await.unwrap();

        let requests = gateway.requests();
        assert_eq!(requests.len(), 2);
        assert_ne!(requests[0].execution_id, requests[1].execution_id);
    }

    #[tokio::test]
    async fn test_failed_tick_is_reported() {
        let gateway = RecordingGatewayClient::new();
        gateway.set_fail(true);
        let scheduler = scheduler(gateway.clone());

        assert!(scheduler.tick().await.is_err());
        assert!(gateway.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_keeps_ticking_through_failures() {
        let gateway = RecordingGatewayClient::new();
        gateway.set_fail(true);
        let handle = tokio::spawn(scheduler(gateway.clone()).run());

        tokio::time::sleep(Duration::from_secs(11)).await;
        gateway.set_fail(false);
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(gateway.requests().len(), 1);
        handle.abort();
    }
}
