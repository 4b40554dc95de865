//! Outbound calls to the gateway.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{Acknowledgement, CorrelationId, Decision, WorkRequest};

use crate::error::{ParticipantError, Result};

pub const REQUEST_PATH: &str = "/request";
pub const COMMIT_PATH: &str = "/commit";

/// The two gateway entry points a participant uses.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// Posts a new work request. Returns the gateway's acknowledgement.
    async fn submit_request(&self, request: &WorkRequest) -> Result<Acknowledgement>;

    /// Posts a commit/cancel decision.
    async fn submit_decision(&self, decision: &Decision) -> Result<()>;
}

/// reqwest-backed client. Any non-2xx answer is treated as a failure.
#[derive(Debug, Clone)]
pub struct HttpGatewayClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGatewayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post<T: serde::Serialize + Sync>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(endpoint)
            .json(body)
            .send()
            .await
            .map_err(|e| ParticipantError::Gateway {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ParticipantError::GatewayStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl GatewayClient for HttpGatewayClient {
    async fn submit_request(&self, request: &WorkRequest) -> Result<Acknowledgement> {
        let endpoint = self.endpoint(REQUEST_PATH);
        let response = self.post(&endpoint, request).await?;
        response
            .json::<Acknowledgement>()
            .await
            .map_err(|e| ParticipantError::Gateway {
                endpoint,
                reason: e.to_string(),
            })
    }

    async fn submit_decision(&self, decision: &Decision) -> Result<()> {
        let endpoint = self.endpoint(COMMIT_PATH);
        self.post(&endpoint, decision).await?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct RecordingState {
    requests: Vec<WorkRequest>,
    decisions: Vec<Decision>,
    fail: bool,
}

/// In-memory gateway client for testing.
#[derive(Debug, Clone, Default)]
pub struct RecordingGatewayClient {
    state: Arc<RwLock<RecordingState>>,
}

impl RecordingGatewayClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent submissions fail as if the gateway were down.
    pub fn set_fail(&self, fail: bool) {
        self.state.write().unwrap().fail = fail;
    }

    pub fn requests(&self) -> Vec<WorkRequest> {
        self.state.read().unwrap().requests.clone()
    }

    pub fn decisions(&self) -> Vec<Decision> {
        self.state.read().unwrap().decisions.clone()
    }
}

#[async_trait]
impl GatewayClient for RecordingGatewayClient {
    async fn submit_request(&self, request: &WorkRequest) -> Result<Acknowledgement> {
        let mut state = self.state.write().unwrap();
        if state.fail {
            return Err(ParticipantError::Gateway {
                endpoint: REQUEST_PATH.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        state.requests.push(request.clone());
        Ok(Acknowledgement::ok(CorrelationId::new()))
    }

    async fn submit_decision(&self, decision: &Decision) -> Result<()> {
        let mut state = self.state.write().unwrap();
        if state.fail {
            return Err(ParticipantError::Gateway {
                endpoint: COMMIT_PATH.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        state.decisions.push(decision.clone());
        Ok(())
    }
}
