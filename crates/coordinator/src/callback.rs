//! Outbound callback leg: asking a participant for its decision.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{CorrelationId, ExecutionId};

use crate::error::{CoordinatorError, Result};

/// Calls back into the service that originated a workflow.
#[async_trait]
pub trait CallbackClient: Send + Sync {
    /// Invokes `callback` with both identifiers as parameters.
    ///
    /// Returns the remote status code on success. A transport failure or a
    /// non-success status is an error.
    async fn invoke(
        &self,
        callback: &str,
        correlation_id: &CorrelationId,
        execution_id: &ExecutionId,
    ) -> Result<u16>;
}

/// Builds the callback URL with the identifiers as query parameters.
pub fn callback_url(
    callback: &str,
    correlation_id: &CorrelationId,
    execution_id: &ExecutionId,
) -> Result<reqwest::Url> {
    let mut url = reqwest::Url::parse(callback).map_err(|e| CoordinatorError::InvalidCallback {
        url: callback.to_string(),
        reason: e.to_string(),
    })?;
    url.query_pairs_mut()
        .append_pair("correlation_id", correlation_id.as_str())
        .append_pair("execution_id", execution_id.as_str());
    Ok(url)
}

/// HTTP implementation issuing `GET {callback}?correlation_id=&execution_id=`.
///
/// No timeout is configured: a participant that never answers holds the
/// control loop until the connection drops.
#[derive(Debug, Clone, Default)]
pub struct HttpCallbackClient {
    client: reqwest::Client,
}

impl HttpCallbackClient {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CallbackClient for HttpCallbackClient {
    async fn invoke(
        &self,
        callback: &str,
        correlation_id: &CorrelationId,
        execution_id: &ExecutionId,
    ) -> Result<u16> {
        let url = callback_url(callback, correlation_id, execution_id)?;

        let response =
            self.client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| CoordinatorError::Callback {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoordinatorError::CallbackStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(status.as_u16())
    }
}

/// One recorded callback invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackCall {
    pub callback: String,
    pub correlation_id: CorrelationId,
    pub execution_id: ExecutionId,
}

#[derive(Debug)]
struct RecordingState {
    calls: Vec<CallbackCall>,
    status: u16,
    unreachable: bool,
}

impl Default for RecordingState {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            status: 200,
            unreachable: false,
        }
    }
}

/// In-memory callback client for testing.
///
/// Records every invocation and answers with a configurable status.
#[derive(Debug, Clone, Default)]
pub struct RecordingCallbackClient {
    state: Arc<RwLock<RecordingState>>,
}

impl RecordingCallbackClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the status code returned to subsequent calls.
    pub fn set_status(&self, status: u16) {
        self.state.write().unwrap().status = status;
    }

    /// Makes subsequent calls fail as if the participant were unreachable.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.write().unwrap().unreachable = unreachable;
    }

    /// Returns every recorded call, in order.
    pub fn calls(&self) -> Vec<CallbackCall> {
        self.state.read().unwrap().calls.clone()
    }
}

#[async_trait]
impl CallbackClient for RecordingCallbackClient {
    async fn invoke(
        &self,
        callback: &str,
        correlation_id: &CorrelationId,
        execution_id: &ExecutionId,
    ) -> Result<u16> {
        let mut state = self.state.write().unwrap();
        state.calls.push(CallbackCall {
            callback: callback.to_string(),
            correlation_id: correlation_id.clone(),
            execution_id: execution_id.clone(),
        });

        if state.unreachable {
            return Err(CoordinatorError::Callback {
                url: callback.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        if !(200..300).contains(&state.status) {
            return Err(CoordinatorError::CallbackStatus {
                url: callback.to_string(),
                status: state.status,
            });
        }
        Ok(state.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_url_carries_both_ids() {
        let url = callback_url(
            "http://svc-a/callback",
            &CorrelationId::from("C1"),
            &ExecutionId::from("exec-1"),
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "http://svc-a/callback?correlation_id=C1&execution_id=exec-1"
        );
    }

    #[test]
    fn test_callback_url_escapes_tokens() {
        let url = callback_url(
            "http://svc-a/callback",
            &CorrelationId::from("a b&c"),
            &ExecutionId::from("exec-1"),
        )
        .unwrap();
        assert_eq!(
            url.query(),
            Some("correlation_id=a+b%26c&execution_id=exec-1")
        );
    }

    #[test]
    fn test_invalid_callback_is_rejected() {
        let result = callback_url(
            "not a url",
            &CorrelationId::new(),
            &ExecutionId::new(),
        );
        assert!(matches!(
            result,
            Err(CoordinatorError::InvalidCallback { .. })
        ));
    }

    #[tokio::test]
    async fn test_recording_client_records_and_answers() {
        let client = RecordingCallbackClient::new();
        let status = client
            .invoke("http://svc-a/callback", &"C1".into(), &"exec-1".into())
            .await
            .unwrap();
        assert_eq!(status, 200);
        assert_eq!(client.calls().len(), 1);
        assert_eq!(client.calls()[0].execution_id.as_str(), "exec-1");
    }

    #[tokio::test]
    async fn test_recording_client_non_success_is_error() {
        let client = RecordingCallbackClient::new();
        client.set_status(503);
        let result = client
            .invoke("http://svc-a/callback", &"C1".into(), &"exec-1".into())
            .await;
        assert!(matches!(
            result,
            Err(CoordinatorError::CallbackStatus { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_http_client_reports_unreachable_participant() {
        // Port 9 (discard) is not served in test environments.
        let client = HttpCallbackClient::new();
        let result = client
            .invoke("http://127.0.0.1:9/callback", &"C1".into(), &"exec-1".into())
            .await;
        assert!(matches!(result, Err(CoordinatorError::Callback { .. })));
    }
}
