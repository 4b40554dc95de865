//! Message contracts exchanged between the saga services.
//!
//! Every body is JSON-encoded. The execution id is carried in the body and
//! additionally as an out-of-band message attribute; see
//! `broker::resolve_execution_id` for the rule that reconciles the two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CorrelationId, ExecutionId};

/// A named publish/subscribe channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Work requests stamped by the gateway, consumed by the coordinator.
    Control,
    /// Decisions with `commit = true`.
    Commit,
    /// Decisions with `commit = false`.
    Cancel,
    /// Completion events, consumed by the sink.
    Event,
}

impl Channel {
    /// All channels, in protocol order.
    pub const ALL: [Channel; 4] = [
        Channel::Control,
        Channel::Commit,
        Channel::Cancel,
        Channel::Event,
    ];

    /// Returns the wire name of the channel.
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Control => "control",
            Channel::Commit => "commit",
            Channel::Cancel => "cancel",
            Channel::Event => "event",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a channel name is not part of the protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown channel: {0}")]
pub struct UnknownChannel(pub String);

impl std::str::FromStr for Channel {
    type Err = UnknownChannel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownChannel(s.to_string()))
    }
}

/// Work issued by a participant and forwarded by the gateway.
///
/// The participant leaves `correlation_id` empty; the gateway fills it in
/// before publishing the request onto [`Channel::Control`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkRequest {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub service_name: String,
    pub callback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<CorrelationId>,
    pub execution_id: ExecutionId,
}

impl WorkRequest {
    /// Creates a request issued now, without a correlation id.
    pub fn new(
        execution_id: ExecutionId,
        user_id: impl Into<String>,
        service_name: impl Into<String>,
        callback: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            timestamp: Some(Utc::now()),
            service_name: service_name.into(),
            callback: callback.into(),
            correlation_id: None,
            execution_id,
        }
    }

    /// Stamps the request with the gateway's correlation id.
    pub fn with_correlation_id(mut self, correlation_id: CorrelationId) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }
}

/// A participant's commit/cancel verdict for one workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub correlation_id: CorrelationId,
    pub execution_id: ExecutionId,
    #[serde(default)]
    pub origin_service: String,
    pub commit: bool,
}

impl Decision {
    /// Returns the channel this decision is routed to.
    pub fn channel(&self) -> Channel {
        if self.commit {
            Channel::Commit
        } else {
            Channel::Cancel
        }
    }
}

/// Terminal message marking a committed workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub correlation_id: CorrelationId,
    pub execution_id: ExecutionId,
    pub service_name: String,
}

impl CompletionEvent {
    /// Builds the completion event for a committed decision.
    pub fn from_decision(decision: &Decision) -> Self {
        Self {
            correlation_id: decision.correlation_id.clone(),
            execution_id: decision.execution_id.clone(),
            service_name: decision.origin_service.clone(),
        }
    }
}

/// Body the gateway returns once it has accepted a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    pub status: String,
    pub correlation_id: CorrelationId,
}

impl Acknowledgement {
    pub fn ok(correlation_id: CorrelationId) -> Self {
        Self {
            status: "OK".to_string(),
            correlation_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_names_match_protocol() {
        let names: Vec<&str> = Channel::ALL.iter().map(Channel::as_str).collect();
        assert_eq!(names, ["control", "commit", "cancel", "event"]);
        assert_eq!("commit".parse::<Channel>().unwrap(), Channel::Commit);
        assert!("e_topic".parse::<Channel>().is_err());
    }

    #[test]
    fn decision_routing_is_exhaustive() {
        let mut decision = Decision {
            correlation_id: "C1".into(),
            execution_id: "exec-1".into(),
            origin_service: "svc-a".to_string(),
            commit: true,
        };
        assert_eq!(decision.channel(), Channel::Commit);
        decision.commit = false;
        assert_eq!(decision.channel(), Channel::Cancel);
    }

    #[test]
    fn work_request_accepts_missing_timestamp() {
        let json = r#"{
            "user_id": "42",
            "service_name": "svc-a",
            "callback": "http://svc-a/callback",
            "execution_id": "exec-1"
        }"#;
        let req: WorkRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.execution_id.as_str(), "exec-1");
        assert!(req.timestamp.is_none());
        assert!(req.correlation_id.is_none());
    }

    #[test]
    fn work_request_rejects_missing_callback() {
        let json = r#"{"user_id": "42", "service_name": "svc-a", "execution_id": "exec-1"}"#;
        assert!(serde_json::from_str::<WorkRequest>(json).is_err());
    }

    #[test]
    fn work_request_keeps_timestamp_precision() {
        let req = WorkRequest::new("exec-1".into(), "42", "svc-a", "http://svc-a/callback")
            .with_correlation_id("C1".into());
        let json = serde_json::to_string(&req).unwrap();
        let back: WorkRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, req);
        assert_eq!(
            back.timestamp.unwrap().timestamp_nanos_opt(),
            req.timestamp.unwrap().timestamp_nanos_opt()
        );
    }

    #[test]
    fn completion_event_copies_decision_identifiers() {
        let decision = Decision {
            correlation_id: "C1".into(),
            execution_id: "exec-1".into(),
            origin_service: "svc-a".to_string(),
            commit: true,
        };
        let event = CompletionEvent::from_decision(&decision);
        assert_eq!(event.correlation_id.as_str(), "C1");
        assert_eq!(event.execution_id.as_str(), "exec-1");
        assert_eq!(event.service_name, "svc-a");
    }

    #[test]
    fn decision_origin_service_defaults_to_empty() {
        let json = r#"{"correlation_id": "C1", "execution_id": "exec-1", "commit": false}"#;
        let decision: Decision = serde_json::from_str(json).unwrap();
        assert_eq!(decision.origin_service, "");
        assert!(!decision.commit);
    }
}
