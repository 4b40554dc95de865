//! Shared log-record schema and its emission through `tracing`.
//!
//! The log stream is the only durable trace of a workflow: an external
//! harvester tails it and groups records by `execution_id`. Every stage
//! transition therefore goes through [`StageLogger`] so that all services
//! agree on one shape.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::{CorrelationId, ExecutionId};

/// Error payload attached to a log record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ErrorDetail {
    #[default]
    Absent,
    /// Plain error text.
    Message(String),
    /// Arbitrary structured payload, kept as-is for forward compatibility.
    Structured(serde_json::Map<String, serde_json::Value>),
}

impl ErrorDetail {
    /// Captures the display form of an error.
    pub fn from_error(err: &dyn std::error::Error) -> Self {
        ErrorDetail::Message(err.to_string())
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, ErrorDetail::Absent)
    }
}

impl std::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorDetail::Absent => Ok(()),
            ErrorDetail::Message(msg) => f.write_str(msg),
            ErrorDetail::Structured(map) => {
                write!(f, "{}", serde_json::Value::Object(map.clone()))
            }
        }
    }
}

/// One entry of the shared log stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub target: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<CorrelationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<ExecutionId>,
    pub friendly_name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "ErrorDetail::is_absent")]
    pub error: ErrorDetail,
}

impl LogRecord {
    pub fn with_correlation_id(mut self, correlation_id: &CorrelationId) -> Self {
        self.correlation_id = Some(correlation_id.clone());
        self
    }

    pub fn with_execution_id(mut self, execution_id: &ExecutionId) -> Self {
        self.execution_id = Some(execution_id.clone());
        self
    }

    /// Attaches both identifiers of a workflow stage.
    pub fn with_ids(self, correlation_id: &CorrelationId, execution_id: &ExecutionId) -> Self {
        self.with_correlation_id(correlation_id)
            .with_execution_id(execution_id)
    }

    pub fn with_error(mut self, error: ErrorDetail) -> Self {
        self.error = error;
        self
    }

    /// Writes the record to the log stream and hands it back.
    ///
    /// Records carrying an error are emitted at `ERROR`, all others at `INFO`.
    pub fn emit(self) -> Self {
        let record = serde_json::to_string(&self).unwrap_or_default();
        let correlation_id = self.correlation_id.as_ref().map(CorrelationId::as_str);
        let execution_id = self.execution_id.as_ref().map(ExecutionId::as_str);

        if self.error.is_absent() {
            tracing::info!(
                target: "saga::stage",
                stage = %self.target,
                correlation_id,
                execution_id,
                friendly_name = %self.friendly_name,
                %record,
                "{}",
                self.message
            );
        } else {
            tracing::error!(
                target: "saga::stage",
                stage = %self.target,
                correlation_id,
                execution_id,
                friendly_name = %self.friendly_name,
                error = %self.error,
                %record,
                "{}",
                self.message
            );
        }
        self
    }
}

/// Mints log records stamped with the process's friendly name.
#[derive(Debug, Clone)]
pub struct StageLogger {
    friendly_name: Arc<str>,
}

impl StageLogger {
    pub fn new(friendly_name: impl Into<String>) -> Self {
        Self {
            friendly_name: Arc::from(friendly_name.into()),
        }
    }

    pub fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    /// Starts a record for `target`, timestamped now.
    pub fn record(&self, target: impl Into<String>, message: impl Into<String>) -> LogRecord {
        LogRecord {
            target: target.into(),
            message: message.into(),
            correlation_id: None,
            execution_id: None,
            friendly_name: self.friendly_name.to_string(),
            timestamp: Utc::now(),
            error: ErrorDetail::Absent,
        }
    }
}

/// Installs the JSON tracing subscriber used by every binary.
///
/// The filter comes from `RUST_LOG` and defaults to `info`.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}
