//! Shared types for the saga services.
//!
//! Holds the identifier scheme, the message contracts carried on the
//! broker channels, and the log-record schema every stage emits.

pub mod config;
pub mod logging;
pub mod messages;
pub mod types;

pub use config::{env_or, env_parse};
pub use logging::{ErrorDetail, LogRecord, StageLogger, init_tracing};
pub use messages::{Acknowledgement, Channel, CompletionEvent, Decision, UnknownChannel, WorkRequest};
pub use types::{CorrelationId, ExecutionId};
