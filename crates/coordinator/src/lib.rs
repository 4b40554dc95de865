//! Coordinator for the callback-driven saga.
//!
//! Consumes two channels independently:
//! 1. `control`: for each stamped work request, call the originating
//!    participant back so it can decide.
//! 2. `commit`: for each committed decision, publish a completion event
//!    onto `event`.
//!
//! Cancel decisions never reach the coordinator. A failed callback ends the
//! workflow silently; there is no retry and no compensation.

pub mod callback;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod state;

pub use callback::{CallbackCall, CallbackClient, HttpCallbackClient, RecordingCallbackClient};
pub use coordinator::Coordinator;
pub use error::CoordinatorError;
pub use state::WorkflowState;
