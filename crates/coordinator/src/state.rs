//! Logical workflow state machine.

use serde::{Deserialize, Serialize};

/// Where one workflow instance stands, as seen by the coordinator.
///
/// Never persisted: the state exists only while a message is being handled
/// and is stamped onto log records so the log stream can be read back as a
/// timeline.
///
/// State transitions:
/// ```text
/// Requested ──► CallbackInFlight ──┬──► Committed
///                                  ├──► Cancelled
///                                  └──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WorkflowState {
    /// A control envelope has been delivered.
    #[default]
    Requested,

    /// The participant's callback endpoint has been called.
    CallbackInFlight,

    /// A commit decision arrived and a completion event was emitted.
    Committed,

    /// A cancel decision was routed; nothing further happens.
    Cancelled,

    /// The callback failed; the workflow is abandoned.
    Failed,
}

impl WorkflowState {
    /// Returns true if `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: WorkflowState) -> bool {
        matches!(
            (self, next),
            (WorkflowState::Requested, WorkflowState::CallbackInFlight)
                | (WorkflowState::Requested, WorkflowState::Failed)
                | (WorkflowState::CallbackInFlight, WorkflowState::Committed)
                | (WorkflowState::CallbackInFlight, WorkflowState::Cancelled)
                | (WorkflowState::CallbackInFlight, WorkflowState::Failed)
        )
    }

    /// Moves to `next`, asserting in debug builds that the move is legal.
    pub fn advance(self, next: WorkflowState) -> WorkflowState {
        debug_assert!(
            self.can_transition_to(next),
            "illegal workflow transition {self} -> {next}"
        );
        next
    }

    /// The state a participant's verdict leads to.
    pub fn decided(commit: bool) -> WorkflowState {
        if commit {
            WorkflowState::Committed
        } else {
            WorkflowState::Cancelled
        }
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowState::Committed | WorkflowState::Cancelled | WorkflowState::Failed
        )
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::Requested => "Requested",
            WorkflowState::CallbackInFlight => "CallbackInFlight",
            WorkflowState::Committed => "Committed",
            WorkflowState::Cancelled => "Cancelled",
            WorkflowState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
