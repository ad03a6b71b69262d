use super::states::ExecutionStatus;
use crate::error::{TrackerError, TrackerResult};

/// Transitions a component may take through the persistence handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEvent {
    Start,
    End(ExecutionStatus),
}

impl TransitionEvent {
    /// Status the row must currently hold for the guarded UPDATE to match
    pub fn required_status(&self) -> ExecutionStatus {
        match self {
            Self::Start => ExecutionStatus::NotYetStarted,
            Self::End(_) => ExecutionStatus::Running,
        }
    }

    pub fn target_status(&self) -> ExecutionStatus {
        match self {
            Self::Start => ExecutionStatus::Running,
            Self::End(status) => *status,
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End(_) => "end",
        }
    }
}

/// Rejects transitions outside NOT_YET_STARTED -> RUNNING -> terminal.
///
/// Only the shape of the request is checked here. Whether the stored row is
/// actually in `required_status` is enforced by the UPDATE's WHERE clause.
pub struct TransitionGuard;

impl TransitionGuard {
    pub fn check(event: TransitionEvent) -> TrackerResult<()> {
        match event {
            TransitionEvent::Start => Ok(()),
            TransitionEvent::End(status) if status.is_terminal() => Ok(()),
            TransitionEvent::End(status) => Err(TrackerError::Validation(format!(
                "cannot end with non-terminal status {status}"
            ))),
        }
    }

    pub fn can_transition(from: ExecutionStatus, to: ExecutionStatus) -> bool {
        match from {
            ExecutionStatus::NotYetStarted => to == ExecutionStatus::Running,
            ExecutionStatus::Running => to.is_terminal(),
            _ => false,
        }
    }
}
