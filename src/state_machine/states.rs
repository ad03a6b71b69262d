use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status shared by workloads, phases, sessions and tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Initial state when the component is created
    NotYetStarted,
    /// Component has been attached to its parent and is executing
    Running,
    /// Component completed successfully
    Finished,
    /// Component failed with an error
    Error,
    /// Component exceeded its time budget
    TimedOut,
    /// Component was aborted externally
    Aborted,
}

impl ExecutionStatus {
    pub const ALL: [ExecutionStatus; 6] = [
        Self::NotYetStarted,
        Self::Running,
        Self::Finished,
        Self::Error,
        Self::TimedOut,
        Self::Aborted,
    ];

    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Finished | Self::Error | Self::TimedOut | Self::Aborted
        )
    }

    /// Check if this is an active state (component is being processed)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Whether a parent association record must exist in this state
    pub fn has_started(&self) -> bool {
        !matches!(self, Self::NotYetStarted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotYetStarted => "not_yet_started",
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Error => "error",
            Self::TimedOut => "timed_out",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExecutionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_yet_started" => Ok(Self::NotYetStarted),
            "running" => Ok(Self::Running),
            "finished" => Ok(Self::Finished),
            "error" => Ok(Self::Error),
            "timed_out" => Ok(Self::TimedOut),
            "aborted" => Ok(Self::Aborted),
            _ => Err(format!("Invalid execution status: {s}")),
        }
    }
}

/// Default state for new components
impl Default for ExecutionStatus {
    fn default() -> Self {
        Self::NotYetStarted
    }
}
