//! # Component Kind Descriptor
//!
//! `ComponentType` is both the persisted discriminator tag and the descriptor the
//! persistence handler dispatches on: it names the entity table, the parent kind
//! and the association table that records the parent -> child edge.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Parent -> child association table for one level of the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssociationTable {
    pub table: &'static str,
    pub parent_column: &'static str,
    pub child_column: &'static str,
}

/// Discriminator for the four levels of a workload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    Task,
    Session,
    Phase,
    Workload,
}

impl ComponentType {
    pub const ALL: [ComponentType; 4] = [Self::Workload, Self::Phase, Self::Session, Self::Task];

    /// Entity table holding rows of this kind
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Task => "base_task",
            Self::Session => "session",
            Self::Phase => "phase",
            Self::Workload => "workload",
        }
    }

    /// Kind of the enclosing component, `None` for the workload
    pub fn parent(&self) -> Option<ComponentType> {
        match self {
            Self::Task => Some(Self::Session),
            Self::Session => Some(Self::Phase),
            Self::Phase => Some(Self::Workload),
            Self::Workload => None,
        }
    }

    /// Kind of the components this one contains, `None` for tasks
    pub fn child(&self) -> Option<ComponentType> {
        match self {
            Self::Workload => Some(Self::Phase),
            Self::Phase => Some(Self::Session),
            Self::Session => Some(Self::Task),
            Self::Task => None,
        }
    }

    /// Table recording the edge from the parent to a component of this kind
    pub fn association(&self) -> Option<AssociationTable> {
        match self {
            Self::Task => Some(AssociationTable {
                table: "session_tasks",
                parent_column: "session_uuid",
                child_column: "task_uuid",
            }),
            Self::Session => Some(AssociationTable {
                table: "phase_sessions",
                parent_column: "phase_uuid",
                child_column: "session_uuid",
            }),
            Self::Phase => Some(AssociationTable {
                table: "workload_phases",
                parent_column: "workload_uuid",
                child_column: "phase_uuid",
            }),
            Self::Workload => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Session => "session",
            Self::Phase => "phase",
            Self::Workload => "workload",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ComponentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "task" => Ok(Self::Task),
            "session" => Ok(Self::Session),
            "phase" => Ok(Self::Phase),
            "workload" => Ok(Self::Workload),
            _ => Err(format!("Invalid component type: {s}")),
        }
    }
}
