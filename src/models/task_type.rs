use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape of work a benchmark task performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Initial data load
    Load,
    /// Single-user query stream
    SingleUser,
    /// Inserts, updates and deletes against loaded data
    DataMaintenance,
    /// Table maintenance such as compaction or statistics refresh
    Optimize,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::SingleUser => "single_user",
            Self::DataMaintenance => "data_maintenance",
            Self::Optimize => "optimize",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "load" => Ok(Self::Load),
            "single_user" => Ok(Self::SingleUser),
            "data_maintenance" => Ok(Self::DataMaintenance),
            "optimize" => Ok(Self::Optimize),
            _ => Err(format!("Invalid task type: {s}")),
        }
    }
}
