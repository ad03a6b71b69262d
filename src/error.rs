//! Error types for the workload tracker.

use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ComponentRecord, ComponentType};

/// Persistence, schema and configuration failures.
///
/// `Integrity` is the structural error raised whenever a guarded `start`/`end`
/// write touches a row count other than one. It is never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackerError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("Failed to {operation} {table} {uuid}: updated {rows_affected} rows but expected 1")]
    Integrity {
        operation: &'static str,
        table: &'static str,
        uuid: Uuid,
        rows_affected: u64,
    },
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TrackerError {
    pub fn is_integrity(&self) -> bool {
        matches!(self, TrackerError::Integrity { .. })
    }
}

impl From<sqlx::Error> for TrackerError {
    fn from(err: sqlx::Error) -> Self {
        TrackerError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for TrackerError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        TrackerError::Migration(err.to_string())
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::Serialization(format!("JSON serialization error: {err}"))
    }
}

impl From<config::ConfigError> for TrackerError {
    fn from(err: config::ConfigError) -> Self {
        TrackerError::Configuration(err.to_string())
    }
}

/// Failure raised by a dispatched task body.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaskError {
    #[error("{0}")]
    Failed(String),
    #[error("task did not complete within {0:?}")]
    TimedOut(Duration),
    #[error("task panicked: {0}")]
    Panicked(String),
    #[error("task dispatch failed: {0}")]
    Dispatch(String),
}

impl TaskError {
    pub fn failed(message: impl Into<String>) -> Self {
        TaskError::Failed(message.into())
    }
}

impl From<anyhow::Error> for TaskError {
    fn from(err: anyhow::Error) -> Self {
        TaskError::Failed(format!("{err:#}"))
    }
}

/// A task-body failure tagged with the scope it originated in.
///
/// Created once by the task scope and handed up unchanged through every
/// enclosing scope.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{component_type} '{name}' failed: {message}")]
pub struct ScopeFailure {
    pub component_type: ComponentType,
    pub name: String,
    pub uuid: Uuid,
    pub message: String,
    #[source]
    pub cause: TaskError,
}

impl ScopeFailure {
    pub fn new(origin: &ComponentRecord, cause: TaskError) -> Self {
        Self {
            component_type: origin.component_type,
            name: origin.name.clone(),
            uuid: origin.uuid,
            message: cause.to_string(),
            cause,
        }
    }
}

/// Error value returned by scopes and runners.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    #[error(transparent)]
    ScopeFailed(#[from] ScopeFailure),
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

impl ExecutionError {
    /// Message persisted as `error_msg` by the scope identified by `uuid`.
    ///
    /// The originating scope stores the raw task message; ancestors store the
    /// tagged failure.
    pub fn message_for(&self, uuid: Uuid) -> String {
        match self {
            ExecutionError::ScopeFailed(failure) if failure.uuid == uuid => {
                failure.message.clone()
            }
            other => other.to_string(),
        }
    }

    pub fn scope_failure(&self) -> Option<&ScopeFailure> {
        match self {
            ExecutionError::ScopeFailed(failure) => Some(failure),
            ExecutionError::Tracker(_) => None,
        }
    }
}

pub type TrackerResult<T> = std::result::Result<T, TrackerError>;
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;
