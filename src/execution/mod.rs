//! # Workload Execution
//!
//! Drives a declarative workload definition through the hierarchy of
//! execution scopes. The driver is strictly sequential: each scope is awaited
//! to completion before its next sibling is opened.

pub mod definition;
pub mod experiment_runner;
pub mod host;
pub mod runnable;
pub mod scope;
pub mod workload_runner;

pub use definition::{PhaseDefinition, SessionDefinition, TaskEntry, WorkloadDefinition};
pub use experiment_runner::ExperimentRunner;
pub use host::HostPool;
pub use runnable::{BenchmarkTask, Runnable, SpawnedJob, TaskJob, TaskShape};
pub use scope::{ExecutionScope, ScopeContext};
pub use workload_runner::WorkloadRunner;
