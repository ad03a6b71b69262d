#![allow(clippy::doc_markdown)] // Allow technical terms like SQLite, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Workload Tracker
//!
//! Hierarchical execution tracker for benchmark workloads.
//!
//! ## Overview
//!
//! A benchmark run is a tree: a **workload** holds ordered **phases**, each phase
//! holds ordered **sessions**, and each session holds ordered **tasks**. Every
//! node passes through the same lifecycle (`NOT_YET_STARTED -> RUNNING ->
//! terminal`) and is persisted to an embedded SQLite store, together with the
//! parent -> child edge that records where it ran.
//!
//! ## Architecture
//!
//! - [`persistence`] owns all durable state. One generic `create`/`start`/`end`
//!   implementation serves all four levels, and every transition write is
//!   guarded by a row-count integrity check.
//! - [`execution`] wraps each level in an [`ExecutionScope`] and walks a
//!   [`WorkloadDefinition`] depth first, failing fast on the first error.
//! - [`reporting`] receives step events for observability only.
//!
//! ## Module Organization
//!
//! - [`models`] - component records, kinds and task types
//! - [`state_machine`] - status vocabulary and transition guards
//! - [`database`] - pool construction and embedded migrations
//! - [`persistence`] - the persistence handler
//! - [`execution`] - scopes, runners, hosts and runnable tasks
//! - [`reporting`] - reporter trait and implementations
//! - [`config`] - layered configuration
//! - [`logging`] - structured logging setup
//! - [`error`] - structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use workload_tracker::config::HostConfig;
//! use workload_tracker::execution::{
//!     BenchmarkTask, ExperimentRunner, HostPool, PhaseDefinition, SessionDefinition,
//!     SpawnedJob, WorkloadDefinition, WorkloadRunner,
//! };
//! use workload_tracker::persistence::PersistenceHandler;
//! use workload_tracker::reporting::TracingReporter;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let handler = PersistenceHandler::in_memory().await?;
//! let hosts = HostPool::new(vec![HostConfig::new("client-1", "10.0.0.11")]);
//! let runner = ExperimentRunner::new(
//!     handler,
//!     Arc::new(TracingReporter::new()),
//!     WorkloadRunner::new(hosts, std::time::Duration::ZERO),
//! );
//!
//! let load = SpawnedJob::new("lineitem", |_host: Option<HostConfig>| async { Ok(()) });
//! let definition = WorkloadDefinition::new("tpch-sf1").phase(
//!     PhaseDefinition::new("load")
//!         .session(SessionDefinition::new("loader").task(BenchmarkTask::Load(load))),
//! );
//!
//! let workload = runner.run(definition).await?;
//! println!("workload {} finished", workload.record.uuid);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod execution;
pub mod logging;
pub mod models;
pub mod persistence;
pub mod reporting;
pub mod state_machine;

pub use config::{DatabaseConfig, HostConfig, RuntimeConfig, TrackerConfig};
pub use error::{
    ExecutionError, ExecutionResult, ScopeFailure, TaskError, TrackerError, TrackerResult,
};
pub use execution::{
    BenchmarkTask, ExecutionScope, ExperimentRunner, HostPool, PhaseDefinition, Runnable,
    SessionDefinition, SpawnedJob, TaskEntry, TaskShape, WorkloadDefinition, WorkloadRunner,
};
pub use models::{
    AssociationRecord, Component, ComponentRecord, ComponentType, Metadata, Phase, Session, Task,
    TaskType, Workload,
};
pub use persistence::PersistenceHandler;
pub use reporting::{NoopReporter, Reporter, TracingReporter};
pub use state_machine::ExecutionStatus;
