//! # Runnable Tasks
//!
//! The driver only knows two things about a task: how to dispatch it to a host
//! (`run`) and how to block until it is done (`wait`). Benchmark task shapes are
//! variants of [`BenchmarkTask`], each carrying the job it spawns.

use async_trait::async_trait;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::HostConfig;
use crate::error::TaskError;
use crate::models::TaskType;

/// Capability interface for anything the workload runner can dispatch.
#[async_trait]
pub trait Runnable: Send {
    /// Dispatch the task; may return before the work is done
    async fn run(&mut self, host: Option<&HostConfig>) -> Result<(), TaskError>;

    /// Block until the task completes. `Duration::ZERO` means wait indefinitely.
    async fn wait(&mut self, timeout: Duration) -> Result<(), TaskError>;
}

/// What a task reports about itself when it is tracked.
///
/// The persisted task type and the default task name both come from here, so
/// they always describe the task that actually runs.
pub trait TaskShape {
    fn task_type(&self) -> TaskType;

    /// Short label used in default task names; the type name unless overridden
    fn label(&self) -> String {
        short_type_name(std::any::type_name::<Self>())
    }
}

pub(crate) fn short_type_name(full: &str) -> String {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// Body of a spawned task
#[async_trait]
pub trait TaskJob: Send + Sync {
    async fn execute(&self, host: Option<HostConfig>) -> Result<(), TaskError>;
}

#[async_trait]
impl<F, Fut> TaskJob for F
where
    F: Fn(Option<HostConfig>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    async fn execute(&self, host: Option<HostConfig>) -> Result<(), TaskError> {
        (self)(host).await
    }
}

/// A job that runs on its own tokio task between `run` and `wait`.
pub struct SpawnedJob {
    label: String,
    job: Arc<dyn TaskJob>,
    handle: Option<JoinHandle<Result<(), TaskError>>>,
}

impl SpawnedJob {
    pub fn new<F, Fut>(label: impl Into<String>, job: F) -> Self
    where
        F: Fn(Option<HostConfig>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        Self::from_job(label, job)
    }

    pub fn from_job(label: impl Into<String>, job: impl TaskJob + 'static) -> Self {
        Self {
            label: label.into(),
            job: Arc::new(job),
            handle: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_dispatched(&self) -> bool {
        self.handle.is_some()
    }

    fn dispatch(&mut self, host: Option<&HostConfig>) -> Result<(), TaskError> {
        if self.handle.is_some() {
            return Err(TaskError::Dispatch(format!(
                "job '{}' is already running",
                self.label
            )));
        }

        let job = Arc::clone(&self.job);
        let host = host.cloned();
        debug!(job = %self.label, host = ?host.as_ref().map(|h| &h.name), "Spawning job");
        self.handle = Some(tokio::spawn(async move { job.execute(host).await }));
        Ok(())
    }

    async fn join(&mut self, timeout: Duration) -> Result<(), TaskError> {
        let Some(handle) = self.handle.as_mut() else {
            return Ok(());
        };

        let joined = if timeout.is_zero() {
            handle.await
        } else {
            match tokio::time::timeout(timeout, &mut *handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    // No cancellation: the job keeps running detached.
                    warn!(job = %self.label, ?timeout, "Job did not finish in time");
                    return Err(TaskError::TimedOut(timeout));
                }
            }
        };
        self.handle = None;

        match joined {
            Ok(result) => result,
            Err(err) if err.is_panic() => Err(TaskError::Panicked(panic_message(err.into_panic()))),
            Err(err) => Err(TaskError::Failed(err.to_string())),
        }
    }
}

impl fmt::Debug for SpawnedJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnedJob")
            .field("label", &self.label)
            .field("dispatched", &self.handle.is_some())
            .finish()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Benchmark task shapes, each carrying the job it runs
#[derive(Debug)]
pub enum BenchmarkTask {
    Load(SpawnedJob),
    SingleUser(SpawnedJob),
    DataMaintenance(SpawnedJob),
    Optimize(SpawnedJob),
}

impl BenchmarkTask {
    pub fn job(&self) -> &SpawnedJob {
        match self {
            Self::Load(job)
            | Self::SingleUser(job)
            | Self::DataMaintenance(job)
            | Self::Optimize(job) => job,
        }
    }

    fn job_mut(&mut self) -> &mut SpawnedJob {
        match self {
            Self::Load(job)
            | Self::SingleUser(job)
            | Self::DataMaintenance(job)
            | Self::Optimize(job) => job,
        }
    }
}

impl TaskShape for BenchmarkTask {
    fn task_type(&self) -> TaskType {
        match self {
            Self::Load(_) => TaskType::Load,
            Self::SingleUser(_) => TaskType::SingleUser,
            Self::DataMaintenance(_) => TaskType::DataMaintenance,
            Self::Optimize(_) => TaskType::Optimize,
        }
    }

    fn label(&self) -> String {
        self.job().label().to_string()
    }
}

#[async_trait]
impl Runnable for BenchmarkTask {
    async fn run(&mut self, host: Option<&HostConfig>) -> Result<(), TaskError> {
        self.job_mut().dispatch(host)
    }

    async fn wait(&mut self, timeout: Duration) -> Result<(), TaskError> {
        self.job_mut().join(timeout).await
    }
}
