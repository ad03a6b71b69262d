//! Shared helpers for integration tests.
#![allow(dead_code)]

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use workload_tracker::config::HostConfig;
use workload_tracker::error::TaskError;
use workload_tracker::execution::{
    BenchmarkTask, ExperimentRunner, HostPool, SpawnedJob, TaskEntry, WorkloadRunner,
};
use workload_tracker::persistence::PersistenceHandler;
use workload_tracker::reporting::RecordingReporter;

/// Hosts each job saw, in dispatch order
pub type HostTrace = Arc<Mutex<Vec<Option<String>>>>;

pub fn unique_name(prefix: &str) -> String {
    format!("{prefix}_{}", &uuid::Uuid::new_v4().simple().to_string()[..8])
}

pub async fn runner_with(hosts: HostPool, timeout: Duration) -> (ExperimentRunner, Arc<RecordingReporter>) {
    let handler = PersistenceHandler::in_memory()
        .await
        .expect("in-memory store");
    let reporter = Arc::new(RecordingReporter::new());
    let runner = ExperimentRunner::new(
        handler,
        reporter.clone(),
        WorkloadRunner::new(hosts, timeout),
    );
    (runner, reporter)
}

pub async fn test_runner() -> (ExperimentRunner, Arc<RecordingReporter>) {
    runner_with(HostPool::default(), Duration::ZERO).await
}

pub fn hosts(names: &[&str]) -> HostPool {
    HostPool::new(
        names
            .iter()
            .enumerate()
            .map(|(i, name)| HostConfig::new(*name, format!("10.0.0.{}", i + 1)))
            .collect(),
    )
}

/// Load task that sleeps briefly so consecutive tasks get distinct timestamps
pub fn ok_task(name: &str) -> TaskEntry {
    let job = SpawnedJob::new(name, |_host: Option<HostConfig>| async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok(())
    });
    TaskEntry::from(BenchmarkTask::Load(job)).named(name)
}

pub fn failing_task(name: &str, message: &'static str) -> TaskEntry {
    let job = SpawnedJob::new(name, move |_host: Option<HostConfig>| async move {
        Err(TaskError::failed(message))
    });
    TaskEntry::from(BenchmarkTask::SingleUser(job)).named(name)
}

pub fn slow_task(name: &str, duration: Duration) -> TaskEntry {
    let job = SpawnedJob::new(name, move |_host: Option<HostConfig>| async move {
        tokio::time::sleep(duration).await;
        Ok(())
    });
    TaskEntry::from(BenchmarkTask::DataMaintenance(job)).named(name)
}

pub fn host_recording_task(name: &str, trace: &HostTrace) -> TaskEntry {
    let trace = Arc::clone(trace);
    let job = SpawnedJob::new(name, move |host: Option<HostConfig>| {
        let trace = Arc::clone(&trace);
        async move {
            trace.lock().push(host.map(|h| h.name));
            Ok(())
        }
    });
    TaskEntry::from(BenchmarkTask::Optimize(job)).named(name)
}
