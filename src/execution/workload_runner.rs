use std::time::Duration;
use tracing::debug;

use super::host::HostPool;
use super::runnable::Runnable;
use crate::config::TrackerConfig;
use crate::error::TaskError;

/// Dispatches one task to a random host and blocks until it completes.
#[derive(Debug, Clone, Default)]
pub struct WorkloadRunner {
    hosts: HostPool,
    wait_timeout: Duration,
}

impl WorkloadRunner {
    /// `wait_timeout` of zero waits indefinitely
    pub fn new(hosts: HostPool, wait_timeout: Duration) -> Self {
        Self {
            hosts,
            wait_timeout,
        }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(
            HostPool::from_config(config),
            config.runtime.task_wait_timeout(),
        )
    }

    pub fn hosts(&self) -> &HostPool {
        &self.hosts
    }

    pub fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }

    pub async fn run_and_wait(&self, task: &mut dyn Runnable) -> Result<(), TaskError> {
        let host = self.hosts.choose();
        debug!(
            host = host.map(|h| h.name.as_str()),
            timeout = ?self.wait_timeout,
            "Dispatching task"
        );

        task.run(host).await?;
        task.wait(self.wait_timeout).await
    }
}
