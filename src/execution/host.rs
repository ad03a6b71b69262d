use crate::config::{HostConfig, TrackerConfig};

/// Hosts a task may be dispatched to, chosen uniformly at random.
#[derive(Debug, Clone, Default)]
pub struct HostPool {
    hosts: Vec<HostConfig>,
}

impl HostPool {
    pub fn new(hosts: Vec<HostConfig>) -> Self {
        Self { hosts }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(config.hosts.clone())
    }

    /// Pick a host, or `None` when the pool is empty
    pub fn choose(&self) -> Option<&HostConfig> {
        if self.hosts.is_empty() {
            return None;
        }
        self.hosts.get(fastrand::usize(..self.hosts.len()))
    }

    /// Same as [`choose`](Self::choose) with a caller-owned generator
    pub fn choose_with(&self, rng: &mut fastrand::Rng) -> Option<&HostConfig> {
        if self.hosts.is_empty() {
            return None;
        }
        self.hosts.get(rng.usize(..self.hosts.len()))
    }

    pub fn hosts(&self) -> &[HostConfig] {
        &self.hosts
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}
