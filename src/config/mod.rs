//! # Tracker Configuration
//!
//! Layered configuration for the execution tracker: compiled defaults, an optional
//! YAML/TOML/JSON file and `TRACKER__`-prefixed environment variables, merged with
//! the `config` crate and validated before use.
//!
//! ```rust,no_run
//! use workload_tracker::config::TrackerConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TrackerConfig::load(Some("config/tracker.yaml"))?;
//! println!("store: {}", config.database.url);
//! # Ok(())
//! # }
//! ```

pub mod loader;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::{TrackerError, TrackerResult};

pub use loader::ENV_PREFIX;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TrackerConfig {
    pub database: DatabaseConfig,
    pub runtime: RuntimeConfig,
    pub hosts: Vec<HostConfig>,
}

/// Embedded store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite connection url, e.g. `sqlite://tracker.db` or `sqlite::memory:`
    pub url: String,
    pub max_connections: u32,
    pub busy_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 4,
            busy_timeout_seconds: 30,
        }
    }
}

impl DatabaseConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Number of tasks the driver may run at once; only sequential (1) is supported
    pub with_concurrency: u32,
    /// Timeout handed to `Runnable::wait`; 0 disables enforcement
    pub task_wait_timeout_seconds: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            with_concurrency: 1,
            task_wait_timeout_seconds: 0,
        }
    }
}

impl RuntimeConfig {
    pub fn task_wait_timeout(&self) -> Duration {
        Duration::from_secs(self.task_wait_timeout_seconds)
    }
}

/// An addressable machine tasks can be dispatched to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    pub name: String,
    pub private_ip: String,
    #[serde(default)]
    pub public_ip: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl HostConfig {
    pub fn new(name: impl Into<String>, private_ip: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            private_ip: private_ip.into(),
            public_ip: None,
            port: None,
            tags: BTreeMap::new(),
        }
    }

    /// `ip[:port]` of the host's private interface
    pub fn address(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{port}", self.private_ip),
            None => self.private_ip.clone(),
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> TrackerResult<()> {
        if self.database.url.trim().is_empty() {
            return Err(TrackerError::Configuration(
                "database.url must not be empty".to_string(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(TrackerError::Configuration(
                "database.max_connections must be at least 1".to_string(),
            ));
        }

        if self.runtime.with_concurrency != 1 {
            return Err(TrackerError::Configuration(format!(
                "runtime.with_concurrency={} is not supported; tasks run sequentially",
                self.runtime.with_concurrency
            )));
        }

        for host in &self.hosts {
            if host.private_ip.trim().is_empty() {
                return Err(TrackerError::Configuration(format!(
                    "host '{}' has no private_ip",
                    host.name
                )));
            }
        }

        Ok(())
    }
}
