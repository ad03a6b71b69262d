//! Configuration Loader
//!
//! Merges defaults, an optional config file and environment overrides.

use std::path::Path;
use tracing::debug;

use super::TrackerConfig;
use crate::error::TrackerResult;

/// Prefix for environment overrides, e.g. `TRACKER__DATABASE__URL`
pub const ENV_PREFIX: &str = "TRACKER";

impl TrackerConfig {
    /// Load configuration from an optional file plus `TRACKER__*` environment variables
    pub fn load(path: Option<impl AsRef<Path>>) -> TrackerResult<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    /// Load configuration from defaults and environment variables only
    pub fn from_env() -> TrackerResult<Self> {
        Self::load(None::<&Path>)
    }

    pub(crate) fn load_with_prefix(
        path: Option<impl AsRef<Path>>,
        env_prefix: &str,
    ) -> TrackerResult<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            let path = path.as_ref();
            debug!(path = %path.display(), "Loading tracker configuration file");
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(env_prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: TrackerConfig = settings.try_deserialize()?;
        config.validate()?;

        debug!(
            database_url = %config.database.url,
            hosts = config.hosts.len(),
            "Tracker configuration loaded"
        );

        Ok(config)
    }
}
