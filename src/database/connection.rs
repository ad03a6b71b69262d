use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::debug;

use crate::config::DatabaseConfig;
use crate::error::TrackerResult;

/// Build a connection pool for the embedded store.
///
/// An in-memory database only lives as long as its connection, so memory urls
/// get a single connection that is never reaped. Each call yields an
/// independent store.
pub async fn create_pool(config: &DatabaseConfig) -> TrackerResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(config.busy_timeout());

    let pool_options = if config.is_in_memory() {
        SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(config.max_connections)
    };

    let pool = pool_options.connect_with(options).await?;

    debug!(
        url = %config.url,
        in_memory = config.is_in_memory(),
        "Opened workload store"
    );

    Ok(pool)
}

pub async fn health_check(pool: &SqlitePool) -> TrackerResult<bool> {
    let row = sqlx::query("SELECT 1 AS health").fetch_one(pool).await?;
    let health: i64 = row.try_get("health")?;
    Ok(health == 1)
}
