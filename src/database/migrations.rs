//! # Schema Migrations
//!
//! The workload schema is embedded at compile time from `migrations/` and applied
//! through sqlx's migrator, which records applied versions in
//! `_sqlx_migrations`. Running it again against an up-to-date store is a no-op.

use sqlx::migrate::Migrator;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::TrackerResult;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub struct DatabaseMigrations;

impl DatabaseMigrations {
    /// Apply every outstanding migration
    pub async fn run_all(pool: &SqlitePool) -> TrackerResult<()> {
        MIGRATOR.run(pool).await?;
        info!(
            migrations = MIGRATOR.iter().count(),
            "Workload schema is up to date"
        );
        Ok(())
    }
}
