//! # Structured Logging Module
//!
//! Environment-aware structured logging that outputs to both console and a JSON
//! log file, plus helpers that give scope and store operations a consistent set
//! of fields.

use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use uuid::Uuid;

use crate::models::ComponentType;
use crate::state_machine::ExecutionStatus;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);

        let console_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_level(true)
            .with_ansi(true)
            .with_filter(EnvFilter::new(log_level));

        let log_dir = PathBuf::from("log");
        if let Err(err) = fs::create_dir_all(&log_dir) {
            // No file output without a log directory; console logging still works.
            let _ = tracing_subscriber::registry().with(console_layer).try_init();
            tracing::warn!(error = %err, "Could not create log directory, logging to console only");
            return;
        }

        let pid = process::id();
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        let log_filename = format!("{environment}.{pid}.{timestamp}.log");
        let log_path = log_dir.join(&log_filename);

        let file_appender = tracing_appender::rolling::never(&log_dir, log_filename);
        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

        let subscriber = tracing_subscriber::registry().with(console_layer).with(
            fmt::layer()
                .with_writer(file_writer)
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .with_filter(EnvFilter::new(log_level)),
        );

        // Another global subscriber (e.g. from a test harness) may already be set.
        if subscriber.try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = pid,
            environment = %environment,
            log_file = %log_path.display(),
            "Structured logging initialized"
        );

        // The writer stops flushing once the guard drops.
        std::mem::forget(guard);
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("TRACKER_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Log a lifecycle transition of a workload component
pub fn log_scope_transition(
    component_type: ComponentType,
    name: &str,
    uuid: Uuid,
    status: ExecutionStatus,
    details: Option<&str>,
) {
    tracing::info!(
        component_type = %component_type,
        name = %name,
        uuid = %uuid,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "SCOPE_TRANSITION"
    );
}

/// Log structured data for store writes
pub fn log_database_operation(
    operation: &str,
    table: &str,
    uuid: Uuid,
    status: ExecutionStatus,
    rows_affected: Option<u64>,
) {
    tracing::debug!(
        operation = %operation,
        table = %table,
        uuid = %uuid,
        status = %status,
        rows_affected = rows_affected,
        timestamp = %Utc::now().to_rfc3339(),
        "DATABASE_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "ERROR"
    );
}
