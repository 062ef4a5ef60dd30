use crate::config::EtlConfig;
use crate::constants::TRACING_LOG_DIR;
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log directory for a config load attempt; a failed load still gets the
/// default directory so the failure itself is recorded.
pub fn resolve_log_dir(config: &Result<EtlConfig>) -> PathBuf {
    match config {
        Ok(config) => config.tracing_log_dir.clone(),
        Err(_) => PathBuf::from(TRACING_LOG_DIR),
    }
}

/// Initializes tracing with a JSON file layer (daily rotation under `log_dir`)
/// and a console layer on stderr. Stdout is left to the query report.
///
/// The returned guard must be held until exit so buffered lines are flushed.
pub fn init_logging(log_dir: &Path) -> WorkerGuard {
    let _ = fs::create_dir_all(log_dir);

    let file_appender = tracing_appender::rolling::daily(log_dir, "banks_etl.log");
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);
    let console_layer = fmt::layer().with_writer(std::io::stderr);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("banks_etl=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    guard
}
