//! File logging for the hook binary.
//!
//! Hooks run with stdout/stderr owned by Claude Code, so logs go to a daily
//! rolling file under `<root>/logs/`. Filter resolution:
//!
//! 1. `CLAUDE_MONITOR_DEBUG_LOG=1` forces `debug`
//! 2. `CLAUDE_MONITOR_LOG`, then `RUST_LOG`
//! 3. `info`

use std::env;

use monitor_core::StorageConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "hook.log";
const LOG_ENV: &str = "CLAUDE_MONITOR_LOG";
const DEBUG_ENV: &str = "CLAUDE_MONITOR_DEBUG_LOG";

/// Installs the global subscriber. The returned guard must live until exit so
/// buffered lines are flushed. Returns `None` if logging could not be set up;
/// the hook still runs.
pub fn init(storage: &StorageConfig) -> Option<WorkerGuard> {
    let logs_dir = storage.logs_dir();
    fs_err::create_dir_all(&logs_dir).ok()?;

    let appender = tracing_appender::rolling::daily(&logs_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .try_init();

    match installed {
        Ok(()) => Some(guard),
        Err(_) => None,
    }
}

fn filter() -> EnvFilter {
    if debug_enabled(env::var(DEBUG_ENV).ok().as_deref()) {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn debug_enabled(value: Option<&str>) -> bool {
    matches!(value, Some("1" | "true" | "TRUE" | "yes" | "YES"))
}
