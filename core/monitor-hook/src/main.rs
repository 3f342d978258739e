//! claude-monitor: hook handler and session feed for Claude Code.
//!
//! Called directly by Claude Code hooks configured in ~/.claude/settings.json.
//! Each invocation is a short-lived process; all state lives on disk.
//!
//! ## Subcommands
//!
//! - `hook`: Process one hook event (reads JSON from stdin)
//! - `usage-hook`: Refresh the account usage snapshot
//! - `list`: Print the current session feed
//! - `cleanup`: Remove old and unreadable session records

mod display;
mod handle;
mod logging;
mod usage;

use std::process::ExitCode;

use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use monitor_core::{load_config_or_default, SessionFeed, StateStore, StorageConfig};

#[derive(Parser)]
#[command(name = "claude-monitor")]
#[command(about = "Live status for running Claude Code sessions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle a hook event (reads JSON from stdin)
    Hook,

    /// Fetch usage metrics and write them to usage.json
    UsageHook,

    /// Print the session feed once
    List {
        /// Print records as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Remove session records older than the given age
    Cleanup {
        /// Maximum record age in hours
        #[arg(long, default_value_t = 1.0)]
        max_age_hours: f64,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let storage = match StorageConfig::from_env() {
        Ok(storage) => storage,
        Err(err) => {
            // Nowhere to log yet. Hooks still exit cleanly.
            return match cli.command {
                Commands::Hook | Commands::UsageHook => ExitCode::SUCCESS,
                _ => {
                    eprintln!("claude-monitor: {err}");
                    ExitCode::FAILURE
                }
            };
        }
    };
    let _logging_guard = logging::init(&storage);

    match cli.command {
        Commands::Hook => {
            // Hooks must never disrupt Claude Code: log and exit 0
            if let Err(e) = handle::run(&storage) {
                tracing::warn!(error = %e, "claude-monitor hook failed");
            }
            ExitCode::SUCCESS
        }
        Commands::UsageHook => {
            let config = load_config_or_default(&storage);
            if let Err(e) = usage::run(&storage, &config.usage) {
                tracing::warn!(error = %e, "claude-monitor usage-hook failed");
            }
            ExitCode::SUCCESS
        }
        Commands::List { json } => {
            let config = load_config_or_default(&storage);
            let feed = SessionFeed::new(StateStore::from_storage(&storage), &config);
            let records = feed.list();
            if json {
                match serde_json::to_string_pretty(&records) {
                    Ok(text) => println!("{text}"),
                    Err(e) => {
                        eprintln!("claude-monitor: failed to serialize feed: {e}");
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                print!("{}", display::render(&records, Utc::now()));
            }
            ExitCode::SUCCESS
        }
        Commands::Cleanup { max_age_hours } => {
            let Some(max_age) = max_age_from_hours(max_age_hours) else {
                eprintln!("claude-monitor: invalid --max-age-hours {max_age_hours}");
                return ExitCode::FAILURE;
            };
            let config = load_config_or_default(&storage);
            let feed = SessionFeed::new(StateStore::from_storage(&storage), &config);
            let stats = feed.cleanup_older_than(max_age);
            tracing::info!(
                sessions = stats.sessions_removed,
                tombstones = stats.tombstones_removed,
                errors = stats.errors.len(),
                "Cleanup finished"
            );
            println!(
                "Removed {} session(s), {} tombstone(s)",
                stats.sessions_removed, stats.tombstones_removed
            );
            for error in &stats.errors {
                eprintln!("claude-monitor: {error}");
            }
            if stats.errors.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

/// Converts a CLI hour count to a duration. Rejects NaN, negative and
/// out-of-range values instead of letting the conversion panic.
fn max_age_from_hours(hours: f64) -> Option<Duration> {
    if !hours.is_finite() || hours < 0.0 {
        return None;
    }
    let secs = hours * 3600.0;
    if secs >= i64::MAX as f64 {
        return None;
    }
    Duration::try_seconds(secs as i64)
}
