//! `claude-monitor hook`: process one notification from stdin.
//!
//! Claude Code runs this once per hook event with the event JSON on stdin.
//! Processing is synchronous and finishes before the process exits; there is
//! no daemon and nothing is spawned.

use std::io::{self, Read};

use chrono::Utc;
use monitor_core::{
    load_config_or_default, Change, DropReason, MonitorError, Outcome, Pipeline, SkipReason,
    StateStore, StorageConfig,
};

pub fn run(storage: &StorageConfig) -> Result<(), MonitorError> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .map_err(|err| MonitorError::Io {
            context: "Failed to read stdin".to_string(),
            source: err,
        })?;

    handle_payload(storage, &input).map(|_| ())
}

/// Handles a raw payload against `storage`. Empty input is ignored.
pub fn handle_payload(storage: &StorageConfig, payload: &str) -> Result<Option<Outcome>, MonitorError> {
    if payload.trim().is_empty() {
        return Ok(None);
    }

    let config = load_config_or_default(storage);
    let pipeline = Pipeline::new(StateStore::from_storage(storage), &config);
    let outcome = pipeline.handle_raw(payload, Utc::now())?;
    log_outcome(&outcome);
    Ok(Some(outcome))
}

fn log_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Applied(Change::Upserted(record)) => tracing::info!(
            session = %record.session_id,
            status = %record.status,
            tool = ?record.tool_name,
            "Session updated"
        ),
        Outcome::Applied(Change::Removed) => tracing::info!("Session removed"),
        Outcome::Skipped(SkipReason::Suppressed(reason)) => {
            tracing::debug!(reason = %reason, "Skipped suppressed transition")
        }
        Outcome::Dropped(DropReason::Malformed(err)) => {
            tracing::debug!(error = %err, "Dropped malformed hook payload")
        }
        other => tracing::debug!(outcome = other.label(), "Hook event skipped"),
    }
}
