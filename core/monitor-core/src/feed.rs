//! Read-side view of all sessions for the display.
//!
//! The display polls [`SessionFeed::list`] about once per second. Each call is a
//! fresh directory scan, so there is no cache to invalidate. Records that have
//! not been updated for longer than the zombie threshold belong to sessions that
//! crashed or were killed without a `SessionEnd`; they are deleted as they are
//! found.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use fs_err as fs;
use serde_json::Value;

use crate::config::MonitorConfig;
use crate::state::store::remove_if_exists;
use crate::state::StateStore;
use crate::types::SessionRecord;

/// What a cleanup pass removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupStats {
    pub sessions_removed: usize,
    pub tombstones_removed: usize,
    pub errors: Vec<String>,
}

impl CleanupStats {
    pub fn total_removed(&self) -> usize {
        self.sessions_removed + self.tombstones_removed
    }
}

#[derive(Debug, Clone)]
pub struct SessionFeed {
    store: StateStore,
    zombie_threshold: Duration,
    tombstone_ttl: Duration,
}

impl SessionFeed {
    pub fn new(store: StateStore, config: &MonitorConfig) -> Self {
        SessionFeed {
            store,
            zombie_threshold: config.zombie_threshold(),
            tombstone_ttl: config.tombstone_ttl(),
        }
    }

    pub fn with_threshold(mut self, zombie_threshold: Duration) -> Self {
        self.zombie_threshold = zombie_threshold;
        self
    }

    pub fn list(&self) -> Vec<SessionRecord> {
        self.list_at(Utc::now())
    }

    /// Live records, active first, then most recently updated first.
    pub fn list_at(&self, now: DateTime<Utc>) -> Vec<SessionRecord> {
        let entries = match self.store.entries() {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to scan sessions directory");
                return Vec::new();
            }
        };

        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            let record = match entry.record {
                Ok(record) => record,
                Err(err) if has_unusable_timestamp(&entry.path) => {
                    tracing::info!(
                        session = %entry.session_id,
                        error = %err,
                        "Reaping session record without a usable last_updated"
                    );
                    if let Err(err) = remove_if_exists(&entry.path) {
                        tracing::warn!(session = %entry.session_id, error = %err, "Failed to reap record");
                    }
                    continue;
                }
                Err(err) => {
                    tracing::debug!(
                        session = %entry.session_id,
                        error = %err,
                        "Skipping unreadable session record"
                    );
                    continue;
                }
            };

            if record.age(now) > self.zombie_threshold {
                tracing::info!(
                    session = %entry.session_id,
                    last_updated = %record.last_updated,
                    "Reaping zombie session"
                );
                if let Err(err) = remove_if_exists(&entry.path) {
                    tracing::warn!(session = %entry.session_id, error = %err, "Failed to reap zombie");
                }
                continue;
            }

            records.push(record);
        }

        self.reap_tombstones(now, &mut CleanupStats::default());
        sort_feed(&mut records);
        records
    }

    pub fn cleanup_older_than(&self, max_age: Duration) -> CleanupStats {
        self.cleanup_older_than_at(max_age, Utc::now())
    }

    /// Removes records older than `max_age` and every unreadable record file.
    pub fn cleanup_older_than_at(&self, max_age: Duration, now: DateTime<Utc>) -> CleanupStats {
        let mut stats = CleanupStats::default();

        let entries = match self.store.entries() {
            Ok(entries) => entries,
            Err(err) => {
                stats.errors.push(err.to_string());
                return stats;
            }
        };

        for entry in entries {
            let expired = match &entry.record {
                Ok(record) => record.age(now) > max_age,
                Err(_) => true,
            };
            if !expired {
                continue;
            }
            match remove_if_exists(&entry.path) {
                Ok(()) => stats.sessions_removed += 1,
                Err(err) => stats
                    .errors
                    .push(format!("{}: {}", entry.session_id, err)),
            }
        }

        self.reap_tombstones(now, &mut stats);
        stats
    }

    fn reap_tombstones(&self, now: DateTime<Utc>, stats: &mut CleanupStats) {
        let tombstones = match self.store.tombstones() {
            Ok(tombstones) => tombstones,
            Err(err) => {
                stats.errors.push(err.to_string());
                return;
            }
        };

        for tombstone in tombstones {
            let expired = tombstone
                .ended_at
                .map_or(true, |ended_at| now >= ended_at + self.tombstone_ttl);
            if !expired {
                continue;
            }
            match remove_if_exists(&tombstone.path) {
                Ok(()) => stats.tombstones_removed += 1,
                Err(err) => stats
                    .errors
                    .push(format!("{}: {}", tombstone.session_id, err)),
            }
        }
    }
}

/// True for a well-formed JSON object whose `last_updated` is missing or not a
/// timestamp; the feed treats it as infinitely old. Truncated or non-JSON files
/// are left for cleanup.
fn has_unusable_timestamp(path: &Path) -> bool {
    let Ok(content) = fs::read_to_string(path) else {
        return false;
    };
    let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(&content) else {
        return false;
    };
    match fields.get("last_updated") {
        Some(value) => serde_json::from_value::<DateTime<Utc>>(value.clone()).is_err(),
        None => true,
    }
}

/// Single stable sort: active before ended, then newest first.
pub fn sort_feed(records: &mut [SessionRecord]) {
    records.sort_by(|a, b| {
        b.is_active()
            .cmp(&a.is_active())
            .then_with(|| b.last_updated.cmp(&a.last_updated))
    });
}
