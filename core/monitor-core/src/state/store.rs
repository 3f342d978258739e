//! File-backed session state persistence.
//!
//! One file per session under `sessions/`, named by session id. Every hook process
//! is a writer, so the store never holds state in memory between calls: each
//! operation goes straight to disk.
//!
//! # Anti-regression
//!
//! [`StateStore::save`] re-reads the file it is about to replace. If the record on
//! disk is newer than the incoming one, the write is skipped. Hooks are delivered
//! asynchronously, so a slow `PreToolUse` process must not clobber the `Stop`
//! written after it.
//!
//! # Defensive Design
//!
//! - Missing files read as "no record"
//! - Corrupt JSON reads as "no record" (logged at debug)
//! - Writes go through [`write_atomic`], so readers never see partial records
//!
//! # Tombstones
//!
//! When a session ends its record is deleted and `<session_id>.ended` is written.
//! The pipeline uses it to ignore notifications that arrive after the end.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs_err as fs;
use serde::{Deserialize, Serialize};

use crate::atomic::write_atomic;
use crate::error::{MonitorError, Result};
use crate::storage::StorageConfig;
use crate::types::SessionRecord;

const RECORD_EXTENSION: &str = "json";
const TOMBSTONE_EXTENSION: &str = "ended";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Written,
    /// The record on disk was newer; nothing was written.
    Stale { on_disk: DateTime<Utc> },
}

/// A record file found while scanning the sessions directory.
#[derive(Debug)]
pub struct StoredEntry {
    pub session_id: String,
    pub path: PathBuf,
    pub record: Result<SessionRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Tombstone {
    session_id: String,
    ended_at: DateTime<Utc>,
}

/// A tombstone file found while scanning. `ended_at` is `None` when unreadable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTombstone {
    pub session_id: String,
    pub path: PathBuf,
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: &Path) -> Self {
        StateStore {
            dir: dir.to_path_buf(),
        }
    }

    pub fn from_storage(storage: &StorageConfig) -> Self {
        StateStore::new(&storage.sessions_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record_path(&self, session_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", session_id, RECORD_EXTENSION))
    }

    fn tombstone_path(&self, session_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", session_id, TOMBSTONE_EXTENSION))
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|err| MonitorError::io("Failed to create sessions directory", err))
    }

    /// Current record for a session, or `None` if missing or unreadable.
    pub fn load(&self, session_id: &str) -> Option<SessionRecord> {
        let path = self.record_path(session_id);
        match read_record(&path, session_id) {
            Ok(record) => Some(record),
            Err(MonitorError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                tracing::debug!(
                    session = %session_id,
                    error = %err,
                    "Unreadable session record, treating as absent"
                );
                None
            }
        }
    }

    /// Persists `record` unless the record on disk is newer.
    pub fn save(&self, record: &SessionRecord) -> Result<SaveOutcome> {
        self.ensure_dir()?;
        let path = self.record_path(&record.session_id);

        if let Ok(existing) = read_record(&path, &record.session_id) {
            if existing.last_updated > record.last_updated {
                return Ok(SaveOutcome::Stale {
                    on_disk: existing.last_updated,
                });
            }
        }

        let content = serde_json::to_vec(record)
            .map_err(|err| MonitorError::json("Failed to serialize session record", err))?;
        write_atomic(&path, &content)?;
        Ok(SaveOutcome::Written)
    }

    /// Deletes a session's record. A missing record is not an error.
    pub fn remove(&self, session_id: &str) -> Result<()> {
        remove_if_exists(&self.record_path(session_id))
    }

    /// Every record file in the directory, parsed or not.
    pub fn entries(&self) -> Result<Vec<StoredEntry>> {
        let mut entries = Vec::new();
        for (session_id, path) in self.scan(RECORD_EXTENSION)? {
            let record = read_record(&path, &session_id);
            entries.push(StoredEntry {
                session_id,
                path,
                record,
            });
        }
        Ok(entries)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tombstones
    // ─────────────────────────────────────────────────────────────────────────

    pub fn mark_ended(&self, session_id: &str, ended_at: DateTime<Utc>) -> Result<()> {
        let tombstone = Tombstone {
            session_id: session_id.to_string(),
            ended_at,
        };
        let content = serde_json::to_vec(&tombstone)
            .map_err(|err| MonitorError::json("Failed to serialize tombstone", err))?;
        write_atomic(&self.tombstone_path(session_id), &content)
    }

    /// When the session ended, if a readable tombstone exists.
    pub fn tombstone(&self, session_id: &str) -> Option<DateTime<Utc>> {
        read_tombstone(&self.tombstone_path(session_id))
    }

    pub fn clear_tombstone(&self, session_id: &str) -> Result<()> {
        remove_if_exists(&self.tombstone_path(session_id))
    }

    pub fn tombstones(&self) -> Result<Vec<StoredTombstone>> {
        Ok(self
            .scan(TOMBSTONE_EXTENSION)?
            .into_iter()
            .map(|(session_id, path)| StoredTombstone {
                ended_at: read_tombstone(&path),
                session_id,
                path,
            })
            .collect())
    }

    /// `(stem, path)` for every file with the given extension. Temp files never
    /// match because they end in `.tmp`.
    fn scan(&self, extension: &str) -> Result<Vec<(String, PathBuf)>> {
        self.ensure_dir()?;
        let read_dir = fs::read_dir(&self.dir)
            .map_err(|err| MonitorError::io("Failed to list sessions directory", err))?;

        let mut found = Vec::new();
        for entry in read_dir.flatten() {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(extension) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if stem.starts_with('.') {
                continue;
            }
            found.push((stem.to_string(), path.clone()));
        }
        Ok(found)
    }
}

fn read_record(path: &Path, session_id: &str) -> Result<SessionRecord> {
    let content = fs::read_to_string(path)
        .map_err(|err| MonitorError::io("Failed to read session record", err))?;
    let mut record: SessionRecord = serde_json::from_str(&content)
        .map_err(|err| MonitorError::json("Failed to parse session record", err))?;
    if record.session_id.is_empty() {
        record.session_id = session_id.to_string();
    }
    Ok(record)
}

fn read_tombstone(path: &Path) -> Option<DateTime<Utc>> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str::<Tombstone>(&content)
        .ok()
        .map(|tombstone| tombstone.ended_at)
}

pub(crate) fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(MonitorError::io("Failed to remove file", err)),
    }
}
