//! Storage configuration and path management for claude-monitor.
//!
//! Every path the monitor reads or writes is derived from a single root so tests
//! can point the whole system at a temp directory.
//!
//! ```text
//! ~/.claude/monitor/
//! ├── config.toml          optional overrides (see config.rs)
//! ├── usage.json           latest usage payload (written by usage-hook)
//! ├── logs/                hook log files
//! └── sessions/
//!     ├── <session_id>.json    one record per live session
//!     └── <session_id>.ended   tombstone for a recently ended session
//! ```

use std::env;
use std::path::{Path, PathBuf};

use crate::error::{MonitorError, Result};

/// Overrides the monitor root directory when set to a non-empty path.
pub const HOME_ENV: &str = "CLAUDE_MONITOR_HOME";

/// Central configuration for all claude-monitor storage paths.
///
/// Production code uses [`StorageConfig::from_env`], which points to
/// `~/.claude/monitor/`. Tests use [`StorageConfig::with_root`] for isolation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    root: PathBuf,
}

impl StorageConfig {
    /// Resolves the root from `CLAUDE_MONITOR_HOME`, falling back to `~/.claude/monitor`.
    pub fn from_env() -> Result<Self> {
        if let Some(root) = env::var_os(HOME_ENV).filter(|value| !value.is_empty()) {
            return Ok(Self::with_root(PathBuf::from(root)));
        }

        let home = dirs::home_dir().ok_or(MonitorError::HomeDirNotFound)?;
        Ok(Self::with_root(home.join(".claude").join("monitor")))
    }

    /// Creates a StorageConfig with a custom root directory.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one JSON record per session.
    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    /// Latest usage payload fetched by `usage-hook`.
    pub fn usage_file(&self) -> PathBuf {
        self.root.join("usage.json")
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }
}
