//! Optional runtime configuration read from `<root>/config.toml`.
//!
//! Every key has a default, so a missing file (the common case) is not an error.
//!
//! ```toml
//! zombie_threshold_hours = 24
//! tombstone_ttl_secs = 60
//!
//! [usage]
//! endpoint = "https://api.anthropic.com/api/oauth/usage"
//! timeout_secs = 10
//! keychain_service = "Claude Code-credentials"
//! keychain_timeout_secs = 5
//! ```

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, Result};
use crate::storage::StorageConfig;

pub const DEFAULT_ZOMBIE_THRESHOLD_HOURS: u32 = 24;
pub const DEFAULT_TOMBSTONE_TTL_SECS: u32 = 60;
pub const DEFAULT_USAGE_ENDPOINT: &str = "https://api.anthropic.com/api/oauth/usage";
pub const DEFAULT_USAGE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "Claude Code-credentials";
pub const DEFAULT_KEYCHAIN_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Records not updated for longer than this are reaped by the feed.
    pub zombie_threshold_hours: u32,
    /// How long after a session ends late notifications are ignored.
    pub tombstone_ttl_secs: u32,
    pub usage: UsageConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            zombie_threshold_hours: DEFAULT_ZOMBIE_THRESHOLD_HOURS,
            tombstone_ttl_secs: DEFAULT_TOMBSTONE_TTL_SECS,
            usage: UsageConfig::default(),
        }
    }
}

impl MonitorConfig {
    pub fn zombie_threshold(&self) -> Duration {
        Duration::hours(i64::from(self.zombie_threshold_hours))
    }

    pub fn tombstone_ttl(&self) -> Duration {
        Duration::seconds(i64::from(self.tombstone_ttl_secs))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    /// Keychain service holding Claude Code's OAuth credentials (macOS).
    pub keychain_service: String,
    /// Upper bound on the credential lookup; the keychain can block on an unlock prompt.
    pub keychain_timeout_secs: u64,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_USAGE_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_USAGE_TIMEOUT_SECS,
            keychain_service: DEFAULT_KEYCHAIN_SERVICE.to_string(),
            keychain_timeout_secs: DEFAULT_KEYCHAIN_TIMEOUT_SECS,
        }
    }
}

/// Loads `config.toml`, returning defaults when the file does not exist.
pub fn load_config(storage: &StorageConfig) -> Result<MonitorConfig> {
    let path = storage.config_file();
    if !path.exists() {
        return Ok(MonitorConfig::default());
    }

    let content = fs_err::read_to_string(&path)
        .map_err(|err| MonitorError::io("Failed to read config", err))?;
    toml::from_str::<MonitorConfig>(&content).map_err(|err| MonitorError::ConfigMalformed {
        path,
        details: err.to_string(),
    })
}

/// Like [`load_config`], but a malformed file degrades to defaults with a warning.
pub fn load_config_or_default(storage: &StorageConfig) -> MonitorConfig {
    match load_config(storage) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(error = %err, "Failed to load monitor config; using defaults");
            MonitorConfig::default()
        }
    }
}
