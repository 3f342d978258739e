//! Error types for monitor-core operations.
//!
//! Most failures in this crate are absorbed (a corrupt record reads as absent, a
//! stale write is an [`crate::Outcome`]), so these variants only cover what a
//! caller genuinely has to report: the state directory could not be written, or
//! configuration could not be resolved.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Configuration file malformed: {}: {details}", path.display())]
    ConfigMalformed { path: PathBuf, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl MonitorError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        MonitorError::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        MonitorError::Json {
            context: context.into(),
            source,
        }
    }
}

/// Convenience type alias for Results using MonitorError.
pub type Result<T> = std::result::Result<T, MonitorError>;

impl From<MonitorError> for String {
    fn from(err: MonitorError) -> String {
        err.to_string()
    }
}
