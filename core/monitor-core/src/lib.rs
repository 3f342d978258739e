//! # monitor-core
//!
//! Core library for claude-monitor: turns Claude Code hook notifications into one
//! status record per session, persisted as a JSON file that a display process can
//! read at any time.
//!
//! ## Design Principles
//!
//! - **Synchronous**: Every hook runs as its own short-lived process. No runtime.
//! - **Optimistic**: No locks. Atomic rename plus a `last_updated` comparison is the
//!   only coordination between concurrent writers.
//! - **Graceful degradation**: Missing or corrupt files read as "no record", never as
//!   a fatal error.
//! - **Observable outcomes**: Suppressed, stale and dropped notifications are explicit
//!   [`Outcome`] values rather than silent returns.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use monitor_core::{load_config_or_default, Pipeline, SessionFeed, StateStore, StorageConfig};
//!
//! let storage = StorageConfig::from_env()?;
//! let config = load_config_or_default(&storage);
//! let pipeline = Pipeline::new(StateStore::from_storage(&storage), &config);
//! let outcome = pipeline.handle_raw(&payload, chrono::Utc::now())?;
//!
//! let feed = SessionFeed::new(StateStore::from_storage(&storage), &config);
//! let sessions = feed.list();
//! ```

pub mod atomic;
pub mod config;
pub mod error;
pub mod feed;
pub mod patterns;
pub mod project;
pub mod state;
pub mod storage;
pub mod transcript;
pub mod types;

pub use config::{load_config, load_config_or_default, MonitorConfig, UsageConfig};
pub use error::{MonitorError, Result};
pub use feed::{CleanupStats, SessionFeed};
pub use state::{
    Admission, Change, Classification, DropReason, Outcome, Pipeline, SaveOutcome, SkipReason,
    StateStore, SuppressReason, Transition,
};
pub use storage::StorageConfig;
pub use transcript::{JsonlTranscripts, TranscriptSource};
pub use types::{SessionRecord, SessionStatus, SubagentRecord, SubagentStatus};
