//! Session state: classification, reconciliation and persistence.
//!
//! A notification flows through these pieces in order:
//!
//! - [`classify`]: maps the event to a proposed status and field updates
//! - [`subagents`]: merges subagent lifecycle events into the parent record
//! - [`guard`]: suppresses late PERMISSION signals
//! - [`store`]: atomic, anti-regression persistence on disk
//!
//! [`Pipeline`] wires them together; most callers only need it.

pub mod classify;
pub mod guard;
pub mod pipeline;
pub mod store;
pub mod subagents;

pub use classify::{classify, Classification, Transition};
pub use guard::{admit, Admission, SuppressReason};
pub use pipeline::{Change, DropReason, Outcome, Pipeline, SkipReason};
pub use store::{SaveOutcome, StateStore, StoredEntry, StoredTombstone};
pub use subagents::{merge, merge_into, Merge, SubagentEvent};
