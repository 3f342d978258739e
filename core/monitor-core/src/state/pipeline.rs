//! Processes one hook notification end to end.
//!
//! ```text
//! payload ─parse─► Notification ─► tombstone check ─► classify ─► guard ─► save
//!                                                  └► merge (subagents) ──────┘
//! ```
//!
//! Every path ends in an [`Outcome`]. Only storage write failures are errors;
//! everything else (malformed input, stale writes, late events) is a normal,
//! expected result that callers log and move past.

use chrono::{DateTime, Duration, Utc};
use claude_monitor_protocol::{HookEventName, Notification, NotificationKind, ParseError};

use crate::config::MonitorConfig;
use crate::error::Result;
use crate::transcript::{JsonlTranscripts, TranscriptSource};
use crate::types::{SessionRecord, SessionStatus};

use super::classify::{classify, Classification};
use super::guard::{admit, Admission, SuppressReason};
use super::store::{SaveOutcome, StateStore};
use super::subagents::merge_into;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied(Change),
    Skipped(SkipReason),
    Dropped(DropReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Upserted(SessionRecord),
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The notification would not change the record.
    Unchanged,
    Suppressed(SuppressReason),
    /// A newer record was already on disk.
    Stale { on_disk: DateTime<Utc> },
    /// The session ended recently; late events are ignored.
    Tombstoned { ended_at: DateTime<Utc> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    Malformed(ParseError),
    /// Subagent event for a session with no record.
    UnknownSession,
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Applied(Change::Upserted(_)) => "upserted",
            Outcome::Applied(Change::Removed) => "removed",
            Outcome::Skipped(SkipReason::Unchanged) => "unchanged",
            Outcome::Skipped(SkipReason::Suppressed(_)) => "suppressed",
            Outcome::Skipped(SkipReason::Stale { .. }) => "stale",
            Outcome::Skipped(SkipReason::Tombstoned { .. }) => "tombstoned",
            Outcome::Dropped(DropReason::Malformed(_)) => "malformed",
            Outcome::Dropped(DropReason::UnknownSession) => "unknown_session",
        }
    }
}

pub struct Pipeline<T = JsonlTranscripts> {
    store: StateStore,
    transcripts: T,
    tombstone_ttl: Duration,
}

impl Pipeline<JsonlTranscripts> {
    pub fn new(store: StateStore, config: &MonitorConfig) -> Self {
        Pipeline {
            store,
            transcripts: JsonlTranscripts,
            tombstone_ttl: config.tombstone_ttl(),
        }
    }
}

impl<T: TranscriptSource> Pipeline<T> {
    pub fn with_transcripts<U: TranscriptSource>(self, transcripts: U) -> Pipeline<U> {
        Pipeline {
            store: self.store,
            transcripts,
            tombstone_ttl: self.tombstone_ttl,
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Parses `payload` and handles it. A payload that fails validation is
    /// dropped, not an error.
    pub fn handle_raw(&self, payload: &str, recorded_at: DateTime<Utc>) -> Result<Outcome> {
        match Notification::parse(payload, recorded_at) {
            Ok(notification) => self.handle(&notification),
            Err(err) => {
                tracing::debug!(error = %err, "Dropping malformed hook payload");
                Ok(Outcome::Dropped(DropReason::Malformed(err)))
            }
        }
    }

    pub fn handle(&self, notification: &Notification) -> Result<Outcome> {
        let session_id = notification.session_id.as_str();
        let event = notification.event_name();

        if let NotificationKind::SessionEnd = notification.kind {
            return self.end(notification);
        }

        if let Some(ended_at) = self.store.tombstone(session_id) {
            // A start recorded after the end reopens the session; anything
            // recorded before it is a late delivery for the old one.
            let is_start = matches!(notification.kind, NotificationKind::SessionStart { .. });
            let late = if is_start {
                notification.recorded_at <= ended_at
            } else {
                notification.recorded_at < ended_at + self.tombstone_ttl
            };
            if is_start && !late {
                self.store.clear_tombstone(session_id)?;
            } else if late {
                tracing::debug!(
                    session = %session_id,
                    event = %event,
                    ended_at = %ended_at,
                    "Ignoring event for recently ended session"
                );
                return Ok(Outcome::Skipped(SkipReason::Tombstoned { ended_at }));
            }
        }

        let prior = self.store.load(session_id);

        if notification.kind.is_subagent() {
            let Some(prior) = prior else {
                tracing::debug!(
                    session = %session_id,
                    event = %event,
                    "Dropping subagent event for unknown session"
                );
                return Ok(Outcome::Dropped(DropReason::UnknownSession));
            };
            return match merge_into(&prior, notification) {
                Some(record) => self.persist(record, event),
                None => Ok(Outcome::Skipped(SkipReason::Unchanged)),
            };
        }

        match classify(prior.as_ref(), notification, &self.transcripts) {
            Classification::Unchanged => Ok(Outcome::Skipped(SkipReason::Unchanged)),
            Classification::Update { status, record } => {
                if let Some(proposed) = status {
                    let existing = prior
                        .as_ref()
                        .map(|record| record.status)
                        .unwrap_or(SessionStatus::Starting);
                    if let Admission::Suppress(reason) = admit(existing, proposed, event) {
                        tracing::debug!(
                            session = %session_id,
                            event = %event,
                            existing = %existing,
                            proposed = %proposed,
                            reason = %reason,
                            "Suppressed status transition"
                        );
                        return Ok(Outcome::Skipped(SkipReason::Suppressed(reason)));
                    }
                }
                self.persist(record, event)
            }
            // Routed above; classify only reports these for completeness.
            Classification::End => self.end(notification),
            Classification::Subagent => Ok(Outcome::Skipped(SkipReason::Unchanged)),
        }
    }

    fn end(&self, notification: &Notification) -> Result<Outcome> {
        let session_id = notification.session_id.as_str();
        self.store.remove(session_id)?;
        self.store.mark_ended(session_id, notification.recorded_at)?;
        tracing::debug!(session = %session_id, "Session ended, record removed");
        Ok(Outcome::Applied(Change::Removed))
    }

    fn persist(&self, record: SessionRecord, event: HookEventName) -> Result<Outcome> {
        match self.store.save(&record)? {
            SaveOutcome::Written => {
                tracing::debug!(
                    session = %record.session_id,
                    event = %event,
                    status = %record.status,
                    "Session record written"
                );
                Ok(Outcome::Applied(Change::Upserted(record)))
            }
            SaveOutcome::Stale { on_disk } => {
                tracing::debug!(
                    session = %record.session_id,
                    event = %event,
                    on_disk = %on_disk,
                    incoming = %record.last_updated,
                    "Skipping stale write"
                );
                Ok(Outcome::Skipped(SkipReason::Stale { on_disk }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::path::Path;
    use tempfile::tempdir;

    struct NoTranscripts;

    impl TranscriptSource for NoTranscripts {
        fn first_user_topic(&self, _path: &Path) -> Option<String> {
            None
        }
    }

    fn at(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 31, 0, 0, secs).unwrap()
    }

    fn pipeline(dir: &Path) -> Pipeline<NoTranscripts> {
        Pipeline::new(StateStore::new(dir), &MonitorConfig::default()).with_transcripts(NoTranscripts)
    }

    fn payload(event: &str, extra: &str) -> String {
        if extra.is_empty() {
            format!(r#"{{"session_id":"s1","hook_event_name":"{event}"}}"#)
        } else {
            format!(r#"{{"session_id":"s1","hook_event_name":"{event}",{extra}}}"#)
        }
    }

    fn upserted(outcome: Outcome) -> SessionRecord {
        match outcome {
            Outcome::Applied(Change::Upserted(record)) => record,
            other => panic!("expected upsert, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_payload_is_dropped() {
        let temp = tempdir().unwrap();
        let pipeline = pipeline(temp.path());

        let outcome = pipeline.handle_raw("not json", at(0)).unwrap();
        assert!(matches!(
            outcome,
            Outcome::Dropped(DropReason::Malformed(ParseError::InvalidJson(_)))
        ));

        let outcome = pipeline
            .handle_raw(r#"{"hook_event_name":"Stop"}"#, at(0))
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Dropped(DropReason::Malformed(ParseError::MissingSessionId))
        );
        assert!(pipeline.store().entries().unwrap().is_empty());
    }

    #[test]
    fn test_start_creates_record() {
        let temp = tempdir().unwrap();
        let pipeline = pipeline(temp.path());

        let record = upserted(
            pipeline
                .handle_raw(&payload("SessionStart", r#""model":"claude-opus-4""#), at(1))
                .unwrap(),
        );
        assert_eq!(record.status, SessionStatus::Starting);
        assert_eq!(pipeline.store().load("s1"), Some(record));
    }

    #[test]
    fn test_end_removes_record_and_writes_tombstone() {
        let temp = tempdir().unwrap();
        let pipeline = pipeline(temp.path());
        pipeline.handle_raw(&payload("SessionStart", ""), at(1)).unwrap();

        let outcome = pipeline.handle_raw(&payload("SessionEnd", ""), at(2)).unwrap();
        assert_eq!(outcome, Outcome::Applied(Change::Removed));
        assert!(pipeline.store().load("s1").is_none());
        assert_eq!(pipeline.store().tombstone("s1"), Some(at(2)));
    }

    #[test]
    fn test_late_event_after_end_is_tombstoned() {
        let temp = tempdir().unwrap();
        let pipeline = pipeline(temp.path());
        pipeline.handle_raw(&payload("SessionStart", ""), at(1)).unwrap();
        pipeline.handle_raw(&payload("SessionEnd", ""), at(2)).unwrap();

        let outcome = pipeline
            .handle_raw(&payload("PostToolUse", r#""tool_name":"Bash""#), at(3))
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Skipped(SkipReason::Tombstoned { ended_at: at(2) })
        );
        assert!(pipeline.store().load("s1").is_none());
    }

    #[test]
    fn test_event_after_tombstone_ttl_is_processed() {
        let temp = tempdir().unwrap();
        let pipeline = pipeline(temp.path());
        pipeline.handle_raw(&payload("SessionEnd", ""), at(0)).unwrap();

        let after_ttl = at(0) + Duration::seconds(61);
        let outcome = pipeline.handle_raw(&payload("Stop", ""), after_ttl).unwrap();
        assert!(outcome.is_applied());
    }

    #[test]
    fn test_session_start_clears_tombstone() {
        let temp = tempdir().unwrap();
        let pipeline = pipeline(temp.path());
        pipeline.handle_raw(&payload("SessionEnd", ""), at(1)).unwrap();

        let outcome = pipeline.handle_raw(&payload("SessionStart", ""), at(2)).unwrap();
        assert!(outcome.is_applied());
        assert_eq!(pipeline.store().tombstone("s1"), None);

        let outcome = pipeline.handle_raw(&payload("Stop", ""), at(3)).unwrap();
        assert!(outcome.is_applied());
    }

    #[test]
    fn test_session_start_older_than_end_does_not_resurrect() {
        let temp = tempdir().unwrap();
        let pipeline = pipeline(temp.path());
        pipeline
            .handle_raw(&payload("UserPromptSubmit", r#""prompt":"hi""#), at(5))
            .unwrap();
        pipeline.handle_raw(&payload("SessionEnd", ""), at(10)).unwrap();

        for stamp in [at(1), at(10)] {
            let outcome = pipeline.handle_raw(&payload("SessionStart", ""), stamp).unwrap();
            assert_eq!(
                outcome,
                Outcome::Skipped(SkipReason::Tombstoned { ended_at: at(10) })
            );
        }
        assert!(pipeline.store().load("s1").is_none());
        assert_eq!(pipeline.store().tombstone("s1"), Some(at(10)));
    }

    #[test]
    fn test_permission_after_waiting_is_suppressed() {
        let temp = tempdir().unwrap();
        let pipeline = pipeline(temp.path());
        pipeline.handle_raw(&payload("Stop", ""), at(1)).unwrap();

        let outcome = pipeline
            .handle_raw(&payload("PermissionRequest", r#""tool_name":"Bash""#), at(2))
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Skipped(SkipReason::Suppressed(SuppressReason::PermissionAfterWaiting))
        );
        assert_eq!(pipeline.store().load("s1").unwrap().status, SessionStatus::Waiting);
    }

    #[test]
    fn test_permission_for_unseen_session_is_allowed() {
        let temp = tempdir().unwrap();
        let pipeline = pipeline(temp.path());
        let record = upserted(
            pipeline
                .handle_raw(&payload("PermissionRequest", r#""tool_name":"Bash""#), at(1))
                .unwrap(),
        );
        assert_eq!(record.status, SessionStatus::Permission);
    }

    #[test]
    fn test_unchanged_notification_skips_write() {
        let temp = tempdir().unwrap();
        let pipeline = pipeline(temp.path());
        pipeline.handle_raw(&payload("Stop", ""), at(1)).unwrap();

        let outcome = pipeline
            .handle_raw(&payload("Notification", r#""notification_type":"idle_prompt""#), at(5))
            .unwrap();
        assert_eq!(outcome, Outcome::Skipped(SkipReason::Unchanged));
        assert_eq!(pipeline.store().load("s1").unwrap().last_updated, at(1));
    }

    #[test]
    fn test_older_notification_is_stale() {
        let temp = tempdir().unwrap();
        let pipeline = pipeline(temp.path());
        pipeline.handle_raw(&payload("Stop", ""), at(10)).unwrap();

        let outcome = pipeline
            .handle_raw(&payload("PreToolUse", r#""tool_name":"Bash""#), at(9))
            .unwrap();
        assert_eq!(outcome, Outcome::Skipped(SkipReason::Stale { on_disk: at(10) }));
        assert_eq!(pipeline.store().load("s1").unwrap().status, SessionStatus::Waiting);
    }

    #[test]
    fn test_subagent_for_unknown_session_is_dropped() {
        let temp = tempdir().unwrap();
        let pipeline = pipeline(temp.path());

        let outcome = pipeline
            .handle_raw(&payload("SubagentStart", r#""agent_id":"a1""#), at(1))
            .unwrap();
        assert_eq!(outcome, Outcome::Dropped(DropReason::UnknownSession));
        assert!(pipeline.store().entries().unwrap().is_empty());
    }

    #[test]
    fn test_subagent_start_and_stop() {
        let temp = tempdir().unwrap();
        let pipeline = pipeline(temp.path());
        pipeline.handle_raw(&payload("PermissionRequest", ""), at(1)).unwrap();

        let record = upserted(
            pipeline
                .handle_raw(
                    &payload("SubagentStart", r#""agent_id":"a1","agent_type":"Plan""#),
                    at(2),
                )
                .unwrap(),
        );
        assert_eq!(record.status, SessionStatus::Thinking);
        assert!(record.has_subagent("a1"));

        let again = pipeline
            .handle_raw(&payload("SubagentStart", r#""agent_id":"a1""#), at(3))
            .unwrap();
        assert_eq!(again, Outcome::Skipped(SkipReason::Unchanged));

        let record = upserted(
            pipeline
                .handle_raw(&payload("SubagentStop", r#""agent_id":"a1""#), at(4))
                .unwrap(),
        );
        assert!(record.subagents.is_empty());
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::Applied(Change::Removed).label(), "removed");
        assert_eq!(
            Outcome::Dropped(DropReason::UnknownSession).label(),
            "unknown_session"
        );
        assert!(!Outcome::Skipped(SkipReason::Unchanged).is_applied());
    }
}
