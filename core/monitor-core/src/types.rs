//! Persisted session types.
//!
//! One [`SessionRecord`] is stored per session as `<session_id>.json`. The field
//! names are the on-disk format read by the display, so renaming any of them is a
//! breaking change.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// What a session is doing right now, as shown by the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    #[default]
    Starting,
    Thinking,
    Executing,
    Permission,
    Waiting,
    Ended,
}

impl SessionStatus {
    pub fn is_active(self) -> bool {
        self != SessionStatus::Ended
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Starting => "STARTING",
            SessionStatus::Thinking => "THINKING",
            SessionStatus::Executing => "EXECUTING",
            SessionStatus::Permission => "PERMISSION",
            SessionStatus::Waiting => "WAITING",
            SessionStatus::Ended => "ENDED",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubagentStatus {
    #[default]
    Running,
}

/// A helper agent spawned inside a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubagentRecord {
    pub agent_id: String,
    #[serde(default)]
    pub agent_type: String,
    #[serde(default)]
    pub status: SubagentStatus,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub cwd: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub status: SessionStatus,
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub permission_mode: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub last_prompt: String,
    #[serde(default)]
    pub tool_count: u32,
    pub started_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub subagents: Vec<SubagentRecord>,
}

impl SessionRecord {
    /// A fresh record for a session seen for the first time.
    pub fn new(session_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.to_string(),
            cwd: String::new(),
            project: String::new(),
            status: SessionStatus::Starting,
            tool_name: None,
            permission_mode: String::new(),
            model: String::new(),
            topic: String::new(),
            last_prompt: String::new(),
            tool_count: 0,
            started_at: now,
            last_updated: now,
            subagents: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Time since the last accepted write.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.last_updated)
    }

    pub fn running_for(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.started_at)
    }

    /// True when both records carry the same content, ignoring `last_updated`.
    pub fn same_content(&self, other: &SessionRecord) -> bool {
        let mut normalized = self.clone();
        normalized.last_updated = other.last_updated;
        normalized == *other
    }

    pub fn has_subagent(&self, agent_id: &str) -> bool {
        self.subagents.iter().any(|agent| agent.agent_id == agent_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 31, 0, 0, secs).unwrap()
    }

    #[test]
    fn test_status_serializes_as_upper_case_name() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::Permission).unwrap(),
            "\"PERMISSION\""
        );
        let status: SessionStatus = serde_json::from_str("\"WAITING\"").unwrap();
        assert_eq!(status, SessionStatus::Waiting);
        assert_eq!(SessionStatus::Executing.to_string(), "EXECUTING");
    }

    #[test]
    fn test_only_ended_is_inactive() {
        assert!(SessionStatus::Starting.is_active());
        assert!(SessionStatus::Waiting.is_active());
        assert!(!SessionStatus::Ended.is_active());
    }

    #[test]
    fn test_record_json_uses_documented_field_names() {
        let mut record = SessionRecord::new("s1", at(0));
        record.subagents.push(SubagentRecord {
            agent_id: "a1".to_string(),
            agent_type: "Explore".to_string(),
            status: SubagentStatus::Running,
            last_updated: at(1),
        });

        let value = serde_json::to_value(&record).unwrap();
        for key in [
            "session_id",
            "cwd",
            "project",
            "status",
            "tool_name",
            "permission_mode",
            "model",
            "topic",
            "last_prompt",
            "tool_count",
            "started_at",
            "last_updated",
            "subagents",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["status"], "STARTING");
        assert!(value["tool_name"].is_null());
        assert_eq!(value["subagents"][0]["status"], "running");
        assert_eq!(value["subagents"][0]["agent_type"], "Explore");
    }

    #[test]
    fn test_reads_sparse_records_with_defaults() {
        let json = r#"{"last_updated":"2026-01-31T00:00:00+00:00","started_at":"2026-01-31T00:00:00Z"}"#;
        let record: SessionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.status, SessionStatus::Starting);
        assert_eq!(record.tool_count, 0);
        assert!(record.subagents.is_empty());
        assert_eq!(record.last_updated, at(0));
    }

    #[test]
    fn test_same_content_ignores_last_updated() {
        let a = SessionRecord::new("s1", at(0));
        let mut b = a.clone();
        b.last_updated = at(5);
        assert!(a.same_content(&b));

        b.tool_count = 1;
        assert!(!a.same_content(&b));
    }

    #[test]
    fn test_age_and_duration() {
        let mut record = SessionRecord::new("s1", at(0));
        record.last_updated = at(10);
        assert_eq!(record.age(at(30)), Duration::seconds(20));
        assert_eq!(record.running_for(at(30)), Duration::seconds(30));
    }
}
