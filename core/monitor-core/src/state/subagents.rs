//! Merges subagent lifecycle notifications into the parent session's record.
//!
//! Start is idempotent per `agent_id`; stop removes the entry and ignores agents
//! it never saw. A start observed while the parent shows PERMISSION moves the
//! parent to THINKING: the permission signal was delivered late and work has
//! visibly resumed.

use chrono::{DateTime, Utc};
use claude_monitor_protocol::{Notification, NotificationKind};

use crate::types::{SessionRecord, SessionStatus, SubagentRecord, SubagentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubagentEvent<'a> {
    Start { agent_id: &'a str, agent_type: &'a str },
    Stop { agent_id: &'a str },
}

impl<'a> SubagentEvent<'a> {
    pub fn from_kind(kind: &'a NotificationKind) -> Option<Self> {
        match kind {
            NotificationKind::SubagentStart {
                agent_id,
                agent_type,
            } => Some(SubagentEvent::Start {
                agent_id,
                agent_type,
            }),
            NotificationKind::SubagentStop { agent_id } => Some(SubagentEvent::Stop { agent_id }),
            _ => None,
        }
    }
}

/// Result of a merge: the new subagent list and, if any, the parent's new status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merge {
    pub subagents: Vec<SubagentRecord>,
    pub status: Option<SessionStatus>,
}

pub fn merge(
    prior: &[SubagentRecord],
    current_status: SessionStatus,
    event: SubagentEvent<'_>,
    now: DateTime<Utc>,
) -> Merge {
    let mut subagents = prior.to_vec();

    match event {
        SubagentEvent::Start {
            agent_id,
            agent_type,
        } => {
            if !subagents.iter().any(|agent| agent.agent_id == agent_id) {
                subagents.push(SubagentRecord {
                    agent_id: agent_id.to_string(),
                    agent_type: agent_type.to_string(),
                    status: SubagentStatus::Running,
                    last_updated: now,
                });
            }
            Merge {
                subagents,
                status: (current_status == SessionStatus::Permission)
                    .then_some(SessionStatus::Thinking),
            }
        }
        SubagentEvent::Stop { agent_id } => {
            subagents.retain(|agent| agent.agent_id != agent_id);
            Merge {
                subagents,
                status: None,
            }
        }
    }
}

/// Applies a subagent notification to `record`. Returns `None` when the
/// notification is not a subagent event or changes nothing.
pub fn merge_into(record: &SessionRecord, notification: &Notification) -> Option<SessionRecord> {
    let event = SubagentEvent::from_kind(&notification.kind)?;
    let merged = merge(
        &record.subagents,
        record.status,
        event,
        notification.recorded_at,
    );

    let mut updated = record.clone();
    updated.subagents = merged.subagents;
    if let Some(status) = merged.status {
        updated.status = status;
    }
    updated.last_updated = notification.recorded_at;

    if record.same_content(&updated) {
        return None;
    }
    Some(updated)
}
