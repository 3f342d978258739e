//! Maps hook notifications to status transitions and field updates.
//!
//! ```text
//! SessionStart                       → STARTING   (model)
//! UserPromptSubmit                   → THINKING   (last_prompt, topic)
//! PreToolUse                         → EXECUTING  (tool_name)
//! PreToolUse ExitPlanMode|AskUser…   → PERMISSION (tool_name)
//! PermissionRequest                  → PERMISSION (tool_name)
//! PostToolUse                        → THINKING   (tool_count + 1)
//! Stop                               → WAITING    (subagents cleared)
//! Notification permission_prompt     → PERMISSION
//! Notification (other)               → unchanged
//! SessionEnd                         → record removed
//! SubagentStart / SubagentStop       → see subagents.rs
//! ```
//!
//! `tool_name` is cleared by every event except PreToolUse and PermissionRequest.
//! Classification never touches disk except for the optional transcript read
//! used to backfill a missing topic.

use std::path::Path;

use claude_monitor_protocol::{Notification, NotificationKind};

use crate::patterns::clean_prompt;
use crate::project::project_name;
use crate::transcript::TranscriptSource;
use crate::types::{SessionRecord, SessionStatus};

/// Tools that block on a human decision rather than executing.
pub const USER_INPUT_TOOLS: &[&str] = &["ExitPlanMode", "AskUserQuestion"];

/// `notification_type` Claude Code uses when it shows a permission dialog.
pub const PERMISSION_PROMPT: &str = "permission_prompt";

/// Proposed status plus the field updates one notification carries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transition {
    pub status: Option<SessionStatus>,
    pub tool_name: Option<String>,
    pub model: Option<String>,
    pub prompt: Option<String>,
    pub increments_tool_count: bool,
    pub clears_subagents: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Write `record`; `status` is the proposed status the guard must check.
    Update {
        status: Option<SessionStatus>,
        record: SessionRecord,
    },
    /// Nothing would change; no write.
    Unchanged,
    /// Session ended; the record is removed.
    End,
    /// Handled by the subagent merger.
    Subagent,
}

impl Transition {
    pub fn for_kind(kind: &NotificationKind) -> Self {
        match kind {
            NotificationKind::SessionStart { model } => Transition {
                status: Some(SessionStatus::Starting),
                model: model.clone(),
                ..Transition::default()
            },
            NotificationKind::UserPromptSubmit { prompt } => Transition {
                status: Some(SessionStatus::Thinking),
                prompt: Some(prompt.clone()),
                ..Transition::default()
            },
            NotificationKind::PreToolUse { tool_name } => {
                let waits_for_user = tool_name
                    .as_deref()
                    .is_some_and(|tool| USER_INPUT_TOOLS.contains(&tool));
                Transition {
                    status: Some(if waits_for_user {
                        SessionStatus::Permission
                    } else {
                        SessionStatus::Executing
                    }),
                    tool_name: tool_name.clone(),
                    ..Transition::default()
                }
            }
            NotificationKind::PermissionRequest { tool_name } => Transition {
                status: Some(SessionStatus::Permission),
                tool_name: tool_name.clone(),
                ..Transition::default()
            },
            NotificationKind::PostToolUse { .. } => Transition {
                status: Some(SessionStatus::Thinking),
                increments_tool_count: true,
                ..Transition::default()
            },
            NotificationKind::Stop => Transition {
                status: Some(SessionStatus::Waiting),
                clears_subagents: true,
                ..Transition::default()
            },
            NotificationKind::Notification { notification_type } => Transition {
                status: (notification_type.as_deref() == Some(PERMISSION_PROMPT))
                    .then_some(SessionStatus::Permission),
                ..Transition::default()
            },
            NotificationKind::SessionEnd
            | NotificationKind::SubagentStart { .. }
            | NotificationKind::SubagentStop { .. } => Transition::default(),
        }
    }

    /// Builds the proposed record from `prior` (or a fresh one).
    pub fn apply(
        &self,
        prior: Option<&SessionRecord>,
        notification: &Notification,
        transcripts: &dyn TranscriptSource,
    ) -> SessionRecord {
        let now = notification.recorded_at;
        let mut record = prior
            .cloned()
            .unwrap_or_else(|| SessionRecord::new(&notification.session_id, now));

        if let Some(cwd) = notification.cwd.as_deref() {
            if cwd != record.cwd || record.project.is_empty() {
                record.project = project_name(cwd);
                record.cwd = cwd.to_string();
            }
        }
        if let Some(mode) = &notification.permission_mode {
            record.permission_mode = mode.clone();
        }

        if let Some(status) = self.status {
            record.status = status;
        }
        record.tool_name = self.tool_name.clone();
        if let Some(model) = &self.model {
            record.model = model.clone();
        }
        if let Some(prompt) = &self.prompt {
            record.last_prompt = prompt.clone();
            let cleaned = clean_prompt(prompt);
            if !cleaned.is_empty() {
                record.topic = cleaned;
            }
        }
        if self.increments_tool_count {
            record.tool_count = record.tool_count.saturating_add(1);
        }
        if self.clears_subagents {
            record.subagents.clear();
        }

        if record.topic.is_empty() {
            if let Some(path) = notification.transcript_path.as_deref() {
                if let Some(topic) = transcripts.first_user_topic(Path::new(path)) {
                    record.topic = topic;
                }
            }
        }

        record.last_updated = now;
        record
    }
}

pub fn classify(
    prior: Option<&SessionRecord>,
    notification: &Notification,
    transcripts: &dyn TranscriptSource,
) -> Classification {
    match &notification.kind {
        NotificationKind::SessionEnd => Classification::End,
        NotificationKind::SubagentStart { .. } | NotificationKind::SubagentStop { .. } => {
            Classification::Subagent
        }
        kind => {
            let transition = Transition::for_kind(kind);
            let record = transition.apply(prior, notification, transcripts);

            let unchanged = transition.status.is_none()
                && prior.is_some_and(|prior| prior.same_content(&record));
            if unchanged {
                return Classification::Unchanged;
            }

            Classification::Update {
                status: transition.status,
                record,
            }
        }
    }
}
