//! Hook payload types and boundary validation for claude-monitor.
//!
//! Claude Code delivers every hook as a single JSON object on stdin. This crate is
//! shared by the core library and the hook binary so both agree on what a valid
//! notification looks like. Anything that fails validation here never reaches the
//! state pipeline.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Session ids double as file stems, so they are length-limited.
pub const MAX_SESSION_ID_LEN: usize = 128;

/// Raw hook payload as written by Claude Code.
///
/// Every field is optional on the wire; [`HookInput::into_notification`] decides
/// which ones are required for a given event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookInput {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub hook_event_name: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub permission_mode: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub transcript_path: Option<String>,
    #[serde(default)]
    pub notification_type: Option<String>,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub agent_type: Option<String>,
}

/// Hook events claude-monitor subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookEventName {
    SessionStart,
    UserPromptSubmit,
    PreToolUse,
    PermissionRequest,
    PostToolUse,
    Stop,
    SessionEnd,
    Notification,
    SubagentStart,
    SubagentStop,
}

impl HookEventName {
    pub const ALL: [HookEventName; 10] = [
        HookEventName::SessionStart,
        HookEventName::UserPromptSubmit,
        HookEventName::PreToolUse,
        HookEventName::PermissionRequest,
        HookEventName::PostToolUse,
        HookEventName::Stop,
        HookEventName::SessionEnd,
        HookEventName::Notification,
        HookEventName::SubagentStart,
        HookEventName::SubagentStop,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HookEventName::SessionStart => "SessionStart",
            HookEventName::UserPromptSubmit => "UserPromptSubmit",
            HookEventName::PreToolUse => "PreToolUse",
            HookEventName::PermissionRequest => "PermissionRequest",
            HookEventName::PostToolUse => "PostToolUse",
            HookEventName::Stop => "Stop",
            HookEventName::SessionEnd => "SessionEnd",
            HookEventName::Notification => "Notification",
            HookEventName::SubagentStart => "SubagentStart",
            HookEventName::SubagentStop => "SubagentStop",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|name| name.as_str() == value)
    }
}

impl fmt::Display for HookEventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event-specific payload, one variant per hook kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
    SessionStart { model: Option<String> },
    UserPromptSubmit { prompt: String },
    PreToolUse { tool_name: Option<String> },
    PermissionRequest { tool_name: Option<String> },
    PostToolUse { tool_name: Option<String> },
    Stop,
    SessionEnd,
    Notification { notification_type: Option<String> },
    SubagentStart { agent_id: String, agent_type: String },
    SubagentStop { agent_id: String },
}

impl NotificationKind {
    pub fn event_name(&self) -> HookEventName {
        match self {
            NotificationKind::SessionStart { .. } => HookEventName::SessionStart,
            NotificationKind::UserPromptSubmit { .. } => HookEventName::UserPromptSubmit,
            NotificationKind::PreToolUse { .. } => HookEventName::PreToolUse,
            NotificationKind::PermissionRequest { .. } => HookEventName::PermissionRequest,
            NotificationKind::PostToolUse { .. } => HookEventName::PostToolUse,
            NotificationKind::Stop => HookEventName::Stop,
            NotificationKind::SessionEnd => HookEventName::SessionEnd,
            NotificationKind::Notification { .. } => HookEventName::Notification,
            NotificationKind::SubagentStart { .. } => HookEventName::SubagentStart,
            NotificationKind::SubagentStop { .. } => HookEventName::SubagentStop,
        }
    }

    pub fn is_subagent(&self) -> bool {
        matches!(
            self,
            NotificationKind::SubagentStart { .. } | NotificationKind::SubagentStop { .. }
        )
    }
}

/// A validated hook notification for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub session_id: String,
    /// When the hook process observed the event. Used as the write timestamp.
    pub recorded_at: DateTime<Utc>,
    pub cwd: Option<String>,
    pub permission_mode: Option<String>,
    pub transcript_path: Option<String>,
    pub kind: NotificationKind,
}

impl Notification {
    /// Parses and validates a raw hook payload.
    pub fn parse(payload: &str, recorded_at: DateTime<Utc>) -> Result<Self, ParseError> {
        let input: HookInput = serde_json::from_str(payload)
            .map_err(|err| ParseError::InvalidJson(err.to_string()))?;
        input.into_notification(recorded_at)
    }

    pub fn event_name(&self) -> HookEventName {
        self.kind.event_name()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("payload is not a valid hook object: {0}")]
    InvalidJson(String),

    #[error("session_id is required")]
    MissingSessionId,

    #[error("session_id {0:?} is not usable as a file name")]
    InvalidSessionId(String),

    #[error("hook_event_name is required")]
    MissingEventName,

    #[error("unknown hook event {0:?}")]
    UnknownEvent(String),

    #[error("agent_id is required for {0}")]
    MissingAgentId(HookEventName),
}

impl HookInput {
    pub fn into_notification(self, recorded_at: DateTime<Utc>) -> Result<Notification, ParseError> {
        let session_id = non_empty(self.session_id).ok_or(ParseError::MissingSessionId)?;
        validate_session_id(&session_id)?;

        let event_name = non_empty(self.hook_event_name).ok_or(ParseError::MissingEventName)?;
        let event = HookEventName::parse(&event_name).ok_or(ParseError::UnknownEvent(event_name))?;

        let kind = match event {
            HookEventName::SessionStart => NotificationKind::SessionStart {
                model: non_empty(self.model),
            },
            HookEventName::UserPromptSubmit => NotificationKind::UserPromptSubmit {
                prompt: self.prompt.unwrap_or_default(),
            },
            HookEventName::PreToolUse => NotificationKind::PreToolUse {
                tool_name: non_empty(self.tool_name),
            },
            HookEventName::PermissionRequest => NotificationKind::PermissionRequest {
                tool_name: non_empty(self.tool_name),
            },
            HookEventName::PostToolUse => NotificationKind::PostToolUse {
                tool_name: non_empty(self.tool_name),
            },
            HookEventName::Stop => NotificationKind::Stop,
            HookEventName::SessionEnd => NotificationKind::SessionEnd,
            HookEventName::Notification => NotificationKind::Notification {
                notification_type: non_empty(self.notification_type),
            },
            HookEventName::SubagentStart => NotificationKind::SubagentStart {
                agent_id: non_empty(self.agent_id).ok_or(ParseError::MissingAgentId(event))?,
                agent_type: self.agent_type.unwrap_or_default(),
            },
            HookEventName::SubagentStop => NotificationKind::SubagentStop {
                agent_id: non_empty(self.agent_id).ok_or(ParseError::MissingAgentId(event))?,
            },
        };

        Ok(Notification {
            session_id,
            recorded_at,
            cwd: non_empty(self.cwd),
            permission_mode: non_empty(self.permission_mode),
            transcript_path: non_empty(self.transcript_path),
            kind,
        })
    }
}

/// Rejects ids that could escape the sessions directory or collide with
/// bookkeeping files.
pub fn validate_session_id(session_id: &str) -> Result<(), ParseError> {
    let invalid = session_id.len() > MAX_SESSION_ID_LEN
        || session_id.starts_with('.')
        || session_id.contains("..")
        || session_id
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control());

    if invalid {
        return Err(ParseError::InvalidSessionId(session_id.to_string()));
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
