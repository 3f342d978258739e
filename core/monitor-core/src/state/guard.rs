//! Suppression rules for late permission signals.
//!
//! Hooks run asynchronously, so a `PermissionRequest` can land after the `Stop`
//! that followed it (the user pressed Escape on the prompt), and a `Notification`
//! of type `permission_prompt` can land after work already resumed. Only
//! transitions *to* PERMISSION are ever suppressed. Blocking THINKING would hide
//! real prompts, because `PermissionRequest` routinely arrives before the
//! `PreToolUse` it belongs to.

use std::fmt;

use claude_monitor_protocol::HookEventName;

use crate::types::SessionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// WAITING means nothing is pending; a late permission signal must not reopen it.
    PermissionAfterWaiting,
    /// A generic notification never overrides an established, stronger status.
    WeakPermissionSignal,
}

impl fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuppressReason::PermissionAfterWaiting => f.write_str("permission after waiting"),
            SuppressReason::WeakPermissionSignal => f.write_str("weak permission signal"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allow,
    Suppress(SuppressReason),
}

pub fn admit(existing: SessionStatus, proposed: SessionStatus, event: HookEventName) -> Admission {
    if proposed != SessionStatus::Permission {
        return Admission::Allow;
    }

    if existing == SessionStatus::Waiting {
        return Admission::Suppress(SuppressReason::PermissionAfterWaiting);
    }

    if event == HookEventName::Notification
        && matches!(
            existing,
            SessionStatus::Thinking | SessionStatus::Executing | SessionStatus::Waiting
        )
    {
        return Admission::Suppress(SuppressReason::WeakPermissionSignal);
    }

    Admission::Allow
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATUSES: [SessionStatus; 6] = [
        SessionStatus::Starting,
        SessionStatus::Thinking,
        SessionStatus::Executing,
        SessionStatus::Permission,
        SessionStatus::Waiting,
        SessionStatus::Ended,
    ];

    #[test]
    fn test_permission_after_waiting_is_suppressed_for_every_event() {
        for event in HookEventName::ALL {
            assert_eq!(
                admit(SessionStatus::Waiting, SessionStatus::Permission, event),
                Admission::Suppress(SuppressReason::PermissionAfterWaiting),
                "{event}"
            );
        }
    }

    #[test]
    fn test_permission_request_allowed_while_working() {
        for existing in [
            SessionStatus::Starting,
            SessionStatus::Thinking,
            SessionStatus::Executing,
            SessionStatus::Permission,
        ] {
            assert_eq!(
                admit(existing, SessionStatus::Permission, HookEventName::PermissionRequest),
                Admission::Allow
            );
            assert_eq!(
                admit(existing, SessionStatus::Permission, HookEventName::PreToolUse),
                Admission::Allow
            );
        }
    }

    #[test]
    fn test_notification_permission_suppressed_when_status_established() {
        for existing in [SessionStatus::Thinking, SessionStatus::Executing] {
            assert_eq!(
                admit(existing, SessionStatus::Permission, HookEventName::Notification),
                Admission::Suppress(SuppressReason::WeakPermissionSignal)
            );
        }
    }

    #[test]
    fn test_notification_permission_allowed_from_starting_or_permission() {
        assert_eq!(
            admit(
                SessionStatus::Starting,
                SessionStatus::Permission,
                HookEventName::Notification
            ),
            Admission::Allow
        );
        assert_eq!(
            admit(
                SessionStatus::Permission,
                SessionStatus::Permission,
                HookEventName::Notification
            ),
            Admission::Allow
        );
    }

    #[test]
    fn test_non_permission_transitions_are_never_suppressed() {
        for existing in ALL_STATUSES {
            for proposed in ALL_STATUSES {
                if proposed == SessionStatus::Permission {
                    continue;
                }
                for event in HookEventName::ALL {
                    assert_eq!(admit(existing, proposed, event), Admission::Allow);
                }
            }
        }
    }
}
