//! Plain-text rendering of the session feed for `claude-monitor list`.

use chrono::{DateTime, Duration, Local, Utc};
use monitor_core::{SessionRecord, SubagentRecord};

const TOPIC_WIDTH: usize = 60;

pub fn render(records: &[SessionRecord], now: DateTime<Utc>) -> String {
    if records.is_empty() {
        return "No active sessions\n".to_string();
    }

    let mut out = String::new();
    for record in records {
        out.push_str(&session_line(record, now));
        out.push('\n');
        for agent in &record.subagents {
            out.push_str(&subagent_line(agent, now));
            out.push('\n');
        }
    }
    out
}

fn session_line(record: &SessionRecord, now: DateTime<Utc>) -> String {
    let project = if record.project.is_empty() {
        "-"
    } else {
        record.project.as_str()
    };

    let mut fields = vec![
        format!("{:<20}", truncate(project, 20)),
        format!("{:<10}", record.status.as_str()),
    ];
    if let Some(tool) = &record.tool_name {
        fields.push(format!("tool={tool}"));
    }
    if !record.model.is_empty() {
        fields.push(format!("model={}", record.model));
    }
    if !record.permission_mode.is_empty() {
        fields.push(format!("mode={}", record.permission_mode));
    }
    fields.push(format!("tools={}", record.tool_count));
    fields.push(format!("up={}", format_duration(record.running_for(now))));
    fields.push(format!(
        "updated={} ({} ago)",
        clock_time(record.last_updated),
        format_duration(record.age(now))
    ));

    let summary = if record.topic.is_empty() {
        record.last_prompt.as_str()
    } else {
        record.topic.as_str()
    };
    if !summary.is_empty() {
        fields.push(format!("\"{}\"", truncate(&single_line(summary), TOPIC_WIDTH)));
    }

    fields.join("  ")
}

fn subagent_line(agent: &SubagentRecord, now: DateTime<Utc>) -> String {
    let agent_type = if agent.agent_type.is_empty() {
        "agent"
    } else {
        agent.agent_type.as_str()
    };
    format!(
        "  └─ {} ({})  running  {}",
        agent_type,
        short_id(&agent.agent_id),
        format_duration(now.signed_duration_since(agent.last_updated))
    )
}

/// Wall-clock `HH:MM:SS` in the local timezone.
pub fn clock_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// Compact duration: `45s`, `12m`, `3h05m`, `2d04h`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.num_seconds().max(0);
    match secs {
        0..=59 => format!("{secs}s"),
        60..=3599 => format!("{}m", secs / 60),
        3600..=86_399 => format!("{}h{:02}m", secs / 3600, (secs % 3600) / 60),
        _ => format!("{}d{:02}h", secs / 86_400, (secs % 86_400) / 3600),
    }
}

fn short_id(id: &str) -> &str {
    id.char_indices().nth(8).map_or(id, |(idx, _)| &id[..idx])
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{kept}…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use monitor_core::{SessionStatus, SubagentStatus};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 31, 0, 0, 0).unwrap() + Duration::seconds(secs)
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::seconds(0)), "0s");
        assert_eq!(format_duration(Duration::seconds(59)), "59s");
        assert_eq!(format_duration(Duration::seconds(61)), "1m");
        assert_eq!(format_duration(Duration::seconds(3600 + 300)), "1h05m");
        assert_eq!(format_duration(Duration::hours(50)), "2d02h");
        assert_eq!(format_duration(Duration::seconds(-5)), "0s");
    }

    #[test]
    fn test_truncate_and_single_line() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
        assert_eq!(single_line("fix\n  the\tbug"), "fix the bug");
        assert_eq!(short_id("agent-123456789"), "agent-12");
        assert_eq!(short_id("a1"), "a1");
    }

    #[test]
    fn test_clock_time_is_local_wall_clock() {
        let stamp = at(3725);
        let expected = stamp.with_timezone(&Local);
        let text = clock_time(stamp);
        assert_eq!(text.len(), 8);
        assert_eq!(text, expected.format("%H:%M:%S").to_string());
    }

    #[test]
    fn test_render_empty_feed() {
        assert_eq!(render(&[], at(0)), "No active sessions\n");
    }

    #[test]
    fn test_render_session_with_subagent() {
        let mut record = SessionRecord::new("s1", at(0));
        record.project = "proj".to_string();
        record.status = SessionStatus::Executing;
        record.tool_name = Some("Bash".to_string());
        record.model = "claude-opus-4".to_string();
        record.permission_mode = "default".to_string();
        record.tool_count = 3;
        record.topic = "fix the bug".to_string();
        record.last_updated = at(90);
        record.subagents.push(SubagentRecord {
            agent_id: "agent-1".to_string(),
            agent_type: "Explore".to_string(),
            status: SubagentStatus::Running,
            last_updated: at(100),
        });

        let text = render(&[record], at(120));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("proj"));
        assert!(lines[0].contains("EXECUTING"));
        assert!(lines[0].contains("tool=Bash"));
        assert!(lines[0].contains("model=claude-opus-4"));
        assert!(lines[0].contains("mode=default"));
        assert!(lines[0].contains("tools=3"));
        assert!(lines[0].contains("up=2m"));
        let updated = format!("updated={} (30s ago)", clock_time(at(90)));
        assert!(lines[0].contains(&updated), "{}", lines[0]);
        assert!(lines[0].contains("\"fix the bug\""));
        assert!(lines[1].contains("Explore (agent-1)"));
        assert!(lines[1].contains("20s"));
    }

    #[test]
    fn test_render_falls_back_to_last_prompt() {
        let mut record = SessionRecord::new("s1", at(0));
        record.last_prompt = "<ide_selection>x</ide_selection>".to_string();
        let text = render(&[record], at(0));
        assert!(text.starts_with('-'));
        assert!(text.contains("<ide_selection>"));
    }
}
