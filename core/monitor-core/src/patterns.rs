//! Compiled regex patterns for cleaning prompt text.
//!
//! Prompts submitted from an IDE or replayed from a transcript carry markup that
//! is noise for a one-line topic. These patterns are compiled once on first use.
//! Update them when Claude Code's prompt markup changes.

use once_cell::sync::Lazy;
use regex::Regex;

/// `<ide_selection>…</ide_selection>`, `<ide_opened_file>…</ide_opened_file>`, etc.
pub static RE_IDE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<ide_\w+>.*?</ide_\w+>").unwrap());
pub static RE_SYSTEM_REMINDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<system-reminder>.*?</system-reminder>").unwrap());

/// Strips IDE context and system-reminder spans, then trims.
pub fn clean_prompt(text: &str) -> String {
    let without_ide = RE_IDE_TAG.replace_all(text, "");
    let cleaned = RE_SYSTEM_REMINDER.replace_all(&without_ide, "");
    cleaned.trim().to_string()
}
