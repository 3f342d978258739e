//! Lazy reader for Claude Code session transcripts.
//!
//! Transcripts are JSON-lines files where each line is one message record. The
//! monitor only ever needs the first user-authored prompt, to backfill a topic for
//! sessions that started before the monitor was installed, so reading stops as soon
//! as one is found. Unparsable lines are skipped; an I/O error ends the scan.

use std::io::{BufRead, BufReader};
use std::path::Path;

use fs_err as fs;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{MonitorError, Result};
use crate::patterns::clean_prompt;

/// One line of a transcript. Only the fields the monitor reads are modeled.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptEntry {
    #[serde(rename = "type", default)]
    pub entry_type: String,
    #[serde(default)]
    pub message: Option<TranscriptMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptMessage {
    #[serde(default)]
    pub content: Value,
}

impl TranscriptEntry {
    /// Plain-text content of a user message. Tool results and other structured
    /// content arrive as arrays and are not prompts.
    pub fn user_text(&self) -> Option<&str> {
        if self.entry_type != "user" {
            return None;
        }
        self.message.as_ref()?.content.as_str()
    }
}

/// Opens a transcript and yields its entries lazily.
pub fn entries(path: &Path) -> Result<impl Iterator<Item = TranscriptEntry>> {
    let file = fs::File::open(path).map_err(|err| MonitorError::io("Failed to open transcript", err))?;

    Ok(BufReader::new(file)
        .lines()
        .map_while(|line| line.ok())
        .filter_map(|line| serde_json::from_str::<TranscriptEntry>(&line).ok()))
}

/// First user prompt in the transcript that is non-empty after cleaning.
pub fn first_user_topic(path: &Path) -> Option<String> {
    let entries = match entries(path) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::debug!(error = %err, "Transcript unavailable for topic backfill");
            return None;
        }
    };

    entries
        .filter_map(|entry| entry.user_text().map(clean_prompt))
        .find(|topic| !topic.is_empty())
}

/// Source of historical prompts used to backfill a session's topic.
pub trait TranscriptSource {
    fn first_user_topic(&self, path: &Path) -> Option<String>;
}

/// Reads Claude Code's JSONL transcripts from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonlTranscripts;

impl TranscriptSource for JsonlTranscripts {
    fn first_user_topic(&self, path: &Path) -> Option<String> {
        first_user_topic(path)
    }
}
