//! `claude-monitor usage-hook`: refresh `<root>/usage.json`.
//!
//! Reads Claude Code's OAuth token, fetches the account usage payload, and
//! writes it atomically. Any failure leaves the previous file untouched.

use std::env;
use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use monitor_core::atomic::write_atomic;
use monitor_core::{MonitorError, StorageConfig, UsageConfig};
use serde::Deserialize;

/// Token override, mainly for platforms without a keychain.
pub const TOKEN_ENV: &str = "CLAUDE_MONITOR_USAGE_TOKEN";

const BETA_HEADER: &str = "anthropic-beta";
const BETA_VALUE: &str = "oauth-2025-04-20";
const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    #[error("No OAuth credential available")]
    MissingCredential,

    #[error("Credential store lookup failed: {0}")]
    Keychain(String),

    #[error("Credential payload malformed: {0}")]
    MalformedCredential(#[source] serde_json::Error),

    #[error("Usage request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Usage payload is not valid JSON: {0}")]
    InvalidPayload(#[source] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] MonitorError),
}

#[derive(Deserialize)]
struct Credentials {
    #[serde(rename = "claudeAiOauth")]
    oauth: Option<OauthCredentials>,
}

#[derive(Deserialize)]
struct OauthCredentials {
    #[serde(rename = "accessToken")]
    access_token: Option<String>,
}

pub fn run(storage: &StorageConfig, config: &UsageConfig) -> Result<(), UsageError> {
    let token = access_token(config)?;
    let body = fetch(config, &token)?;
    write_usage(storage, &body)?;
    tracing::info!(bytes = body.len(), "Usage payload written");
    Ok(())
}

fn access_token(config: &UsageConfig) -> Result<String, UsageError> {
    if let Some(token) = env::var(TOKEN_ENV).ok().filter(|token| !token.is_empty()) {
        return Ok(token);
    }
    let mut command = Command::new("security");
    command.args(["find-generic-password", "-s", config.keychain_service.as_str(), "-w"]);
    let raw = run_with_timeout(command, Duration::from_secs(config.keychain_timeout_secs))?;
    parse_access_token(&raw)
}

/// Runs `command` and returns its trimmed stdout. The child is killed if it
/// has not exited within `timeout`.
fn run_with_timeout(mut command: Command, timeout: Duration) -> Result<String, UsageError> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|err| UsageError::Keychain(err.to_string()))?;

    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                if !status.success() {
                    return Err(UsageError::MissingCredential);
                }
                let mut output = String::new();
                if let Some(mut stdout) = child.stdout.take() {
                    stdout
                        .read_to_string(&mut output)
                        .map_err(|err| UsageError::Keychain(err.to_string()))?;
                }
                return Ok(output.trim().to_string());
            }
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(UsageError::Keychain("timed out".to_string()));
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(err) => return Err(UsageError::Keychain(err.to_string())),
        }
    }
}

/// Extracts `claudeAiOauth.accessToken` from the stored credential JSON.
pub fn parse_access_token(raw: &str) -> Result<String, UsageError> {
    let credentials: Credentials =
        serde_json::from_str(raw).map_err(UsageError::MalformedCredential)?;
    credentials
        .oauth
        .and_then(|oauth| oauth.access_token)
        .filter(|token| !token.is_empty())
        .ok_or(UsageError::MissingCredential)
}

fn fetch(config: &UsageConfig, token: &str) -> Result<String, UsageError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let body = client
        .get(&config.endpoint)
        .header(reqwest::header::ACCEPT, "application/json")
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .header(BETA_HEADER, BETA_VALUE)
        .bearer_auth(token)
        .send()?
        .error_for_status()?
        .text()?;
    Ok(body)
}

/// Writes `body` to the usage file if it parses as JSON.
pub fn write_usage(storage: &StorageConfig, body: &str) -> Result<(), UsageError> {
    serde_json::from_str::<serde_json::Value>(body).map_err(UsageError::InvalidPayload)?;
    write_atomic(&storage.usage_file(), body.as_bytes())?;
    Ok(())
}
