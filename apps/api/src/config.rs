use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::render::PollPolicy;

pub const DEFAULT_DID_BASE_URL: &str = "https://api.d-id.com";
pub const DEFAULT_IMGBB_BASE_URL: &str = "https://api.imgbb.com";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
///
/// Per-user credentials (Gemini and D-ID keys) are not part of this struct.
/// They arrive with each request and are threaded into the clients explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    pub imgbb_api_key: String,
    pub did_base_url: String,
    pub imgbb_base_url: String,
    pub gemini_base_url: String,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let poll = parse_poll_policy(
            &env_or("RENDER_POLL_INTERVAL_SECS", "10"),
            &env_or("RENDER_MAX_ATTEMPTS", "20"),
        )?;

        Ok(Config {
            imgbb_api_key: require_env("IMGBB_API_KEY")?,
            did_base_url: env_or("DID_BASE_URL", DEFAULT_DID_BASE_URL),
            imgbb_base_url: env_or("IMGBB_BASE_URL", DEFAULT_IMGBB_BASE_URL),
            gemini_base_url: env_or("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            poll_interval: poll.interval,
            max_poll_attempts: poll.max_attempts,
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", "20971520")
                .parse::<usize>()
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    /// Polling cadence for the video render job.
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: self.poll_interval,
            max_attempts: self.max_poll_attempts,
        }
    }
}

/// Both values must be at least 1, and the total wait `interval × attempts`
/// must fit in a `Duration`.
fn parse_poll_policy(interval_secs: &str, max_attempts: &str) -> Result<PollPolicy> {
    let interval_secs = interval_secs
        .parse::<u64>()
        .context("RENDER_POLL_INTERVAL_SECS must be a whole number of seconds")?;
    let max_attempts = max_attempts
        .parse::<u32>()
        .context("RENDER_MAX_ATTEMPTS must be a positive integer")?;

    if interval_secs == 0 {
        bail!("RENDER_POLL_INTERVAL_SECS must be at least 1");
    }
    if max_attempts == 0 {
        bail!("RENDER_MAX_ATTEMPTS must be a positive integer");
    }

    let interval = Duration::from_secs(interval_secs);
    if interval.checked_mul(max_attempts).is_none() {
        bail!("RENDER_POLL_INTERVAL_SECS × RENDER_MAX_ATTEMPTS is too large");
    }

    Ok(PollPolicy {
        interval,
        max_attempts,
    })
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
