use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Container format requested for every render. Not configurable.
pub const OUTPUT_FORMAT: &str = "mp4";

// ────────────────────────────────────────────────────────────────────────────
// Voice
// ────────────────────────────────────────────────────────────────────────────

/// The two fixed narrator voices, selected by the form's gender field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Voice {
    Male,
    Female,
}

impl Voice {
    /// Provider voice identifier sent to the render service.
    pub fn voice_id(self) -> &'static str {
        match self {
            Voice::Male => "en-IN-PrabhatNeural",
            Voice::Female => "en-IN-NeerjaNeural",
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown gender '{0}' (expected male or female)")]
pub struct UnknownVoice(pub String);

impl FromStr for Voice {
    type Err = UnknownVoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Voice::Male),
            "female" => Ok(Voice::Female),
            _ => Err(UnknownVoice(s.to_string())),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Request / handle / status
// ────────────────────────────────────────────────────────────────────────────

/// Everything the render service needs for one talking-avatar video.
/// Fields are private: a request is immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderJobRequest {
    narrative_text: String,
    source_image_url: String,
    voice: Voice,
}

impl RenderJobRequest {
    pub fn new(
        narrative_text: impl Into<String>,
        source_image_url: impl Into<String>,
        voice: Voice,
    ) -> Self {
        Self {
            narrative_text: narrative_text.into(),
            source_image_url: source_image_url.into(),
            voice,
        }
    }

    pub fn narrative_text(&self) -> &str {
        &self.narrative_text
    }

    pub fn source_image_url(&self) -> &str {
        &self.source_image_url
    }

    pub fn voice(&self) -> Voice {
        self.voice
    }

    pub fn output_format(&self) -> &'static str {
        OUTPUT_FORMAT
    }
}

/// Identifies one remote job for the lifetime of the polling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderJobHandle {
    job_id: String,
    status_url: String,
}

impl RenderJobHandle {
    pub fn new(job_id: impl Into<String>, status_url: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status_url: status_url.into(),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn status_url(&self) -> &str {
        &self.status_url
    }
}

/// One observation of the remote job. `Pending` carries the raw status string
/// ("created", "started", ...) for logging only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderJobStatus {
    Pending(String),
    Done { result_url: String },
    Error { message: String },
}

// ────────────────────────────────────────────────────────────────────────────
// Outcome
// ────────────────────────────────────────────────────────────────────────────

/// Terminal result of polling one job. Exactly one of these is produced per handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Succeeded { result_url: String },
    /// The render service reported the job as failed.
    RenderFailed { message: String },
    /// The attempt ceiling was reached while the job was still pending.
    TimedOut { attempts: u32 },
    /// A status poll returned non-200 or could not be read. Never retried.
    TransportFailed { status: Option<u16>, message: String },
    Cancelled { attempts: u32 },
}

impl fmt::Display for RenderOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderOutcome::Succeeded { result_url } => write!(f, "Video ready at {result_url}"),
            RenderOutcome::RenderFailed { message } => {
                write!(f, "Video generation failed: {message}")
            }
            RenderOutcome::TimedOut { attempts } => {
                write!(f, "Video generation timed out after {attempts} status checks")
            }
            RenderOutcome::TransportFailed {
                status: Some(status),
                message,
            } => write!(f, "Error checking status: {status} {message}"),
            RenderOutcome::TransportFailed {
                status: None,
                message,
            } => write!(f, "Error checking status: {message}"),
            RenderOutcome::Cancelled { attempts } => {
                write!(f, "Video generation cancelled after {attempts} status checks")
            }
        }
    }
}
