//! Asynchronous Video Job Client — drives one remote talking-avatar render to a
//! terminal state.
//!
//! Flow: submit (exactly one creation call) → wait/poll loop → `RenderOutcome`.
//!
//! The remote job has no push notification and cannot be cancelled server-side,
//! so the loop polls at a fixed cadence under a hard attempt ceiling. Waiting is
//! bounded by `interval × max_attempts`.
//!
//! The HTTP wire format lives in `did`; the loop in `job` only sees the
//! `TalkApi` seam, which keeps the cadence testable under paused time.

pub mod did;
pub mod job;
pub mod models;

use async_trait::async_trait;
use thiserror::Error;

pub use did::DidClient;
pub use job::{PollPolicy, RenderJobClient};
pub use models::{RenderJobRequest, RenderOutcome, Voice};

use models::{RenderJobHandle, RenderJobStatus};

/// Job creation failed. No handle exists and no polling happens.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Render service rejected job (status {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Render service accepted job but returned no job id")]
    MissingJobId,

    #[error("Malformed submission response: {0}")]
    Malformed(String),
}

/// A single status poll failed. Always terminal for the loop.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed status response: {0}")]
    Malformed(String),
}

impl PollError {
    pub fn status(&self) -> Option<u16> {
        match self {
            PollError::Status { status, .. } => Some(*status),
            PollError::Http(e) => e.status().map(|s| s.as_u16()),
            PollError::Malformed(_) => None,
        }
    }
}

/// Either the job was never created, or it ended in a non-success outcome.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error("{0}")]
    Outcome(RenderOutcome),
}

/// Remote render service transport: one creation call, one status call.
#[async_trait]
pub trait TalkApi: Send + Sync {
    async fn create(&self, request: &RenderJobRequest) -> Result<RenderJobHandle, SubmissionError>;

    async fn status(&self, handle: &RenderJobHandle) -> Result<RenderJobStatus, PollError>;
}
