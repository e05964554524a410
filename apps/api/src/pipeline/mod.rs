//! Orchestrator — runs one introduction video end to end.
//!
//! Flow: extract_text → generate_introduction → publish photo →
//!       submit render job → poll to completion.
//!
//! Strictly sequential; each stage starts only after the previous one succeeded.
//! The first failure halts the run, and no earlier stage is retried.

pub mod handlers;

use std::fmt;

use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::extract::{extract_text, ExtractionError};
use crate::imgbb::{ImagePublisher, UploadError};
use crate::introduction::generate_introduction;
use crate::llm_client::{LlmClient, LlmError};
use crate::render::{
    DidClient, RenderError, RenderJobClient, RenderJobRequest, RenderOutcome, SubmissionError,
    TalkApi, Voice,
};

// ────────────────────────────────────────────────────────────────────────────
// Inputs / outputs
// ────────────────────────────────────────────────────────────────────────────

/// Per-user API keys entered in the form. Read-only for the life of one run.
#[derive(Clone)]
pub struct Credentials {
    pub google_api_key: String,
    pub did_api_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("google_api_key", &"<redacted>")
            .field("did_api_key", &"<redacted>")
            .finish()
    }
}

/// A named binary upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct IntroductionSubmission {
    pub resume: UploadedFile,
    pub photo: UploadedFile,
    pub voice: Voice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntroductionVideo {
    pub introduction: String,
    pub image_url: String,
    pub video_url: String,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Error extracting text: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Error generating introduction: {0}")]
    Generation(#[from] LlmError),

    #[error("Error uploading photo: {0}")]
    Upload(#[from] UploadError),

    #[error("Error creating video: {0}")]
    Submission(SubmissionError),

    #[error("{0}")]
    Render(RenderOutcome),
}

impl From<RenderError> for PipelineError {
    fn from(e: RenderError) -> Self {
        match e {
            RenderError::Submission(e) => PipelineError::Submission(e),
            RenderError::Outcome(outcome) => PipelineError::Render(outcome),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

pub struct Pipeline<A> {
    llm: LlmClient,
    publisher: ImagePublisher,
    renderer: RenderJobClient<A>,
}

impl Pipeline<DidClient> {
    /// Wires the production clients. Credentials are passed in explicitly; the
    /// imgBB key and endpoints come from `Config`.
    pub fn from_config(http: &Client, config: &Config, credentials: &Credentials) -> Self {
        Self::new(
            LlmClient::new(
                http.clone(),
                config.gemini_base_url.clone(),
                credentials.google_api_key.clone(),
            ),
            ImagePublisher::new(
                http.clone(),
                config.imgbb_base_url.clone(),
                config.imgbb_api_key.clone(),
            ),
            RenderJobClient::new(
                DidClient::new(
                    http.clone(),
                    config.did_base_url.clone(),
                    credentials.did_api_key.clone(),
                ),
                config.poll_policy(),
            ),
        )
    }
}

impl<A: TalkApi> Pipeline<A> {
    pub fn new(llm: LlmClient, publisher: ImagePublisher, renderer: RenderJobClient<A>) -> Self {
        Self {
            llm,
            publisher,
            renderer,
        }
    }

    pub async fn run(
        &self,
        submission: IntroductionSubmission,
        cancel: &CancellationToken,
    ) -> Result<IntroductionVideo, PipelineError> {
        let IntroductionSubmission {
            resume,
            photo,
            voice,
        } = submission;

        info!("[1/4] Extracting text from '{}'", resume.file_name);
        let resume_text = extract_text(&resume.file_name, resume.bytes).await?;

        info!("[2/4] Generating introduction");
        let introduction = generate_introduction(&self.llm, &resume_text).await?;

        info!("[3/4] Publishing photo '{}'", photo.file_name);
        let image_url = self.publisher.publish(&photo.bytes).await?;

        info!("[4/4] Rendering video");
        let request = RenderJobRequest::new(introduction.clone(), image_url.clone(), voice);
        let video_url = self.renderer.render(&request, cancel).await?;

        Ok(IntroductionVideo {
            introduction,
            image_url,
            video_url,
        })
    }
}
