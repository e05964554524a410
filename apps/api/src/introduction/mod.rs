//! Summary Generator — turns extracted résumé text into the narrative script
//! the avatar will speak.
//!
//! A single non-streamed generation call. No retry, no length cap, no filtering
//! beyond what the model applies itself.

pub mod prompts;

use tracing::info;

use crate::introduction::prompts::INTRODUCTION_PROMPT;
use crate::llm_client::{LlmClient, LlmError};

pub fn build_prompt(resume_text: &str) -> String {
    INTRODUCTION_PROMPT.replace("{resume_text}", resume_text)
}

pub async fn generate_introduction(
    llm: &LlmClient,
    resume_text: &str,
) -> Result<String, LlmError> {
    let introduction = llm.call_text(&build_prompt(resume_text)).await?;
    info!("Generated introduction ({} chars)", introduction.len());
    Ok(introduction)
}
