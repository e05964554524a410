//! D-ID `/talks` wire format.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::errors::one_line;
use crate::render::models::{RenderJobHandle, RenderJobRequest, RenderJobStatus};
use crate::render::{PollError, SubmissionError, TalkApi};

const VOICE_PROVIDER: &str = "microsoft";
const DEFAULT_EXPRESSION: &str = "happy";
const DEFAULT_ERROR_MESSAGE: &str = "Error in video generation";

#[derive(Debug, Serialize)]
struct CreateTalkRequest<'a> {
    script: Script<'a>,
    config: TalkConfig<'a>,
    source_url: &'a str,
}

#[derive(Debug, Serialize)]
struct Script<'a> {
    #[serde(rename = "type")]
    script_type: &'a str,
    input: &'a str,
    provider: Provider<'a>,
}

#[derive(Debug, Serialize)]
struct Provider<'a> {
    #[serde(rename = "type")]
    provider_type: &'a str,
    voice_id: &'a str,
}

#[derive(Debug, Serialize)]
struct TalkConfig<'a> {
    stitch: bool,
    result_format: &'a str,
    driver_expressions: DriverExpressions<'a>,
}

#[derive(Debug, Serialize)]
struct DriverExpressions<'a> {
    expressions: Vec<Expression<'a>>,
}

#[derive(Debug, Serialize)]
struct Expression<'a> {
    start_frame: u32,
    expression: &'a str,
    intensity: u32,
}

impl<'a> CreateTalkRequest<'a> {
    fn from_request(request: &'a RenderJobRequest) -> Self {
        Self {
            script: Script {
                script_type: "text",
                input: request.narrative_text(),
                provider: Provider {
                    provider_type: VOICE_PROVIDER,
                    voice_id: request.voice().voice_id(),
                },
            },
            config: TalkConfig {
                stitch: true,
                result_format: request.output_format(),
                driver_expressions: DriverExpressions {
                    // One cue at the first frame; the avatar holds it for the whole clip.
                    expressions: vec![Expression {
                        start_frame: 0,
                        expression: DEFAULT_EXPRESSION,
                        intensity: 1,
                    }],
                },
            },
            source_url: request.source_image_url(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateTalkResponse {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TalkStatusResponse {
    status: String,
    result_url: Option<String>,
    error: Option<Value>,
}

impl TalkStatusResponse {
    fn into_status(self) -> Result<RenderJobStatus, PollError> {
        match self.status.as_str() {
            "done" => self
                .result_url
                .map(|result_url| RenderJobStatus::Done { result_url })
                .ok_or_else(|| PollError::Malformed("done without result_url".to_string())),
            "error" => Ok(RenderJobStatus::Error {
                message: self
                    .error
                    .as_ref()
                    .and_then(error_description)
                    .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()),
            }),
            _ => Ok(RenderJobStatus::Pending(self.status.clone())),
        }
    }
}

/// D-ID reports failures either as a bare string or as `{kind, description}`.
fn error_description(error: &Value) -> Option<String> {
    match error {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("description")
            .or_else(|| map.get("message"))
            .and_then(Value::as_str)
            .map(String::from),
        _ => None,
    }
}

/// reqwest-backed `TalkApi` for the D-ID talks endpoint.
#[derive(Clone)]
pub struct DidClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl DidClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: String) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn talks_url(&self) -> String {
        format!("{}/talks", self.base_url)
    }

    fn status_url(&self, job_id: &str) -> String {
        format!("{}/talks/{job_id}", self.base_url)
    }

    /// D-ID keys are issued already in Basic form, so the key is sent verbatim.
    fn with_headers(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("accept", "application/json")
            .header("content-type", "application/json")
            .header("authorization", format!("Basic {}", self.api_key))
    }
}

#[async_trait]
impl TalkApi for DidClient {
    async fn create(&self, request: &RenderJobRequest) -> Result<RenderJobHandle, SubmissionError> {
        let body = CreateTalkRequest::from_request(request);
        let response = self
            .with_headers(self.client.post(self.talks_url()))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() != 201 {
            let body = response.text().await.unwrap_or_default();
            return Err(SubmissionError::Rejected {
                status: status.as_u16(),
                body: one_line(&body),
            });
        }

        let text = response.text().await?;
        let created: CreateTalkResponse =
            serde_json::from_str(&text).map_err(|e| SubmissionError::Malformed(e.to_string()))?;
        let job_id = created
            .id
            .filter(|id| !id.is_empty())
            .ok_or(SubmissionError::MissingJobId)?;

        let status_url = self.status_url(&job_id);
        Ok(RenderJobHandle::new(job_id, status_url))
    }

    async fn status(&self, handle: &RenderJobHandle) -> Result<RenderJobStatus, PollError> {
        let response = self
            .with_headers(self.client.get(handle.status_url()))
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(PollError::Status {
                status: status.as_u16(),
                body: one_line(&body),
            });
        }

        let text = response.text().await?;
        debug!("Render job {} status body: {}", handle.job_id(), text);
        let parsed: TalkStatusResponse =
            serde_json::from_str(&text).map_err(|e| PollError::Malformed(e.to_string()))?;
        parsed.into_status()
    }
}
