use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::pipeline::PipelineError;
use crate::render::RenderOutcome;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Collapses a remote response body to one line so it can be embedded in a
/// user-facing error message.
pub(crate) fn one_line(body: &str) -> String {
    body.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Pipeline(e) => match e {
                PipelineError::Extraction(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "EXTRACTION_ERROR")
                }
                PipelineError::Generation(_) => (StatusCode::BAD_GATEWAY, "LLM_ERROR"),
                PipelineError::Upload(_) => (StatusCode::BAD_GATEWAY, "UPLOAD_ERROR"),
                PipelineError::Submission(_) => (StatusCode::BAD_GATEWAY, "SUBMISSION_ERROR"),
                PipelineError::Render(RenderOutcome::TimedOut { .. }) => {
                    (StatusCode::GATEWAY_TIMEOUT, "RENDER_TIMED_OUT")
                }
                PipelineError::Render(RenderOutcome::Cancelled { .. }) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "RENDER_CANCELLED")
                }
                PipelineError::Render(_) => (StatusCode::BAD_GATEWAY, "RENDER_FAILED"),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match &self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Pipeline(e) => {
                tracing::warn!("Pipeline halted: {e}");
                e.to_string()
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
