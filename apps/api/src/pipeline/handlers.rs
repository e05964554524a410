use axum::{
    extract::{multipart::Field, Multipart, State},
    Json,
};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::imgbb::is_supported_image;
use crate::pipeline::{Credentials, IntroductionSubmission, IntroductionVideo, Pipeline, UploadedFile};
use crate::render::Voice;
use crate::state::AppState;

/// Raw multipart fields as received. Validated into a submission in one place.
#[derive(Default)]
struct IntroductionForm {
    google_api_key: Option<String>,
    did_api_key: Option<String>,
    resume: Option<UploadedFile>,
    photo: Option<UploadedFile>,
    gender: Option<String>,
}

impl IntroductionForm {
    async fn read(multipart: &mut Multipart) -> Result<Self, AppError> {
        let mut form = IntroductionForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read multipart field: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "google_api_key" => form.google_api_key = Some(read_text(field).await?),
                "did_api_key" => form.did_api_key = Some(read_text(field).await?),
                "gender" => form.gender = Some(read_text(field).await?),
                "resume" => form.resume = Some(read_file(field).await?),
                "photo" => form.photo = Some(read_file(field).await?),
                // Unknown fields are ignored.
                _ => {}
            }
        }

        Ok(form)
    }

    fn validate(self) -> Result<(Credentials, IntroductionSubmission), AppError> {
        let google_api_key = required_text(self.google_api_key, "google_api_key")?;
        let did_api_key = required_text(self.did_api_key, "did_api_key")?;
        let resume = required_file(self.resume, "resume")?;
        let photo = required_file(self.photo, "photo")?;

        if !is_supported_image(&photo.file_name) {
            return Err(AppError::Validation(format!(
                "Photo '{}' must be a JPG, JPEG or PNG image",
                photo.file_name
            )));
        }

        let voice = required_text(self.gender, "gender")?
            .parse::<Voice>()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        Ok((
            Credentials {
                google_api_key,
                did_api_key,
            },
            IntroductionSubmission {
                resume,
                photo,
                voice,
            },
        ))
    }
}

async fn read_text(field: Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read form field: {e}")))
}

async fn read_file(field: Field<'_>) -> Result<UploadedFile, AppError> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read file '{file_name}': {e}")))?;
    Ok(UploadedFile {
        file_name,
        bytes: bytes.to_vec(),
    })
}

fn required_text(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("Missing required field '{field}'")))
}

fn required_file(value: Option<UploadedFile>, field: &str) -> Result<UploadedFile, AppError> {
    value
        .filter(|f| !f.bytes.is_empty())
        .ok_or_else(|| AppError::Validation(format!("Missing required file '{field}'")))
}

/// POST /api/v1/introductions
///
/// Runs the full pipeline for one user action. Holds the request open while
/// the render job is polled.
pub async fn handle_create_introduction(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IntroductionVideo>, AppError> {
    let (credentials, submission) = IntroductionForm::read(&mut multipart).await?.validate()?;

    let span = info_span!("introduction", request_id = %Uuid::new_v4());
    span.in_scope(|| {
        info!(
            "Introduction requested: resume='{}' photo='{}' voice={:?}",
            submission.resume.file_name, submission.photo.file_name, submission.voice
        )
    });

    let pipeline = Pipeline::from_config(&state.http, &state.config, &credentials);
    let cancel = state.shutdown.child_token();
    let video = pipeline.run(submission, &cancel).instrument(span).await?;

    Ok(Json(video))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> Option<UploadedFile> {
        Some(UploadedFile {
            file_name: name.to_string(),
            bytes: vec![1, 2, 3],
        })
    }

    fn complete_form() -> IntroductionForm {
        IntroductionForm {
            google_api_key: Some("g".to_string()),
            did_api_key: Some("d".to_string()),
            resume: file("cv.pdf"),
            photo: file("me.jpg"),
            gender: Some("Female".to_string()),
        }
    }

    #[test]
    fn test_complete_form_validates() {
        let (creds, submission) = complete_form().validate().unwrap();
        assert_eq!(creds.google_api_key, "g");
        assert_eq!(submission.voice, Voice::Female);
    }

    #[test]
    fn test_blank_key_is_missing() {
        let form = IntroductionForm {
            did_api_key: Some("   ".to_string()),
            ..complete_form()
        };
        let err = form.validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("did_api_key")));
    }

    #[test]
    fn test_empty_resume_is_missing() {
        let form = IntroductionForm {
            resume: Some(UploadedFile {
                file_name: "cv.pdf".to_string(),
                bytes: vec![],
            }),
            ..complete_form()
        };
        assert!(matches!(form.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_photo_must_be_image() {
        let form = IntroductionForm {
            photo: file("me.gif"),
            ..complete_form()
        };
        let err = form.validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("me.gif")));
    }

    #[test]
    fn test_unknown_gender_rejected() {
        let form = IntroductionForm {
            gender: Some("robot".to_string()),
            ..complete_form()
        };
        assert!(matches!(form.validate(), Err(AppError::Validation(_))));
    }
}
