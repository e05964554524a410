//! Image Publisher — uploads the profile photo to imgBB so the render service
//! can fetch it from a public URL.
//!
//! Exactly one upload attempt per call; no retry.

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::errors::one_line;

/// Photo extensions accepted by the upload form.
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image host rejected upload (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed image host response: {0}")]
    Malformed(String),
}

#[derive(Debug, Deserialize)]
struct Envelope {
    status: u16,
    data: Option<EnvelopeData>,
    error: Option<EnvelopeError>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    url: String,
}

#[derive(Debug, Deserialize)]
struct EnvelopeError {
    message: String,
}

/// True if the file name carries one of the accepted photo extensions.
pub fn is_supported_image(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .is_some_and(|ext| ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

#[derive(Clone)]
pub struct ImagePublisher {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ImagePublisher {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: String) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }

    /// Uploads the image and returns its public URL.
    pub async fn publish(&self, image: &[u8]) -> Result<String, UploadError> {
        let url = format!("{}/1/upload", self.base_url.trim_end_matches('/'));
        let encoded = STANDARD.encode(image);

        let response = self
            .client
            .post(url)
            .form(&[("key", self.api_key.as_str()), ("image", encoded.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() != 200 {
            let body = response.text().await.unwrap_or_default();
            warn!("imgBB returned {}: {}", status, body);
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                message: one_line(&body),
            });
        }

        let body = response.text().await?;
        let envelope: Envelope =
            serde_json::from_str(&body).map_err(|e| UploadError::Malformed(e.to_string()))?;

        if envelope.status != 200 {
            let message = envelope
                .error
                .map(|e| one_line(&e.message))
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(UploadError::Rejected {
                status: envelope.status,
                message,
            });
        }

        let url = envelope
            .data
            .map(|d| d.url)
            .ok_or_else(|| UploadError::Malformed("missing data.url".to_string()))?;

        info!("Published image ({} bytes) to {}", image.len(), url);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use httpmock::MockServer;

    use super::*;

    fn publisher(server: &MockServer) -> ImagePublisher {
        ImagePublisher::new(Client::new(), server.base_url(), "imgbb-key".to_string())
    }

    #[test]
    fn test_supported_image_extensions() {
        assert!(is_supported_image("me.jpg"));
        assert!(is_supported_image("me.JPEG"));
        assert!(is_supported_image("me.png"));
        assert!(!is_supported_image("me.gif"));
        assert!(!is_supported_image("me"));
    }

    #[tokio::test]
    async fn test_publish_returns_public_url() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("POST")
                .path("/1/upload")
                .header("content-type", "application/x-www-form-urlencoded")
                // base64("abc") == "YWJj"
                .body_includes("image=YWJj")
                .body_includes("key=imgbb-key");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"status":200,"success":true,"data":{"url":"https://i.ibb.co/x/me.png"}}"#);
        });

        let url = publisher(&server).publish(b"abc").await.unwrap();
        assert_eq!(url, "https://i.ibb.co/x/me.png");
        mock.assert();
    }

    #[tokio::test]
    async fn test_http_failure_is_rejected_with_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("POST").path("/1/upload");
            then.status(400).body("Invalid API v1 key.");
        });

        let err = publisher(&server).publish(b"abc").await.unwrap_err();
        match err {
            UploadError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid API v1 key.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        mock.assert();
    }

    #[tokio::test]
    async fn test_envelope_error_is_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("POST").path("/1/upload");
            then.status(200)
                .body(r#"{"status":400,"error":{"message":"Empty upload source."}}"#);
        });

        let err = publisher(&server).publish(b"").await.unwrap_err();
        assert!(
            matches!(err, UploadError::Rejected { status: 400, ref message } if message == "Empty upload source.")
        );
    }

    #[tokio::test]
    async fn test_missing_url_is_malformed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("POST").path("/1/upload");
            then.status(200).body(r#"{"status":200,"data":{}}"#);
        });

        let err = publisher(&server).publish(b"abc").await.unwrap_err();
        assert!(matches!(err, UploadError::Malformed(_)));
    }
}
