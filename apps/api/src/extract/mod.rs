//! Document Text Extractor — turns an uploaded résumé into plain text.
//!
//! Two container formats are supported: PDF (via pdf-extract) and DOCX (via docx-rs).
//! The format is chosen from the file extension only. Anything else fails fast with
//! `UnsupportedFormat` before any bytes are parsed.
//!
//! No normalization is applied to the extracted text.

mod docx;
mod pdf;

use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported document format '{0}' (expected .pdf or .docx)")]
    UnsupportedFormat(String),

    #[error("Could not read {format} document: {message}")]
    Unreadable {
        format: DocumentFormat,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Resolves the format from the extension after the last `.` (case-insensitive).
    pub fn from_file_name(file_name: &str) -> Result<Self, ExtractionError> {
        let ext = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            _ => Err(ExtractionError::UnsupportedFormat(ext)),
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentFormat::Pdf => f.write_str("PDF"),
            DocumentFormat::Docx => f.write_str("DOCX"),
        }
    }
}

/// Extracts the full text of a document, pages/paragraphs in document order.
///
/// Parsing is CPU-bound and both parsers are synchronous, so the work runs on the
/// blocking pool.
pub async fn extract_text(file_name: &str, bytes: Vec<u8>) -> Result<String, ExtractionError> {
    let format = DocumentFormat::from_file_name(file_name)?;
    let size = bytes.len();

    let text = tokio::task::spawn_blocking(move || extract_sync(format, &bytes))
        .await
        .map_err(|e| ExtractionError::Unreadable {
            format,
            message: format!("extraction task failed: {e}"),
        })??;

    info!(
        "Extracted {} chars from {} document '{}' ({} bytes)",
        text.len(),
        format,
        file_name,
        size
    );
    Ok(text)
}

fn extract_sync(format: DocumentFormat, bytes: &[u8]) -> Result<String, ExtractionError> {
    let text = match format {
        DocumentFormat::Pdf => pdf::extract(bytes),
        DocumentFormat::Docx => docx::extract(bytes),
    }
    .map_err(|message| ExtractionError::Unreadable { format, message })?;

    if text.trim().is_empty() {
        return Err(ExtractionError::Unreadable {
            format,
            message: "document contains no extractable text".to_string(),
        });
    }
    Ok(text)
}
