use tracing::{error, warn};

/// Extracts the text of all pages in order.
///
/// pdf-extract (and its font parsers) can panic on malformed glyph tables, so the
/// call is isolated with `catch_unwind` and a panic surfaces as an ordinary error.
pub(super) fn extract(bytes: &[u8]) -> Result<String, String> {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(bytes)
    })) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => {
            warn!("PDF extraction failed: {e}");
            Err(format!("failed to parse PDF: {e}"))
        }
        Err(_) => {
            error!("PDF extraction panicked, likely a malformed font");
            Err("PDF parser panicked on malformed content".to_string())
        }
    }
}
