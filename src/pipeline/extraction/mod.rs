pub mod layout;
pub mod plain;
pub mod types;

pub use layout::*;
pub use plain::*;
pub use types::*;

use thiserror::Error;

use crate::models::ExtractionStatus;

/// Minimum trimmed length below which extracted text counts as suspect.
const MIN_TEXT_CHARS: usize = 32;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("PDFium library not available: {0}")]
    PdfiumUnavailable(String),

    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("PDF is password-protected")]
    PdfEncrypted,

    #[error("Document has no pages")]
    EmptyDocument,
}

/// Extract text from catalog PDF bytes.
///
/// Layout-aware PDFium text layer first; the sequential extractor as
/// fallback when PDFium is unavailable, fails, or yields only whitespace.
/// Never panics or errors past this boundary — failures come back as an
/// [`ExtractedText`] with status `error` and a readable reason.
pub fn extract_pdf_text(pdf_bytes: &[u8]) -> ExtractedText {
    extract_pdf_text_with(&PdfiumTextSource, &SequentialTextSource, pdf_bytes)
}

/// Same as [`extract_pdf_text`], with injectable extractors for testing.
pub fn extract_pdf_text_with(
    primary: &dyn PdfTextSource,
    fallback: &dyn PdfTextSource,
    pdf_bytes: &[u8],
) -> ExtractedText {
    if pdf_bytes.is_empty() {
        return ExtractedText::error("Empty upload: no PDF bytes received");
    }

    let primary_failure = match primary.extract(pdf_bytes) {
        Ok(text) if !text.trim().is_empty() => {
            return grade_text(text, ExtractionMethod::LayoutAware);
        }
        Ok(_) => "extractor returned only whitespace".to_string(),
        Err(e) => e.to_string(),
    };
    tracing::debug!(
        reason = %primary_failure,
        "Layout-aware extraction unusable, trying sequential fallback"
    );

    match fallback.extract(pdf_bytes) {
        Ok(text) if !text.trim().is_empty() => grade_text(text, ExtractionMethod::Sequential),
        Ok(_) => ExtractedText::error("No text extracted or PDF reader not available"),
        Err(e) => {
            tracing::warn!(
                primary = %primary_failure,
                fallback = %e,
                "Both PDF extractors failed"
            );
            ExtractedText::error(&format!(
                "Text extraction failed: {primary_failure}; fallback: {e}"
            ))
        }
    }
}

/// Non-empty text: `ok` unless suspiciously short after trimming.
fn grade_text(text: String, method: ExtractionMethod) -> ExtractedText {
    let trimmed_len = text.trim().chars().count();
    tracing::info!(
        method = ?method,
        chars = trimmed_len,
        "PDF text extracted"
    );
    if trimmed_len < MIN_TEXT_CHARS {
        ExtractedText {
            text,
            status: ExtractionStatus::Partial,
            reason: Some("No text extracted".to_string()),
            method: Some(method),
        }
    } else {
        ExtractedText {
            text,
            status: ExtractionStatus::Ok,
            reason: None,
            method: Some(method),
        }
    }
}
