//! Sequential PDF text extraction via `pdf-extract`.
//!
//! No layout fidelity: words arrive in content-stream order and line
//! structure is approximate. Used only when the PDFium text layer is
//! unavailable or produced nothing.

use tracing::debug;

use super::types::PdfTextSource;
use super::ExtractError;

/// Fallback text source without layout reconstruction.
pub struct SequentialTextSource;

impl PdfTextSource for SequentialTextSource {
    fn extract(&self, pdf_bytes: &[u8]) -> Result<String, ExtractError> {
        let text = pdf_extract::extract_text_from_mem(pdf_bytes).map_err(|e| {
            let msg = e.to_string();
            let lower = msg.to_lowercase();
            if lower.contains("password") || lower.contains("encrypt") {
                ExtractError::PdfEncrypted
            } else {
                ExtractError::PdfParsing(format!("Sequential extraction failed: {msg}"))
            }
        })?;

        // Page breaks arrive as form feeds; the parser wants plain lines.
        let text = text.replace('\x0C', "\n");

        debug!(chars = text.len(), "Sequential extraction complete");
        Ok(text)
    }
}
