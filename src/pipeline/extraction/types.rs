use serde::{Deserialize, Serialize};

use super::ExtractError;
use crate::models::ExtractionStatus;

/// Result of text extraction from one PDF byte stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedText {
    pub text: String,
    pub status: ExtractionStatus,
    pub reason: Option<String>,
    pub method: Option<ExtractionMethod>,
}

impl ExtractedText {
    pub fn error(reason: &str) -> Self {
        Self {
            text: String::new(),
            status: ExtractionStatus::Error,
            reason: Some(reason.to_string()),
            method: None,
        }
    }
}

/// How the text was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionMethod {
    /// PDFium text layer — preserves line breaks and word spacing.
    LayoutAware,
    /// Sequential extraction without layout fidelity.
    Sequential,
}

/// PDF text extraction abstraction (allows mocking for tests).
pub trait PdfTextSource {
    fn extract(&self, pdf_bytes: &[u8]) -> Result<String, ExtractError>;
}

/// Mock text source returning a fixed text or a fixed failure.
pub struct MockTextSource {
    result: Result<String, String>,
}

impl MockTextSource {
    pub fn with_text(text: &str) -> Self {
        Self {
            result: Ok(text.to_string()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            result: Err(reason.to_string()),
        }
    }
}

impl PdfTextSource for MockTextSource {
    fn extract(&self, _pdf_bytes: &[u8]) -> Result<String, ExtractError> {
        match &self.result {
            Ok(text) => Ok(text.clone()),
            Err(reason) => Err(ExtractError::PdfParsing(reason.clone())),
        }
    }
}
