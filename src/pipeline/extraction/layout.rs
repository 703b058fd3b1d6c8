//! Layout-aware PDF text extraction via the Google PDFium text layer.
//!
//! PDFium reconstructs lines and word spacing from glyph positions, so
//! headers, wrapped titles and bullet lists come out with their line
//! structure intact — the structural parser depends on that. The library is
//! loaded dynamically per operation: the upstream `Pdfium` type is `!Send`,
//! and the OS caches `dlopen`/`LoadLibrary`, so repeat loads are near-free.
//! A host without PDFium installed is the "extractor unavailable" case and
//! routes callers to the sequential fallback.

use pdfium_render::prelude::*;
use tracing::debug;

use super::types::PdfTextSource;
use super::ExtractError;

/// Text source backed by the PDFium text layer.
pub struct PdfiumTextSource;

/// Load the PDFium dynamic library.
///
/// Discovery order:
/// 1. `PDFIUM_DYNAMIC_LIB_PATH` env var (explicit path to library file)
/// 2. Alongside the running executable
/// 3. System library search paths
fn load_pdfium() -> Result<Pdfium, ExtractError> {
    // 1. Explicit path via env var
    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        debug!(path = %path, "Loading PDFium from env var");
        let bindings = Pdfium::bind_to_library(&path).map_err(|e| {
            ExtractError::PdfiumUnavailable(format!("Failed to load PDFium from {path}: {e}"))
        })?;
        return Ok(Pdfium::new(bindings));
    }

    // 2. Alongside the executable (dev / portable layout).
    // pdfium_platform_library_name_at_path() handles platform naming:
    //   Windows → pdfium.dll | Linux → libpdfium.so | macOS → libpdfium.dylib
    if let Ok(exe) = std::env::current_exe() {
        if let Some(exe_dir) = exe.parent() {
            let lib_path =
                Pdfium::pdfium_platform_library_name_at_path(exe_dir.to_string_lossy().as_ref());
            if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
                debug!(dir = %exe_dir.display(), "Loaded PDFium from executable directory");
                return Ok(Pdfium::new(bindings));
            }
        }
    }

    // 3. System library
    let bindings = Pdfium::bind_to_system_library().map_err(|e| {
        ExtractError::PdfiumUnavailable(format!(
            "PDFium library not found. Set PDFIUM_DYNAMIC_LIB_PATH or install PDFium: {e}"
        ))
    })?;
    Ok(Pdfium::new(bindings))
}

/// Map PDF load errors — detect encrypted PDFs for a clear status reason.
fn map_load_error(e: PdfiumError) -> ExtractError {
    let msg = format!("{e}");
    let lower = msg.to_lowercase();
    if lower.contains("password") || lower.contains("encrypt") {
        ExtractError::PdfEncrypted
    } else {
        ExtractError::PdfParsing(format!("Failed to load PDF: {e}"))
    }
}

impl PdfTextSource for PdfiumTextSource {
    fn extract(&self, pdf_bytes: &[u8]) -> Result<String, ExtractError> {
        let pdfium = load_pdfium()?;
        let document = pdfium
            .load_pdf_from_byte_slice(pdf_bytes, None)
            .map_err(map_load_error)?;

        let page_count = document.pages().len();
        if page_count == 0 {
            return Err(ExtractError::EmptyDocument);
        }

        let mut pages = Vec::with_capacity(page_count as usize);
        for page in document.pages().iter() {
            let text = page.text().map(|t| t.all()).unwrap_or_default();
            pages.push(text);
        }

        debug!(pages = pages.len(), "PDFium text layer extracted");
        Ok(pages.join("\n"))
    }
}
