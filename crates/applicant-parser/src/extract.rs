//! Text recovery from PDF bytes
//!
//! The parser only needs "the text of every page, in order". That capability
//! sits behind [`TextExtractor`] so callers (and tests) can swap the backend.

use std::panic::{self, AssertUnwindSafe};

use tracing::warn;

use crate::error::ExtractionError;

/// Recovers per-page text from a document held in memory
pub trait TextExtractor: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Text of each page in document order; empty strings for pages with no text
    fn extract_pages(&self, data: &[u8]) -> Result<Vec<String>, ExtractionError>;
}

/// Concatenate page texts in order, newline-joined
pub fn document_text(pages: &[String]) -> String {
    pages.join("\n")
}

/// Default backend built on `pdf-extract`
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for PdfTextExtractor {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn extract_pages(&self, data: &[u8]) -> Result<Vec<String>, ExtractionError> {
        if data.len() < 5 || &data[0..5] != b"%PDF-" {
            return Err(ExtractionError::NotPdf);
        }

        // pdf-extract panics on some malformed inputs; keep that inside this call
        let extracted = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(data)
        }))
        .map_err(|payload| {
            let reason = panic_message(payload.as_ref());
            warn!(backend = self.name(), %reason, "text extraction panicked");
            ExtractionError::Panicked(reason)
        })?;

        let text = extracted.map_err(|e| classify_error(&e.to_string()))?;

        // Pages come back separated by form feeds when the backend emits them
        Ok(text.split('\x0C').map(str::to_string).collect())
    }
}

fn classify_error(message: &str) -> ExtractionError {
    let lowered = message.to_lowercase();
    if lowered.contains("encrypted") || lowered.contains("password") {
        ExtractionError::PasswordProtected
    } else {
        ExtractionError::Parse(message.to_string())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
