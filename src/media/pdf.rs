//! PDF text extraction.
//!
//! Extracts the text layer of an uploaded paper with `pdf-extract` and cuts
//! it down to a fixed character budget before it is handed to the analyzer.

use crate::error::MediaError;
use crate::util::truncate_chars;

/// Default number of characters kept from a document.
pub const DEFAULT_MAX_CHARS: usize = 5000;

/// PDF text extractor.
#[derive(Debug, Clone)]
pub struct PdfExtractor {
    /// Maximum number of characters returned.
    max_chars: usize,
}

impl PdfExtractor {
    /// Create a new PDF extractor with the default character budget.
    pub fn new() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
        }
    }

    /// Set the character budget.
    pub fn with_max_chars(mut self, max: usize) -> Self {
        self.max_chars = max;
        self
    }

    /// Extract the concatenated text of all pages, truncated to the budget.
    ///
    /// Malformed, encrypted and unreadable documents all surface as
    /// [`MediaError::ExtractionFailed`].
    pub fn extract(&self, data: &[u8]) -> Result<String, MediaError> {
        if !data.starts_with(b"%PDF") {
            return Err(MediaError::ExtractionFailed {
                reason: "not a valid PDF file (missing %PDF header)".to_string(),
            });
        }

        // pdf-extract panics on some malformed inputs instead of returning an error.
        let extracted = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(data))
            .map_err(|_| MediaError::ExtractionFailed {
                reason: "PDF parser aborted on malformed input".to_string(),
            })?
            .map_err(|e| MediaError::ExtractionFailed {
                reason: e.to_string(),
            })?;

        // Page text comes back with leading line breaks.
        let text = truncate_chars(extracted.trim_start(), self.max_chars).to_string();
        tracing::debug!(
            extracted_chars = extracted.chars().count(),
            kept_chars = text.chars().count(),
            "Extracted PDF text"
        );
        Ok(text)
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a filename looks like a PDF.
pub fn is_pdf_filename(filename: &str) -> bool {
    filename.to_ascii_lowercase().ends_with(".pdf")
}

/// Default paper title for an uploaded file: the filename without `.pdf`.
pub fn title_from_filename(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    if is_pdf_filename(name) {
        name[..name.len() - 4].to_string()
    } else {
        name.to_string()
    }
}
