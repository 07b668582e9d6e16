//! Media handling module.
//!
//! Uploaded papers arrive as PDF bytes; this module turns them into the
//! plain text the analyzer works on.

mod pdf;

pub use pdf::{DEFAULT_MAX_CHARS, PdfExtractor, is_pdf_filename, title_from_filename};
