//! Error types for the lecture-a11y library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ConvertError`]: **Fatal**: the conversion cannot proceed at all
//!   (unsupported upload, unreadable document, captioning service down).
//!   Returned as `Err(ConvertError)` from the `convert*` entry points.
//!
//! * [`CellError`]: **Non-fatal**: a character or line has no Braille
//!   rendering. The Braille pipeline substitutes blanks for it and carries
//!   on, so this error never reaches the caller of
//!   [`crate::convert::convert_to_braille`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the lecture-a11y library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The extension is not one the requested pipeline understands.
    #[error("Unsupported format '{extension}': expected {expected}")]
    UnsupportedFormat { extension: String, expected: String },

    /// Wrong document type for the Braille pipeline (only Word documents).
    #[error("Unsupported input '{name}': only .docx files can be converted to Braille")]
    UnsupportedInput { name: String },

    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// The file exists but its leading bytes do not match its extension.
    #[error("File '{path}' is not a valid {expected} document\nFirst bytes: {magic:?}")]
    NotADocument {
        path: PathBuf,
        expected: &'static str,
        magic: [u8; 4],
    },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    // ── Document errors ───────────────────────────────────────────────────
    /// Container, XML or PDF structure could not be parsed.
    #[error("Document '{path}' is corrupt: {detail}")]
    CorruptDocument { path: PathBuf, detail: String },

    /// Extraction produced units that do not line up (gap in unit indices,
    /// or an image pointing at a unit that has no text block).
    #[error("Inconsistent extraction: {0}")]
    InconsistentUnits(String),

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium (file or directory) or install\n\
pdfium where the system loader can find it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Captioning errors ─────────────────────────────────────────────────
    /// The vision model could not be reached, loaded, or failed to answer.
    #[error("Caption service unavailable: {detail}")]
    CaptionUnavailable { detail: String },

    // ── Job errors ────────────────────────────────────────────────────────
    /// Status query for an unknown job identifier.
    #[error("No conversion job with id '{file_id}'")]
    NotFound { file_id: String },

    /// The job table could not be read or written.
    #[error("Job store error: {0}")]
    Database(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// `true` for errors caused by what the caller sent rather than by the
    /// server or its collaborators.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ConvertError::UnsupportedFormat { .. }
                | ConvertError::UnsupportedInput { .. }
                | ConvertError::NotADocument { .. }
                | ConvertError::CorruptDocument { .. }
                | ConvertError::NotFound { .. }
        )
    }
}

/// Text `braillify` could not render.
///
/// Produced by [`crate::braille::translit`]; the Braille pipeline turns the
/// affected characters into blank cells.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CellError {
    /// A single character has no rendering.
    #[error("No Braille rendering for {ch:?} (U+{:04X}): {reason}", code_point(.ch))]
    Untranslatable { ch: char, reason: String },

    /// A line was rejected as a whole.
    #[error("Braille translation rejected {text:?}: {reason}")]
    Rejected { text: String, reason: String },
}

fn code_point(ch: &char) -> u32 {
    u32::from(*ch)
}
