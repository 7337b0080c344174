//! Result types returned by the conversion entry points.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Files written by a document conversion (caption or plain pipeline).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Plain-text rendering.
    pub text_path: PathBuf,
    /// Word rendering, one paragraph per text line.
    pub docx_path: PathBuf,
    pub stats: ConversionStats,
}

/// Aggregate counters for a document conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages or slides in the source document.
    pub total_units: usize,
    /// Images found across all units (zero for the plain pipeline).
    pub total_images: usize,
    /// Images that received a caption.
    pub captioned_images: usize,
    /// Wall-clock time of the whole conversion in milliseconds.
    pub total_duration_ms: u64,
}

/// File written by the Braille pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrailleOutput {
    pub brf_path: PathBuf,
    /// Paragraphs read from the Word document.
    pub paragraphs: usize,
    /// Characters in the written file, line breaks included.
    pub cells: usize,
}
