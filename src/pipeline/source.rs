//! Source format detection.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Document formats the service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Pdf,
    Pptx,
    Docx,
}

impl SourceFormat {
    /// Detect the format from the extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "pptx" => Some(Self::Pptx),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    /// Format of a document accepted by the text/caption pipelines.
    pub fn lecture_from_path(path: &Path) -> Result<Self, ConvertError> {
        match Self::from_path(path) {
            Some(f @ (Self::Pdf | Self::Pptx)) => Ok(f),
            _ => Err(ConvertError::UnsupportedFormat {
                extension: extension_of(path),
                expected: ".pdf or .pptx".into(),
            }),
        }
    }

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Pptx => "pptx",
            Self::Docx => "docx",
        }
    }

    /// Leading bytes every file of this format starts with.
    ///
    /// PPTX and DOCX are both zip containers.
    pub fn magic(self) -> &'static [u8; 4] {
        match self {
            Self::Pdf => b"%PDF",
            Self::Pptx | Self::Docx => b"PK\x03\x04",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pdf => "PDF",
            Self::Pptx => "PowerPoint",
            Self::Docx => "Word",
        })
    }
}

/// What a numbered unit of a document is called in output markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Page,
    Slide,
}

impl UnitKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Page => "PAGE",
            Self::Slide => "SLIDE",
        }
    }
}

/// Lower-cased extension of `path`, or an empty string.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}
