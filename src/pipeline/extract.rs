//! Extracted document model shared by the PDF and PPTX extractors.
//!
//! Both extractors produce the same shape: one [`TextBlock`] per page or
//! slide, plus the images found on each unit in reading order. The
//! constructor enforces the cross-references the assembler relies on.

use crate::error::ConvertError;
use crate::pipeline::source::{SourceFormat, UnitKind};
use crate::pipeline::{pdf, pptx};
use image::RgbImage;
use std::path::Path;
use tracing::info;

/// Text of one page or slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    /// 1-based page or slide number.
    pub unit_index: usize,
    /// `"=== {LABEL} {n} ===\n{text}\n"`, uncleaned.
    pub raw_text: String,
}

impl TextBlock {
    pub fn new(kind: UnitKind, unit_index: usize, text: &str) -> Self {
        Self {
            unit_index,
            raw_text: format!("=== {} {} ===\n{}\n", kind.label(), unit_index, text),
        }
    }
}

/// One raster image found on a page or slide.
#[derive(Debug, Clone)]
pub struct ExtractedImage {
    /// 1-based page or slide number.
    pub unit_index: usize,
    /// 1-based position among the images of its unit.
    pub image_index: usize,
    pub pixels: RgbImage,
}

/// Text blocks and images of one document.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    kind: UnitKind,
    blocks: Vec<TextBlock>,
    images: Vec<ExtractedImage>,
}

impl ExtractedDocument {
    /// Assemble and validate an extraction result.
    ///
    /// Block indices must run 1, 2, … without gaps, and every image must
    /// point at an existing block with image indices 1, 2, … per unit.
    /// Images are stored sorted by `(unit_index, image_index)`.
    pub fn new(
        kind: UnitKind,
        blocks: Vec<TextBlock>,
        mut images: Vec<ExtractedImage>,
    ) -> Result<Self, ConvertError> {
        for (i, block) in blocks.iter().enumerate() {
            if block.unit_index != i + 1 {
                return Err(ConvertError::InconsistentUnits(format!(
                    "expected {} {} at position {}, found {}",
                    kind.label(),
                    i + 1,
                    i,
                    block.unit_index
                )));
            }
        }

        images.sort_by_key(|img| (img.unit_index, img.image_index));
        let mut expected_next = (0usize, 0usize);
        for img in &images {
            if img.unit_index == 0 || img.unit_index > blocks.len() {
                return Err(ConvertError::InconsistentUnits(format!(
                    "image {} references {} {} but the document has {}",
                    img.image_index,
                    kind.label(),
                    img.unit_index,
                    blocks.len()
                )));
            }
            let want = if img.unit_index == expected_next.0 {
                expected_next.1 + 1
            } else {
                1
            };
            if img.image_index != want {
                return Err(ConvertError::InconsistentUnits(format!(
                    "{} {} has image {} where image {} was expected",
                    kind.label(),
                    img.unit_index,
                    img.image_index,
                    want
                )));
            }
            expected_next = (img.unit_index, img.image_index);
        }

        Ok(Self {
            kind,
            blocks,
            images,
        })
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    pub fn blocks(&self) -> &[TextBlock] {
        &self.blocks
    }

    pub fn images(&self) -> &[ExtractedImage] {
        &self.images
    }

    /// Images of one unit in ascending image order.
    pub fn images_of(&self, unit_index: usize) -> impl Iterator<Item = &ExtractedImage> {
        self.images
            .iter()
            .filter(move |img| img.unit_index == unit_index)
    }

    /// Number of pages or slides.
    pub fn unit_count(&self) -> usize {
        self.blocks.len()
    }
}

/// Extract text blocks, and images when `with_images` is set, from a PDF or
/// PPTX file.
///
/// Extraction is blocking work; it runs on the blocking thread pool.
pub async fn extract_document(
    path: &Path,
    with_images: bool,
) -> Result<ExtractedDocument, ConvertError> {
    let format = SourceFormat::lecture_from_path(path)?;
    let path = path.to_path_buf();

    let doc = tokio::task::spawn_blocking(move || match format {
        SourceFormat::Pdf => pdf::extract_pdf(&path, with_images),
        SourceFormat::Pptx => pptx::extract_pptx(&path, with_images),
        SourceFormat::Docx => Err(ConvertError::UnsupportedFormat {
            extension: format.extension().into(),
            expected: ".pdf or .pptx".into(),
        }),
    })
    .await
    .map_err(|e| ConvertError::Internal(format!("Extraction task panicked: {}", e)))??;

    info!(
        "Extracted {} {}(s), {} image(s)",
        doc.unit_count(),
        doc.kind().label().to_lowercase(),
        doc.images().len()
    );
    Ok(doc)
}
