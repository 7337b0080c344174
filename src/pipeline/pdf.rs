//! PDF extraction via pdfium: page text layer and embedded raster images.
//!
//! All functions here are blocking; [`crate::pipeline::extract::extract_document`]
//! calls them from `spawn_blocking` since pdfium keeps thread-local state
//! and must stay off the Tokio worker threads.

use crate::error::ConvertError;
use crate::pipeline::extract::{ExtractedDocument, ExtractedImage, TextBlock};
use crate::pipeline::source::UnitKind;
use image::RgbImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// Bind to pdfium.
///
/// `PDFIUM_LIB_PATH` may point at the library file or at the directory that
/// holds it; otherwise the working directory and then the system loader are
/// tried.
pub fn bind_pdfium() -> Result<Pdfium, ConvertError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(p) if !p.is_empty() => {
            let path = Path::new(&p);
            if path.is_dir() {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(path))
            } else {
                Pdfium::bind_to_library(path)
            }
        }
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| ConvertError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Extract one text block per page and, if requested, every decodable image
/// object in content order, including images drawn through form XObjects.
pub fn extract_pdf(path: &Path, with_images: bool) -> Result<ExtractedDocument, ConvertError> {
    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| ConvertError::CorruptDocument {
            path: path.to_path_buf(),
            detail: format!("{:?}", e),
        })?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let mut blocks = Vec::with_capacity(pages.len() as usize);
    let mut images = Vec::new();

    for (i, page) in pages.iter().enumerate() {
        let unit_index = i + 1;

        // A page without a text layer (scanned slide) still gets a block.
        let text = match page.text() {
            Ok(t) => t.all(),
            Err(e) => {
                warn!("Page {}: no text layer ({:?})", unit_index, e);
                String::new()
            }
        };
        blocks.push(TextBlock::new(UnitKind::Page, unit_index, &text));

        if !with_images {
            continue;
        }

        let mut decoded = Vec::new();
        for object in page.objects().iter() {
            collect_images(&object, 0, unit_index, &mut decoded);
        }
        for (i, pixels) in decoded.into_iter().enumerate() {
            let image_index = i + 1;
            debug!(
                "Page {} image {}: {}x{} px",
                unit_index,
                image_index,
                pixels.width(),
                pixels.height()
            );
            images.push(ExtractedImage {
                unit_index,
                image_index,
                pixels,
            });
        }
    }

    ExtractedDocument::new(UnitKind::Page, blocks, images)
}

/// Form XObjects nest deeper than this only in malformed files.
const MAX_FORM_DEPTH: usize = 16;

/// Decode `object` if it is an image, or every image inside it if it is a
/// form XObject, in content-stream order.
fn collect_images(object: &PdfPageObject<'_>, depth: usize, unit_index: usize, found: &mut Vec<RgbImage>) {
    if let Some(image_object) = object.as_image_object() {
        match image_object.get_raw_image() {
            Ok(raw) => found.push(raw.to_rgb8()),
            Err(e) => warn!(
                "Page {}: skipping image pdfium could not decode ({:?})",
                unit_index, e
            ),
        }
        return;
    }

    let Some(form) = object.as_x_object_form_object() else {
        return;
    };
    if depth >= MAX_FORM_DEPTH {
        warn!("Page {}: form XObjects nested too deep, skipping", unit_index);
        return;
    }
    for index in 0..form.len() {
        match form.get(index) {
            Ok(child) => collect_images(&child, depth + 1, unit_index, found),
            Err(e) => debug!("Page {}: form child {} unreadable ({:?})", unit_index, index, e),
        }
    }
}
