//! Image encoding: `RgbImage` → base64 PNG wrapped in `ImageData`.
//!
//! VLM APIs accept images as base64 data embedded in the JSON request body.
//! PNG keeps diagrams and slide text lossless; `detail: "high"` lets
//! GPT-4-class models tile the image instead of seeing a 512 px overview.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::{DynamicImage, RgbImage};
use std::io::Cursor;
use tracing::debug;

/// Encode an extracted image as a base64 PNG ready for the VLM API.
pub fn encode_image(img: &RgbImage) -> Result<ImageData, image::ImageError> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img.clone()).write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded {}x{} image → {} bytes base64", img.width(), img.height(), b64.len());

    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}
