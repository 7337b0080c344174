//! Conversion entry points.
//!
//! Three pipelines share input resolution and output naming:
//!
//! | Function | Input | Output |
//! |----------|-------|--------|
//! | [`convert_with_captions`] | `.pdf` / `.pptx` | `<stem>_vlm.txt`, `<stem>_vlm.docx` |
//! | [`convert_text`] | `.pdf` / `.pptx` | `<stem>.txt`, `<stem>.docx` |
//! | [`convert_to_braille`] | `.docx` | `<stem>.brf` |
//!
//! Every function runs to completion before returning. Output files land in
//! [`ConversionConfig::output_dir`]; identical stems overwrite each other.

use crate::braille;
use crate::config::ConversionConfig;
use crate::docx;
use crate::error::ConvertError;
use crate::naming::{self, BRF_EXT, DOCX_EXT, TXT_EXT};
use crate::output::{BrailleOutput, ConversionOutput, ConversionStats};
use crate::pipeline::assemble::{assemble, assemble_text};
use crate::pipeline::caption::{Captioner, VlmCaptioner};
use crate::pipeline::extract::extract_document;
use crate::pipeline::input;
use crate::pipeline::render::{write_atomic, write_text_and_docx};
use crate::pipeline::source::{extension_of, SourceFormat};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Convert a PDF or PPTX (path or URL) to captioned text and Word outputs,
/// using a [`VlmCaptioner`] built from `config`.
///
/// The provider is resolved on the first image. Long-running callers that
/// convert many documents should build one captioner and call
/// [`convert_with_captions`] so the provider is resolved only once.
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    let captioner = VlmCaptioner::new(config);
    convert_with_captions(input_str, None, &captioner, config).await
}

/// Caption pipeline: extract text and images, caption every image, and write
/// `<stem>_vlm.txt` and `<stem>_vlm.docx`.
///
/// `desired_name` (usually the uploaded file name) picks the output stem;
/// without it the input's own stem is used. Any caption failure aborts the
/// conversion and nothing is written.
pub async fn convert_with_captions(
    input_str: impl AsRef<str>,
    desired_name: Option<&str>,
    captioner: &dyn Captioner,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    let start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting caption conversion: {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let path = resolved.path();
    let doc = extract_document(path, true).await?;

    let groups = assemble(&doc, captioner, config.progress_callback.as_ref()).await?;

    let stem = naming::output_stem(desired_name, path);
    let (text_path, docx_path) = write_text_and_docx(
        &groups,
        &config.output_dir,
        &naming::vlm_name(&stem, TXT_EXT),
        &naming::vlm_name(&stem, DOCX_EXT),
    )
    .await?;

    let stats = ConversionStats {
        total_units: doc.unit_count(),
        total_images: doc.images().len(),
        captioned_images: doc.images().len(),
        total_duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Caption conversion complete: {} ({} image(s), {}ms)",
        docx_path.display(),
        stats.captioned_images,
        stats.total_duration_ms
    );

    Ok(ConversionOutput {
        text_path,
        docx_path,
        stats,
    })
}

/// Plain pipeline: text only, written to `<stem>.txt` and `<stem>.docx`.
pub async fn convert_text(
    input_str: impl AsRef<str>,
    desired_name: Option<&str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    let start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting text conversion: {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let path = resolved.path();
    let doc = extract_document(path, false).await?;
    let groups = assemble_text(&doc);

    let stem = naming::output_stem(desired_name, path);
    let (text_path, docx_path) = write_text_and_docx(
        &groups,
        &config.output_dir,
        &naming::with_ext(&stem, TXT_EXT),
        &naming::with_ext(&stem, DOCX_EXT),
    )
    .await?;

    let stats = ConversionStats {
        total_units: doc.unit_count(),
        total_duration_ms: start.elapsed().as_millis() as u64,
        ..Default::default()
    };
    info!(
        "Text conversion complete: {} ({} unit(s))",
        docx_path.display(),
        stats.total_units
    );

    Ok(ConversionOutput {
        text_path,
        docx_path,
        stats,
    })
}

/// Braille pipeline: read a Word document and write `<stem>.brf`.
///
/// Anything but `.docx` is rejected with [`ConvertError::UnsupportedInput`]
/// before any file is read or written.
pub async fn convert_to_braille(
    input_str: impl AsRef<str>,
    desired_name: Option<&str>,
    config: &ConversionConfig,
) -> Result<BrailleOutput, ConvertError> {
    let input_str = input_str.as_ref();
    ensure_docx(Path::new(input_str))?;
    info!("Starting Braille conversion: {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let path = resolved.path().to_path_buf();
    ensure_docx(&path)?;

    let encoding = config.braille_encoding;
    let read_path = path.clone();
    let (paragraphs, text) = tokio::task::spawn_blocking(move || {
        let paragraphs = docx::read_paragraphs(&read_path)?;
        let text = braille::braille_text(&paragraphs, encoding);
        Ok::<_, ConvertError>((paragraphs.len(), text))
    })
    .await
    .map_err(|e| ConvertError::Internal(format!("Braille task panicked: {}", e)))??;

    let stem = naming::output_stem(desired_name, &path);
    let brf_path = config.output_dir.join(naming::with_ext(&stem, BRF_EXT));
    write_atomic(&brf_path, text.as_bytes()).await?;

    let cells = text.chars().count();
    info!(
        "Braille conversion complete: {} ({} paragraph(s), {} cell(s))",
        brf_path.display(),
        paragraphs,
        cells
    );

    Ok(BrailleOutput {
        brf_path,
        paragraphs,
        cells,
    })
}

/// Reject anything that is not a Word document.
pub fn ensure_docx(path: &Path) -> Result<(), ConvertError> {
    if input::is_url(&path.to_string_lossy()) {
        return Ok(());
    }
    match SourceFormat::from_path(path) {
        Some(SourceFormat::Docx) => Ok(()),
        _ => Err(ConvertError::UnsupportedInput {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| extension_of(path)),
        }),
    }
}
