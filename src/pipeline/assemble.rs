//! Document assembly: interleave page/slide text with image captions.
//!
//! Output is a list of paragraph groups. For each unit in ascending order the
//! cleaned text block comes first, then one group per image of that unit in
//! image order. Groups are never reordered or deduplicated.
//!
//! Captioning is sequential and fail-fast: the first caption error aborts the
//! document, so a caller never receives a document with silent gaps.

use crate::error::ConvertError;
use crate::pipeline::caption::Captioner;
use crate::pipeline::clean::clean_text;
use crate::pipeline::extract::ExtractedDocument;
use crate::progress::ProgressCallback;
use tracing::{debug, info};

/// Marker group for one image caption.
pub fn caption_group(label: &str, unit_index: usize, image_index: usize, caption: &str) -> String {
    format!("=== {label} {unit_index} IMAGE {image_index} ===\n{caption}\n")
}

/// Interleave text blocks and captions.
pub async fn assemble(
    doc: &ExtractedDocument,
    captioner: &dyn Captioner,
    progress: Option<&ProgressCallback>,
) -> Result<Vec<String>, ConvertError> {
    let label = doc.kind().label();
    let total_images = doc.images().len();
    if let Some(cb) = progress {
        cb.on_conversion_start(doc.unit_count(), total_images);
    }

    let mut groups = Vec::with_capacity(doc.unit_count() + total_images);
    let mut captioned = 0;

    for block in doc.blocks() {
        groups.push(clean_text(&block.raw_text));

        for img in doc.images_of(block.unit_index) {
            if let Some(cb) = progress {
                cb.on_caption_start(img.unit_index, img.image_index);
            }
            let caption = match captioner.caption(&img.pixels).await {
                Ok(c) => c,
                Err(e) => {
                    if let Some(cb) = progress {
                        cb.on_caption_error(img.unit_index, img.image_index, &e.to_string());
                    }
                    return Err(e);
                }
            };
            if let Some(cb) = progress {
                cb.on_caption_complete(img.unit_index, img.image_index, caption.len());
            }
            debug!(
                "{} {} image {}: {} byte caption",
                label,
                img.unit_index,
                img.image_index,
                caption.len()
            );
            groups.push(caption_group(label, img.unit_index, img.image_index, &caption));
            captioned += 1;
        }
    }

    if let Some(cb) = progress {
        cb.on_conversion_complete(doc.unit_count(), captioned);
    }
    info!(
        "Assembled {} {}(s) with {} caption(s)",
        doc.unit_count(),
        label.to_lowercase(),
        captioned
    );
    Ok(groups)
}

/// Text-only variant: cleaned blocks, no captions.
pub fn assemble_text(doc: &ExtractedDocument) -> Vec<String> {
    doc.blocks().iter().map(|b| clean_text(&b.raw_text)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extract::{ExtractedImage, TextBlock};
    use crate::pipeline::source::UnitKind;
    use crate::progress::ConversionProgressCallback;
    use async_trait::async_trait;
    use image::RgbImage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Captions each image with its width, so order is observable.
    struct WidthCaptioner {
        calls: AtomicUsize,
        fail_on_call: Option<usize>,
    }

    impl WidthCaptioner {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on_call: None,
            }
        }
    }

    #[async_trait]
    impl Captioner for WidthCaptioner {
        async fn caption(&self, image: &RgbImage) -> Result<String, ConvertError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_on_call == Some(n) {
                return Err(ConvertError::CaptionUnavailable {
                    detail: "model offline".into(),
                });
            }
            Ok(format!("w{}", image.width()))
        }
    }

    fn image(unit: usize, index: usize, width: u32) -> ExtractedImage {
        ExtractedImage {
            unit_index: unit,
            image_index: index,
            pixels: RgbImage::new(width, 1),
        }
    }

    fn two_page_doc() -> ExtractedDocument {
        ExtractedDocument::new(
            UnitKind::Page,
            vec![
                TextBlock::new(UnitKind::Page, 1, "• Intro"),
                TextBlock::new(UnitKind::Page, 2, "Summary"),
            ],
            vec![image(1, 1, 7)],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn two_pages_one_image() {
        let groups = assemble(&two_page_doc(), &WidthCaptioner::new(), None)
            .await
            .unwrap();
        assert_eq!(
            groups,
            vec![
                "=== PAGE 1 ===\n Intro\n".to_string(),
                "=== PAGE 1 IMAGE 1 ===\nw7\n".to_string(),
                "=== PAGE 2 ===\nSummary\n".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn strict_merge_order() {
        let blocks = (1..=3)
            .map(|i| TextBlock::new(UnitKind::Slide, i, &format!("s{i}")))
            .collect();
        let doc = ExtractedDocument::new(
            UnitKind::Slide,
            blocks,
            vec![image(3, 1, 31), image(1, 2, 12), image(1, 1, 11)],
        )
        .unwrap();
        let groups = assemble(&doc, &WidthCaptioner::new(), None).await.unwrap();
        let heads: Vec<&str> = groups.iter().map(|g| g.lines().next().unwrap()).collect();
        assert_eq!(
            heads,
            vec![
                "=== SLIDE 1 ===",
                "=== SLIDE 1 IMAGE 1 ===",
                "=== SLIDE 1 IMAGE 2 ===",
                "=== SLIDE 2 ===",
                "=== SLIDE 3 ===",
                "=== SLIDE 3 IMAGE 1 ===",
            ]
        );
        assert!(groups[1].contains("w11") && groups[2].contains("w12"));
    }

    #[derive(Default)]
    struct Events {
        errors: AtomicUsize,
        completes: AtomicUsize,
    }

    impl ConversionProgressCallback for Events {
        fn on_caption_complete(&self, _u: usize, _i: usize, _len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }
        fn on_caption_error(&self, _u: usize, _i: usize, _e: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn first_caption_error_aborts() {
        let doc = ExtractedDocument::new(
            UnitKind::Page,
            vec![TextBlock::new(UnitKind::Page, 1, "x")],
            vec![image(1, 1, 1), image(1, 2, 2), image(1, 3, 3)],
        )
        .unwrap();
        let captioner = WidthCaptioner {
            calls: AtomicUsize::new(0),
            fail_on_call: Some(2),
        };
        let events = Arc::new(Events::default());
        let cb: ProgressCallback = events.clone();

        let err = assemble(&doc, &captioner, Some(&cb)).await.unwrap_err();
        assert!(matches!(err, ConvertError::CaptionUnavailable { .. }));
        assert_eq!(captioner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(events.completes.load(Ordering::SeqCst), 1);
        assert_eq!(events.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn text_only_groups() {
        let groups = assemble_text(&two_page_doc());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], "=== PAGE 1 ===\n Intro\n");
    }
}
