//! PDF → text/Word pipeline against PDFs generated with pdfium itself.
//!
//! Needs a pdfium library (`PDFIUM_LIB_PATH`, `./` or the system loader) but
//! no vision model; skipped when pdfium cannot be bound. Everything runs in
//! one test because every `Pdfium` instance tears the library down on drop.

use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};
use lecture_a11y::pipeline::pdf::bind_pdfium;
use lecture_a11y::{convert_text, convert_with_captions, Captioner, ConversionConfig, ConvertError};
use pdfium_render::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

struct SizeCaptioner {
    calls: AtomicUsize,
}

#[async_trait]
impl Captioner for SizeCaptioner {
    async fn caption(&self, image: &RgbImage) -> Result<String, ConvertError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{}x{} 그림", image.width(), image.height()))
    }
}

/// Page 1: "Intro" and one 7x5 image. Page 2: "Summary".
fn write_two_page_pdf(pdfium: &Pdfium, path: &Path) -> Result<(), PdfiumError> {
    let mut document = pdfium.create_new_pdf()?;
    let font = document.fonts_mut().helvetica();
    {
        let mut page = document.pages_mut().create_page_at_end(PdfPagePaperSize::a4())?;
        page.objects_mut().create_text_object(
            PdfPoints::new(72.0),
            PdfPoints::new(720.0),
            "Intro",
            font,
            PdfPoints::new(18.0),
        )?;
        let picture = DynamicImage::ImageRgb8(RgbImage::from_pixel(7, 5, Rgb([200, 30, 30])));
        page.objects_mut().create_image_object(
            PdfPoints::new(72.0),
            PdfPoints::new(400.0),
            &picture,
            Some(PdfPoints::new(140.0)),
            Some(PdfPoints::new(100.0)),
        )?;
    }
    {
        let mut page = document.pages_mut().create_page_at_end(PdfPagePaperSize::a4())?;
        page.objects_mut().create_text_object(
            PdfPoints::new(72.0),
            PdfPoints::new(720.0),
            "Summary",
            font,
            PdfPoints::new(18.0),
        )?;
    }
    document.save_to_file(path)
}

/// One page whose only content is a form XObject wrapping a 4x3 image.
fn write_stamped_pdf(pdfium: &Pdfium, path: &Path) -> Result<(), PdfiumError> {
    let mut stamp = pdfium.create_new_pdf()?;
    {
        let mut page = stamp.pages_mut().create_page_at_end(PdfPagePaperSize::a4())?;
        let picture = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 3, Rgb([20, 120, 220])));
        page.objects_mut().create_image_object(
            PdfPoints::new(72.0),
            PdfPoints::new(400.0),
            &picture,
            Some(PdfPoints::new(80.0)),
            Some(PdfPoints::new(60.0)),
        )?;
    }

    let mut document = pdfium.create_new_pdf()?;
    let mut page = document.pages_mut().create_page_at_end(PdfPagePaperSize::a4())?;
    let source = stamp.pages().get(0)?;
    let form = source.objects().copy_into_x_object_form_object(&mut document)?;
    page.objects_mut().add_object(form)?;
    drop(page);
    document.save_to_file(path)
}

fn markers(text: &str) -> Vec<&str> {
    text.lines().filter(|l| l.starts_with("=== ")).collect()
}

#[tokio::test]
async fn generated_pdfs_through_both_pipelines() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("slides.pdf");
    let stamped = dir.path().join("stamped.pdf");
    {
        let pdfium = match bind_pdfium() {
            Ok(p) => p,
            Err(e) => {
                println!("SKIP — {e}");
                return;
            }
        };
        write_two_page_pdf(&pdfium, &pdf).unwrap();
        write_stamped_pdf(&pdfium, &stamped).unwrap();
    }

    let config = ConversionConfig::builder()
        .output_dir(dir.path().join("static"))
        .build()
        .unwrap();
    let captioner = SizeCaptioner {
        calls: AtomicUsize::new(0),
    };

    let out = convert_with_captions(pdf.to_str().unwrap(), Some("Week 3"), &captioner, &config)
        .await
        .unwrap();

    assert_eq!(out.stats.total_units, 2, "one block per page");
    assert_eq!(out.stats.total_images, 1);
    assert_eq!(captioner.calls.load(Ordering::SeqCst), 1);
    assert_eq!(out.docx_path.file_name().unwrap(), "Week 3_vlm.docx");

    let text = std::fs::read_to_string(&out.text_path).unwrap();
    assert_eq!(
        markers(&text),
        vec!["=== PAGE 1 ===", "=== PAGE 1 IMAGE 1 ===", "=== PAGE 2 ==="]
    );
    let intro = text.find("Intro").unwrap();
    let caption = text.find("7x5 그림").unwrap();
    let summary = text.find("Summary").unwrap();
    assert!(intro < caption && caption < summary, "{text}");

    let plain = convert_text(pdf.to_str().unwrap(), Some("Week 3"), &config)
        .await
        .unwrap();
    assert_eq!(plain.stats.total_units, 2);
    let text = std::fs::read_to_string(&plain.text_path).unwrap();
    assert_eq!(markers(&text), vec!["=== PAGE 1 ===", "=== PAGE 2 ==="]);

    // Images drawn through a form XObject count as page images too.
    let out = convert_with_captions(stamped.to_str().unwrap(), None, &captioner, &config)
        .await
        .unwrap();
    assert_eq!(out.stats.total_units, 1);
    assert_eq!(out.stats.total_images, 1);
    let text = std::fs::read_to_string(&out.text_path).unwrap();
    assert!(text.contains("=== PAGE 1 IMAGE 1 ===\n4x3 그림\n"), "{text}");
}
