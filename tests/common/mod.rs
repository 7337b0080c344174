//! Synthetic lecture decks shared by the integration tests.

use image::RgbImage;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::{SimpleFileOptions, ZipWriter};

const P_NS: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(RgbImage::new(width, height))
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

/// A two-slide deck: slide 1 has a bulleted title and two pictures (one
/// inside a group), slide 2 only text.
pub fn write_deck(path: &Path) {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = SimpleFileOptions::default();
    let mut put = |name: &str, data: &[u8]| {
        zip.start_file(name, opts).unwrap();
        zip.write_all(data).unwrap();
    };

    put(
        "ppt/presentation.xml",
        format!(
            r#"<?xml version="1.0"?><p:presentation xmlns:p="{P_NS}" xmlns:r="{R_NS}"><p:sldIdLst><p:sldId id="256" r:id="rId1"/><p:sldId id="257" r:id="rId2"/></p:sldIdLst></p:presentation>"#
        )
        .as_bytes(),
    );
    put(
        "ppt/_rels/presentation.xml.rels",
        format!(
            r#"<?xml version="1.0"?><Relationships xmlns="{REL_NS}"><Relationship Id="rId1" Type="{R_NS}/slide" Target="slides/slide1.xml"/><Relationship Id="rId2" Type="{R_NS}/slide" Target="slides/slide2.xml"/></Relationships>"#
        )
        .as_bytes(),
    );

    let slide = |body: &str| {
        format!(
            r#"<?xml version="1.0"?><p:sld xmlns:p="{P_NS}" xmlns:a="{A_NS}" xmlns:r="{R_NS}"><p:cSld><p:spTree>{body}</p:spTree></p:cSld></p:sld>"#
        )
    };
    put(
        "ppt/slides/slide1.xml",
        slide(concat!(
            r#"<p:sp><p:txBody><a:p><a:r><a:t>• 강의 소개</a:t></a:r></a:p></p:txBody></p:sp>"#,
            r#"<p:pic><p:blipFill><a:blip r:embed="rId5"/></p:blipFill></p:pic>"#,
            r#"<p:grpSp><p:pic><p:blipFill><a:blip r:embed="rId6"/></p:blipFill></p:pic></p:grpSp>"#,
        ))
        .as_bytes(),
    );
    put(
        "ppt/slides/_rels/slide1.xml.rels",
        format!(
            r#"<?xml version="1.0"?><Relationships xmlns="{REL_NS}"><Relationship Id="rId5" Type="{R_NS}/image" Target="../media/image1.png"/><Relationship Id="rId6" Type="{R_NS}/image" Target="../media/image2.png"/></Relationships>"#
        )
        .as_bytes(),
    );
    put(
        "ppt/slides/slide2.xml",
        slide(r#"<p:sp><p:txBody><a:p><a:r><a:t>요약</a:t></a:r></a:p></p:txBody></p:sp>"#)
            .as_bytes(),
    );
    put("ppt/media/image1.png", &png(3, 2));
    put("ppt/media/image2.png", &png(5, 4));

    let bytes = zip.finish().unwrap().into_inner();
    std::fs::write(path, bytes).unwrap();
}
