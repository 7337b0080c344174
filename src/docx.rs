//! Word document I/O.
//!
//! Reading goes through `docx-rs` first. Some producers write packages
//! `docx-rs` refuses (missing content-type or relationship parts), so a raw
//! `word/document.xml` walk with `zip` + `roxmltree` is the fallback.

use crate::error::ConvertError;
use docx_rs::{Docx, DocumentChild, InsertChild, Paragraph, ParagraphChild, Run, RunChild};
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::{debug, warn};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Text of every body paragraph, empty ones included, in document order.
pub fn read_paragraphs(path: &Path) -> Result<Vec<String>, ConvertError> {
    let bytes = std::fs::read(path).map_err(|_| ConvertError::FileNotFound {
        path: path.to_path_buf(),
    })?;

    match paragraphs_with_docx_rs(&bytes) {
        Ok(p) => Ok(p),
        Err(primary) => {
            warn!("docx-rs could not read {}: {}; using XML fallback", path.display(), primary);
            paragraphs_with_xml_fallback(&bytes).map_err(|fallback| ConvertError::CorruptDocument {
                path: path.to_path_buf(),
                detail: format!("docx-rs: {primary}; xml fallback: {fallback}"),
            })
        }
    }
}

fn paragraphs_with_docx_rs(bytes: &[u8]) -> Result<Vec<String>, String> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| e.to_string())?;

    let mut paragraphs = Vec::new();
    for child in &docx.document.children {
        let DocumentChild::Paragraph(para) = child else {
            continue;
        };
        let mut buf = String::new();
        push_paragraph_text(&para.children, &mut buf);
        paragraphs.push(buf);
    }
    debug!("docx-rs read {} paragraphs", paragraphs.len());
    Ok(paragraphs)
}

/// Runs directly under the paragraph, inside hyperlinks and inside tracked
/// insertions all count as paragraph text. Deleted runs do not.
fn push_paragraph_text(children: &[ParagraphChild], buf: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => push_run_text(run, buf),
            ParagraphChild::Hyperlink(link) => push_paragraph_text(&link.children, buf),
            ParagraphChild::Insert(insert) => {
                for c in &insert.children {
                    if let InsertChild::Run(run) = c {
                        push_run_text(run, buf);
                    }
                }
            }
            _ => {}
        }
    }
}

fn push_run_text(run: &Run, buf: &mut String) {
    for r in &run.children {
        match r {
            RunChild::Text(t) => buf.push_str(&t.text),
            RunChild::Tab(_) => buf.push('\t'),
            RunChild::Break(_) => buf.push('\n'),
            _ => {}
        }
    }
}

fn paragraphs_with_xml_fallback(bytes: &[u8]) -> Result<Vec<String>, String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| format!("zip open failed: {e}"))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| format!("word/document.xml missing: {e}"))?
        .read_to_string(&mut xml)
        .map_err(|e| format!("cannot read document.xml: {e}"))?;

    let doc = roxmltree::Document::parse(&xml).map_err(|e| format!("document.xml parse failed: {e}"))?;
    let is_w = |n: &roxmltree::Node, name: &str| {
        n.is_element() && n.tag_name().name() == name && n.tag_name().namespace() == Some(W_NS)
    };
    let Some(body) = doc.descendants().find(|n| is_w(n, "body")) else {
        return Err("document.xml has no w:body".into());
    };

    let paragraphs = body
        .children()
        .filter(|n| is_w(n, "p"))
        .map(|p| {
            let mut buf = String::new();
            for node in p.descendants() {
                if is_w(&node, "t") {
                    buf.push_str(node.text().unwrap_or_default());
                } else if is_w(&node, "tab") {
                    buf.push('\t');
                } else if is_w(&node, "br") || is_w(&node, "cr") {
                    buf.push('\n');
                }
            }
            buf
        })
        .collect();
    Ok(paragraphs)
}

/// Serialise `lines` as a Word document, one paragraph per line.
pub fn docx_bytes<'a>(lines: impl IntoIterator<Item = &'a str>) -> Result<Vec<u8>, ConvertError> {
    let docx = lines.into_iter().fold(Docx::new(), |docx, line| {
        docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line)))
    });
    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| ConvertError::Internal(format!("docx packing failed: {e}")))?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Hyperlink, HyperlinkType, Insert};
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    #[test]
    fn written_paragraphs_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.docx");
        let bytes = docx_bytes(["첫 문단", "", "Third paragraph"]).unwrap();
        std::fs::write(&path, bytes).unwrap();

        let paragraphs = read_paragraphs(&path).unwrap();
        assert_eq!(paragraphs, vec!["첫 문단", "", "Third paragraph"]);
    }

    #[test]
    fn hyperlink_and_inserted_runs_are_paragraph_text() {
        let para = Paragraph::new()
            .add_run(Run::new().add_text("Visit "))
            .add_hyperlink(
                Hyperlink::new("https://example.com", HyperlinkType::External)
                    .add_run(Run::new().add_text("https://example.com")),
            )
            .add_insert(Insert::new(Run::new().add_text(" today")))
            .add_run(Run::new().add_text("!"));
        let mut buf = Cursor::new(Vec::new());
        Docx::new().add_paragraph(para).build().pack(&mut buf).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("linked.docx");
        std::fs::write(&path, buf.into_inner()).unwrap();

        assert_eq!(
            read_paragraphs(&path).unwrap(),
            vec!["Visit https://example.com today!"]
        );
    }

    #[test]
    fn xml_fallback_reads_minimal_package() {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(
            br#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Intro</w:t></w:r></w:p>
    <w:p/>
    <w:p><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>c</w:t></w:r></w:p>
  </w:body>
</w:document>"#,
        )
        .unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("minimal.docx");
        std::fs::write(&path, bytes).unwrap();

        assert_eq!(read_paragraphs(&path).unwrap(), vec!["Intro", "", "a\tb\nc"]);
    }

    #[test]
    fn garbage_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.docx");
        std::fs::write(&path, b"not a zip").unwrap();
        assert!(matches!(
            read_paragraphs(&path).unwrap_err(),
            ConvertError::CorruptDocument { .. }
        ));
    }
}
