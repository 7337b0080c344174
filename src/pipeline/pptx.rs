//! PPTX extraction: slide text and picture shapes, straight from the
//! OOXML package with `zip` + `roxmltree`.
//!
//! ## Slide order
//!
//! `ppt/presentation.xml` lists slides in `p:sldIdLst`; each entry points at a
//! relationship in `ppt/_rels/presentation.xml.rels`. That list is the order
//! the deck is shown in. Part names (`slide7.xml`) say nothing about order
//! once slides have been moved, so they are only the last resort.
//!
//! ## Shape tree
//!
//! Shapes are visited depth-first in document order, descending into group
//! shapes (`p:grpSp`). The walk uses an explicit stack so arbitrarily deep
//! grouping cannot overflow the call stack. Text and pictures come out of the
//! same walk, which keeps image numbering aligned with reading order.

use crate::error::ConvertError;
use crate::pipeline::extract::{ExtractedDocument, ExtractedImage, TextBlock};
use crate::pipeline::source::UnitKind;
use roxmltree::{Document, Node};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use tracing::{debug, warn};
use zip::ZipArchive;

const P_NS: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const PRESENTATION: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";

/// Extract one text block per slide and, if requested, every raster picture.
pub fn extract_pptx(path: &Path, with_images: bool) -> Result<ExtractedDocument, ConvertError> {
    let file = File::open(path).map_err(|_| ConvertError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    let archive = ZipArchive::new(file).map_err(|e| corrupt(path, format!("not a zip package: {e}")))?;
    extract_from_archive(archive, path, with_images)
}

fn extract_from_archive<R: Read + Seek>(
    archive: ZipArchive<R>,
    path: &Path,
    with_images: bool,
) -> Result<ExtractedDocument, ConvertError> {
    let mut package = Package { archive, path };
    let slides = package.slide_parts()?;
    debug!("PPTX has {} slides", slides.len());

    let mut blocks = Vec::with_capacity(slides.len());
    let mut images = Vec::new();

    for (i, slide_part) in slides.iter().enumerate() {
        let unit_index = i + 1;
        let xml = package
            .read_string(slide_part)?
            .ok_or_else(|| corrupt(path, format!("missing slide part {slide_part}")))?;
        let doc = Document::parse(&xml)
            .map_err(|e| corrupt(path, format!("{slide_part}: {e}")))?;
        let items = walk_shape_tree(&doc);

        let texts: Vec<&str> = items
            .iter()
            .filter_map(|item| match item {
                ShapeItem::Text(t) => Some(t.as_str()),
                ShapeItem::Picture(_) => None,
            })
            .collect();
        blocks.push(TextBlock::new(UnitKind::Slide, unit_index, &texts.join("\n")));

        if !with_images {
            continue;
        }

        let rels = match package.read_string(&rels_part_for(slide_part))? {
            Some(rels_xml) => parse_relationships(&rels_xml)
                .map_err(|e| corrupt(path, format!("{slide_part} relationships: {e}")))?,
            None => Vec::new(),
        };
        let by_id: HashMap<&str, &Relationship> =
            rels.iter().map(|r| (r.id.as_str(), r)).collect();

        let mut image_index = 0;
        for item in &items {
            let ShapeItem::Picture(rel_id) = item else {
                continue;
            };
            let Some(rel) = by_id.get(rel_id.as_str()) else {
                warn!("Slide {}: picture references unknown relationship {}", unit_index, rel_id);
                continue;
            };
            if rel.external {
                warn!("Slide {}: skipping linked picture {}", unit_index, rel.target);
                continue;
            }
            let media_part = resolve_target(slide_part, &rel.target);
            let Some(bytes) = package.read_bytes(&media_part)? else {
                warn!("Slide {}: media part {} is missing", unit_index, media_part);
                continue;
            };
            match image::load_from_memory(&bytes) {
                Ok(decoded) => {
                    image_index += 1;
                    images.push(ExtractedImage {
                        unit_index,
                        image_index,
                        pixels: decoded.to_rgb8(),
                    });
                }
                Err(e) => warn!(
                    "Slide {}: skipping {} (not a decodable raster image: {})",
                    unit_index, media_part, e
                ),
            }
        }
    }

    ExtractedDocument::new(UnitKind::Slide, blocks, images)
}

// ── Package access ───────────────────────────────────────────────────────

struct Package<'p, R> {
    archive: ZipArchive<R>,
    path: &'p Path,
}

impl<R: Read + Seek> Package<'_, R> {
    /// Bytes of a part, or `None` when the package has no such part.
    fn read_bytes(&mut self, name: &str) -> Result<Option<Vec<u8>>, ConvertError> {
        let mut file = match self.archive.by_name(name) {
            Ok(f) => f,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(corrupt(self.path, format!("{name}: {e}"))),
        };
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .map_err(|e| corrupt(self.path, format!("{name}: {e}")))?;
        Ok(Some(buf))
    }

    fn read_string(&mut self, name: &str) -> Result<Option<String>, ConvertError> {
        match self.read_bytes(name)? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| corrupt(self.path, format!("{name}: invalid UTF-8"))),
            None => Ok(None),
        }
    }

    /// Slide part names in presentation order.
    fn slide_parts(&mut self) -> Result<Vec<String>, ConvertError> {
        let rels = match self.read_string(PRESENTATION_RELS)? {
            Some(xml) => parse_relationships(&xml)
                .map_err(|e| corrupt(self.path, format!("{PRESENTATION_RELS}: {e}")))?,
            None => Vec::new(),
        };
        let slide_rels: Vec<&Relationship> = rels.iter().filter(|r| r.is_slide()).collect();

        if !slide_rels.is_empty() {
            let ordered_ids = match self.read_string(PRESENTATION)? {
                Some(xml) => slide_id_list(&xml)
                    .map_err(|e| corrupt(self.path, format!("{PRESENTATION}: {e}")))?,
                None => Vec::new(),
            };

            let by_id: HashMap<&str, &Relationship> =
                slide_rels.iter().map(|r| (r.id.as_str(), *r)).collect();
            let ordered: Vec<String> = ordered_ids
                .iter()
                .filter_map(|id| by_id.get(id.as_str()))
                .map(|r| resolve_target(PRESENTATION, &r.target))
                .collect();
            if !ordered.is_empty() {
                return Ok(ordered);
            }

            return Ok(slide_rels
                .iter()
                .map(|r| resolve_target(PRESENTATION, &r.target))
                .collect());
        }

        // No relationships at all: numbered part names.
        let mut numbered: Vec<(u32, String)> = self
            .archive
            .file_names()
            .filter_map(|name| {
                let n = name
                    .strip_prefix("ppt/slides/slide")?
                    .strip_suffix(".xml")?
                    .parse()
                    .ok()?;
                Some((n, name.to_string()))
            })
            .collect();
        numbered.sort();
        Ok(numbered.into_iter().map(|(_, name)| name).collect())
    }
}

fn corrupt(path: &Path, detail: String) -> ConvertError {
    ConvertError::CorruptDocument {
        path: path.to_path_buf(),
        detail,
    }
}

// ── Relationships ────────────────────────────────────────────────────────

#[derive(Debug)]
struct Relationship {
    id: String,
    rel_type: String,
    target: String,
    external: bool,
}

impl Relationship {
    fn is_slide(&self) -> bool {
        self.rel_type.ends_with("/slide")
    }
}

fn parse_relationships(xml: &str) -> Result<Vec<Relationship>, roxmltree::Error> {
    let doc = Document::parse(xml)?;
    Ok(doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "Relationship")
        .filter_map(|n| {
            Some(Relationship {
                id: n.attribute("Id")?.to_string(),
                rel_type: n.attribute("Type").unwrap_or_default().to_string(),
                target: n.attribute("Target")?.to_string(),
                external: n.attribute("TargetMode") == Some("External"),
            })
        })
        .collect())
}

/// Relationship ids of `p:sldIdLst` entries, in order.
fn slide_id_list(xml: &str) -> Result<Vec<String>, roxmltree::Error> {
    let doc = Document::parse(xml)?;
    Ok(doc
        .descendants()
        .filter(|n| is(n, P_NS, "sldId"))
        .filter_map(|n| n.attribute((R_NS, "id")).map(str::to_string))
        .collect())
}

/// `ppt/slides/slide1.xml` → `ppt/slides/_rels/slide1.xml.rels`
fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolve a relationship target relative to the part that owns it.
fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for seg in target.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

// ── Shape tree ───────────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
enum ShapeItem {
    /// Text of a shape with a text frame (possibly empty).
    Text(String),
    /// Relationship id of a picture's embedded blip.
    Picture(String),
}

fn is(node: &Node, ns: &str, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name && node.tag_name().namespace() == Some(ns)
}

fn walk_shape_tree(doc: &Document) -> Vec<ShapeItem> {
    let Some(sp_tree) = doc.descendants().find(|n| is(n, P_NS, "spTree")) else {
        return Vec::new();
    };

    let mut items = Vec::new();
    let mut stack: Vec<Node> = sp_tree.children().filter(|n| n.is_element()).collect();
    stack.reverse();

    while let Some(node) = stack.pop() {
        if is(&node, P_NS, "sp") {
            if let Some(tx_body) = node.children().find(|n| is(n, P_NS, "txBody")) {
                items.push(ShapeItem::Text(text_frame_text(&tx_body)));
            }
        } else if is(&node, P_NS, "pic") {
            let embed = node
                .descendants()
                .find(|n| is(n, A_NS, "blip"))
                .and_then(|blip| blip.attribute((R_NS, "embed")));
            if let Some(id) = embed {
                items.push(ShapeItem::Picture(id.to_string()));
            }
        } else if is(&node, P_NS, "grpSp") {
            let start = stack.len();
            stack.extend(node.children().filter(|n| n.is_element()));
            stack[start..].reverse();
        }
    }
    items
}

/// Paragraphs joined by `\n`; runs concatenated; `a:br` is a line break.
fn text_frame_text(tx_body: &Node) -> String {
    tx_body
        .children()
        .filter(|n| is(n, A_NS, "p"))
        .map(|p| {
            let mut line = String::new();
            for n in p.descendants() {
                if is(&n, A_NS, "t") {
                    line.push_str(n.text().unwrap_or_default());
                } else if is(&n, A_NS, "br") {
                    line.push('\n');
                }
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}
