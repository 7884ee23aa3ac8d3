//! PDF Rendering
//!
//! Serializes book text into a paginated A4 document with a diagonal
//! watermark on every page. Text is written as UTF-16BE through an
//! Identity-H composite font, so any Unicode input renders without an
//! encoding error; the viewer substitutes glyphs for the non-embedded
//! face.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

use crate::error::{PdfError, Result};
use crate::layout::{paginate, wrap, PageLayout};

/// Watermark stamped across every page
pub const WATERMARK: &str = "WIZBOOK PREVIEW";

/// Render book text into PDF bytes
///
/// The title becomes the first line of page one and the document metadata
/// title. Never fails on valid UTF-8 input regardless of script.
pub fn render_pdf(title: &str, body: &str) -> Result<Vec<u8>> {
    let layout = PageLayout::default();

    let mut lines = Vec::new();
    if !title.trim().is_empty() {
        lines.extend(wrap(title.trim(), layout.max_chars));
        lines.push(String::new());
    }
    lines.extend(wrap(body, layout.max_chars));

    let pages = paginate(lines, layout.lines_per_page);
    tracing::debug!(pages = pages.len(), "rendering pdf");

    build_document(&pages, layout)
}

/// Extract a display title from markdown content (first `#` heading)
pub fn title_from_markdown(body: &str) -> Option<&str> {
    body.lines().find_map(|line| {
        let trimmed = line.trim();
        trimmed
            .strip_prefix('#')
            .map(|rest| rest.trim_start_matches('#').trim())
            .filter(|t| !t.is_empty())
    })
}

/// Encode text as UTF-16BE for the Identity-H font
fn encode_text(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_be_bytes).collect()
}

fn text_object(text: &str) -> Object {
    Object::String(encode_text(text), StringFormat::Hexadecimal)
}

fn watermark_ops(layout: PageLayout) -> Vec<Operation> {
    // 45 degree rotation matrix, placed so the text crosses the page center
    let (cos, sin) = (0.7071_f32, 0.7071_f32);
    vec![
        Operation::new("q", vec![]),
        Operation::new("BT", vec![]),
        Operation::new("g", vec![Object::Real(0.85)]),
        Operation::new("Tf", vec!["F1".into(), Object::Real(54.0)]),
        Operation::new(
            "Tm",
            vec![
                Object::Real(cos),
                Object::Real(sin),
                Object::Real(-sin),
                Object::Real(cos),
                Object::Real(layout.width * 0.14),
                Object::Real(layout.height * 0.28),
            ],
        ),
        Operation::new("Tj", vec![text_object(WATERMARK)]),
        Operation::new("ET", vec![]),
        Operation::new("Q", vec![]),
    ]
}

fn page_ops(lines: &[String], layout: PageLayout) -> Vec<Operation> {
    let mut ops = watermark_ops(layout);

    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("g", vec![Object::Real(0.0)]));
    ops.push(Operation::new(
        "Tf",
        vec!["F1".into(), Object::Real(layout.font_size)],
    ));
    ops.push(Operation::new("TL", vec![Object::Real(layout.leading)]));
    ops.push(Operation::new(
        "Td",
        vec![
            Object::Real(layout.margin),
            Object::Real(layout.height - layout.margin),
        ],
    ));

    for line in lines {
        if !line.is_empty() {
            ops.push(Operation::new("Tj", vec![text_object(line)]));
        }
        ops.push(Operation::new("T*", vec![]));
    }

    ops.push(Operation::new("ET", vec![]));
    ops
}

fn build_document(pages: &[Vec<String>], layout: PageLayout) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => "NotoSans",
        "Flags" => 32,
        "FontBBox" => vec![(-250).into(), (-250).into(), 1250.into(), 1000.into()],
        "ItalicAngle" => 0,
        "Ascent" => 800,
        "Descent" => -200,
        "CapHeight" => 700,
        "StemV" => 80,
    });
    let cid_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => "NotoSans",
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => descriptor_id,
        "DW" => 1000,
        "CIDToGIDMap" => "Identity",
    });
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => "NotoSans",
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![cid_font_id.into()],
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids = Vec::with_capacity(pages.len());
    for page_lines in pages {
        let content = Content {
            operations: page_ops(page_lines, layout),
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().map_err(PdfError::from)?,
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = pages.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                Object::Real(layout.width),
                Object::Real(layout.height),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).map_err(PdfError::from)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watermark_count(bytes: &[u8]) -> usize {
        let doc = Document::load_mem(bytes).unwrap();
        let needle = encode_text(WATERMARK);
        let mut count = 0;

        for page_id in doc.get_pages().values() {
            let data = doc.get_page_content(*page_id).unwrap();
            let content = Content::decode(&data).unwrap();
            for op in &content.operations {
                if op.operator == "Tj" {
                    if let Some(Object::String(bytes, _)) = op.operands.first() {
                        if *bytes == needle {
                            count += 1;
                        }
                    }
                }
            }
        }
        count
    }

    #[test]
    fn test_output_is_well_formed_pdf() {
        let bytes = render_pdf("My Book", "Some body text.").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_unicode_text_renders() {
        let body = "A café for the naïve reader. 東京の本屋. Ünïcödé everywhere.";
        let bytes = render_pdf("Révision", body).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(Document::load_mem(&bytes).is_ok());
    }

    #[test]
    fn test_long_text_paginates() {
        let body = "A line of body text for the pagination check.\n".repeat(200);
        let bytes = render_pdf("Long Book", &body).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert!(doc.get_pages().len() >= 4);
    }

    #[test]
    fn test_every_page_carries_the_watermark() {
        let body = "watermark coverage line\n".repeat(120);
        let bytes = render_pdf("Stamped", &body).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(watermark_count(&bytes), doc.get_pages().len());
    }

    #[test]
    fn test_empty_body_still_produces_a_page() {
        let bytes = render_pdf("", "").unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_title_from_markdown() {
        assert_eq!(
            title_from_markdown("# The Guide\n\nBody"),
            Some("The Guide")
        );
        assert_eq!(
            title_from_markdown("intro\n## Chapter One\nBody"),
            Some("Chapter One")
        );
        assert_eq!(title_from_markdown("no headings here"), None);
    }
}
