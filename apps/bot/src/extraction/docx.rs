use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use super::ExtractionError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Joins the text of every body paragraph with newlines.
///
/// Paragraphs nested in tables and text boxes are skipped; runs inside a
/// paragraph are concatenated, with `w:tab` and `w:br` rendered as tab and
/// newline.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractionError::Docx(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractionError::Docx(e.to_string()))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::Docx(e.to_string()))?;

    paragraphs_from_xml(&xml).map(|paragraphs| paragraphs.join("\n"))
}

/// Subtrees that never contribute body text: tables, text boxes, the
/// fallback copy of alternate content, and paragraph properties (whose
/// `w:tabs` holds tab-stop definitions, not tabs).
const SKIPPED_SUBTREES: &[&[u8]] = &[b"w:tbl", b"w:txbxContent", b"mc:Fallback", b"w:pPr"];

fn is_skipped(name: &[u8]) -> bool {
    SKIPPED_SUBTREES.contains(&name)
}

fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut skip_depth = 0usize;
    let mut paragraph_depth = 0usize;
    let mut run_depth = 0usize;
    let mut in_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ExtractionError::Docx(e.to_string()))?;
        match event {
            Event::Start(e) => {
                let name = e.name();
                if is_skipped(name.as_ref()) {
                    skip_depth += 1;
                } else if skip_depth == 0 {
                    match name.as_ref() {
                        b"w:p" => paragraph_depth += 1,
                        b"w:r" => run_depth += 1,
                        b"w:t" => in_text = true,
                        _ => {}
                    }
                }
            }
            Event::Empty(e) if skip_depth == 0 => match e.name().as_ref() {
                b"w:p" if paragraph_depth == 0 => paragraphs.push(String::new()),
                b"w:tab" if run_depth > 0 && paragraph_depth > 0 => current.push('\t'),
                b"w:br" | b"w:cr" if run_depth > 0 && paragraph_depth > 0 => current.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text && skip_depth == 0 && paragraph_depth > 0 => {
                let text = t.unescape().map_err(|e| ExtractionError::Docx(e.to_string()))?;
                current.push_str(&text);
            }
            Event::End(e) => {
                let name = e.name();
                if is_skipped(name.as_ref()) {
                    skip_depth = skip_depth.saturating_sub(1);
                } else if skip_depth == 0 {
                    match name.as_ref() {
                        b"w:p" => {
                            paragraph_depth = paragraph_depth.saturating_sub(1);
                            // A stray inner paragraph folds into the outer one.
                            if paragraph_depth == 0 {
                                paragraphs.push(std::mem::take(&mut current));
                            }
                        }
                        b"w:r" => run_depth = run_depth.saturating_sub(1),
                        b"w:t" => in_text = false,
                        _ => {}
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}
