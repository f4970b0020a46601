// PDF Text Extraction Service
// Turns a PDF byte stream into normalized full text plus per-page text.
// A page that fails to decode contributes an empty string; only a document
// that cannot be opened at all fails the whole extraction.

use std::path::Path;
use std::sync::OnceLock;

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use regex::Regex;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::models::{ExtractedDocument, PageText};

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("failed to open or parse PDF: {0}")]
    Failed(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("extraction cancelled")]
    Cancelled,
}

/// Extract text from a PDF file on disk.
///
/// Fails with `NotFound` if the path does not exist, otherwise behaves like
/// [`extract_from_bytes`].
pub fn extract_from_path(
    path: impl AsRef<Path>,
    cancel: &CancellationToken,
) -> Result<ExtractedDocument, ExtractionError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ExtractionError::NotFound(path.display().to_string()));
    }

    let bytes = std::fs::read(path).map_err(|e| ExtractionError::Failed(Box::new(e)))?;
    extract_from_bytes(&bytes, cancel)
}

/// Extract text from in-memory PDF content.
///
/// Empty input yields an empty `ExtractedDocument` rather than an error
/// (defensive default for malformed uploads); a document that cannot be
/// opened or parsed fails with `Failed`. Cancellation is observed between
/// pages. Page texts and the joined full text are normalized.
pub fn extract_from_bytes(
    bytes: &[u8],
    cancel: &CancellationToken,
) -> Result<ExtractedDocument, ExtractionError> {
    if bytes.is_empty() {
        warn!("empty PDF input provided");
        return Ok(ExtractedDocument::default());
    }

    let doc = Document::load_mem(bytes).map_err(|e| ExtractionError::Failed(Box::new(e)))?;

    // lopdf auto-decrypts with an empty password on load; anything still
    // encrypted here is not accessible.
    if doc.is_encrypted() {
        return Err(ExtractionError::Failed(
            "PDF is encrypted and could not be decrypted".into(),
        ));
    }

    let mut pages = Vec::new();

    for (page_number, page_id) in doc.get_pages() {
        if cancel.is_cancelled() {
            return Err(ExtractionError::Cancelled);
        }

        let text = match page_text(&doc, page_id) {
            Ok(text) => normalize_text(&text),
            Err(e) => {
                warn!(page = page_number, error = %e, "failed to extract text from page");
                String::new()
            }
        };

        pages.push(PageText { page_number, text });
    }

    let full_text = normalize_text(
        &pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
    );

    info!(
        chars = full_text.len(),
        pages = pages.len(),
        "extracted text from PDF"
    );

    Ok(ExtractedDocument { full_text, pages })
}

/// Decode the text-showing operators of one page's content stream.
fn page_text(doc: &Document, page_id: ObjectId) -> Result<String, lopdf::Error> {
    let content_bytes = doc.get_page_content(page_id)?;
    let content = Content::decode(&content_bytes)?;

    let mut text = String::new();

    for operation in &content.operations {
        match operation.operator.as_str() {
            // Text showing operators
            "Tj" | "TJ" | "'" | "\"" => {
                for operand in &operation.operands {
                    if let Some(s) = decode_text_object(operand) {
                        text.push_str(&s);
                        text.push(' ');
                    }
                }
            }
            // Text positioning: line break for readability
            "Td" | "TD" | "T*" => {
                if !text.ends_with('\n') && !text.ends_with(' ') {
                    text.push('\n');
                }
            }
            _ => {}
        }
    }

    Ok(text)
}

/// Decode a PDF string object (UTF-16BE with BOM, else Latin-1) or the mixed
/// string/positioning array used by the TJ operator.
fn decode_text_object(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => {
            if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
                let utf16: Vec<u16> = bytes[2..]
                    .chunks(2)
                    .filter_map(|chunk| {
                        if chunk.len() == 2 {
                            Some(u16::from_be_bytes([chunk[0], chunk[1]]))
                        } else {
                            None
                        }
                    })
                    .collect();
                String::from_utf16(&utf16).ok()
            } else {
                Some(bytes.iter().map(|&b| b as char).collect())
            }
        }
        Object::Array(arr) => {
            let mut result = String::new();
            for item in arr {
                if let Some(s) = decode_text_object(item) {
                    result.push_str(&s);
                }
            }
            if result.is_empty() {
                None
            } else {
                Some(result)
            }
        }
        _ => None,
    }
}

/// Normalize extracted text: unify line breaks, collapse runs of spaces,
/// reduce 3+ newlines to a paragraph break, trim.
pub fn normalize_text(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    static SPACES: OnceLock<Regex> = OnceLock::new();
    static NEWLINES: OnceLock<Regex> = OnceLock::new();

    let spaces = SPACES.get_or_init(|| Regex::new(r" +").expect("spaces pattern"));
    let newlines = NEWLINES.get_or_init(|| Regex::new(r"\n{3,}").expect("newlines pattern"));

    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = spaces.replace_all(&text, " ");
    let text = newlines.replace_all(&text, "\n\n");

    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;
    use lopdf::{dictionary, Stream};

    #[test]
    fn test_normalize_line_breaks() {
        assert_eq!(normalize_text("one\r\ntwo\rthree"), "one\ntwo\nthree");
    }

    #[test]
    fn test_normalize_collapses_spaces() {
        assert_eq!(normalize_text("a    b  c"), "a b c");
    }

    #[test]
    fn test_normalize_paragraph_breaks() {
        assert_eq!(normalize_text("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(normalize_text("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_normalize_trims_result() {
        assert_eq!(normalize_text("  hello  \n"), "hello");
        assert_eq!(normalize_text("   \n\t "), "");
    }

    #[test]
    fn test_missing_path_is_not_found() {
        let cancel = CancellationToken::new();
        let result = extract_from_path("/nonexistent/contract.pdf", &cancel);
        assert!(matches!(result, Err(ExtractionError::NotFound(_))));
    }

    #[test]
    fn test_empty_bytes_yield_empty_document() {
        let cancel = CancellationToken::new();
        let doc = extract_from_bytes(&[], &cancel).unwrap();
        assert!(doc.is_empty());
        assert!(doc.pages.is_empty());
    }

    #[test]
    fn test_garbage_bytes_fail_extraction() {
        let cancel = CancellationToken::new();
        let result = extract_from_bytes(b"this is not a pdf at all", &cancel);
        assert!(matches!(result, Err(ExtractionError::Failed(_))));
    }

    /// Encode a minimal text-showing content stream for one page.
    fn encode_text_content(text: &str) -> Vec<u8> {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        content.encode().expect("encode content")
    }

    /// Build a small single-font PDF with one uncompressed content stream per
    /// page. Streams are taken as-is, so a page can carry undecodable bytes.
    fn build_pdf_from_streams(streams: Vec<Vec<u8>>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let count = streams.len() as i64;
        let mut kids = Vec::new();
        for stream in streams {
            let content_id = doc.add_object(Stream::new(dictionary! {}, stream));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).expect("save pdf");
        buffer
    }

    fn build_pdf(page_texts: &[&str]) -> Vec<u8> {
        build_pdf_from_streams(page_texts.iter().map(|t| encode_text_content(t)).collect())
    }

    #[test]
    fn test_round_trip_extraction() {
        let bytes = build_pdf(&[
            "The renewal period is set at 12 months.",
            "The termination clause requires 60 days notice.",
        ]);

        let cancel = CancellationToken::new();
        let doc = extract_from_bytes(&bytes, &cancel).unwrap();

        assert_eq!(doc.pages.len(), 2);
        assert_eq!(doc.pages[0].page_number, 1);
        assert_eq!(doc.pages[1].page_number, 2);
        assert!(doc.pages[0].text.contains("renewal period"));
        assert!(doc.pages[1].text.contains("termination clause"));
        assert!(doc.full_text.contains("renewal period"));
        assert!(doc.full_text.contains("termination clause"));
    }

    #[test]
    fn test_undecodable_page_contributes_empty_text() {
        let bytes = build_pdf_from_streams(vec![
            encode_text_content("The renewal period is set at 12 months."),
            vec![0xFF, 0xFE, 0x00, 0x28],
        ]);

        let cancel = CancellationToken::new();
        let doc = extract_from_bytes(&bytes, &cancel).unwrap();

        assert_eq!(doc.pages.len(), 2);
        assert!(doc.pages[0].text.contains("renewal period"));
        assert_eq!(doc.pages[1].text, "");
        assert!(doc.full_text.contains("renewal period"));
    }

    #[test]
    fn test_cancelled_before_first_page() {
        let bytes = build_pdf(&["Some contract text."]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = extract_from_bytes(&bytes, &cancel);
        assert!(matches!(result, Err(ExtractionError::Cancelled)));
    }
}
