//! Document-to-text normalization.
//!
//! Converts an [`UploadedDocument`] of any supported format into a single
//! plain-text string, or a tagged [`NormalizeError`]. All formats funnel into
//! one text blob: tables become flattened rows, PDF layout becomes a linear
//! stream with page markers. The downstream model consumes plain text only, so
//! structural fidelity is deliberately discarded.
//!
//! Normalization is a pure transformation — no shared state, safe to run
//! concurrently across documents. Parser failures never escape as panics or
//! raw errors; every failure is one of the [`NormalizeError`] kinds.

use std::io::Read;

use quick_xml::events::Event;

use crate::document::{MediaType, UploadedDocument};

/// Normalization failure, tagged by kind so callers can decide policy.
#[derive(Debug)]
pub enum NormalizeError {
    /// Extension not recognized; no decode was attempted.
    Unsupported(String),
    /// Neither UTF-8 nor the Latin-1 fallback produced text.
    DecodeFailed(String),
    /// The parser succeeded but yielded no text (likely image-based or
    /// encrypted content, or a genuinely empty document).
    Empty(String),
    /// The underlying parser failed on a malformed or corrupt file.
    Parser(String),
}

impl std::fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NormalizeError::Unsupported(name) => {
                write!(f, "unsupported file type: {}", name)
            }
            NormalizeError::DecodeFailed(detail) => {
                write!(f, "could not decode file as text: {}", detail)
            }
            NormalizeError::Empty(detail) => {
                write!(f, "no text could be extracted: {}", detail)
            }
            NormalizeError::Parser(detail) => {
                write!(f, "failed to parse file: {}", detail)
            }
        }
    }
}

impl std::error::Error for NormalizeError {}

/// Extract plain UTF-8 text from an uploaded document.
///
/// Dispatches on the declared media type:
/// - text formats (`.txt`, `.md`, `.csv`) are decoded as UTF-8, falling back
///   to Latin-1 (total over arbitrary bytes) on invalid UTF-8;
/// - PDF pages are concatenated with a `--- Page N ---` marker before each
///   page's text;
/// - Word documents yield paragraph text first, then table cell text
///   (row-major, all tables after all paragraphs);
/// - unrecognized extensions are refused without any decode attempt.
pub fn normalize(doc: &UploadedDocument) -> Result<String, NormalizeError> {
    match doc.media_type {
        MediaType::PlainText | MediaType::Markdown | MediaType::Csv => decode_text(&doc.bytes),
        MediaType::Pdf => extract_pdf(&doc.bytes),
        MediaType::Word => extract_docx(&doc.bytes),
        MediaType::Unsupported => Err(NormalizeError::Unsupported(doc.name.clone())),
    }
}

/// Two-tier text decode: UTF-8 first, then Latin-1.
///
/// Latin-1 maps every byte to a char, so the fallback always succeeds and
/// [`NormalizeError::DecodeFailed`] is practically unreachable.
fn decode_text(bytes: &[u8]) -> Result<String, NormalizeError> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Ok(s.to_string()),
        Err(_) => Ok(bytes.iter().map(|&b| b as char).collect()),
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String, NormalizeError> {
    if bytes.is_empty() {
        return Err(NormalizeError::Empty(
            "the PDF contains no data".to_string(),
        ));
    }
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| NormalizeError::Parser(format!("PDF: {}", e)))?;
    join_pages(&pages).ok_or_else(|| {
        NormalizeError::Empty("the PDF is likely image-based or encrypted".to_string())
    })
}

/// Concatenate per-page text with a marker before each non-blank page.
///
/// Page numbers follow the page's position in the document, so blank pages
/// consume a number even though they emit no marker. Returns `None` when no
/// page has extractable text.
fn join_pages(pages: &[String]) -> Option<String> {
    let mut out = String::new();
    for (idx, page) in pages.iter().enumerate() {
        if page.trim().is_empty() {
            continue;
        }
        out.push_str(&format!("\n--- Page {} ---\n", idx + 1));
        out.push_str(page);
    }
    if out.trim().is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Maximum decompressed bytes to read from the document part (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

fn extract_docx(bytes: &[u8]) -> Result<String, NormalizeError> {
    if bytes.is_empty() {
        return Err(NormalizeError::Empty(
            "the document contains no data".to_string(),
        ));
    }
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| NormalizeError::Parser(format!("docx: {}", e)))?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|e| NormalizeError::Parser(format!("docx: {}", e)))?;
    let mut doc_xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut doc_xml)
        .map_err(|e| NormalizeError::Parser(format!("docx: {}", e)))?;
    if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(NormalizeError::Parser(
            "docx: word/document.xml exceeds size limit".to_string(),
        ));
    }
    let (paragraphs, cells) = collect_document_text(&doc_xml)?;
    let mut out = String::new();
    for line in paragraphs.iter().chain(cells.iter()) {
        out.push_str(line);
        out.push('\n');
    }
    if out.trim().is_empty() {
        Err(NormalizeError::Empty(
            "the document might be empty".to_string(),
        ))
    } else {
        Ok(out)
    }
}

/// Walk `word/document.xml` collecting paragraph text and table cell text.
///
/// Paragraph text is one entry per non-empty `w:p` outside any table; cell
/// text is one entry per non-empty `w:tc`, in document (row-major) order.
/// Paragraphs nested inside a cell accumulate into the cell's entry.
fn collect_document_text(xml: &[u8]) -> Result<(Vec<String>, Vec<String>), NormalizeError> {
    // Text events are gated to w:t content, so no trim_text here: trimming
    // would eat significant spaces at run boundaries ("Hobbes, " + "Leviathan").
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut paragraphs: Vec<String> = Vec::new();
    let mut cells: Vec<String> = Vec::new();
    let mut para_buf = String::new();
    let mut cell_buf = String::new();
    let mut table_depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"tbl" => table_depth += 1,
                b"tc" => cell_buf.clear(),
                b"p" if table_depth == 0 => para_buf.clear(),
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t.unescape().unwrap_or_default();
                if table_depth > 0 {
                    cell_buf.push_str(&text);
                } else {
                    para_buf.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" if table_depth == 0 => {
                    if !para_buf.trim().is_empty() {
                        paragraphs.push(para_buf.trim().to_string());
                    }
                    para_buf.clear();
                }
                b"tc" => {
                    if !cell_buf.trim().is_empty() {
                        cells.push(cell_buf.trim().to_string());
                    }
                    cell_buf.clear();
                }
                b"tbl" => table_depth = table_depth.saturating_sub(1),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(NormalizeError::Parser(format!("docx: {}", e))),
            _ => {}
        }
        buf.clear();
    }

    Ok((paragraphs, cells))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::UploadedDocument;
    use std::io::Write;

    fn docx_from_xml(body: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            let xml = format!(
                "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
                body
            );
            zip.write_all(xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf
    }

    #[test]
    fn valid_utf8_text_passes_through_unchanged() {
        for name in ["notes.txt", "notes.md", "notes.csv"] {
            let doc = UploadedDocument::new(name, "Plato, Republic — 375 BC".as_bytes().to_vec());
            assert_eq!(normalize(&doc).unwrap(), "Plato, Republic — 375 BC");
        }
    }

    #[test]
    fn invalid_utf8_falls_back_to_latin1() {
        // "café" encoded as Latin-1: 0xE9 is invalid as a UTF-8 start byte.
        let doc = UploadedDocument::new("menu.txt", vec![0x63, 0x61, 0x66, 0xE9]);
        assert_eq!(normalize(&doc).unwrap(), "café");
    }

    #[test]
    fn empty_text_file_decodes_to_empty_string() {
        let doc = UploadedDocument::new("blank.txt", Vec::new());
        assert_eq!(normalize(&doc).unwrap(), "");
    }

    #[test]
    fn unsupported_extension_is_refused_without_decoding() {
        let doc = UploadedDocument::new("sheet.xlsx", b"PK\x03\x04".to_vec());
        let err = normalize(&doc).unwrap_err();
        assert!(matches!(err, NormalizeError::Unsupported(ref name) if name == "sheet.xlsx"));
    }

    #[test]
    fn invalid_pdf_reports_parser_failure() {
        let doc = UploadedDocument::new("bad.pdf", b"not a pdf at all".to_vec());
        assert!(matches!(
            normalize(&doc).unwrap_err(),
            NormalizeError::Parser(_)
        ));
    }

    #[test]
    fn zero_byte_pdf_reports_extraction_empty() {
        let doc = UploadedDocument::new("scan.pdf", Vec::new());
        assert!(matches!(
            normalize(&doc).unwrap_err(),
            NormalizeError::Empty(_)
        ));
    }

    #[test]
    fn page_markers_are_ascending_and_precede_page_text() {
        let pages = vec![
            "First page text".to_string(),
            "Second page text".to_string(),
            "Third page text".to_string(),
        ];
        let joined = join_pages(&pages).unwrap();
        let p1 = joined.find("--- Page 1 ---").unwrap();
        let p2 = joined.find("--- Page 2 ---").unwrap();
        let p3 = joined.find("--- Page 3 ---").unwrap();
        assert!(p1 < p2 && p2 < p3);
        assert!(joined.find("First page text").unwrap() > p1);
        assert!(joined.find("Second page text").unwrap() > p2);
        assert!(joined.find("Third page text").unwrap() > p3);
    }

    #[test]
    fn blank_pages_keep_their_page_number() {
        let pages = vec![
            "Opening".to_string(),
            "   ".to_string(),
            "Closing".to_string(),
        ];
        let joined = join_pages(&pages).unwrap();
        assert!(joined.contains("--- Page 1 ---"));
        assert!(!joined.contains("--- Page 2 ---"));
        assert!(joined.contains("--- Page 3 ---"));
    }

    #[test]
    fn all_blank_pages_yield_nothing() {
        let pages = vec!["".to_string(), "  \n ".to_string()];
        assert!(join_pages(&pages).is_none());
    }

    #[test]
    fn docx_paragraphs_come_before_table_cells() {
        let body = "\
            <w:p><w:r><w:t>First paragraph</w:t></w:r></w:p>\
            <w:tbl><w:tr>\
              <w:tc><w:p><w:r><w:t>Cell A1</w:t></w:r></w:p></w:tc>\
              <w:tc><w:p><w:r><w:t>Cell B1</w:t></w:r></w:p></w:tc>\
            </w:tr><w:tr>\
              <w:tc><w:p><w:r><w:t>Cell A2</w:t></w:r></w:p></w:tc>\
              <w:tc><w:p><w:r><w:t>Cell B2</w:t></w:r></w:p></w:tc>\
            </w:tr></w:tbl>\
            <w:p><w:r><w:t>Second paragraph</w:t></w:r></w:p>";
        let doc = UploadedDocument::new("table.docx", docx_from_xml(body));
        let text = normalize(&doc).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "First paragraph",
                "Second paragraph",
                "Cell A1",
                "Cell B1",
                "Cell A2",
                "Cell B2",
            ]
        );
    }

    #[test]
    fn docx_split_runs_merge_into_one_paragraph() {
        let body = "<w:p><w:r><w:t>Hobbes, </w:t></w:r><w:r><w:t>Leviathan</w:t></w:r></w:p>";
        let doc = UploadedDocument::new("runs.docx", docx_from_xml(body));
        assert_eq!(normalize(&doc).unwrap(), "Hobbes, Leviathan\n");
    }

    #[test]
    fn docx_with_only_whitespace_reports_extraction_empty() {
        let body = "<w:p><w:r><w:t> </w:t></w:r></w:p>";
        let doc = UploadedDocument::new("empty.docx", docx_from_xml(body));
        assert!(matches!(
            normalize(&doc).unwrap_err(),
            NormalizeError::Empty(_)
        ));
    }

    #[test]
    fn docx_that_is_not_a_zip_reports_parser_failure() {
        let doc = UploadedDocument::new("broken.docx", b"not a zip archive".to_vec());
        assert!(matches!(
            normalize(&doc).unwrap_err(),
            NormalizeError::Parser(_)
        ));
    }

    #[test]
    fn zero_byte_docx_reports_extraction_empty() {
        let doc = UploadedDocument::new("blank.docx", Vec::new());
        assert!(matches!(
            normalize(&doc).unwrap_err(),
            NormalizeError::Empty(_)
        ));
    }
}
