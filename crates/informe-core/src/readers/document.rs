use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use crate::error::InformeError;
use crate::model::{SourceKind, TabularResult};

const DOCUMENT_PART: &str = "word/document.xml";

/// Read a `.docx` file into a single-text result, one paragraph per line.
pub fn read_document(bytes: &[u8]) -> Result<TabularResult, InformeError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| InformeError::read(SourceKind::Document, format!("not a .docx archive: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| InformeError::read(SourceKind::Document, format!("{DOCUMENT_PART}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| InformeError::read(SourceKind::Document, e))?;

    let paragraphs = extract_paragraphs(&xml)?;
    debug!(paragraphs = paragraphs.len(), "read document");

    let mut text = String::new();
    for paragraph in &paragraphs {
        text.push_str(paragraph);
        text.push('\n');
    }
    Ok(TabularResult::single_text(SourceKind::Document, text))
}

/// Collect the text of the paragraphs directly under `w:body`, in document
/// order.
///
/// Runs are concatenated; `w:tab` becomes a tab and `w:br` / `w:cr` a newline.
/// Paragraphs inside tables are skipped, and text-box content anchored in a
/// paragraph does not count towards its text.
fn extract_paragraphs(xml: &str) -> Result<Vec<String>, InformeError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut current: Option<String> = None;
    let mut text_boxes = 0usize;
    let mut in_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| InformeError::read(SourceKind::Document, format!("malformed XML: {e}")))?;
        match event {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                match name.as_slice() {
                    b"p" if current.is_none() && under_body(&path) => current = Some(String::new()),
                    b"txbxContent" if current.is_some() => text_boxes += 1,
                    b"t" => in_text = true,
                    _ => {}
                }
                path.push(name);
            }
            Event::End(e) => {
                path.pop();
                match e.local_name().as_ref() {
                    b"p" if under_body(&path) => {
                        if let Some(paragraph) = current.take() {
                            paragraphs.push(paragraph);
                        }
                    }
                    b"txbxContent" if current.is_some() => text_boxes = text_boxes.saturating_sub(1),
                    b"t" => in_text = false,
                    _ => {}
                }
            }
            Event::Empty(e) => match e.local_name().as_ref() {
                b"p" if under_body(&path) => paragraphs.push(String::new()),
                b"tab" if text_boxes == 0 => push_text(&mut current, "\t"),
                b"br" | b"cr" if text_boxes == 0 => push_text(&mut current, "\n"),
                _ => {}
            },
            Event::Text(t) if in_text && text_boxes == 0 => {
                let text = t.unescape().map_err(|e| {
                    InformeError::read(SourceKind::Document, format!("malformed XML text: {e}"))
                })?;
                push_text(&mut current, &text);
            }
            Event::CData(t) if in_text && text_boxes == 0 => {
                push_text(&mut current, &String::from_utf8_lossy(&t));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn under_body(path: &[Vec<u8>]) -> bool {
    path.last().is_some_and(|name| name.as_slice() == b"body")
}

fn push_text(current: &mut Option<String>, text: &str) {
    if let Some(paragraph) = current {
        paragraph.push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Informe de </w:t></w:r><w:r><w:t>ventas</w:t></w:r></w:p>
    <w:p/>
    <w:p><w:r><w:t>Total:</w:t><w:tab/><w:t>120 &amp; más</w:t></w:r></w:p>
    <w:p><w:r><w:instrText>PAGE</w:instrText><w:t>Fin</w:t><w:br/><w:t>línea</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

    #[test]
    fn test_extract_paragraphs() {
        let paragraphs = extract_paragraphs(BODY).unwrap();
        assert_eq!(
            paragraphs,
            vec!["Informe de ventas", "", "Total:\t120 & más", "Fin\nlínea"]
        );
    }

    #[test]
    fn test_skips_table_and_text_box_paragraphs() {
        let xml = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Antes</w:t></w:r></w:p>
    <w:tbl><w:tr><w:tc><w:p><w:r><w:t>celda</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
    <w:p><w:r><w:t>Con </w:t></w:r><w:r><w:pict><w:txbxContent><w:p><w:r><w:t>caja</w:t></w:r></w:p></w:txbxContent></w:pict></w:r><w:r><w:t>dibujo</w:t></w:r></w:p>
    <w:sectPr/>
  </w:body>
</w:document>"#;
        assert_eq!(extract_paragraphs(xml).unwrap(), vec!["Antes", "Con dibujo"]);
    }

    #[test]
    fn test_not_a_zip_fails() {
        let err = read_document(b"plain text, not a docx").unwrap_err();
        assert!(matches!(err, InformeError::ReadFailure { .. }));
    }
}
