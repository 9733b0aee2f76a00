use std::io::{self, Cursor, Write};

use quick_xml::escape::escape;
use serde::Serialize;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::InformeError;

/// File name offered for the downloadable report.
pub const REPORT_FILENAME: &str = "informe.docx";

pub const REPORT_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Heading placed above the generated text in the document.
pub const REPORT_HEADING: &str = "Informe Generado por CAT-AI";

const TITLE_PREFIX: &str = "Título principal:";
const SUBTITLE_PREFIXES: [&str; 3] = ["Subtítulo 1:", "Subtítulo 2:", "Subtítulo 3:"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "level", rename_all = "lowercase")]
pub enum LineKind {
    Title,
    /// Subtitle level 1 to 3.
    Subtitle(u8),
    Body,
}

/// One line of generated text, with its heading prefix removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    pub kind: LineKind,
    pub text: String,
}

impl ReportLine {
    pub fn parse(line: &str) -> Self {
        if let Some(rest) = line.strip_prefix(TITLE_PREFIX) {
            return Self::heading(LineKind::Title, rest);
        }
        for (level, prefix) in (1u8..).zip(SUBTITLE_PREFIXES) {
            if let Some(rest) = line.strip_prefix(prefix) {
                return Self::heading(LineKind::Subtitle(level), rest);
            }
        }
        ReportLine {
            kind: LineKind::Body,
            text: line.to_string(),
        }
    }

    fn heading(kind: LineKind, rest: &str) -> Self {
        ReportLine {
            kind,
            text: rest.trim_start().to_string(),
        }
    }

    /// Text for on-screen display: markdown emphasis and heading marks removed.
    pub fn screen_text(&self) -> String {
        self.text.replace(['*', '#'], "")
    }
}

/// Generated text split into classified lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    lines: Vec<ReportLine>,
}

impl Report {
    pub fn parse(text: &str) -> Self {
        Report {
            lines: text.lines().map(ReportLine::parse).collect(),
        }
    }

    pub fn lines(&self) -> &[ReportLine] {
        &self.lines
    }

    pub fn title(&self) -> Option<&str> {
        self.lines
            .iter()
            .find(|l| l.kind == LineKind::Title)
            .map(|l| l.text.as_str())
    }

    /// One paragraph per line, as written to the document.
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| l.text.as_str())
    }

    /// Write the report as a minimal `.docx`: the fixed heading followed by
    /// one paragraph per line.
    pub fn to_docx(&self) -> Result<Vec<u8>, InformeError> {
        let mut body = String::new();
        body.push_str(&paragraph_xml(REPORT_HEADING, Some("Title")));
        for text in self.paragraphs() {
            body.push_str(&paragraph_xml(text, None));
        }
        let document = format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
                "<w:body>{}</w:body></w:document>"
            ),
            body
        );

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, content) in [
            ("[Content_Types].xml", CONTENT_TYPES_XML),
            ("_rels/.rels", ROOT_RELS_XML),
            ("word/document.xml", document.as_str()),
        ] {
            zip.start_file(name, options).map_err(io::Error::from)?;
            zip.write_all(content.as_bytes())?;
        }
        let cursor = zip.finish().map_err(io::Error::from)?;
        Ok(cursor.into_inner())
    }
}

fn paragraph_xml(text: &str, style: Option<&str>) -> String {
    let properties = style
        .map(|s| format!(r#"<w:pPr><w:pStyle w:val="{s}"/></w:pPr>"#))
        .unwrap_or_default();
    if text.is_empty() {
        return format!("<w:p>{properties}</w:p>");
    }
    format!(
        r#"<w:p>{properties}<w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        escape(text)
    )
}

const CONTENT_TYPES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
    "</Types>"
);

const ROOT_RELS_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
    "</Relationships>"
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceKind;
    use crate::readers::document::read_document;

    const GENERATED: &str = "Título principal: Informe de **ventas**\n\
        Subtítulo 1: Resumen\n\
        Las ventas crecieron un 12% en la zona #norte.\n\
        \n\
        Subtítulo 3: Recomendaciones";

    #[test]
    fn test_parse_classifies_lines() {
        let report = Report::parse(GENERATED);
        let kinds: Vec<LineKind> = report.lines().iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LineKind::Title,
                LineKind::Subtitle(1),
                LineKind::Body,
                LineKind::Body,
                LineKind::Subtitle(3),
            ]
        );
        assert_eq!(report.title(), Some("Informe de **ventas**"));
        assert_eq!(report.lines()[1].text, "Resumen");
    }

    #[test]
    fn test_screen_text_strips_marks() {
        let report = Report::parse(GENERATED);
        assert_eq!(report.lines()[0].screen_text(), "Informe de ventas");
        assert_eq!(
            report.lines()[2].screen_text(),
            "Las ventas crecieron un 12% en la zona norte."
        );
    }

    #[test]
    fn test_prefix_must_start_the_line() {
        let line = ReportLine::parse("  Subtítulo 2: sangrado");
        assert_eq!(line.kind, LineKind::Body);
    }

    #[test]
    fn test_docx_round_trips_through_document_reader() {
        let report = Report::parse("Título principal: Q1 & Q2 <resumen>\nCuerpo");
        let bytes = report.to_docx().unwrap();
        let table = read_document(&bytes).unwrap();
        assert_eq!(table.source_kind(), SourceKind::Document);
        assert_eq!(
            table.text_content(),
            Some("Informe Generado por CAT-AI\nQ1 & Q2 <resumen>\nCuerpo\n")
        );
    }
}
