use crate::error::InformeError;
use crate::model::{SourceKind, TabularResult};
use crate::readers::{PageContent, PdfExtractor};
use tracing::debug;

/// Read a PDF into a single-text result: one chunk per page, joined with
/// newlines. Pages without extractable text are left out.
pub fn read_pdf(bytes: &[u8], extractor: &dyn PdfExtractor) -> Result<TabularResult, InformeError> {
    let pages = extractor.extract_pages(bytes)?;
    debug!(
        backend = extractor.backend_name(),
        pages = pages.len(),
        "extracted PDF pages"
    );
    Ok(TabularResult::single_text(SourceKind::Pdf, join_pages(&pages)))
}

fn join_pages(pages: &[PageContent]) -> String {
    pages
        .iter()
        .map(|p| p.lines.join("\n"))
        .filter(|text| !text.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(number: usize, lines: &[&str]) -> PageContent {
        PageContent {
            page_number: number,
            lines: lines.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_join_pages_skips_empty() {
        let pages = vec![
            page(1, &["Ventas 2024", "Resumen"]),
            page(2, &["", "   "]),
            page(3, &["Anexo"]),
        ];
        assert_eq!(join_pages(&pages), "Ventas 2024\nResumen\nAnexo");
    }

    #[test]
    fn test_join_pages_all_empty() {
        assert_eq!(join_pages(&[page(1, &[])]), "");
    }
}
