//! One reader per source kind. Every reader turns raw content into a
//! [`TabularResult`](crate::model::TabularResult) or an [`InformeError`];
//! the ingestion dispatcher turns errors into the empty `none` result.

pub mod delimited;
pub mod document;
pub mod pdf;
pub mod pdftotext;
pub mod spreadsheet;
pub mod web;

use crate::error::InformeError;

/// Text extracted from a single page of a PDF.
#[derive(Debug, Clone)]
pub struct PageContent {
    pub page_number: usize,
    pub lines: Vec<String>,
}

/// Trait for PDF text extraction backends.
pub trait PdfExtractor: Send + Sync {
    /// Extract text content from PDF bytes, returning one PageContent per page.
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageContent>, InformeError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Trait for fetching web pages.
pub trait PageFetcher: Send + Sync {
    /// GET `url` and return the response body. Error statuses are failures.
    fn fetch(&self, url: &str) -> Result<String, InformeError>;

    /// Name of this fetch backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Make header names usable as column keys: blank names become
/// `Unnamed: <index>` and repeats get a `.1`, `.2`, ... suffix.
pub(crate) fn unique_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(raw.len());
    for (i, name) in raw.into_iter().enumerate() {
        let trimmed = name.trim();
        let base = if trimmed.is_empty() {
            format!("Unnamed: {i}")
        } else {
            trimmed.to_string()
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{base}.{suffix}");
            suffix += 1;
        }
        seen.push(candidate);
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_headers() {
        let headers = unique_headers(vec![
            "Región".into(),
            "".into(),
            "Ventas".into(),
            "Ventas".into(),
            " Ventas ".into(),
        ]);
        assert_eq!(
            headers,
            vec!["Región", "Unnamed: 1", "Ventas", "Ventas.1", "Ventas.2"]
        );
    }
}
