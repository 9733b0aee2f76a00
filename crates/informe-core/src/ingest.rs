use std::path::Path;

use tracing::{info, warn};

use crate::error::InformeError;
use crate::model::{SourceKind, TabularResult};
use crate::readers::delimited::{read_delimited, SkippedRow};
use crate::readers::document::read_document;
use crate::readers::pdf::read_pdf;
use crate::readers::spreadsheet::read_spreadsheet;
use crate::readers::web::read_web;
use crate::readers::{PageFetcher, PdfExtractor};
use crate::validate::is_valid_url;

/// An uploaded file: its name, optional MIME type, and contents.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: None,
            bytes,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    pub fn from_path(path: &Path) -> Result<Self, InformeError> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }

    fn extension(&self) -> Option<&str> {
        Path::new(&self.name).extension().and_then(|e| e.to_str())
    }

    /// The kind declared by the MIME type, or failing that by the extension.
    pub fn declared_kind(&self) -> Option<SourceKind> {
        self.mime
            .as_deref()
            .and_then(SourceKind::from_mime)
            .or_else(|| self.extension().and_then(SourceKind::from_extension))
    }

    fn declared_label(&self) -> String {
        match (&self.mime, self.extension()) {
            (Some(mime), _) => mime.clone(),
            (None, Some(ext)) => format!(".{ext}"),
            (None, None) => self.name.clone(),
        }
    }
}

/// Outcome of one ingestion event.
///
/// `table` is always usable; when `failure` is set it is the canonical
/// empty result tagged [`SourceKind::None`].
#[derive(Debug)]
pub struct Ingestion {
    pub table: TabularResult,
    pub failure: Option<InformeError>,
    pub skipped_rows: Vec<SkippedRow>,
}

impl Ingestion {
    fn loaded(table: TabularResult, skipped_rows: Vec<SkippedRow>) -> Self {
        Self {
            table,
            failure: None,
            skipped_rows,
        }
    }

    fn failed(failure: InformeError) -> Self {
        Self {
            table: TabularResult::none(),
            failure: Some(failure),
            skipped_rows: Vec::new(),
        }
    }

    /// True when a reader produced data (possibly with zero rows).
    pub fn is_loaded(&self) -> bool {
        self.table.source_kind() != SourceKind::None
    }

    /// Human-readable message to show instead of data.
    pub fn diagnostic(&self) -> Option<String> {
        self.failure.as_ref().map(|e| e.to_string())
    }
}

/// Routes a file or a URL to the matching reader.
pub struct Ingestor<'a> {
    pdf: &'a dyn PdfExtractor,
    fetcher: &'a dyn PageFetcher,
}

impl<'a> Ingestor<'a> {
    pub fn new(pdf: &'a dyn PdfExtractor, fetcher: &'a dyn PageFetcher) -> Self {
        Self { pdf, fetcher }
    }

    /// Ingest a file, or a URL when no file is given.
    ///
    /// Never fails: any problem yields the `none` table plus a diagnostic.
    pub fn ingest(&self, file: Option<&SourceFile>, url: Option<&str>) -> Ingestion {
        let url = url.map(str::trim).filter(|u| !u.is_empty());

        let result = match (file, url) {
            (Some(file), _) => self.read_file(file),
            (None, Some(url)) if is_valid_url(url) => {
                read_web(url, self.fetcher).map(|table| (table, Vec::new()))
            }
            _ => Err(InformeError::NoInput),
        };

        match result {
            Ok((table, skipped_rows)) => {
                info!(
                    kind = %table.source_kind(),
                    columns = table.column_count(),
                    rows = table.row_count(),
                    "ingested source"
                );
                Ingestion::loaded(table, skipped_rows)
            }
            Err(e) => {
                warn!(error = %e, "ingestion failed");
                Ingestion::failed(e)
            }
        }
    }

    /// Read a file with the reader for its declared kind.
    pub fn read_file(
        &self,
        file: &SourceFile,
    ) -> Result<(TabularResult, Vec<SkippedRow>), InformeError> {
        let kind = file
            .declared_kind()
            .ok_or_else(|| InformeError::UnsupportedKind(file.declared_label()))?;

        match kind {
            SourceKind::Spreadsheet => Ok((read_spreadsheet(&file.bytes)?, Vec::new())),
            SourceKind::DelimitedText => {
                let read = read_delimited(&file.bytes)?;
                Ok((read.table, read.skipped_rows))
            }
            SourceKind::Document => Ok((read_document(&file.bytes)?, Vec::new())),
            SourceKind::Pdf => Ok((read_pdf(&file.bytes, self.pdf)?, Vec::new())),
            SourceKind::WebPage | SourceKind::None => {
                Err(InformeError::UnsupportedKind(file.declared_label()))
            }
        }
    }
}
