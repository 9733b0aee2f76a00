pub mod ingest;
pub mod profile;
pub mod prompt;
pub mod report;
pub mod segment;

use informe_core::error::InformeError;
use informe_core::ingest::{Ingestor, SourceFile};
use informe_core::model::{SourceKind, TabularResult};
use informe_core::readers::pdftotext::PdftotextExtractor;
use informe_core::readers::web::HttpFetcher;

use tracing::debug;

use crate::args::SourceArgs;

/// Ingest the file or URL named on the command line.
///
/// A failed ingestion ends the command with its diagnostic.
pub fn load(source: &SourceArgs) -> Result<TabularResult, InformeError> {
    let file = match &source.input_file {
        Some(path) => {
            let file = SourceFile::from_path(path)?;
            Some(match &source.mime {
                Some(mime) => file.with_mime(mime.clone()),
                None => file,
            })
        }
        None => None,
    };

    let wants_pdf = file
        .as_ref()
        .is_some_and(|f| f.declared_kind() == Some(SourceKind::Pdf));
    if wants_pdf && !PdftotextExtractor::is_available() {
        return Err(InformeError::PdftotextNotFound);
    }

    let extractor = PdftotextExtractor::new();
    let fetcher = HttpFetcher::new(&source.fetch_config())?;
    let ingestor = Ingestor::new(&extractor, &fetcher);
    let ingestion = ingestor.ingest(file.as_ref(), source.url.as_deref());
    debug!(
        kind = %ingestion.table.source_kind(),
        rows = ingestion.table.row_count(),
        "source loaded"
    );

    if !ingestion.skipped_rows.is_empty() {
        eprintln!("{} malformed row(s) skipped:", ingestion.skipped_rows.len());
        for row in &ingestion.skipped_rows {
            eprintln!("  line {}: {}", row.line, row.reason);
        }
    }

    match ingestion.failure {
        Some(e) => Err(e),
        None => Ok(ingestion.table),
    }
}

pub(crate) fn warn_quartiles(diagnostic: Option<&str>) {
    if let Some(message) = diagnostic {
        eprintln!("  warning: {message}");
    }
}
