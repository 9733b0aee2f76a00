pub mod config;
pub mod display;
pub mod error;
pub mod filter;
pub mod generate;
pub mod ingest;
pub mod model;
pub mod normalize;
pub mod prompt;
pub mod quartile;
pub mod readers;
pub mod report;
pub mod validate;

use display::DisplaySubset;
use error::InformeError;
use generate::ReportGenerator;
use prompt::{AnalysisLevel, PromptTable};
use report::Report;
use tracing::info;

/// Main API entry point: turn a prepared display table into a report.
///
/// Builds the prompt for the source's template family and `level`, sends it
/// to `generator` and parses the returned text into report lines.
pub fn generate_report(
    display: &DisplaySubset,
    level: AnalysisLevel,
    context: Option<&str>,
    templates: &PromptTable,
    generator: &dyn ReportGenerator,
) -> Result<Report, InformeError> {
    let prompt = templates.build(display, level, context)?;
    let text = generator.generate(&prompt)?;
    let report = Report::parse(&text);
    info!(
        backend = generator.backend_name(),
        lines = report.lines().len(),
        "generated report"
    );
    Ok(report)
}
