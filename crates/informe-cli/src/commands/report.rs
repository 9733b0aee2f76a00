use std::path::PathBuf;

use informe_core::display::prepare;
use informe_core::error::InformeError;
use informe_core::generate::GeminiClient;
use informe_core::generate_report;
use informe_core::prompt::load_templates;

use crate::args::{GeneratorArgs, PrepareArgs, PromptArgs, SourceArgs};
use crate::commands::{load, warn_quartiles};
use crate::output;

pub fn run(
    source: &SourceArgs,
    prepare_args: &PrepareArgs,
    prompt_args: &PromptArgs,
    generator_args: &GeneratorArgs,
    output_format: &str,
    output_file: Option<PathBuf>,
) -> Result<(), InformeError> {
    let templates = load_templates()?;
    let client = GeminiClient::new(&generator_args.config())?;

    let prepared = prepare(load(source)?, &prepare_args.to_options())?;
    warn_quartiles(prepared.quartile_diagnostic.as_deref());

    let report = generate_report(
        &prepared.display,
        prompt_args.level,
        prompt_args.context.as_deref(),
        &templates,
        &client,
    )?;

    match output_format {
        "json" => output::json::print(&report)?,
        _ => output::table::print_report(&report),
    }

    if let Some(path) = output_file {
        std::fs::write(&path, report.to_docx()?)?;
        eprintln!("Report written to {}", path.display());
    }

    Ok(())
}
