use std::path::PathBuf;

use informe_core::display::prepare;
use informe_core::error::InformeError;

use crate::args::{PrepareArgs, SourceArgs};
use crate::commands::{load, warn_quartiles};
use crate::output;

pub fn run(
    source: &SourceArgs,
    prepare_args: &PrepareArgs,
    output_format: &str,
    output_file: Option<PathBuf>,
) -> Result<(), InformeError> {
    let table = load(source)?;
    let total_rows = table.row_count();
    let prepared = prepare(table, &prepare_args.to_options())?;
    warn_quartiles(prepared.quartile_diagnostic.as_deref());

    match output_file {
        Some(path) => {
            // Always write JSON when saving to file
            let json = serde_json::to_string_pretty(&prepared.display)?;
            std::fs::write(&path, json)?;
            eprintln!(
                "Loaded {} row(s), {} shown, written to {}",
                total_rows,
                prepared.display.table().row_count(),
                path.display()
            );
        }
        None => match output_format {
            "json" => output::json::print(&prepared.display)?,
            _ => output::table::print_display(&prepared.display, total_rows),
        },
    }

    Ok(())
}
