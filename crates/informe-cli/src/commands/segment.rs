use informe_core::display::DisplaySubset;
use informe_core::error::InformeError;
use informe_core::normalize::coerce_object_columns;
use informe_core::quartile::segment;

use crate::args::SourceArgs;
use crate::commands::{load, warn_quartiles};
use crate::output;

pub fn run(source: &SourceArgs, column: &str, output_format: &str) -> Result<(), InformeError> {
    let table = coerce_object_columns(load(source)?);
    let outcome = segment(&table, column)?;
    warn_quartiles(outcome.diagnostic.as_deref());

    match output_format {
        "json" => output::json::print(&outcome)?,
        _ => {
            output::table::print_segments(&outcome, column);
            println!();
            output::table::print_display(&DisplaySubset::new(outcome.table.clone()), table.row_count());
        }
    }

    Ok(())
}
