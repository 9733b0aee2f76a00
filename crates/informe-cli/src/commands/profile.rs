use informe_core::error::InformeError;
use informe_core::filter::{profile, ColumnProfile};
use informe_core::model::ColumnType;
use informe_core::normalize::coerce_object_columns;
use serde::Serialize;

use crate::args::SourceArgs;
use crate::commands::load;
use crate::output;

#[derive(Debug, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub column_type: ColumnType,
    pub missing: usize,
    pub profile: ColumnProfile,
}

pub fn run(source: &SourceArgs, output_format: &str) -> Result<(), InformeError> {
    let table = coerce_object_columns(load(source)?);

    let summaries: Vec<ColumnSummary> = table
        .columns()
        .iter()
        .map(|column| ColumnSummary {
            name: column.name().to_string(),
            column_type: column.column_type(),
            missing: column.values().iter().filter(|v| v.is_empty()).count(),
            profile: profile(column),
        })
        .collect();

    match output_format {
        "json" => output::json::print(&summaries)?,
        _ => output::table::print_profiles(&summaries, table.source_kind(), table.row_count()),
    }

    Ok(())
}
