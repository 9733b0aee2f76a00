use serde::Serialize;

use crate::error::InformeError;
use crate::filter::{apply_filters, FilterSet};
use crate::model::{SourceKind, TabularResult, Value};
use crate::normalize::{coerce_object_columns, normalize, select_columns, truncate_rows, DISPLAY_ROW_LIMIT};
use crate::quartile::segment;

/// The row-capped, normalized table that is shown and interpolated into
/// prompts. Nothing larger ever leaves the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DisplaySubset {
    table: TabularResult,
}

impl DisplaySubset {
    /// Normalize `table` and cap it at [`DISPLAY_ROW_LIMIT`](crate::normalize::DISPLAY_ROW_LIMIT) rows.
    pub fn new(table: TabularResult) -> Self {
        Self {
            table: normalize(table),
        }
    }

    pub fn table(&self) -> &TabularResult {
        &self.table
    }

    pub fn source_kind(&self) -> SourceKind {
        self.table.source_kind()
    }

    pub fn into_table(self) -> TabularResult {
        self.table
    }

    /// Flat text rendering with a row index column.
    pub fn render(&self) -> String {
        render_table(&self.table)
    }
}

/// Choices applied between ingestion and display.
#[derive(Debug, Clone, Default)]
pub struct PrepareOptions {
    /// Columns to keep, in order. Empty keeps all.
    pub columns: Vec<String>,
    pub filters: FilterSet,
    /// Numeric column to segment into quartiles.
    pub quartile_column: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prepared {
    pub display: DisplaySubset,
    /// Set when quartile binning was degenerate.
    pub quartile_diagnostic: Option<String>,
}

/// Run the pipeline from an ingested table to its display subset:
/// coerce, select columns, cap the rows, then filter and segment the capped
/// rows.
pub fn prepare(table: TabularResult, options: &PrepareOptions) -> Result<Prepared, InformeError> {
    if table.source_kind() == SourceKind::None {
        return Err(InformeError::NoInput);
    }

    let table = coerce_object_columns(table);
    let table = select_columns(table, &options.columns)?;
    let table = truncate_rows(table, DISPLAY_ROW_LIMIT);
    let table = apply_filters(&table, &options.filters)?;

    let (table, quartile_diagnostic) = match &options.quartile_column {
        Some(column) => {
            let outcome = segment(&table, column)?;
            (outcome.table, outcome.diagnostic)
        }
        None => (table, None),
    };

    Ok(Prepared {
        display: DisplaySubset::new(table),
        quartile_diagnostic,
    })
}

/// Render a table as aligned plain text: an index column, then one column per
/// field, right-aligned. Missing values print as `NaN`; line breaks inside a
/// cell print as spaces.
pub fn render_table(table: &TabularResult) -> String {
    if table.column_count() == 0 {
        return "Empty table".to_string();
    }

    let rows = table.row_count();
    let mut grid: Vec<Vec<String>> = Vec::with_capacity(table.column_count() + 1);
    let mut index = vec![String::new()];
    index.extend((0..rows).map(|i| i.to_string()));
    grid.push(index);

    for column in table.columns() {
        let mut cells = vec![column.name().to_string()];
        cells.extend(column.values().iter().map(cell_text));
        grid.push(cells);
    }

    let widths: Vec<usize> = grid
        .iter()
        .map(|cells| cells.iter().map(|c| c.chars().count()).max().unwrap_or(0))
        .collect();

    let mut out = String::new();
    for row in 0..=rows {
        let line: Vec<String> = grid
            .iter()
            .zip(&widths)
            .map(|(cells, &width)| format!("{:>width$}", cells[row]))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Empty => "NaN".to_string(),
        other => other.to_string().replace(['\r', '\n'], " "),
    }
}
