use tracing::debug;

use crate::error::InformeError;
use crate::model::{Column, ColumnType, TabularResult, Value};

/// Row cap applied before anything is displayed or sent out.
pub const DISPLAY_ROW_LIMIT: usize = 100;

/// Coerce text and mixed columns to plain text, then keep the first
/// [`DISPLAY_ROW_LIMIT`] rows.
pub fn normalize(table: TabularResult) -> TabularResult {
    truncate_rows(coerce_object_columns(table), DISPLAY_ROW_LIMIT)
}

/// Every column that is not strictly numeric or date has each cell turned
/// into its text form. Empty cells become empty strings.
pub fn coerce_object_columns(table: TabularResult) -> TabularResult {
    let (kind, columns) = table.into_columns();
    let columns = columns
        .into_iter()
        .map(|column| match column.column_type() {
            ColumnType::Numeric | ColumnType::Date => column,
            ColumnType::Text | ColumnType::Mixed => {
                let values = column
                    .values()
                    .iter()
                    .map(|v| match v {
                        Value::Text(_) => v.clone(),
                        other => Value::Text(other.to_string()),
                    })
                    .collect();
                Column::new(column.name(), values)
            }
        })
        .collect();
    TabularResult::from_columns(kind, columns)
}

/// Keep the first `limit` rows.
pub fn truncate_rows(table: TabularResult, limit: usize) -> TabularResult {
    let rows = table.row_count();
    if rows <= limit {
        return table;
    }
    debug!(rows, limit, "truncating rows");
    let keep: Vec<usize> = (0..limit).collect();
    table.take_rows(&keep)
}

/// Restrict the table to `names`, in the order given. An empty selection
/// keeps every column.
pub fn select_columns(table: TabularResult, names: &[String]) -> Result<TabularResult, InformeError> {
    if names.is_empty() {
        return Ok(table);
    }
    for name in names {
        if table.column(name).is_none() {
            return Err(InformeError::invalid_column(name, "no such column"));
        }
    }
    let (kind, mut columns) = table.into_columns();
    let mut selected = Vec::with_capacity(names.len());
    for name in names {
        if let Some(pos) = columns.iter().position(|c| c.name() == name) {
            selected.push(columns.remove(pos));
        }
    }
    Ok(TabularResult::from_columns(kind, selected))
}
