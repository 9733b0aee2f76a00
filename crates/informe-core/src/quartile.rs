use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::InformeError;
use crate::model::{Column, ColumnType, TabularResult, Value};

/// Name of the column holding the segment labels.
pub const QUARTILE_COLUMN: &str = "Quartile";

/// Segment labels, highest bin first. Higher values are assumed better.
pub const QUARTILE_LABELS: [&str; 4] = ["Q1 (best)", "Q2", "Q3", "Q4 (worst)"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuartileOutcome {
    pub table: TabularResult,
    /// Bin edges after dropping duplicates, ascending.
    pub edges: Vec<Decimal>,
    pub bins: usize,
    /// Set when the data could not fill four bins.
    pub diagnostic: Option<String>,
}

/// Append a [`QUARTILE_COLUMN`] labelling each row of `column_name` by the
/// quartile its value falls in.
///
/// Edges are the 0/25/50/75/100th percentiles with linear interpolation.
/// Duplicate edges are dropped, so heavily repeated values yield fewer bins
/// and a diagnostic rather than an error. Rows without a value get an
/// empty label.
pub fn segment(table: &TabularResult, column_name: &str) -> Result<QuartileOutcome, InformeError> {
    let column = table
        .column(column_name)
        .ok_or_else(|| InformeError::invalid_column(column_name, "no such column"))?;
    if column.column_type() != ColumnType::Numeric {
        return Err(InformeError::invalid_column(
            column_name,
            format!("quartiles need a numeric column, found {}", column.column_type()),
        ));
    }

    let mut sorted: Vec<Decimal> = column.values().iter().filter_map(Value::as_number).collect();
    if sorted.is_empty() {
        return Err(InformeError::invalid_column(column_name, "column has no numeric values"));
    }
    sorted.sort();

    let mut edges = quartile_edges(&sorted).ok_or_else(|| {
        InformeError::invalid_column(column_name, "values too large to interpolate quartile edges")
    })?;
    edges.dedup();
    let bins = (edges.len() - 1).max(1);

    let mut distinct = sorted.clone();
    distinct.dedup();

    let diagnostic = if bins < 4 || distinct.len() < 4 {
        let message = format!(
            "column '{column_name}' has {} distinct values; only {bins} of 4 quartile bins could be formed",
            distinct.len()
        );
        warn!(column = column_name, bins, distinct = distinct.len(), "degenerate quartile binning");
        Some(message)
    } else {
        None
    };

    let labels: Vec<Value> = column
        .values()
        .iter()
        .map(|v| match v.as_number() {
            Some(n) => Value::Text(QUARTILE_LABELS[bins - 1 - bin_index(&edges, n)].to_string()),
            None => Value::Empty,
        })
        .collect();

    debug!(column = column_name, bins, ?edges, "segmented into quartiles");

    let (kind, mut columns) = table.clone().into_columns();
    columns.retain(|c| c.name() != QUARTILE_COLUMN);
    columns.push(Column::new(QUARTILE_COLUMN, labels));

    Ok(QuartileOutcome {
        table: TabularResult::from_columns(kind, columns),
        edges,
        bins,
        diagnostic,
    })
}

/// The five quartile edges of an ascending, non-empty slice.
///
/// The k-th edge sits at position k * (n - 1) / 4; integer arithmetic keeps
/// the interpolation exact. Between neighbours the edge is the weighted sum
/// `lower * (1 - f) + upper * f`, which stays within the two values even at
/// the ends of the `Decimal` range. `None` if the arithmetic still overflows.
fn quartile_edges(sorted: &[Decimal]) -> Option<Vec<Decimal>> {
    let last = sorted.len() - 1;
    (0..=4)
        .map(|k| {
            let lower = k * last / 4;
            let remainder = k * last % 4;
            if remainder == 0 {
                return Some(sorted[lower]);
            }
            let fraction = Decimal::from(remainder) / Decimal::from(4);
            let below = sorted[lower].checked_mul(Decimal::ONE - fraction)?;
            let above = sorted[lower + 1].checked_mul(fraction)?;
            below.checked_add(above)
        })
        .collect()
}

/// Index of the right-closed bin holding `value`; the first bin also holds
/// its lower edge.
fn bin_index(edges: &[Decimal], value: Decimal) -> usize {
    let bins = (edges.len() - 1).max(1);
    edges
        .iter()
        .skip(1)
        .position(|&upper| value <= upper)
        .unwrap_or(bins - 1)
        .min(bins - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceKind;
    use rust_decimal_macros::dec;

    fn numbers(values: &[Option<i64>]) -> TabularResult {
        TabularResult::from_rows(
            SourceKind::DelimitedText,
            vec!["puntaje".into()],
            values
                .iter()
                .map(|v| vec![v.map_or(Value::Empty, |n| Value::Number(n.into()))])
                .collect(),
        )
    }

    fn labels(outcome: &QuartileOutcome) -> Vec<String> {
        outcome
            .table
            .column(QUARTILE_COLUMN)
            .unwrap()
            .values()
            .iter()
            .map(|v| v.to_string())
            .collect()
    }

    #[test]
    fn test_one_to_eight() {
        let values: Vec<Option<i64>> = (1..=8).map(Some).collect();
        let outcome = segment(&numbers(&values), "puntaje").unwrap();
        assert_eq!(outcome.edges, vec![dec!(1), dec!(2.75), dec!(4.5), dec!(6.25), dec!(8)]);
        assert_eq!(outcome.bins, 4);
        assert!(outcome.diagnostic.is_none());
        assert_eq!(
            labels(&outcome),
            vec!["Q4 (worst)", "Q4 (worst)", "Q3", "Q3", "Q2", "Q2", "Q1 (best)", "Q1 (best)"]
        );
    }

    #[test]
    fn test_missing_values_get_empty_label() {
        let outcome = segment(&numbers(&[Some(4), None, Some(1), Some(3), Some(2)]), "puntaje").unwrap();
        assert_eq!(labels(&outcome), vec!["Q1 (best)", "", "Q4 (worst)", "Q2", "Q3"]);
        assert_eq!(outcome.table.column_names(), vec!["puntaje", QUARTILE_COLUMN]);
    }

    #[test]
    fn test_few_distinct_values_gives_diagnostic() {
        let outcome = segment(&numbers(&[Some(5), Some(5), Some(5), Some(9)]), "puntaje").unwrap();
        assert!(outcome.bins < 4);
        assert!(outcome.diagnostic.is_some());
        assert_eq!(labels(&outcome), vec!["Q2", "Q2", "Q2", "Q1 (best)"]);
    }

    #[test]
    fn test_single_value_is_one_bin() {
        let outcome = segment(&numbers(&[Some(7)]), "puntaje").unwrap();
        assert_eq!(outcome.bins, 1);
        assert_eq!(labels(&outcome), vec!["Q1 (best)"]);
        assert!(outcome.diagnostic.is_some());
    }

    #[test]
    fn test_rejects_absent_or_text_column() {
        let table = numbers(&[Some(1)]);
        assert!(matches!(
            segment(&table, "otra").unwrap_err(),
            InformeError::InvalidColumn { .. }
        ));

        let text = TabularResult::single_text(SourceKind::Pdf, "hola".into());
        assert!(matches!(
            segment(&text, "text").unwrap_err(),
            InformeError::InvalidColumn { .. }
        ));
    }

    #[test]
    fn test_extreme_values_do_not_overflow() {
        let table = TabularResult::from_rows(
            SourceKind::DelimitedText,
            vec!["v".into()],
            vec![vec![Value::Number(Decimal::MAX)], vec![Value::Number(Decimal::MIN)]],
        );
        let outcome = segment(&table, "v").unwrap();
        assert_eq!(outcome.edges.first(), Some(&Decimal::MIN));
        assert_eq!(outcome.edges.last(), Some(&Decimal::MAX));
        assert_eq!(outcome.edges[2], Decimal::ZERO);
        assert_eq!(outcome.bins, 4);
        assert!(outcome.diagnostic.is_some());
        assert_eq!(labels(&outcome), vec!["Q1 (best)", "Q4 (worst)"]);
    }

    #[test]
    fn test_resegmenting_replaces_labels() {
        let values: Vec<Option<i64>> = (1..=8).map(Some).collect();
        let first = segment(&numbers(&values), "puntaje").unwrap();
        let second = segment(&first.table, "puntaje").unwrap();
        assert_eq!(second.table.column_count(), 2);
        assert_eq!(second.table, first.table);
    }
}
