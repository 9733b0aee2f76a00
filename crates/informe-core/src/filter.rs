use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::error::InformeError;
use crate::model::{Column, ColumnType, SourceKind, TabularResult, Value};

/// What a filter control needs to know about a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ColumnProfile {
    Numeric { min: Decimal, max: Decimal },
    Date { min: NaiveDate, max: NaiveDate },
    Text { distinct: BTreeSet<String> },
}

/// Profile a column according to its type tag.
///
/// Mixed columns are profiled as text, which is how they are displayed
/// after normalization.
pub fn profile(column: &Column) -> ColumnProfile {
    match column.column_type() {
        ColumnType::Numeric => {
            if let Some((min, max)) = bounds(column.values().iter().filter_map(Value::as_number)) {
                return ColumnProfile::Numeric { min, max };
            }
        }
        ColumnType::Date => {
            let dates = column.values().iter().filter_map(Value::as_date).map(|d| d.date());
            if let Some((min, max)) = bounds(dates) {
                return ColumnProfile::Date { min, max };
            }
        }
        ColumnType::Text | ColumnType::Mixed => {}
    }
    ColumnProfile::Text {
        distinct: column.values().iter().map(|v| v.to_string()).collect(),
    }
}

fn bounds<T: Ord + Copy>(values: impl Iterator<Item = T>) -> Option<(T, T)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// A single-column predicate. Which variant applies is decided by the
/// column's type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnFilter {
    /// Closed interval over a numeric column.
    NumericRange { lo: Decimal, hi: Decimal },
    /// Allow-set over a text column. An empty set lets every row through.
    Categories(BTreeSet<String>),
    /// Closed interval of calendar dates over a date column.
    DateRange { start: NaiveDate, end: NaiveDate },
}

impl ColumnFilter {
    fn accepts(&self, column_type: ColumnType) -> bool {
        matches!(
            (self, column_type),
            (ColumnFilter::NumericRange { .. }, ColumnType::Numeric)
                | (ColumnFilter::DateRange { .. }, ColumnType::Date)
                | (ColumnFilter::Categories(_), ColumnType::Text | ColumnType::Mixed)
        )
    }

    fn kind_name(&self) -> &'static str {
        match self {
            ColumnFilter::NumericRange { .. } => "numeric range",
            ColumnFilter::Categories(_) => "category",
            ColumnFilter::DateRange { .. } => "date range",
        }
    }
}

/// Filters to AND-combine, each bound to a column name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    filters: Vec<(String, ColumnFilter)>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, filter: ColumnFilter) -> Self {
        self.push(column, filter);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, filter: ColumnFilter) {
        self.filters.push((column.into(), filter));
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnFilter)> {
        self.filters.iter().map(|(c, f)| (c.as_str(), f))
    }
}

/// Keep the rows that pass every filter, preserving row order and columns.
///
/// Filtering the `none` table is [`InformeError::NoInput`]; a non-empty
/// table that loses every row is [`InformeError::EmptyAfterFilter`].
pub fn apply_filters(table: &TabularResult, filters: &FilterSet) -> Result<TabularResult, InformeError> {
    if table.source_kind() == SourceKind::None {
        return Err(InformeError::NoInput);
    }
    if filters.is_empty() {
        return Ok(table.clone());
    }

    let mut keep = vec![true; table.row_count()];
    for (name, filter) in filters.iter() {
        let column = table
            .column(name)
            .ok_or_else(|| InformeError::invalid_column(name, "no such column"))?;
        if !filter.accepts(column.column_type()) {
            return Err(InformeError::invalid_column(
                name,
                format!("a {} filter does not apply to a {} column", filter.kind_name(), column.column_type()),
            ));
        }
        apply_one(column, filter, &mut keep);
    }

    let rows: Vec<usize> = keep
        .iter()
        .enumerate()
        .filter_map(|(i, &k)| k.then_some(i))
        .collect();
    debug!(
        filters = filters.len(),
        before = table.row_count(),
        after = rows.len(),
        "applied filters"
    );

    if rows.is_empty() && table.row_count() > 0 {
        return Err(InformeError::EmptyAfterFilter);
    }
    Ok(table.take_rows(&rows))
}

fn apply_one(column: &Column, filter: &ColumnFilter, keep: &mut [bool]) {
    match filter {
        ColumnFilter::NumericRange { lo, hi } => {
            let (lo, hi) = match profile(column) {
                ColumnProfile::Numeric { min, max } => ((*lo).max(min), (*hi).min(max)),
                _ => (*lo, *hi),
            };
            retain(column, keep, |v| v.as_number().is_some_and(|n| lo <= n && n <= hi));
        }
        ColumnFilter::DateRange { start, end } => {
            let (start, end) = match profile(column) {
                ColumnProfile::Date { min, max } => ((*start).max(min), (*end).min(max)),
                _ => (*start, *end),
            };
            retain(column, keep, |v| {
                v.as_date()
                    .map(|d| d.date())
                    .is_some_and(|d| start <= d && d <= end)
            });
        }
        ColumnFilter::Categories(allowed) if allowed.is_empty() => {}
        ColumnFilter::Categories(allowed) => {
            retain(column, keep, |v| allowed.contains(&v.to_string()));
        }
    }
}

fn retain(column: &Column, keep: &mut [bool], pass: impl Fn(&Value) -> bool) {
    for (k, value) in keep.iter_mut().zip(column.values()) {
        *k = *k && pass(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> Value {
        Value::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap())
    }

    fn sales() -> TabularResult {
        TabularResult::from_rows(
            SourceKind::Spreadsheet,
            vec!["region".into(), "ventas".into(), "fecha".into()],
            vec![
                vec![Value::Text("Norte".into()), Value::Number(dec!(120)), date(2024, 1, 5)],
                vec![Value::Text("Sur".into()), Value::Number(dec!(80)), date(2024, 2, 10)],
                vec![Value::Text("Norte".into()), Value::Empty, date(2024, 3, 15)],
                vec![Value::Text("Este".into()), Value::Number(dec!(200)), date(2024, 4, 20)],
            ],
        )
    }

    #[test]
    fn test_profile_follows_type_of_kept_rows() {
        let table = TabularResult::from_rows(
            SourceKind::DelimitedText,
            vec!["ventas".into()],
            vec![vec![Value::Empty], vec![Value::Empty], vec![Value::Number(dec!(5))]],
        );
        assert_eq!(table.column("ventas").unwrap().column_type(), ColumnType::Numeric);

        let head = crate::normalize::truncate_rows(table, 2);
        let column = head.column("ventas").unwrap();
        assert_eq!(column.column_type(), ColumnType::Text);
        assert!(matches!(profile(column), ColumnProfile::Text { .. }));

        let filters = FilterSet::new().with("ventas", ColumnFilter::Categories(BTreeSet::new()));
        assert_eq!(apply_filters(&head, &filters).unwrap().row_count(), 2);
    }

    #[test]
    fn test_profiles() {
        let table = sales();
        assert_eq!(
            profile(table.column("ventas").unwrap()),
            ColumnProfile::Numeric { min: dec!(80), max: dec!(200) }
        );
        assert_eq!(
            profile(table.column("fecha").unwrap()),
            ColumnProfile::Date {
                min: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                max: NaiveDate::from_ymd_opt(2024, 4, 20).unwrap(),
            }
        );
        let ColumnProfile::Text { distinct } = profile(table.column("region").unwrap()) else {
            panic!("expected text profile");
        };
        assert_eq!(distinct.into_iter().collect::<Vec<_>>(), vec!["Este", "Norte", "Sur"]);
    }

    #[test]
    fn test_numeric_range_excludes_missing() {
        let filters = FilterSet::new().with("ventas", ColumnFilter::NumericRange { lo: dec!(0), hi: dec!(150) });
        let out = apply_filters(&sales(), &filters).unwrap();
        assert_eq!(out.row_count(), 2);
        assert_eq!(
            out.column("region").unwrap().values(),
            &[Value::Text("Norte".into()), Value::Text("Sur".into())]
        );
    }

    #[test]
    fn test_numeric_lo_above_max_is_empty_after_filter() {
        let filters = FilterSet::new().with("ventas", ColumnFilter::NumericRange { lo: dec!(500), hi: dec!(900) });
        assert!(matches!(
            apply_filters(&sales(), &filters).unwrap_err(),
            InformeError::EmptyAfterFilter
        ));
    }

    #[test]
    fn test_empty_category_set_is_pass_through() {
        let filters = FilterSet::new().with("region", ColumnFilter::Categories(BTreeSet::new()));
        assert_eq!(apply_filters(&sales(), &filters).unwrap(), sales());
    }

    #[test]
    fn test_filters_and_combine() {
        let filters = FilterSet::new()
            .with("region", ColumnFilter::Categories(["Norte".to_string()].into()))
            .with(
                "fecha",
                ColumnFilter::DateRange {
                    start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                    end: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
                },
            );
        let out = apply_filters(&sales(), &filters).unwrap();
        assert_eq!(out.row_count(), 1);
        assert_eq!(out.row(0).unwrap()[2], &date(2024, 3, 15));
        assert_eq!(out.column_count(), 3);
    }

    #[test]
    fn test_wrong_column_or_type() {
        let filters = FilterSet::new().with("falta", ColumnFilter::Categories(BTreeSet::new()));
        assert!(matches!(
            apply_filters(&sales(), &filters).unwrap_err(),
            InformeError::InvalidColumn { .. }
        ));

        let filters = FilterSet::new().with("region", ColumnFilter::NumericRange { lo: dec!(0), hi: dec!(1) });
        assert!(matches!(
            apply_filters(&sales(), &filters).unwrap_err(),
            InformeError::InvalidColumn { .. }
        ));
    }

    #[test]
    fn test_none_table_is_no_input() {
        assert!(matches!(
            apply_filters(&TabularResult::none(), &FilterSet::new()).unwrap_err(),
            InformeError::NoInput
        ));
    }
}
