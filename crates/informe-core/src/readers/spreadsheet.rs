use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::InformeError;
use crate::model::{SourceKind, TabularResult, Value};
use crate::readers::unique_headers;

/// Read the first worksheet of an `.xls` / `.xlsx` workbook.
///
/// The first row provides the column names; every following row becomes a
/// data row.
pub fn read_spreadsheet(bytes: &[u8]) -> Result<TabularResult, InformeError> {
    let cursor = Cursor::new(bytes);
    let mut workbook = open_workbook_auto_from_rs(cursor).map_err(|e| {
        InformeError::read(SourceKind::Spreadsheet, format!("failed to open workbook: {e}"))
    })?;

    let sheet_name = workbook.sheet_names().first().cloned().unwrap_or_default();
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| InformeError::read(SourceKind::Spreadsheet, "workbook has no worksheets"))?
        .map_err(|e| {
            InformeError::read(
                SourceKind::Spreadsheet,
                format!("failed to read sheet '{sheet_name}': {e}"),
            )
        })?;

    let mut rows = range.rows();
    let header_row = rows
        .next()
        .ok_or_else(|| InformeError::read(SourceKind::Spreadsheet, "worksheet is empty"))?;
    let headers = unique_headers(
        header_row
            .iter()
            .map(|cell| cell_to_value(cell).to_string())
            .collect(),
    );

    let data: Vec<Vec<Value>> = rows
        .map(|row| row.iter().map(cell_to_value).collect())
        .collect();

    debug!(
        sheet = %sheet_name,
        columns = headers.len(),
        rows = data.len(),
        "read worksheet"
    );

    Ok(TabularResult::from_rows(SourceKind::Spreadsheet, headers, data))
}

fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Empty,
        Data::Int(i) => Value::Number(Decimal::from(*i)),
        Data::Float(f) => match f64_to_decimal(*f) {
            Some(d) => Value::Number(d),
            None => Value::Text(f.to_string()),
        },
        Data::String(s) if s.is_empty() => Value::Empty,
        Data::String(s) => Value::Text(s.clone()),
        Data::Bool(b) => Value::Text(b.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(d) => Value::Date(d),
            None => Value::Text(dt.to_string()),
        },
        Data::DateTimeIso(s) => match s.parse::<chrono::NaiveDateTime>() {
            Ok(d) => Value::Date(d),
            Err(_) => match s.parse::<chrono::NaiveDate>() {
                Ok(d) => Value::Date(d.and_time(chrono::NaiveTime::MIN)),
                Err(_) => Value::Text(s.clone()),
            },
        },
        Data::DurationIso(s) => Value::Text(s.clone()),
        Data::Error(e) => Value::Text(format!("{e}")),
    }
}

/// Convert f64 to Decimal, preserving reasonable precision.
///
/// Uses string round-trip to avoid floating-point artifacts
/// (e.g., 0.0035_f64 becoming 0.00349999...). NaN and infinities have no
/// decimal form.
fn f64_to_decimal(f: f64) -> Option<Decimal> {
    if !f.is_finite() {
        return None;
    }
    let s = format!("{f}");
    s.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::try_from(f).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn f64_to_decimal_preserves_precision() {
        assert_eq!(f64_to_decimal(0.0035), Some(dec!(0.0035)));
        assert_eq!(f64_to_decimal(68.0), Some(dec!(68)));
        assert_eq!(f64_to_decimal(1.23), Some(dec!(1.23)));
        assert_eq!(f64_to_decimal(f64::NAN), None);
    }

    #[test]
    fn test_cell_to_value() {
        assert_eq!(cell_to_value(&Data::Int(7)), Value::Number(dec!(7)));
        assert_eq!(cell_to_value(&Data::String("Norte".into())), Value::Text("Norte".into()));
        assert_eq!(cell_to_value(&Data::String(String::new())), Value::Empty);
        assert_eq!(cell_to_value(&Data::Bool(true)), Value::Text("true".into()));
        assert_eq!(
            cell_to_value(&Data::DateTimeIso("2024-05-01".into())),
            Value::Date(
                chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
                    .unwrap()
                    .and_time(chrono::NaiveTime::MIN)
            )
        );
    }

    #[test]
    fn test_garbage_bytes_fail() {
        let err = read_spreadsheet(b"definitely not a workbook").unwrap_err();
        assert!(matches!(err, InformeError::ReadFailure { .. }));
    }
}
