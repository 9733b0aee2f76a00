use std::borrow::Cow;
use std::str::FromStr;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::InformeError;
use crate::model::{SourceKind, TabularResult, Value};
use crate::readers::unique_headers;

/// Cell texts read as missing values.
const MISSING_MARKERS: &[&str] = &["NA", "N/A", "n/a", "#N/A", "NaN", "nan", "null", "NULL"];

/// A data row that was left out of the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct DelimitedRead {
    pub table: TabularResult,
    pub skipped_rows: Vec<SkippedRow>,
    /// Name of the encoding the bytes were decoded with.
    pub encoding: &'static str,
}

/// Read comma-separated text with a header row.
///
/// Rows with more fields than the header are skipped and reported; shorter
/// rows are padded with empty cells. Bytes that are not valid UTF-8 are
/// decoded as Windows-1252, so legacy Latin-1 exports never fail to decode.
pub fn read_delimited(bytes: &[u8]) -> Result<DelimitedRead, InformeError> {
    let (text, encoding) = decode_text(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| InformeError::read(SourceKind::DelimitedText, e))?
        .clone();
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(InformeError::read(
            SourceKind::DelimitedText,
            "no columns to parse from file",
        ));
    }
    let width = headers.len();
    let headers = unique_headers(headers.iter().map(|h| h.to_string()).collect());

    let mut rows = Vec::new();
    let mut skipped_rows = Vec::new();

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                skipped_rows.push(SkippedRow {
                    line,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        // Blank lines carry no data
        if record.len() <= 1 && record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        let line = record.position().map(|p| p.line()).unwrap_or(0);
        if record.len() > width {
            skipped_rows.push(SkippedRow {
                line,
                reason: format!("expected {width} fields, saw {}", record.len()),
            });
            continue;
        }

        rows.push(record.iter().map(guess_value).collect::<Vec<_>>());
    }

    if !skipped_rows.is_empty() {
        warn!(count = skipped_rows.len(), "skipped malformed CSV rows");
    }
    debug!(
        encoding = encoding.name(),
        columns = headers.len(),
        rows = rows.len(),
        "read delimited text"
    );

    Ok(DelimitedRead {
        table: TabularResult::from_rows(SourceKind::DelimitedText, headers, rows),
        skipped_rows,
        encoding: encoding.name(),
    })
}

/// Decode as UTF-8 (honouring a BOM); fall back to Windows-1252 when the
/// bytes are not valid UTF-8. Windows-1252 maps every byte, so this never fails.
fn decode_text(bytes: &[u8]) -> (Cow<'_, str>, &'static Encoding) {
    let (text, encoding, had_errors) = UTF_8.decode(bytes);
    if !had_errors {
        return (text, encoding);
    }
    debug!("input is not valid UTF-8, decoding as windows-1252");
    let (text, encoding, _) = WINDOWS_1252.decode(bytes);
    (text, encoding)
}

fn guess_value(field: &str) -> Value {
    let trimmed = field.trim();
    if trimmed.is_empty() || MISSING_MARKERS.contains(&trimmed) {
        return Value::Empty;
    }
    if let Some(number) = parse_number(trimmed) {
        return Value::Number(number);
    }
    Value::Text(field.to_string())
}

fn parse_number(s: &str) -> Option<Decimal> {
    if !s.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.')) {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ColumnType;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reads_header_and_rows() {
        let read = read_delimited(b"region,ventas\nNorte,120\nSur,95.5\n").unwrap();
        let table = read.table;
        assert_eq!(table.source_kind(), SourceKind::DelimitedText);
        assert_eq!(table.column_names(), vec!["region", "ventas"]);
        assert_eq!(table.row_count(), 2);
        let ventas = table.column("ventas").unwrap();
        assert_eq!(ventas.column_type(), ColumnType::Numeric);
        assert_eq!(ventas.values()[1], Value::Number(dec!(95.5)));
        assert!(read.skipped_rows.is_empty());
    }

    #[test]
    fn test_skips_rows_with_extra_fields() {
        let read = read_delimited(b"a,b\n1,2\n3,4,5\n6,7\n").unwrap();
        assert_eq!(read.table.row_count(), 2);
        assert_eq!(read.skipped_rows.len(), 1);
        assert_eq!(read.skipped_rows[0].line, 3);
    }

    #[test]
    fn test_pads_short_rows() {
        let read = read_delimited(b"a,b,c\n1,2\n").unwrap();
        let row = read.table.row(0).unwrap();
        assert_eq!(row[2], &Value::Empty);
    }

    #[test]
    fn test_latin1_fallback() {
        // "Año,Región\n2024,Peñalolén\n" in ISO-8859-1
        let bytes = b"A\xf1o,Regi\xf3n\n2024,Pe\xf1alol\xe9n\n";
        let read = read_delimited(bytes).unwrap();
        assert_eq!(read.encoding, "windows-1252");
        assert_eq!(read.table.column_names(), vec!["Año", "Región"]);
        assert_eq!(
            read.table.column("Región").unwrap().values()[0],
            Value::Text("Peñalolén".into())
        );
    }

    #[test]
    fn test_utf8_bom_is_removed() {
        let read = read_delimited("\u{feff}id,nombre\n1,Ana\n".as_bytes()).unwrap();
        assert_eq!(read.encoding, "UTF-8");
        assert_eq!(read.table.column_names(), vec!["id", "nombre"]);
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(matches!(
            read_delimited(b"").unwrap_err(),
            InformeError::ReadFailure { .. }
        ));
    }

    #[test]
    fn test_guess_value() {
        assert_eq!(guess_value(" 42 "), Value::Number(dec!(42)));
        assert_eq!(guess_value("1e3"), Value::Number(dec!(1000)));
        assert_eq!(guess_value("N/A"), Value::Empty);
        assert_eq!(guess_value("Norte"), Value::Text("Norte".into()));
        assert_eq!(guess_value("inf"), Value::Text("inf".into()));
    }
}
