use chrono::{NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Origin and shape of ingested content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Spreadsheet,
    DelimitedText,
    Document,
    Pdf,
    WebPage,
    None,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Spreadsheet => write!(f, "spreadsheet"),
            SourceKind::DelimitedText => write!(f, "delimited-text"),
            SourceKind::Document => write!(f, "document"),
            SourceKind::Pdf => write!(f, "pdf"),
            SourceKind::WebPage => write!(f, "web-page"),
            SourceKind::None => write!(f, "none"),
        }
    }
}

impl SourceKind {
    /// Map a file extension (without the dot, any case) to a file-backed kind.
    pub fn from_extension(ext: &str) -> Option<SourceKind> {
        match ext.trim().trim_start_matches('.').to_lowercase().as_str() {
            "xls" | "xlsx" => Some(SourceKind::Spreadsheet),
            "csv" => Some(SourceKind::DelimitedText),
            "docx" => Some(SourceKind::Document),
            "pdf" => Some(SourceKind::Pdf),
            _ => None,
        }
    }

    /// Map a MIME type to a file-backed kind. Parameters such as `; charset=` are ignored.
    pub fn from_mime(mime: &str) -> Option<SourceKind> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_lowercase();
        match essence.as_str() {
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            | "application/vnd.ms-excel" => Some(SourceKind::Spreadsheet),
            "text/csv" | "application/csv" => Some(SourceKind::DelimitedText),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(SourceKind::Document)
            }
            "application/pdf" => Some(SourceKind::Pdf),
            _ => None,
        }
    }

    /// Spreadsheets and delimited text carry real columns; every other kind
    /// is a single block of text.
    pub fn is_tabular(&self) -> bool {
        matches!(self, SourceKind::Spreadsheet | SourceKind::DelimitedText)
    }
}

/// A single cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    Empty,
    Number(Decimal),
    Date(NaiveDateTime),
    Text(String),
}

impl Value {
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Number(v) => write!(f, "{v}"),
            Value::Date(d) if d.time() == NaiveTime::MIN => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S")),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Element type of a column, computed once when the column is built.
///
/// `Mixed` is the generic case: the column holds more than one kind of
/// value and is only safe to display after normalization turns it into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Date,
    Text,
    Mixed,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Numeric => write!(f, "numeric"),
            ColumnType::Date => write!(f, "date"),
            ColumnType::Text => write!(f, "text"),
            ColumnType::Mixed => write!(f, "mixed"),
        }
    }
}

impl ColumnType {
    /// Infer the type from the non-empty cells. A column with no values at
    /// all is text.
    pub fn infer(values: &[Value]) -> ColumnType {
        let mut inferred: Option<ColumnType> = None;
        for value in values {
            let this = match value {
                Value::Empty => continue,
                Value::Number(_) => ColumnType::Numeric,
                Value::Date(_) => ColumnType::Date,
                Value::Text(_) => ColumnType::Text,
            };
            match inferred {
                None => inferred = Some(this),
                Some(t) if t == this => {}
                Some(_) => return ColumnType::Mixed,
            }
        }
        inferred.unwrap_or(ColumnType::Text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    column_type: ColumnType,
    values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        let column_type = ColumnType::infer(&values);
        Column {
            name: name.into(),
            column_type,
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Build a column of the same name from the cells at `rows`. The type is
    /// inferred again from the cells kept.
    pub(crate) fn take_rows(&self, rows: &[usize]) -> Column {
        let values = rows.iter().map(|&i| self.values[i].clone()).collect();
        Column::new(self.name.clone(), values)
    }
}

/// The uniform table every reader produces.
///
/// All columns have the same length. A result tagged [`SourceKind::None`]
/// has no columns and no rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabularResult {
    source_kind: SourceKind,
    columns: Vec<Column>,
}

impl TabularResult {
    /// The canonical "no data" result.
    pub fn none() -> Self {
        TabularResult {
            source_kind: SourceKind::None,
            columns: Vec::new(),
        }
    }

    /// Build a table from a header row and data rows. Short rows are padded
    /// with empty cells and cells beyond the header width are dropped.
    pub fn from_rows(source_kind: SourceKind, headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        if source_kind == SourceKind::None {
            return TabularResult::none();
        }

        let width = headers.len();
        let mut columns_values: Vec<Vec<Value>> = (0..width)
            .map(|_| Vec::with_capacity(rows.len()))
            .collect();

        for row in rows {
            let mut cells = row.into_iter();
            for values in columns_values.iter_mut() {
                values.push(cells.next().unwrap_or(Value::Empty));
            }
        }

        let columns = headers
            .into_iter()
            .zip(columns_values)
            .map(|(name, values)| Column::new(name, values))
            .collect();

        TabularResult {
            source_kind,
            columns,
        }
    }

    /// A one-row, one-column (`text`) result holding a block of extracted text.
    pub fn single_text(source_kind: SourceKind, text: String) -> Self {
        TabularResult::from_rows(source_kind, vec!["text".into()], vec![vec![Value::Text(text)]])
    }

    pub(crate) fn from_columns(source_kind: SourceKind, columns: Vec<Column>) -> Self {
        debug_assert!(columns.windows(2).all(|w| w[0].len() == w[1].len()));
        TabularResult {
            source_kind,
            columns,
        }
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source_kind
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// True when there is nothing to show: no columns or no rows.
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// The cells of one row, in column order.
    pub fn row(&self, index: usize) -> Option<Vec<&Value>> {
        if index >= self.row_count() {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[index]).collect())
    }

    /// The extracted text of a single-text result (documents, PDFs, web pages).
    pub fn text_content(&self) -> Option<&str> {
        match (self.columns.as_slice(), self.row_count()) {
            ([column], 1) if column.name == "text" => match &column.values[0] {
                Value::Text(s) => Some(s.as_str()),
                _ => None,
            },
            _ => None,
        }
    }

    /// Keep only the rows at `rows` (in the given order).
    pub(crate) fn take_rows(&self, rows: &[usize]) -> TabularResult {
        TabularResult {
            source_kind: self.source_kind,
            columns: self.columns.iter().map(|c| c.take_rows(rows)).collect(),
        }
    }

    pub(crate) fn into_columns(self) -> (SourceKind, Vec<Column>) {
        (self.source_kind, self.columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_infer_column_types() {
        assert_eq!(
            ColumnType::infer(&[Value::Number(dec!(1)), Value::Empty, Value::Number(dec!(2.5))]),
            ColumnType::Numeric
        );
        assert_eq!(
            ColumnType::infer(&[Value::Text("a".into()), Value::Number(dec!(1))]),
            ColumnType::Mixed
        );
        assert_eq!(ColumnType::infer(&[Value::Empty, Value::Empty]), ColumnType::Text);
    }

    #[test]
    fn test_from_rows_pads_short_rows() {
        let table = TabularResult::from_rows(
            SourceKind::DelimitedText,
            vec!["a".into(), "b".into()],
            vec![
                vec![Value::Number(dec!(1)), Value::Text("x".into())],
                vec![Value::Number(dec!(2))],
            ],
        );
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.row(1).unwrap()[1], &Value::Empty);
        assert_eq!(table.column("a").unwrap().column_type(), ColumnType::Numeric);
    }

    #[test]
    fn test_none_has_no_rows_or_columns() {
        let table = TabularResult::from_rows(
            SourceKind::None,
            vec!["a".into()],
            vec![vec![Value::Text("ignored".into())]],
        );
        assert_eq!(table, TabularResult::none());
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_count(), 0);
    }

    #[test]
    fn test_single_text_content() {
        let table = TabularResult::single_text(SourceKind::Pdf, "hola\nmundo".into());
        assert_eq!(table.text_content(), Some("hola\nmundo"));
        assert_eq!(table.column_names(), vec!["text"]);
    }

    #[test]
    fn test_kind_from_extension_and_mime() {
        assert_eq!(SourceKind::from_extension("XLSX"), Some(SourceKind::Spreadsheet));
        assert_eq!(SourceKind::from_extension(".csv"), Some(SourceKind::DelimitedText));
        assert_eq!(SourceKind::from_extension("txt"), None);
        assert_eq!(SourceKind::from_mime("text/csv; charset=utf-8"), Some(SourceKind::DelimitedText));
        assert_eq!(SourceKind::from_mime("application/pdf"), Some(SourceKind::Pdf));
        assert_eq!(SourceKind::from_mime("image/png"), None);
    }

    #[test]
    fn test_date_display() {
        let midnight = chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(Value::Date(midnight).to_string(), "2024-03-01");
        let afternoon = midnight + chrono::Duration::hours(15);
        assert_eq!(Value::Date(afternoon).to_string(), "2024-03-01 15:00:00");
    }
}
