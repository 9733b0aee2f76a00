#[derive(Debug, thiserror::Error)]
pub enum InformeError {
    #[error("could not read {kind} source: {reason}")]
    ReadFailure { kind: String, reason: String },

    #[error("unsupported file type: {0}. Supported types are .xls, .xlsx, .csv, .docx and .pdf")]
    UnsupportedKind(String),

    #[error("no data loaded: provide a file or a valid URL")]
    NoInput,

    #[error("column '{column}' cannot be used here: {reason}")]
    InvalidColumn { column: String, reason: String },

    #[error("no rows left after applying the filters")]
    EmptyAfterFilter,

    #[error("report service failed: {0}")]
    UpstreamFailure(String),

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error("invalid prompt template table: {0}")]
    TemplateInvalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl InformeError {
    pub(crate) fn read(kind: impl ToString, reason: impl ToString) -> Self {
        InformeError::ReadFailure {
            kind: kind.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invalid_column(column: &str, reason: impl ToString) -> Self {
        InformeError::InvalidColumn {
            column: column.to_string(),
            reason: reason.to_string(),
        }
    }
}
