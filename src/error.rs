use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("All lists are empty, cannot derive the column count")]
    EmptyInput,
    #[error("List {group} row {row} has {found} columns, expected {expected}")]
    InconsistentRowWidth {
        group: usize,
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Data source error: {0}")]
    DataSource(String),
    #[error("Failed to read catalog: {0}")]
    Catalog(#[from] serde_json::Error),
    #[error("Unknown report: {0}")]
    UnknownReport(String),
    #[error("Invalid date format: {0}")]
    DateError(String),
    #[error("Failed to write XLSX: {0}")]
    XlsxError(#[from] rust_xlsxwriter::XlsxError),
    #[error("Failed to create PDF: {0}")]
    PdfError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
