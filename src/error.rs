use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, normalizing or aggregating a sales log.
#[derive(Error, Debug)]
pub enum SalesError {
    /// A strictly coerced field held text that does not parse.
    #[error("Failed to parse {field} at row {row}: {value:?} is not a valid {expected}")]
    Parse {
        field: String,
        /// 1-based data row (the header is not counted).
        row: usize,
        value: String,
        expected: &'static str,
    },

    /// A field name is not part of the record schema.
    #[error("Unknown field: {0}")]
    InvalidField(String),

    /// A sum or mean was requested over a field holding text or dates.
    #[error("Field {field} is not numeric")]
    NotNumeric { field: String },

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SalesError>;
