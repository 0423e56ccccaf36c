use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Invalid report configuration: {0}")]
    Config(String),

    #[error("Input file {file}: row {row}: {details}")]
    Field {
        file: String,
        row: usize,
        details: String,
    },

    #[error("Failed to read {}: {source}", .path.display())]
    InputFile {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
