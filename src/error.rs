//! Error types for dataset loading and grid configuration.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Row or column data that does not have the expected shape
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Empty file")]
    EmptyFile,

    #[error("Duplicate column field: {0}")]
    DuplicateColumn(String),
}

pub type GridResult<T> = Result<T, GridError>;
