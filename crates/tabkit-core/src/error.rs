use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    #[error("Column index {index} out of range for {width} columns")]
    ColumnIndex { index: usize, width: usize },

    #[error("Internal invariant failed: {0}")]
    Invariant(String),
}
