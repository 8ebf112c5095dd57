use thiserror::Error;

/// Result type local to tabkit-io.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("resource not found: {location}")]
    ResourceNotFound { location: String },

    #[error("empty input: {location} contains no lines")]
    EmptyInput { location: String },

    #[error("malformed row in {location} at line {line}: expected {expected} fields, found {found}")]
    MalformedRow {
        location: String,
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("unsupported location scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("io config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Core(#[from] tabkit_core::Error),
}
