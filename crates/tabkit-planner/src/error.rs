use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("query parse error at position {pos}: {msg}")]
    Parse { pos: usize, msg: String },

    #[error("unsupported query: {0}")]
    Unsupported(String),

    #[error("notebook: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
