use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExecError>;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("unknown view '{0}'")]
    UnknownView(String),

    #[error("schema mismatch on '{field}': {reason}")]
    SchemaMismatch { field: String, reason: String },

    #[error(transparent)]
    Load(#[from] tabkit_io::Error),

    #[error("operator: {0}")]
    Operator(#[from] tabkit_operators::OpError),

    #[error(transparent)]
    Query(#[from] tabkit_planner::Error),

    #[error(transparent)]
    Core(#[from] tabkit_core::Error),
}

impl ExecError {
    pub(crate) fn mismatch(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ExecError::SchemaMismatch {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
