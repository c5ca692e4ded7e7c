use thiserror::Error;

pub type TrackerResult<T> = std::result::Result<T, TrackerError>;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("user {user_id} not found")]
    NotFound { user_id: String },

    #[error("{0}")]
    InvalidInput(String),

    #[error("store failure: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl TrackerError {
    pub fn not_found(user_id: impl ToString) -> Self {
        Self::NotFound {
            user_id: user_id.to_string(),
        }
    }

    pub fn missing_field(field: &str) -> Self {
        Self::InvalidInput(format!("Path `{field}` is required."))
    }

    /// Stable short label used in audit records and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::Store(_) => "store_failure",
        }
    }
}
