use thiserror::Error;

#[derive(Debug, Error)]
pub enum RingshiftError {
    /// A required column is missing or holds an unparseable value.
    #[error("Malformed record: column `{column}` {reason}")]
    MalformedRecord { column: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RingshiftError {
    pub fn malformed(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            column: column.into(),
            reason: reason.into(),
        }
    }

    pub fn is_malformed_record(&self) -> bool {
        matches!(self, Self::MalformedRecord { .. })
    }
}

pub type Result<T> = std::result::Result<T, RingshiftError>;
