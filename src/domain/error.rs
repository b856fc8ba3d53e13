// Error taxonomy for a single query's pipeline
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DatasourceError {
    /// Missing or empty required parameter. Raised before any network call.
    #[error("{0}")]
    Validation(String),

    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success status; carries the server supplied `err_msg`.
    #[error("{0}")]
    Upstream(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("invalid timestamp: {0}")]
    Parse(String),

    #[error("point not found: {0}")]
    MissingPoint(String),

    #[error("request cancelled")]
    Cancelled,
}

impl DatasourceError {
    /// Stable identifier reported next to the message in query results
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Transport(_) => "transport",
            Self::Upstream(_) => "upstream",
            Self::Decode(_) => "decode",
            Self::Parse(_) => "parse",
            Self::MissingPoint(_) => "missing_point",
            Self::Cancelled => "cancelled",
        }
    }
}

impl From<serde_json::Error> for DatasourceError {
    fn from(err: serde_json::Error) -> Self {
        DatasourceError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DatasourceError>;
