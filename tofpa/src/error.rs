use thiserror::Error;

#[derive(Error, Debug)]
pub enum TofpaError {
    #[error("invalid parameters, {0}")]
    InvalidParameters(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of an external elevation lookup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("elevation source unavailable, {0}")]
    Unavailable(String),

    #[error("elevation lookup timed out")]
    Timeout,

    #[error("elevation lookup failed, {0}")]
    Other(String),
}

impl SourceError {
    /// Returns `true` if retrying the same lookup may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout)
    }
}
