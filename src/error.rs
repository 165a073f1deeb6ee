use thiserror::Error;

/// Errors from iftar operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IftarError {
    /// Upstream unreachable or non-2xx response.
    #[error("network error: {0}")]
    Network(String),

    /// Response could not be mapped to the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// Location or notification permission was refused.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Caller-supplied value is unusable (e.g. unparsable manual coordinates).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A position or network request did not complete in time.
    #[error("timed out: {0}")]
    Timeout(String),

    /// The requested capability or data is not available.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

impl IftarError {
    /// Creates an `InvalidInput` error.
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }

    /// Creates a `Parse` error.
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse(reason.into())
    }
}
