use thiserror::Error;

/// Failures surfaced by an [`ExploreClient`](crate::ExploreClient) call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExploreError {
    /// No credential is configured, or the backend rejected it.
    #[error("no access token is set for the explore endpoint")]
    MissingCredential,

    /// The backend answered with a non-success status.
    #[error("explore request failed: {status} - {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response (connect, timeout, ...).
    #[error("explore transport error: {0}")]
    Transport(String),

    /// The response body could not be understood.
    #[error("invalid explore response: {0}")]
    InvalidResponse(String),
}

impl ExploreError {
    pub fn is_missing_credential(&self) -> bool {
        matches!(self, ExploreError::MissingCredential)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
