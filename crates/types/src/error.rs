//! Unified error type for the leadrelay workspace.

use thiserror::Error;

/// Enumerates all error kinds that can occur while relaying a lead.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The caller presented a missing or wrong API key.
    #[error("unauthorized")]
    Unauthorized,

    /// The identity provider refused the credential exchange, was unreachable,
    /// or answered with something that is not a token.
    #[error("token endpoint error: {0}")]
    UpstreamAuth(String),

    /// The lead API rejected the bearer token (HTTP 401).
    #[error("lead api rejected the bearer token")]
    DownstreamRejected,

    /// The lead API returned a non-success status other than 401.
    #[error("lead api error: status={status}, body={body}")]
    Downstream { status: u16, body: String },

    /// HTTP transport error, including timeouts.
    #[error("http error: {0}")]
    Http(String),

    /// Configuration loading or validation error.
    #[error("configuration error: {0}")]
    Config(String),
}

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

impl RelayError {
    /// Returns `true` if the lead API told us the bearer token is no good,
    /// which is the only failure that should evict the cached token.
    #[must_use]
    pub fn invalidates_token(&self) -> bool {
        matches!(self, Self::DownstreamRejected)
    }

    /// Builds the error for a non-success lead API response.
    #[must_use]
    pub fn from_downstream_status(status: u16, body: String) -> Self {
        if status == 401 {
            Self::DownstreamRejected
        } else {
            Self::Downstream { status, body }
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, RelayError>;
