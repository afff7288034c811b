//! Google sign-in errors.

use thiserror::Error;

/// Errors from the authorization-code exchange.
#[derive(Debug, Error)]
pub enum GoogleError {
    /// The callback `state` does not match the one issued for this flow.
    #[error("OAuth state mismatch")]
    InvalidState,

    /// The user declined consent or Google returned an `error` parameter.
    #[error("sign-in denied by provider: {0}")]
    Denied(String),

    /// The token endpoint was unreachable or rejected the code.
    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// The userinfo endpoint was unreachable or returned an error status.
    #[error("profile fetch failed: {0}")]
    ProfileFetch(String),

    /// The userinfo response body could not be read.
    #[error("profile read failed: {0}")]
    ProfileRead(String),

    /// A provider call exceeded the request timeout.
    #[error("identity provider timed out")]
    Timeout,

    /// The HTTP client could not be built.
    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

impl GoogleError {
    /// Map a transport error, keeping timeouts distinct and dropping the URL
    /// (the userinfo URL carries the access token).
    pub(super) fn from_transport(err: reqwest::Error, kind: fn(String) -> Self) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            kind(err.without_url().to_string())
        }
    }
}
