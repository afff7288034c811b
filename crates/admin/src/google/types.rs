//! Google OAuth2 wire types and per-flow state.

use serde::Deserialize;
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// Successful token endpoint response. Only the access token is used.
#[derive(Deserialize)]
pub(super) struct TokenResponse {
    pub access_token: String,
}

/// Token endpoint error body (RFC 6749 section 5.2).
#[derive(Debug, Deserialize)]
pub(super) struct TokenErrorResponse {
    pub error: String,
}

/// Anti-forgery value for one sign-in attempt.
///
/// Generated when the browser is sent to Google, kept in a signed cookie, and
/// compared with the `state` Google echoes back on the callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthState(String);

impl OAuthState {
    /// A fresh random state.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Restore a state previously handed out (from its cookie).
    #[must_use]
    pub fn from_cookie(value: &str) -> Self {
        Self(value.to_owned())
    }

    /// The state as sent to Google.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the callback's `state` parameter belongs to this flow.
    ///
    /// Compared in constant time.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        !self.0.is_empty() && bool::from(self.0.as_bytes().ct_eq(candidate.as_bytes()))
    }
}
