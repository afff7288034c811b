//! Aggregate error for the admin login and session flows.

use thiserror::Error;

use super::directory::DirectoryError;
use super::session::SessionError;
use crate::google::GoogleError;

/// Any failure in the login flow or session check.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The identity provider exchange failed.
    #[error(transparent)]
    Provider(#[from] GoogleError),

    /// Resolving the admin record failed.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// Issuing or checking the session failed.
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl AuthError {
    /// Whether the caller is simply not allowed in.
    ///
    /// All of these must look identical to the browser so that allow-list
    /// membership and record existence cannot be told apart by a caller.
    #[must_use]
    pub const fn is_access_denied(&self) -> bool {
        matches!(
            self,
            Self::Provider(GoogleError::InvalidState | GoogleError::Denied(_))
                | Self::Directory(DirectoryError::Unauthorized | DirectoryError::IdentityConflict)
                | Self::Session(
                    SessionError::MissingCookies(_)
                        | SessionError::NotFound
                        | SessionError::Authentication
                )
        )
    }

    /// Whether an upstream call exceeded its deadline.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Provider(GoogleError::Timeout)
                | Self::Directory(DirectoryError::Timeout(_))
                | Self::Session(SessionError::Timeout(_))
        )
    }

    /// Whether the identity provider misbehaved (bad response, unreachable).
    #[must_use]
    pub const fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            Self::Provider(
                GoogleError::TokenExchange(_) | GoogleError::ProfileFetch(_) | GoogleError::ProfileRead(_)
            ) | Self::Directory(DirectoryError::Decode(_))
        )
    }
}
