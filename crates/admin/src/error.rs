//! Unified error handling for the admin backend.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use website_core::AdminId;

use crate::db::RepositoryError;
use crate::services::AuthError;

/// Body for every access-denied response.
pub const ACCESS_DENIED: &str = "Access denied";

/// Application-level error type for the admin backend.
#[derive(Debug, Error)]
pub enum AppError {
    /// Login or session failure.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Auth(e) if e.is_access_denied() => StatusCode::UNAUTHORIZED,
            Self::Auth(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            Self::Auth(e) if e.is_provider_failure() => StatusCode::BAD_GATEWAY,
            Self::Database(RepositoryError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Auth(_) | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        } else if status == StatusCode::UNAUTHORIZED {
            tracing::info!(error = %self, "Access denied");
        }

        // Don't expose internal error details to clients
        let message = match status {
            StatusCode::UNAUTHORIZED => ACCESS_DENIED.to_string(),
            StatusCode::BAD_GATEWAY => "Identity provider error".to_string(),
            StatusCode::GATEWAY_TIMEOUT => "Upstream timeout".to_string(),
            StatusCode::BAD_REQUEST => self.to_string(),
            _ => "Internal server error".to_string(),
        };

        (status, message).into_response()
    }
}

/// Set the Sentry user context from an admin ID.
pub fn set_sentry_user(admin_id: AdminId, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
