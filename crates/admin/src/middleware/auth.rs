//! Authentication extractor for admin.
//!
//! Every extraction re-reads the admin record from the store and verifies the
//! session hash. Nothing is cached between requests.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use crate::error::{ACCESS_DENIED, AppError, set_sentry_user};
use crate::models::AdminRecord;
use crate::services::AuthError;
use crate::state::AppState;

/// Extractor that requires an authenticated admin.
///
/// If the session cookies are missing or invalid, returns a redirect to the
/// login page for browser requests, or 401 Unauthorized for API requests.
/// Store or hashing failures are server errors, not rejections.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdmin(admin): RequireAdmin,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.email)
/// }
/// ```
pub struct RequireAdmin(pub AdminRecord);

/// Error returned when an authenticated admin is required.
#[derive(Debug)]
pub enum AdminAuthRejection {
    /// Redirect to login page (for browser requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
    /// Authentication could not be decided.
    Error(AppError),
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, ACCESS_DENIED).into_response(),
            Self::Error(err) => err.into_response(),
        }
    }
}

/// Paths that answer with 401 instead of a login redirect.
fn is_api_path(path: &str) -> bool {
    path.starts_with("/api/") || path == "/auth/me"
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        match state.sessions().authenticate(&jar).await {
            Ok(admin) => {
                set_sentry_user(admin.id, Some(admin.email.as_str()));
                Ok(Self(admin))
            }
            Err(e) => {
                let err = AuthError::from(e);
                if !err.is_access_denied() {
                    return Err(AdminAuthRejection::Error(err.into()));
                }

                tracing::debug!(error = %err, "Request rejected: not authenticated");
                if is_api_path(parts.uri.path()) {
                    Err(AdminAuthRejection::Unauthorized)
                } else {
                    Err(AdminAuthRejection::RedirectToLogin)
                }
            }
        }
    }
}
