//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (store reachable)
//!
//! # Auth (Google sign-in, cookie sessions)
//! GET  /auth/login             - Redirect to Google's consent screen
//! GET  /auth/callback          - Finish sign-in, set session cookies
//! POST /auth/logout            - Clear session cookies
//! GET  /auth/me                - Signed-in admin (401 if not signed in)
//! ```

pub mod auth;

use axum::{Router, extract::State, http::StatusCode, routing::get};

use crate::middleware::security_headers;
use crate::state::AppState;

/// Build the application router with its state applied.
///
/// Tracing and Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    security_headers(routes()).with_state(state)
}

/// All routes, before state is applied.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(auth::router())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the admin store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
