//! Google sign-in and session route handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect},
    routing::{get, post},
};
use axum_extra::extract::{
    CookieJar, SignedCookieJar,
    cookie::{Cookie, SameSite},
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::google::{GoogleError, OAuthState};
use crate::middleware::RequireAdmin;
use crate::models::{SessionCookiePair, cookie_names};
use crate::services::AuthError;
use crate::state::AppState;

/// How long a sign-in attempt may take before its state cookie expires.
const OAUTH_STATE_LIFETIME: time::Duration = time::Duration::minutes(10);

/// The state cookie is only sent back to the auth routes.
const OAUTH_STATE_PATH: &str = "/auth";

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login))
        .route("/auth/callback", get(callback))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

/// Query parameters Google appends to the redirect URI.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    state: Option<String>,
    code: Option<String>,
    error: Option<String>,
}

/// Response body for `GET /auth/me`.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    email: String,
}

/// Start a sign-in attempt.
///
/// GET /auth/login
async fn login(State(state): State<AppState>, jar: SignedCookieJar) -> impl IntoResponse {
    let oauth_state = OAuthState::generate();
    let url = state.google().authorization_url(&oauth_state);
    let cookie = state_cookie(oauth_state.as_str().to_owned(), state.config().cookie_scope().secure);

    (jar.add(cookie), Redirect::to(&url))
}

/// Finish a sign-in attempt and issue the session cookies.
///
/// GET /auth/callback?state=..&code=..
///
/// The state cookie is removed whatever the outcome, so a callback URL can
/// only be used once.
async fn callback(
    State(state): State<AppState>,
    signed: SignedCookieJar,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> impl IntoResponse {
    let expected = signed
        .get(cookie_names::OAUTH_STATE)
        .map(|c| OAuthState::from_cookie(c.value()));
    let signed = signed.remove(Cookie::build(cookie_names::OAUTH_STATE).path(OAUTH_STATE_PATH));

    (signed, complete_login(&state, expected, params, jar).await)
}

async fn complete_login(
    state: &AppState,
    expected: Option<OAuthState>,
    params: CallbackParams,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    if let Some(error) = params.error {
        return Err(AuthError::from(GoogleError::Denied(error)).into());
    }
    let Some(expected) = expected else {
        tracing::warn!("OAuth callback without a valid state cookie");
        return Err(AuthError::from(GoogleError::InvalidState).into());
    };
    let Some(code) = params.code else {
        return Err(AppError::BadRequest("missing authorization code".to_string()));
    };

    let profile = state
        .google()
        .exchange_code(&expected, params.state.as_deref().unwrap_or_default(), &code)
        .await
        .map_err(AuthError::from)?;
    let admin = state
        .directory()
        .resolve_or_create(&profile)
        .await
        .map_err(AuthError::from)?;
    let pair = state.sessions().issue(&admin).await.map_err(AuthError::from)?;

    set_sentry_user(admin.id, Some(admin.email.as_str()));
    tracing::info!(admin_id = %admin.id, "Admin signed in");

    Ok((pair.apply(jar), Redirect::to("/")))
}

/// Clear the session cookies.
///
/// POST /auth/logout
async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    clear_sentry_user();
    (
        SessionCookiePair::clear(jar, state.sessions().scope()),
        Redirect::to("/"),
    )
}

/// The signed-in admin.
///
/// GET /auth/me
async fn me(RequireAdmin(admin): RequireAdmin) -> Json<MeResponse> {
    Json(MeResponse {
        email: admin.email.into_inner(),
    })
}

fn state_cookie(value: String, secure: bool) -> Cookie<'static> {
    // Lax so the cookie survives the top-level redirect back from Google.
    Cookie::build((cookie_names::OAUTH_STATE, value))
        .path(OAUTH_STATE_PATH)
        .max_age(OAUTH_STATE_LIFETIME)
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}
