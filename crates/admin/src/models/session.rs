//! Session cookie types for admin authentication.
//!
//! Sessions are not stored server-side. A browser proves it holds a session
//! with two cookies: the admin's email in plaintext, and a salted bcrypt hash
//! of the admin's provider ID.

use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::OffsetDateTime;

use website_core::Email;

/// Cookie names used by admin authentication.
pub mod cookie_names {
    /// Plaintext admin email.
    pub const EMAIL: &str = "admin-email";

    /// bcrypt hash of the admin's provider ID.
    pub const ID: &str = "admin-id";

    /// Signed per-flow OAuth anti-forgery state.
    pub const OAUTH_STATE: &str = "oauth-state";
}

/// How long a session cookie pair stays valid in the browser.
pub const SESSION_LIFETIME: time::Duration = time::Duration::days(30);

/// Where session cookies are scoped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieScope {
    /// `Domain` attribute (the site's domain).
    pub domain: String,
    /// Whether to set `Secure` (HTTPS deployments).
    pub secure: bool,
}

/// The pair of cookies that proves an authenticated admin session.
#[derive(Debug, Clone)]
pub struct SessionCookiePair {
    email: Cookie<'static>,
    id: Cookie<'static>,
}

impl SessionCookiePair {
    /// Build a pair expiring at `expires`.
    #[must_use]
    pub fn new(email: &Email, id_hash: String, scope: &CookieScope, expires: OffsetDateTime) -> Self {
        Self {
            email: session_cookie(cookie_names::EMAIL, email.as_str().to_owned(), scope, expires),
            id: session_cookie(cookie_names::ID, id_hash, scope, expires),
        }
    }

    /// The `admin-email` cookie.
    #[must_use]
    pub const fn email(&self) -> &Cookie<'static> {
        &self.email
    }

    /// The `admin-id` cookie.
    #[must_use]
    pub const fn id(&self) -> &Cookie<'static> {
        &self.id
    }

    /// Add both cookies to a response jar.
    #[must_use]
    pub fn apply(self, jar: CookieJar) -> CookieJar {
        jar.add(self.email).add(self.id)
    }

    /// Expire both session cookies in the browser (logout).
    #[must_use]
    pub fn clear(jar: CookieJar, scope: &CookieScope) -> CookieJar {
        let removal = |name: &'static str| {
            Cookie::build((name, ""))
                .domain(scope.domain.clone())
                .path("/")
                .build()
        };
        jar.remove(removal(cookie_names::EMAIL))
            .remove(removal(cookie_names::ID))
    }
}

fn session_cookie(
    name: &'static str,
    value: String,
    scope: &CookieScope,
    expires: OffsetDateTime,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .domain(scope.domain.clone())
        .path("/")
        .expires(expires)
        .http_only(true)
        .secure(scope.secure)
        .same_site(SameSite::Lax)
        .build()
}
