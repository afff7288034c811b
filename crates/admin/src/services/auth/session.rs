//! Cookie-based admin sessions without server-side session storage.
//!
//! A session is the pair `admin-email` (plaintext) and `admin-id` (salted
//! bcrypt hash of the admin's provider ID). Every request re-reads the admin
//! record by email and verifies the hash against the stored provider ID, so
//! deleting a record revokes all of its sessions on the next request.

use std::sync::Arc;
use std::time::Duration;

use axum_extra::extract::CookieJar;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::instrument;

use website_core::Email;

use super::hasher::{CredentialHasher, HashError};
use crate::db::{AdminStore, RepositoryError, with_deadline};
use crate::models::{AdminFilter, AdminRecord, CookieScope, SESSION_LIFETIME, SessionCookiePair, cookie_names};

/// Errors from issuing or checking a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// One or both session cookies are absent. Lists every missing name.
    #[error("missing session cookies: {}", .0.join(", "))]
    MissingCookies(Vec<&'static str>),

    /// No admin record matches the email cookie.
    #[error("no admin matches the session")]
    NotFound,

    /// The admin lookup failed.
    #[error("admin lookup failed: {0}")]
    Lookup(#[source] RepositoryError),

    /// The `admin-id` cookie does not verify against the stored provider ID.
    #[error("session verification failed")]
    Authentication,

    /// Hashing the provider ID failed while issuing a session.
    #[error(transparent)]
    Hash(#[from] HashError),

    /// The admin lookup exceeded its deadline.
    #[error("session lookup timed out after {0:?}")]
    Timeout(Duration),
}

/// Issues and verifies session cookie pairs.
#[derive(Clone)]
pub struct SessionManager {
    hasher: CredentialHasher,
    store: Arc<dyn AdminStore>,
    scope: CookieScope,
    deadline: Duration,
}

impl SessionManager {
    /// Create a session manager.
    #[must_use]
    pub fn new(
        hasher: CredentialHasher,
        store: Arc<dyn AdminStore>,
        scope: CookieScope,
        deadline: Duration,
    ) -> Self {
        Self {
            hasher,
            store,
            scope,
            deadline,
        }
    }

    /// Where session cookies are scoped.
    #[must_use]
    pub const fn scope(&self) -> &CookieScope {
        &self.scope
    }

    /// Issue a cookie pair for `admin`, valid for 30 days.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Hash` if hashing the provider ID fails.
    #[instrument(skip(self, admin), fields(admin_id = %admin.id))]
    pub async fn issue(&self, admin: &AdminRecord) -> Result<SessionCookiePair, SessionError> {
        let id_hash = self.hasher.hash(admin.provider_id.as_str()).await?;
        let expires = OffsetDateTime::now_utc() + SESSION_LIFETIME;

        tracing::debug!("Issued session cookies");
        Ok(SessionCookiePair::new(&admin.email, id_hash, &self.scope, expires))
    }

    /// Authenticate a request from its cookies.
    ///
    /// # Errors
    ///
    /// * `MissingCookies` if either cookie is absent.
    /// * `NotFound` if the email cookie names no admin (or is not an email).
    /// * `Lookup` if the store query fails.
    /// * `Authentication` if the `admin-id` cookie does not verify.
    /// * `Timeout` if the store query exceeds the deadline.
    #[instrument(skip(self, jar))]
    pub async fn authenticate(&self, jar: &CookieJar) -> Result<AdminRecord, SessionError> {
        let (email, id_hash) = match (jar.get(cookie_names::EMAIL), jar.get(cookie_names::ID)) {
            (Some(email), Some(id)) => (email.value(), id.value()),
            (email, id) => {
                let missing = [(email.is_none(), cookie_names::EMAIL), (id.is_none(), cookie_names::ID)]
                    .into_iter()
                    .filter_map(|(absent, name)| absent.then_some(name))
                    .collect();
                return Err(SessionError::MissingCookies(missing));
            }
        };

        let Ok(email) = Email::parse(email) else {
            return Err(SessionError::NotFound);
        };

        let admin = match with_deadline(self.deadline, self.store.find_one(&AdminFilter::email(&email))).await {
            Ok(Some(admin)) => admin,
            Ok(None) => return Err(SessionError::NotFound),
            Err(RepositoryError::Timeout(d)) => return Err(SessionError::Timeout(d)),
            Err(e) => return Err(SessionError::Lookup(e)),
        };

        match self.hasher.verify(id_hash, admin.provider_id.as_str()).await {
            Ok(true) => Ok(admin),
            Ok(false) => Err(SessionError::Authentication),
            Err(HashError::Bcrypt(e)) => {
                tracing::debug!(error = %e, "Session cookie is not a valid hash");
                Err(SessionError::Authentication)
            }
            Err(e @ HashError::Task(_)) => Err(SessionError::Hash(e)),
        }
    }
}
