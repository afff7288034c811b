//! Application state shared across handlers.

use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use secrecy::ExposeSecret;

use crate::config::{AdminConfig, ConfigError};
use crate::db::AdminStore;
use crate::google::GoogleClient;
use crate::services::{AdminDirectory, AuthorizationPolicy, CredentialHasher, SessionManager};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    store: Arc<dyn AdminStore>,
    google: GoogleClient,
    directory: AdminDirectory,
    sessions: SessionManager,
    cookie_key: Key,
}

impl AppState {
    /// Wire the auth services over `store`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the cookie secret cannot be used as a signing
    /// key or the HTTP client cannot be built.
    pub fn new(config: AdminConfig, store: Arc<dyn AdminStore>) -> Result<Self, ConfigError> {
        let cookie_key = Key::try_from(config.cookie_secret.expose_secret().as_bytes())
            .map_err(|e| {
                ConfigError::InsecureSecret("ADMIN_COOKIE_SECRET".to_string(), e.to_string())
            })?;

        let google = GoogleClient::new(&config.google, config.request_timeout)
            .map_err(|e| ConfigError::InvalidEnvVar("GOOGLE_*".to_string(), e.to_string()))?;

        let policy = AuthorizationPolicy::new(config.admin_emails.clone());
        if policy.is_empty() {
            tracing::warn!("ADMIN_EMAILS is empty; nobody can sign in");
        } else {
            tracing::info!(admins = policy.len(), "Loaded admin allow-list");
        }

        let directory = AdminDirectory::new(store.clone(), policy, config.request_timeout);
        let sessions = SessionManager::new(
            CredentialHasher::new(config.hash_cost),
            store.clone(),
            config.cookie_scope(),
            config.request_timeout,
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                google,
                directory,
                sessions,
                cookie_key,
            }),
        })
    }

    /// Loaded configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Admin record store.
    #[must_use]
    pub fn store(&self) -> &dyn AdminStore {
        self.inner.store.as_ref()
    }

    /// Google OAuth2 client.
    #[must_use]
    pub fn google(&self) -> &GoogleClient {
        &self.inner.google
    }

    /// Admin directory.
    #[must_use]
    pub fn directory(&self) -> &AdminDirectory {
        &self.inner.directory
    }

    /// Session manager.
    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.inner.sessions
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.inner.cookie_key.clone()
    }
}
