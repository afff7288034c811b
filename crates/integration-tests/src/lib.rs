//! Shared fixtures for the admin backend integration tests.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p website-integration-tests
//! ```
//!
//! No database is needed: the store is the in-memory `MemoryAdminStore` or a
//! wrapper around it, and Google is replaced by a `mockito` server.
//!
//! # Test Categories
//!
//! - `directory` - resolve-or-create properties, failure injection, races
//! - `sessions` - cookie pair issue/verify, tampering, revocation
//! - `login_flow` - the HTTP flow end to end through the router

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Barrier;

use website_admin::AdminConfig;
use website_admin::db::{AdminStore, InsertOutcome, MemoryAdminStore, RepositoryError};
use website_admin::models::{AdminFilter, AdminRecord, CookieScope, NewAdmin};
use website_admin::services::{AdminDirectory, AuthorizationPolicy, CredentialHasher, SessionManager};
use website_core::{Email, ProviderUserId};

/// bcrypt cost used throughout the tests.
pub const TEST_HASH_COST: u32 = 4;

/// Deadline for store calls in tests.
pub const TEST_DEADLINE: Duration = Duration::from_secs(5);

/// Cookie signing key material (64 chars, high entropy).
pub const TEST_COOKIE_SECRET: &str =
    "Zq8mN3vR7tY1wK5pL9xC2bH6jF4dS0gA+eU8iO3uT7yW1qM5nB9vX2cZ6kJ4hG0f";

/// A userinfo body as Google returns it.
#[must_use]
pub fn profile_json(email: &str, id: &str) -> Vec<u8> {
    serde_json::json!({
        "id": id,
        "email": email,
        "verified_email": true,
        "picture": "https://lh3.googleusercontent.com/a/default-user",
    })
    .to_string()
    .into_bytes()
}

/// Parse an admin identity, panicking on invalid fixtures.
#[must_use]
pub fn new_admin(email: &str, provider_id: &str) -> NewAdmin {
    NewAdmin {
        email: Email::parse(email).unwrap_or_else(|e| panic!("bad fixture email {email}: {e}")),
        provider_id: ProviderUserId::parse(provider_id)
            .unwrap_or_else(|e| panic!("bad fixture id {provider_id}: {e}")),
    }
}

/// Allow-list from string slices.
#[must_use]
pub fn policy(allowed: &[&str]) -> AuthorizationPolicy {
    AuthorizationPolicy::new(allowed.iter().map(ToString::to_string).collect())
}

/// Directory over `store` with the test deadline.
#[must_use]
pub fn directory(store: Arc<dyn AdminStore>, allowed: &[&str]) -> AdminDirectory {
    AdminDirectory::new(store, policy(allowed), TEST_DEADLINE)
}

/// Session manager over `store` with the test hash cost.
#[must_use]
pub fn session_manager(store: Arc<dyn AdminStore>) -> SessionManager {
    SessionManager::new(
        CredentialHasher::new(TEST_HASH_COST),
        store,
        CookieScope {
            domain: "x.com".to_string(),
            secure: false,
        },
        TEST_DEADLINE,
    )
}

/// Backend configuration pointing Google's endpoints at `provider_url`.
///
/// # Panics
///
/// Panics if the fixture configuration is rejected.
#[must_use]
pub fn test_config(provider_url: &str, admin_emails: &[&str]) -> AdminConfig {
    let vars: HashMap<String, String> = [
        ("ADMIN_DATABASE_URL", "postgres://localhost/unused".to_string()),
        ("ADMIN_BASE_URL", "http://localhost:3001".to_string()),
        ("SITE_DOMAIN", "x.com".to_string()),
        ("ADMIN_COOKIE_SECRET", TEST_COOKIE_SECRET.to_string()),
        ("ADMIN_EMAILS", admin_emails.join(",")),
        ("ADMIN_HASH_COST", TEST_HASH_COST.to_string()),
        ("ADMIN_REQUEST_TIMEOUT_SECS", "5".to_string()),
        ("GOOGLE_CLIENT_ID", "client-1".to_string()),
        ("GOOGLE_CLIENT_SECRET", "GOCSPX-test".to_string()),
        ("GOOGLE_AUTH_URL", format!("{provider_url}/o/oauth2/auth")),
        ("GOOGLE_TOKEN_URL", format!("{provider_url}/token")),
        ("GOOGLE_USERINFO_URL", format!("{provider_url}/oauth2/v2/userinfo")),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    AdminConfig::from_vars(&vars).unwrap_or_else(|e| panic!("test config rejected: {e}"))
}

// =============================================================================
// Store wrappers
// =============================================================================

/// Which store call misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Every lookup fails.
    FindFails,
    /// Every insert fails.
    InsertFails,
    /// Lookups fail once a record has been inserted.
    RefetchFails,
    /// Lookups find nothing once a record has been inserted.
    RefetchMissing,
    /// Every call stalls for this long before running.
    Slow(Duration),
}

/// Memory store with an injected fault.
#[derive(Debug)]
pub struct FaultyStore {
    pub inner: MemoryAdminStore,
    fault: Fault,
}

impl FaultyStore {
    /// Wrap an empty memory store.
    #[must_use]
    pub fn new(fault: Fault) -> Self {
        Self {
            inner: MemoryAdminStore::new(),
            fault,
        }
    }

    fn injected() -> RepositoryError {
        RepositoryError::Unavailable("injected fault".to_string())
    }

    async fn stall(&self) {
        if let Fault::Slow(delay) = self.fault {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl AdminStore for FaultyStore {
    async fn find_one(&self, filter: &AdminFilter) -> Result<Option<AdminRecord>, RepositoryError> {
        self.stall().await;
        let inserted = self.inner.insert_count() > 0;
        match self.fault {
            Fault::FindFails => Err(Self::injected()),
            Fault::RefetchFails if inserted => Err(Self::injected()),
            Fault::RefetchMissing if inserted => Ok(None),
            _ => self.inner.find_one(filter).await,
        }
    }

    async fn insert_if_absent(&self, admin: &NewAdmin) -> Result<InsertOutcome, RepositoryError> {
        self.stall().await;
        if self.fault == Fault::InsertFails {
            return Err(Self::injected());
        }
        self.inner.insert_if_absent(admin).await
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        match self.fault {
            Fault::FindFails => Err(Self::injected()),
            _ => Ok(()),
        }
    }
}

/// Memory store whose first `parties` lookups wait for each other, so that
/// concurrent first logins all observe "no record" before any of them inserts.
#[derive(Debug)]
pub struct RacingStore {
    pub inner: MemoryAdminStore,
    barrier: Barrier,
    parties: usize,
    lookups: AtomicUsize,
}

impl RacingStore {
    /// Synchronize the first `parties` lookups.
    #[must_use]
    pub fn new(parties: usize) -> Self {
        Self {
            inner: MemoryAdminStore::new(),
            barrier: Barrier::new(parties),
            parties,
            lookups: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AdminStore for RacingStore {
    async fn find_one(&self, filter: &AdminFilter) -> Result<Option<AdminRecord>, RepositoryError> {
        let result = self.inner.find_one(filter).await;
        if self.lookups.fetch_add(1, Ordering::SeqCst) < self.parties {
            self.barrier.wait().await;
        }
        result
    }

    async fn insert_if_absent(&self, admin: &NewAdmin) -> Result<InsertOutcome, RepositoryError> {
        self.inner.insert_if_absent(admin).await
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
