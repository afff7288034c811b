//! Document store access for admin records.
//!
//! # Collection: `site.admins`
//!
//! One document per administrator: `email`, `provider_id`, store-assigned
//! `id` and `created_at`. The store enforces `UNIQUE(email)` and
//! `UNIQUE(email, provider_id)`, which is what makes concurrent first logins
//! for the same identity collapse into a single record.
//!
//! The auth services only need two operations (find one by exact-match filter,
//! insert if absent); they are expressed by the [`AdminStore`] port so the
//! services can run against [`PgAdminStore`] in production and
//! [`MemoryAdminStore`] in tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p website-cli -- migrate
//! ```

pub mod admins;
pub mod memory;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use website_core::AdminId;

use crate::models::{AdminFilter, AdminRecord, NewAdmin};

pub use admins::PgAdminStore;
pub use memory::MemoryAdminStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The operation did not complete within its deadline.
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    /// The store is unavailable (used by non-database stores).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result of a conditional insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new record was written with this identifier.
    Inserted(AdminId),
    /// A record with the same email already exists; nothing was written.
    AlreadyExists,
}

/// Storage port for admin records.
///
/// `find_one` distinguishes "no matching record" (`Ok(None)`) from a failed
/// query (`Err`). Callers must never treat a failed query as absence.
#[async_trait]
pub trait AdminStore: Send + Sync {
    /// Find the single record matching `filter` exactly.
    async fn find_one(&self, filter: &AdminFilter) -> Result<Option<AdminRecord>, RepositoryError>;

    /// Insert `admin` unless a record with the same email already exists.
    async fn insert_if_absent(&self, admin: &NewAdmin) -> Result<InsertOutcome, RepositoryError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Run a store operation with a deadline.
///
/// # Errors
///
/// Returns `RepositoryError::Timeout` if `op` does not finish within
/// `deadline`, otherwise whatever `op` returns.
pub async fn with_deadline<T, F>(deadline: Duration, op: F) -> Result<T, RepositoryError>
where
    F: Future<Output = Result<T, RepositoryError>>,
{
    tokio::time::timeout(deadline, op)
        .await
        .map_err(|_| RepositoryError::Timeout(deadline))?
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_deadline_passes_result_through() {
        let result = with_deadline(Duration::from_secs(1), async { Ok::<_, RepositoryError>(7) }).await;
        assert!(matches!(result, Ok(7)));
    }

    #[tokio::test]
    async fn test_with_deadline_times_out() {
        let result = with_deadline(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, RepositoryError>(())
        })
        .await;
        assert!(matches!(result, Err(RepositoryError::Timeout(_))));
    }
}
