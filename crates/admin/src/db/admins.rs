//! `PostgreSQL`-backed admin store.
//!
//! Queries are built at runtime (`sqlx::query_as`) so the crate builds
//! without a live database or offline query cache.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use website_core::{AdminId, Email, ProviderUserId};

use super::{AdminStore, InsertOutcome, RepositoryError};
use crate::models::{AdminFilter, AdminRecord, NewAdmin};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `site.admins` queries.
#[derive(Debug, sqlx::FromRow)]
struct AdminRow {
    id: i32,
    email: String,
    provider_id: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AdminRow> for AdminRecord {
    type Error = RepositoryError;

    fn try_from(row: AdminRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in admins: {e}"))
        })?;
        let provider_id = ProviderUserId::parse(&row.provider_id).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid provider id in admins: {e}"))
        })?;

        Ok(Self {
            id: AdminId::new(row.id),
            email,
            provider_id,
            created_at: row.created_at,
        })
    }
}

// =============================================================================
// Store
// =============================================================================

/// Admin store backed by the `site.admins` table.
#[derive(Debug, Clone)]
pub struct PgAdminStore {
    pool: PgPool,
}

impl PgAdminStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List every admin, oldest first.
    ///
    /// Operator tooling only; the auth services never enumerate admins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn list_all(&self) -> Result<Vec<AdminRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, AdminRow>(
            r"
            SELECT id, email, provider_id, created_at
            FROM site.admins
            ORDER BY created_at ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Delete the admin with this email, returning whether a record existed.
    ///
    /// Deleting a record revokes every session issued for it: the next
    /// authenticated request fails its directory lookup.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_by_email(&self, email: &Email) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM site.admins WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AdminStore for PgAdminStore {
    async fn find_one(&self, filter: &AdminFilter) -> Result<Option<AdminRecord>, RepositoryError> {
        let row = match &filter.provider_id {
            Some(provider_id) => {
                sqlx::query_as::<_, AdminRow>(
                    r"
                    SELECT id, email, provider_id, created_at
                    FROM site.admins
                    WHERE email = $1 AND provider_id = $2
                    ",
                )
                .bind(&filter.email)
                .bind(provider_id)
                .fetch_optional(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, AdminRow>(
                    r"
                    SELECT id, email, provider_id, created_at
                    FROM site.admins
                    WHERE email = $1
                    ",
                )
                .bind(&filter.email)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        row.map(TryInto::try_into).transpose()
    }

    async fn insert_if_absent(&self, admin: &NewAdmin) -> Result<InsertOutcome, RepositoryError> {
        let id: Option<i32> = sqlx::query_scalar(
            r"
            INSERT INTO site.admins (email, provider_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            RETURNING id
            ",
        )
        .bind(&admin.email)
        .bind(&admin.provider_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(id.map_or(InsertOutcome::AlreadyExists, |id| {
            InsertOutcome::Inserted(AdminId::new(id))
        }))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
