//! Admin directory: resolves a provider profile to a stored admin record,
//! creating the record on first login.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use website_core::{Email, ProviderUserId};

use super::policy::AuthorizationPolicy;
use crate::db::{AdminStore, InsertOutcome, RepositoryError, with_deadline};
use crate::models::{AdminFilter, AdminRecord, NewAdmin, Profile};

/// Errors from resolving an admin record.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The profile body is not valid JSON or has invalid fields.
    #[error("malformed profile: {0}")]
    Decode(String),

    /// The email is not on the allow-list.
    #[error("email is not authorized")]
    Unauthorized,

    /// Looking up an existing record failed.
    #[error("admin lookup failed: {0}")]
    Lookup(#[source] RepositoryError),

    /// Writing a new record failed.
    #[error("admin insert failed: {0}")]
    Insert(#[source] RepositoryError),

    /// A new record was written but reading it back failed.
    #[error("admin record written but could not be re-read: {0}")]
    PostInsertQuery(String),

    /// The email is already bound to a different provider identity.
    #[error("email is bound to another identity")]
    IdentityConflict,

    /// A store call exceeded its deadline.
    #[error("directory operation timed out after {0:?}")]
    Timeout(Duration),
}

impl DirectoryError {
    fn lookup(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Timeout(d) => Self::Timeout(d),
            other => Self::Lookup(other),
        }
    }

    fn insert(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Timeout(d) => Self::Timeout(d),
            other => Self::Insert(other),
        }
    }
}

/// Userinfo fields the directory needs. Other fields are ignored.
#[derive(Debug, Deserialize)]
struct RawProfile {
    email: String,
    id: String,
}

/// Store-backed directory of admin records.
#[derive(Clone)]
pub struct AdminDirectory {
    store: Arc<dyn AdminStore>,
    policy: AuthorizationPolicy,
    deadline: Duration,
}

impl AdminDirectory {
    /// Create a directory over `store`, gated by `policy`.
    #[must_use]
    pub fn new(store: Arc<dyn AdminStore>, policy: AuthorizationPolicy, deadline: Duration) -> Self {
        Self {
            store,
            policy,
            deadline,
        }
    }

    /// The allow-list consulted before any record is read or written.
    #[must_use]
    pub const fn policy(&self) -> &AuthorizationPolicy {
        &self.policy
    }

    /// Decode a userinfo response body into a [`Profile`].
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Decode` if the body is not JSON, lacks `email`
    /// or `id`, or either value is invalid.
    pub fn decode_profile(raw: &[u8]) -> Result<Profile, DirectoryError> {
        let profile: RawProfile =
            serde_json::from_slice(raw).map_err(|e| DirectoryError::Decode(e.to_string()))?;

        let email = Email::parse(&profile.email)
            .map_err(|e| DirectoryError::Decode(format!("email: {e}")))?;
        let provider_id = ProviderUserId::parse(&profile.id)
            .map_err(|e| DirectoryError::Decode(format!("id: {e}")))?;

        Ok(Profile { email, provider_id })
    }

    /// Resolve the admin a profile belongs to, creating it on first login.
    ///
    /// The allow-list is checked before the store is touched. An existing
    /// `(email, provider_id)` record is returned as-is. Otherwise a record is
    /// inserted if no record holds the email yet, and the stored record is
    /// read back.
    ///
    /// # Errors
    ///
    /// * `Decode` if the profile is malformed.
    /// * `Unauthorized` if the email is not allowed; nothing is read or written.
    /// * `Lookup` if the existing-record query fails. A failed query never
    ///   leads to an insert.
    /// * `Insert` if the insert fails.
    /// * `PostInsertQuery` if the record was written but cannot be read back.
    /// * `IdentityConflict` if the email belongs to a record with another
    ///   provider id.
    /// * `Timeout` if a store call exceeds the deadline.
    #[instrument(skip(self, raw), fields(admin_id = tracing::field::Empty))]
    pub async fn resolve_or_create(&self, raw: &[u8]) -> Result<AdminRecord, DirectoryError> {
        let profile = Self::decode_profile(raw)?;

        if !self.policy.is_allowed(profile.email.as_str()) {
            tracing::info!("Login rejected: email not on the allow-list");
            return Err(DirectoryError::Unauthorized);
        }

        let filter = AdminFilter::identity(&profile.email, &profile.provider_id);
        if let Some(existing) = self.find(&filter).await.map_err(DirectoryError::lookup)? {
            tracing::Span::current().record("admin_id", existing.id.as_i32());
            return Ok(existing);
        }

        let new_admin = NewAdmin::from(profile);
        let outcome = with_deadline(self.deadline, self.store.insert_if_absent(&new_admin))
            .await
            .map_err(DirectoryError::insert)?;

        match outcome {
            InsertOutcome::Inserted(id) => {
                tracing::Span::current().record("admin_id", id.as_i32());
                match self.find(&filter).await {
                    Ok(Some(record)) => {
                        tracing::info!("Created admin record");
                        Ok(record)
                    }
                    Ok(None) => {
                        tracing::error!(%id, "admin record written but could not be re-read");
                        Err(DirectoryError::PostInsertQuery(format!(
                            "record {id} missing after insert"
                        )))
                    }
                    Err(e) => {
                        tracing::error!(%id, error = %e, "admin record written but could not be re-read");
                        Err(DirectoryError::PostInsertQuery(e.to_string()))
                    }
                }
            }
            InsertOutcome::AlreadyExists => {
                match self.find(&filter).await.map_err(DirectoryError::lookup)? {
                    Some(record) => {
                        tracing::Span::current().record("admin_id", record.id.as_i32());
                        Ok(record)
                    }
                    None => {
                        tracing::warn!("Login rejected: email already bound to another provider id");
                        Err(DirectoryError::IdentityConflict)
                    }
                }
            }
        }
    }

    async fn find(&self, filter: &AdminFilter) -> Result<Option<AdminRecord>, RepositoryError> {
        with_deadline(self.deadline, self.store.find_one(filter)).await
    }
}
