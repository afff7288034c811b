//! Admin record domain types.
//!
//! An admin is identified by the `(email, provider_id)` pair. Records are
//! created once on first login and never updated by the auth services.

use chrono::{DateTime, Utc};
use serde::Serialize;

use website_core::{AdminId, Email, ProviderUserId};

/// A stored administrator (domain type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminRecord {
    /// Store-assigned identifier.
    pub id: AdminId,
    /// Admin's email address (unique within the directory).
    pub email: Email,
    /// Identity provider's stable user ID.
    pub provider_id: ProviderUserId,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// The identity a new admin record is created from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAdmin {
    pub email: Email,
    pub provider_id: ProviderUserId,
}

/// The identity asserted by the provider's profile response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub email: Email,
    pub provider_id: ProviderUserId,
}

impl From<Profile> for NewAdmin {
    fn from(profile: Profile) -> Self {
        Self {
            email: profile.email,
            provider_id: profile.provider_id,
        }
    }
}

/// Exact-match filter for a single admin record.
///
/// Existing-admin checks always filter on both fields; session checks filter
/// on email only and prove the provider ID through the session hash instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminFilter {
    pub email: Email,
    pub provider_id: Option<ProviderUserId>,
}

impl AdminFilter {
    /// Match on the full `(email, provider_id)` identity.
    #[must_use]
    pub fn identity(email: &Email, provider_id: &ProviderUserId) -> Self {
        Self {
            email: email.clone(),
            provider_id: Some(provider_id.clone()),
        }
    }

    /// Match on email only.
    #[must_use]
    pub fn email(email: &Email) -> Self {
        Self {
            email: email.clone(),
            provider_id: None,
        }
    }

    /// Whether `record` satisfies this filter.
    #[must_use]
    pub fn matches(&self, record: &AdminRecord) -> bool {
        record.email == self.email
            && self
                .provider_id
                .as_ref()
                .is_none_or(|id| *id == record.provider_id)
    }
}
