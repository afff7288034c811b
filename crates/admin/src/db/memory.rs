//! In-process admin store.
//!
//! Enforces the same uniqueness rules as `site.admins` and is used by unit
//! and integration tests.

use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use website_core::{AdminId, Email};

use super::{AdminStore, InsertOutcome, RepositoryError};
use crate::models::{AdminFilter, AdminRecord, NewAdmin};

/// Admin store held in memory.
#[derive(Debug, Default)]
pub struct MemoryAdminStore {
    records: RwLock<Vec<AdminRecord>>,
    next_id: AtomicI32,
    inserts: AtomicUsize,
}

impl MemoryAdminStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `admins`.
    pub async fn with_admins(admins: impl IntoIterator<Item = NewAdmin>) -> Self {
        let store = Self::new();
        for admin in admins {
            store.push(&admin).await;
        }
        store
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Number of inserts that actually wrote a record.
    #[must_use]
    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    /// Remove the record with this email, returning whether one existed.
    pub async fn remove(&self, email: &Email) -> bool {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.email != *email);
        records.len() != before
    }

    async fn push(&self, admin: &NewAdmin) -> AdminId {
        let id = AdminId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.records.write().await.push(AdminRecord {
            id,
            email: admin.email.clone(),
            provider_id: admin.provider_id.clone(),
            created_at: Utc::now(),
        });
        id
    }
}

#[async_trait]
impl AdminStore for MemoryAdminStore {
    async fn find_one(&self, filter: &AdminFilter) -> Result<Option<AdminRecord>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| filter.matches(r)).cloned())
    }

    async fn insert_if_absent(&self, admin: &NewAdmin) -> Result<InsertOutcome, RepositoryError> {
        // Check and write under one lock so concurrent inserts serialize.
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.email == admin.email) {
            return Ok(InsertOutcome::AlreadyExists);
        }

        let id = AdminId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        records.push(AdminRecord {
            id,
            email: admin.email.clone(),
            provider_id: admin.provider_id.clone(),
            created_at: Utc::now(),
        });
        self.inserts.fetch_add(1, Ordering::SeqCst);

        Ok(InsertOutcome::Inserted(id))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
