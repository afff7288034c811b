//! Admin directory behavior against stores that misbehave or race.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use website_admin::db::MemoryAdminStore;
use website_admin::services::{AdminDirectory, DirectoryError};
use website_integration_tests::{
    Fault, FaultyStore, RacingStore, directory, new_admin, policy, profile_json,
};

const ADMIN: &str = "a@x.com";

#[tokio::test]
async fn test_unlisted_emails_never_touch_the_store() {
    let store = Arc::new(MemoryAdminStore::new());
    let dir = directory(store.clone(), &[ADMIN]);

    for email in ["b@x.com", "A@x.com", "a@x.co", "a@x.com.evil.org"] {
        let err = dir
            .resolve_or_create(&profile_json(email, "pid1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Unauthorized), "{email}: {err:?}");
    }

    assert!(store.is_empty().await);
    assert_eq!(store.insert_count(), 0);
}

#[tokio::test]
async fn test_unlisted_email_is_rejected_even_when_store_is_down() {
    let store = Arc::new(FaultyStore::new(Fault::FindFails));
    let dir = directory(store, &[ADMIN]);

    let err = dir
        .resolve_or_create(&profile_json("b@x.com", "pid1"))
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::Unauthorized));
}

#[tokio::test]
async fn test_existing_admin_is_returned_without_insert() {
    let store = Arc::new(MemoryAdminStore::with_admins([new_admin(ADMIN, "pid1")]).await);
    let dir = directory(store.clone(), &[ADMIN]);

    let admin = dir.resolve_or_create(&profile_json(ADMIN, "pid1")).await.unwrap();

    assert_eq!(admin.email.as_str(), ADMIN);
    assert_eq!(admin.provider_id.as_str(), "pid1");
    assert_eq!(store.insert_count(), 0);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_repeated_logins_create_one_record() {
    let store = Arc::new(MemoryAdminStore::new());
    let dir = directory(store.clone(), &[ADMIN]);

    let first = dir.resolve_or_create(&profile_json(ADMIN, "pid1")).await.unwrap();
    for _ in 0..3 {
        let again = dir.resolve_or_create(&profile_json(ADMIN, "pid1")).await.unwrap();
        assert_eq!(again, first);
    }

    assert_eq!(store.len().await, 1);
    assert_eq!(store.insert_count(), 1);
}

#[tokio::test]
async fn test_email_bound_to_other_provider_id_is_a_conflict() {
    let store = Arc::new(MemoryAdminStore::with_admins([new_admin(ADMIN, "pid1")]).await);
    let dir = directory(store.clone(), &[ADMIN]);

    let err = dir
        .resolve_or_create(&profile_json(ADMIN, "pid2"))
        .await
        .unwrap_err();

    assert!(matches!(err, DirectoryError::IdentityConflict));
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_malformed_profiles_are_decode_errors() {
    let dir = directory(Arc::new(MemoryAdminStore::new()), &[ADMIN]);

    for body in [
        b"not json".to_vec(),
        br#"{"email":"a@x.com"}"#.to_vec(),
        br#"{"id":"pid1"}"#.to_vec(),
        profile_json("not-an-email", "pid1"),
        profile_json(ADMIN, ""),
    ] {
        let err = dir.resolve_or_create(&body).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Decode(_)), "{err:?}");
    }
}

#[tokio::test]
async fn test_failed_lookup_is_not_treated_as_missing() {
    let store = Arc::new(FaultyStore::new(Fault::FindFails));
    let dir = directory(store.clone(), &[ADMIN]);

    let err = dir.resolve_or_create(&profile_json(ADMIN, "pid1")).await.unwrap_err();

    assert!(matches!(err, DirectoryError::Lookup(_)), "{err:?}");
    assert_eq!(store.inner.insert_count(), 0);
}

#[tokio::test]
async fn test_failed_insert_is_reported() {
    let store = Arc::new(FaultyStore::new(Fault::InsertFails));
    let dir = directory(store.clone(), &[ADMIN]);

    let err = dir.resolve_or_create(&profile_json(ADMIN, "pid1")).await.unwrap_err();

    assert!(matches!(err, DirectoryError::Insert(_)), "{err:?}");
    assert!(store.inner.is_empty().await);
}

#[tokio::test]
async fn test_unreadable_record_after_insert_is_reported() {
    for fault in [Fault::RefetchFails, Fault::RefetchMissing] {
        let store = Arc::new(FaultyStore::new(fault));
        let dir = directory(store.clone(), &[ADMIN]);

        let err = dir.resolve_or_create(&profile_json(ADMIN, "pid1")).await.unwrap_err();

        assert!(matches!(err, DirectoryError::PostInsertQuery(_)), "{fault:?}: {err:?}");
        // The write itself went through.
        assert_eq!(store.inner.insert_count(), 1);
    }
}

#[tokio::test]
async fn test_slow_store_times_out() {
    let store = Arc::new(FaultyStore::new(Fault::Slow(Duration::from_secs(2))));
    let dir = AdminDirectory::new(store.clone(), policy(&[ADMIN]), Duration::from_millis(20));

    let err = dir.resolve_or_create(&profile_json(ADMIN, "pid1")).await.unwrap_err();

    assert!(matches!(err, DirectoryError::Timeout(_)), "{err:?}");
    assert_eq!(store.inner.insert_count(), 0);
}

#[tokio::test]
async fn test_concurrent_first_logins_create_one_record() {
    let store = Arc::new(RacingStore::new(2));
    let dir = directory(store.clone(), &[ADMIN]);
    let profile = profile_json(ADMIN, "pid1");

    let (a, b) = tokio::join!(dir.resolve_or_create(&profile), dir.resolve_or_create(&profile));
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a, b);
    assert_eq!(store.inner.len().await, 1);
    assert_eq!(store.inner.insert_count(), 1);
}

#[tokio::test]
async fn test_concurrent_logins_with_conflicting_ids() {
    let store = Arc::new(RacingStore::new(2));
    let dir = directory(store.clone(), &[ADMIN]);
    let first = profile_json(ADMIN, "pid1");
    let second = profile_json(ADMIN, "pid2");

    let (a, b) = tokio::join!(dir.resolve_or_create(&first), dir.resolve_or_create(&second));

    // Exactly one identity wins the email; the other is a conflict.
    let winners = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(
        [a, b]
            .into_iter()
            .filter_map(Result::err)
            .all(|e| matches!(e, DirectoryError::IdentityConflict))
    );
    assert_eq!(store.inner.len().await, 1);
}
