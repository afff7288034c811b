//! Session cookie pairs from first login to revocation.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;

use website_admin::db::{AdminStore, MemoryAdminStore};
use website_admin::models::{AdminRecord, SESSION_LIFETIME, SessionCookiePair, cookie_names};
use website_admin::services::{
    CredentialHasher, DirectoryError, HashError, SessionError, SessionManager,
};
use website_core::{Email, ProviderUserId};
use website_integration_tests::{
    Fault, FaultyStore, TEST_HASH_COST, directory, new_admin, profile_json, session_manager,
};

const ADMIN: &str = "a@x.com";

fn jar(email: &str, id: &str) -> CookieJar {
    CookieJar::new()
        .add(Cookie::new(cookie_names::EMAIL, email.to_owned()))
        .add(Cookie::new(cookie_names::ID, id.to_owned()))
}

fn jar_from(pair: &SessionCookiePair) -> CookieJar {
    jar(pair.email().value(), pair.id().value())
}

/// Change one character in the middle of a bcrypt hash.
fn flip_char(hash: &str) -> String {
    let mut chars: Vec<char> = hash.chars().collect();
    chars[40] = if chars[40] == 'A' { 'B' } else { 'A' };
    chars.into_iter().collect()
}

async fn signed_in() -> (Arc<MemoryAdminStore>, SessionManager, AdminRecord, SessionCookiePair) {
    let store = Arc::new(MemoryAdminStore::new());
    let admin = directory(store.clone(), &[ADMIN])
        .resolve_or_create(&profile_json(ADMIN, "pid1"))
        .await
        .unwrap();
    let sessions = session_manager(store.clone());
    let pair = sessions.issue(&admin).await.unwrap();
    (store, sessions, admin, pair)
}

#[tokio::test]
async fn test_first_login_session_authenticates() {
    let (_, sessions, admin, pair) = signed_in().await;

    assert_eq!(pair.email().value(), ADMIN);
    assert_ne!(pair.id().value(), "pid1");
    assert!(pair.id().value().starts_with("$2b$04$"));

    let authenticated = sessions.authenticate(&jar_from(&pair)).await.unwrap();
    assert_eq!(authenticated, admin);
}

#[tokio::test]
async fn test_session_cookies_expire_after_lifetime() {
    let (_, _, _, pair) = signed_in().await;

    let expires = pair.id().expires_datetime().unwrap();
    let remaining = expires - time::OffsetDateTime::now_utc();
    assert!(remaining <= SESSION_LIFETIME);
    assert!(remaining > SESSION_LIFETIME - time::Duration::minutes(1));
    assert_eq!(pair.email().domain(), Some("x.com"));
}

#[tokio::test]
async fn test_each_issue_produces_a_fresh_hash() {
    let (_, sessions, admin, first) = signed_in().await;
    let second = sessions.issue(&admin).await.unwrap();

    assert_ne!(first.id().value(), second.id().value());
    sessions.authenticate(&jar_from(&first)).await.unwrap();
    sessions.authenticate(&jar_from(&second)).await.unwrap();
}

#[tokio::test]
async fn test_tampered_hash_fails_authentication() {
    let (_, sessions, _, pair) = signed_in().await;

    let forged = flip_char(pair.id().value());
    let err = sessions.authenticate(&jar(ADMIN, &forged)).await.unwrap_err();
    assert!(matches!(err, SessionError::Authentication), "{err:?}");
}

#[tokio::test]
async fn test_raw_provider_id_is_not_a_credential() {
    let (_, sessions, _, _) = signed_in().await;

    let err = sessions.authenticate(&jar(ADMIN, "pid1")).await.unwrap_err();
    assert!(matches!(err, SessionError::Authentication), "{err:?}");
}

#[tokio::test]
async fn test_hash_for_another_admin_fails_authentication() {
    let store = Arc::new(
        MemoryAdminStore::with_admins([new_admin(ADMIN, "pid1"), new_admin("b@x.com", "pid2")]).await,
    );
    let sessions = session_manager(store.clone());
    let other = directory(store, &[ADMIN, "b@x.com"])
        .resolve_or_create(&profile_json("b@x.com", "pid2"))
        .await
        .unwrap();
    let pair = sessions.issue(&other).await.unwrap();

    // b's valid hash presented with a's email.
    let err = sessions
        .authenticate(&jar(ADMIN, pair.id().value()))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Authentication), "{err:?}");
}

#[tokio::test]
async fn test_unknown_email_is_not_found() {
    let (_, sessions, _, pair) = signed_in().await;

    for email in ["b@x.com", "A@x.com", "garbage"] {
        let err = sessions
            .authenticate(&jar(email, pair.id().value()))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NotFound), "{email}: {err:?}");
    }
}

#[tokio::test]
async fn test_missing_cookies_are_named() {
    let (_, sessions, _, pair) = signed_in().await;

    let cases = [
        (CookieJar::new(), vec![cookie_names::EMAIL, cookie_names::ID]),
        (
            CookieJar::new().add(pair.email().clone()),
            vec![cookie_names::ID],
        ),
        (
            CookieJar::new().add(pair.id().clone()),
            vec![cookie_names::EMAIL],
        ),
    ];

    for (jar, expected) in cases {
        match sessions.authenticate(&jar).await {
            Err(SessionError::MissingCookies(missing)) => assert_eq!(missing, expected),
            other => panic!("expected MissingCookies, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_deleting_admin_revokes_sessions() {
    let (store, sessions, _, pair) = signed_in().await;
    sessions.authenticate(&jar_from(&pair)).await.unwrap();

    assert!(store.remove(&Email::parse(ADMIN).unwrap()).await);

    let err = sessions.authenticate(&jar_from(&pair)).await.unwrap_err();
    assert!(matches!(err, SessionError::NotFound), "{err:?}");
}

#[tokio::test]
async fn test_store_failure_is_not_an_authentication_failure() {
    let store: Arc<dyn AdminStore> = Arc::new(FaultyStore::new(Fault::FindFails));
    let sessions = session_manager(store);

    let err = sessions
        .authenticate(&jar(ADMIN, "$2b$04$abcdefghijklmnopqrstuv"))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Lookup(_)), "{err:?}");
}

#[tokio::test]
async fn test_hasher_round_trips_provider_ids() {
    let hasher = CredentialHasher::new(TEST_HASH_COST);
    let longest = "x".repeat(ProviderUserId::MAX_LENGTH);

    for secret in ["pid1", "108234567890123456789", "ünïcødé", longest.as_str()] {
        let hashed = hasher.hash(secret).await.unwrap();
        assert!(hasher.verify(&hashed, secret).await.unwrap(), "{secret}");
        assert!(!hasher.verify(&hashed, "other").await.unwrap(), "{secret}");
    }
}

#[tokio::test]
async fn test_hasher_rejects_overlong_secret() {
    let hasher = CredentialHasher::new(TEST_HASH_COST);

    let err = hasher
        .hash(&"x".repeat(ProviderUserId::MAX_LENGTH + 1))
        .await
        .unwrap_err();
    assert!(matches!(err, HashError::Bcrypt(_)), "{err:?}");
}

#[tokio::test]
async fn test_longest_provider_id_gets_a_working_session() {
    let store = Arc::new(MemoryAdminStore::new());
    let provider_id = "9".repeat(ProviderUserId::MAX_LENGTH);

    let admin = directory(store.clone(), &[ADMIN])
        .resolve_or_create(&profile_json(ADMIN, &provider_id))
        .await
        .unwrap();
    let sessions = session_manager(store);
    let pair = sessions.issue(&admin).await.unwrap();

    let authenticated = sessions.authenticate(&jar_from(&pair)).await.unwrap();
    assert_eq!(authenticated, admin);
    assert_eq!(authenticated.provider_id.as_str(), provider_id);
}

#[tokio::test]
async fn test_provider_id_too_long_to_hash_is_never_stored() {
    let store = Arc::new(MemoryAdminStore::new());
    let provider_id = "9".repeat(ProviderUserId::MAX_LENGTH + 1);

    let err = directory(store.clone(), &[ADMIN])
        .resolve_or_create(&profile_json(ADMIN, &provider_id))
        .await
        .unwrap_err();

    assert!(matches!(err, DirectoryError::Decode(_)), "{err:?}");
    assert!(store.is_empty().await);
    assert_eq!(store.insert_count(), 0);
}
