//! Security-focused test suite.
//!
//! Covers the properties an attacker would target: account enumeration through
//! timing, brute force, forged or tampered session cookies and stale sessions.
//! Run with: `cargo test --features mocks --test security`

#![cfg(feature = "mocks")]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use chrono::{Duration, Utc};
use mainframe_auth::actions::{LoginAction, SessionGuard};
use mainframe_auth::crypto::{Argon2Hasher, PasswordHasher, Verifier};
use mainframe_auth::session::{InMemorySessionRepository, MemoryCookieJar, SessionToken};
use mainframe_auth::{
    AuthConfig, AuthError, MockUserRepository, SecretString, Session, SessionRepository, User,
    UserRepository,
};

const KEY: &str = "security-suite-server-key-0123456789abcdef";
const PASSWORD: &str = "Str0ng!Pw2";

/// Argon2 with the real algorithm but cheap parameters, counting every call.
#[derive(Clone)]
struct CountingHasher {
    inner: Argon2Hasher,
    verifies: Arc<AtomicUsize>,
    fake_verifies: Arc<AtomicUsize>,
}

impl CountingHasher {
    fn new() -> Self {
        Self {
            inner: Argon2Hasher::new(8192, 2, 1).unwrap(),
            verifies: Arc::new(AtomicUsize::new(0)),
            fake_verifies: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl PasswordHasher for CountingHasher {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        self.inner.hash(password)
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        self.verifies.fetch_add(1, Ordering::SeqCst);
        self.inner.verify(password, hash)
    }

    fn fake_verify(&self, password: &str) -> Result<(), AuthError> {
        self.fake_verifies.fetch_add(1, Ordering::SeqCst);
        self.inner.fake_verify(password)
    }
}

struct Fixture {
    users: MockUserRepository,
    sessions: InMemorySessionRepository,
    hasher: CountingHasher,
    config: AuthConfig,
    user: User,
}

impl Fixture {
    fn new() -> Self {
        let hasher = CountingHasher::new();
        let hash = hasher.hash(PASSWORD).unwrap();
        let user = User::mock_from_credentials("alice", &hash);
        Self {
            users: MockUserRepository::with_user(user.clone()),
            sessions: InMemorySessionRepository::new(),
            hasher,
            config: AuthConfig::new(SecretString::new(KEY)),
            user,
        }
    }

    fn login_action(&self) -> LoginAction<MockUserRepository, InMemorySessionRepository, CountingHasher> {
        LoginAction::new(
            self.users.clone(),
            self.sessions.clone(),
            self.hasher.clone(),
            &self.config,
        )
    }

    fn guard(&self) -> SessionGuard<MockUserRepository, InMemorySessionRepository> {
        SessionGuard::new(self.users.clone(), self.sessions.clone(), &self.config)
    }

    async fn login(&self, password: &str) -> Result<SessionToken, AuthError> {
        self.login_action()
            .execute("alice", &SecretString::new(password))
            .await
            .map(|outcome| outcome.token())
    }
}

fn jar(token: &SessionToken) -> MemoryCookieJar {
    MemoryCookieJar::with_cookie("session_id", &token.encode())
}

// =============================================================================
// Account enumeration
// =============================================================================

#[tokio::test]
async fn unknown_user_runs_a_full_decoy_verification() {
    let f = Fixture::new();

    let result = f
        .login_action()
        .execute("mallory", &SecretString::new(PASSWORD))
        .await;

    assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
    assert_eq!(f.hasher.fake_verifies.load(Ordering::SeqCst), 1);
    assert_eq!(f.hasher.verifies.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_user_and_wrong_password_are_indistinguishable() {
    let f = Fixture::new();

    let unknown = f
        .login_action()
        .execute("mallory", &SecretString::new(PASSWORD))
        .await
        .unwrap_err();
    let wrong = f.login("not-the-password").await.unwrap_err();

    assert_eq!(unknown, wrong);
    assert_eq!(unknown.to_string(), wrong.to_string());
}

#[test]
fn decoy_verification_costs_about_the_same_as_a_real_one() {
    let hasher = Argon2Hasher::new(8192, 2, 1).unwrap();
    let hash = hasher.hash(PASSWORD).unwrap();

    // warm up allocator and caches
    hasher.verify("warmup", &hash).unwrap();
    hasher.fake_verify("warmup").unwrap();

    let mut real = Vec::new();
    let mut decoy = Vec::new();
    for _ in 0..5 {
        let start = Instant::now();
        hasher.verify("wrong", &hash).unwrap();
        real.push(start.elapsed());

        let start = Instant::now();
        hasher.fake_verify("wrong").unwrap();
        decoy.push(start.elapsed());
    }
    real.sort();
    decoy.sort();

    let real = real[2].as_secs_f64();
    let decoy = decoy[2].as_secs_f64();
    let ratio = decoy / real;

    // Loose bounds: only catches a decoy that skips the work entirely.
    assert!(ratio > 0.3 && ratio < 3.0, "decoy/real ratio was {ratio}");
}

#[tokio::test]
async fn login_for_unknown_user_takes_about_as_long_as_wrong_password() {
    let f = Fixture::new();
    let action = f.login_action();
    let password = SecretString::new("not-the-password");

    // warm up the blocking pool
    action.execute("mallory", &password).await.unwrap_err();
    action.execute("alice", &password).await.unwrap_err();

    let mut unknown = Vec::new();
    let mut wrong = Vec::new();
    for _ in 0..5 {
        let start = Instant::now();
        action.execute("mallory", &password).await.unwrap_err();
        unknown.push(start.elapsed());

        let start = Instant::now();
        action.execute("alice", &password).await.unwrap_err();
        wrong.push(start.elapsed());
    }
    unknown.sort();
    wrong.sort();

    let ratio = unknown[2].as_secs_f64() / wrong[2].as_secs_f64();

    // Loose bounds: only catches a login that skips the decoy hashing.
    assert!(ratio > 0.3 && ratio < 3.0, "unknown/wrong ratio was {ratio}");
}

// =============================================================================
// Brute force
// =============================================================================

#[tokio::test]
async fn account_locks_after_five_failures() {
    let f = Fixture::new();

    for _ in 0..4 {
        assert_eq!(
            f.login("wrong").await.unwrap_err(),
            AuthError::InvalidCredentials
        );
    }
    let stored = f.users.find_user_by_id(f.user.id).await.unwrap().unwrap();
    assert_eq!(stored.failed_login_attempts, 4);
    assert!(!stored.is_disabled);

    f.login("wrong").await.unwrap_err();
    let stored = f.users.find_user_by_id(f.user.id).await.unwrap().unwrap();
    assert_eq!(stored.failed_login_attempts, 5);
    assert!(stored.is_disabled);

    // The right password no longer helps, and the response is unchanged.
    assert_eq!(
        f.login(PASSWORD).await.unwrap_err(),
        AuthError::InvalidCredentials
    );
    assert!(f.sessions.is_empty());
}

#[tokio::test]
async fn locked_account_still_pays_for_verification() {
    let f = Fixture::new();
    for _ in 0..5 {
        f.login("wrong").await.unwrap_err();
    }
    let before = f.hasher.verifies.load(Ordering::SeqCst);

    f.login(PASSWORD).await.unwrap_err();

    assert_eq!(f.hasher.verifies.load(Ordering::SeqCst), before + 1);
}

#[tokio::test]
async fn success_before_threshold_resets_the_counter() {
    let f = Fixture::new();
    for _ in 0..4 {
        f.login("wrong").await.unwrap_err();
    }

    f.login(PASSWORD).await.unwrap();
    for _ in 0..4 {
        f.login("wrong").await.unwrap_err();
    }

    let stored = f.users.find_user_by_id(f.user.id).await.unwrap().unwrap();
    assert_eq!(stored.failed_login_attempts, 4);
    assert!(!stored.is_disabled);
}

// =============================================================================
// Session token integrity
// =============================================================================

#[tokio::test]
async fn raw_verifier_is_never_stored() {
    let f = Fixture::new();
    let outcome = f
        .login_action()
        .execute("alice", &SecretString::new(PASSWORD))
        .await
        .unwrap();

    let stored = f.sessions.find(outcome.session.id).await.unwrap().unwrap();
    assert_ne!(stored.token, outcome.verifier.encode());
    assert!(!stored.token.contains(&outcome.verifier.encode()));
}

#[tokio::test]
async fn forged_verifier_is_rejected_and_cookie_cleared() {
    let f = Fixture::new();
    let token = f.login(PASSWORD).await.unwrap();

    let forged = SessionToken::new(token.session_id, Verifier::generate(32).unwrap());
    let mut cookies = jar(&forged);

    let err = f.guard().authenticate(&mut cookies).await.unwrap_err();

    assert_eq!(err, AuthError::Unauthorized);
    assert!(cookies.last_written().unwrap().is_removal());
    // The legitimate session survives a forgery attempt.
    assert!(f.sessions.find(token.session_id).await.unwrap().is_some());
}

#[tokio::test]
async fn tampered_verifier_byte_is_rejected() {
    let f = Fixture::new();
    let token = f.login(PASSWORD).await.unwrap();

    let mut bytes = token.verifier.as_bytes().to_vec();
    bytes[0] ^= 0x01;
    let tampered = SessionToken::new(token.session_id, Verifier::from_bytes(bytes));

    let err = f.guard().authenticate(&mut jar(&tampered)).await.unwrap_err();
    assert_eq!(err, AuthError::Unauthorized);
}

#[tokio::test]
async fn rotated_server_key_invalidates_existing_sessions() {
    let f = Fixture::new();
    let token = f.login(PASSWORD).await.unwrap();

    let rotated = AuthConfig::new(SecretString::new(
        "a-completely-different-server-key-0123456789",
    ));
    let guard = SessionGuard::new(f.users.clone(), f.sessions.clone(), &rotated);

    let mut cookies = jar(&token);
    assert_eq!(
        guard.authenticate(&mut cookies).await.unwrap_err(),
        AuthError::Unauthorized
    );
    assert!(cookies.last_written().unwrap().is_removal());
}

#[tokio::test]
async fn malformed_cookie_is_rejected_without_lookup() {
    let f = Fixture::new();

    for value in ["", "no-separator", "not-a-uuid:AAAA", ":", "6a2f41a3-c54c-fce8-32d2-0324e1c32e22:"] {
        let mut cookies = MemoryCookieJar::with_cookie("session_id", value);
        let err = f.guard().authenticate(&mut cookies).await.unwrap_err();
        assert_eq!(err, AuthError::Unauthorized, "cookie value {value:?}");
    }
}

#[tokio::test]
async fn session_for_unknown_id_is_rejected() {
    let f = Fixture::new();
    let stranger = SessionToken::new(uuid::Uuid::new_v4(), Verifier::generate(32).unwrap());

    let mut cookies = jar(&stranger);
    let err = f.guard().authenticate(&mut cookies).await.unwrap_err();

    assert_eq!(err, AuthError::Unauthorized);
    assert!(cookies.last_written().unwrap().is_removal());
}

// =============================================================================
// Expiry
// =============================================================================

#[tokio::test]
async fn expired_session_is_rejected_even_with_valid_mac() {
    let f = Fixture::new();
    let key = SecretString::new(KEY);
    let verifier = Verifier::generate(32).unwrap();
    let session = Session::new(
        f.user.id,
        verifier.digest(&key),
        Utc::now() - Duration::seconds(1),
    );
    f.sessions.create(&session).await.unwrap();

    let token = SessionToken::new(session.id, verifier);
    let mut cookies = jar(&token);
    let err = f.guard().authenticate(&mut cookies).await.unwrap_err();

    assert_eq!(err, AuthError::Unauthorized);
    assert!(cookies.last_written().unwrap().is_removal());
    // No renewal was written for the expired record.
    let stored = f.sessions.find(session.id).await.unwrap().unwrap();
    assert_eq!(stored.expires_at, session.expires_at);
}

#[tokio::test]
async fn each_request_slides_the_expiry_window() {
    let f = Fixture::new();
    let token = f.login(PASSWORD).await.unwrap();
    let issued = f.sessions.find(token.session_id).await.unwrap().unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let mut cookies = jar(&token);
    let before = Utc::now();
    let auth = f.guard().authenticate(&mut cookies).await.unwrap();
    let after = Utc::now();

    assert!(auth.session.expires_at > issued.expires_at);
    assert!(auth.session.expires_at >= before + Duration::hours(2));
    assert!(auth.session.expires_at <= after + Duration::hours(2));
    let renewed = f.sessions.find(token.session_id).await.unwrap().unwrap();
    assert_eq!(renewed.expires_at, auth.session.expires_at);

    // The renewed cookie carries the same token with the new expiry.
    let cookie = cookies.last_written().unwrap();
    assert_eq!(cookie.value, token.encode());
    assert_eq!(cookie.expires, renewed.expires_at);
}

#[tokio::test]
async fn session_seen_after_an_hour_lives_two_more_hours() {
    let f = Fixture::new();
    let key = SecretString::new(KEY);
    let issued_at = Utc::now();
    let verifier = Verifier::generate(32).unwrap();
    let session = Session::new(f.user.id, verifier.digest(&key), issued_at + Duration::hours(2));
    f.sessions.create(&session).await.unwrap();
    let token = SessionToken::new(session.id, verifier);

    let seen_at = issued_at + Duration::hours(1);
    f.guard().authenticate_at(&mut jar(&token), seen_at).await.unwrap();

    // Still valid just past the original two-hour deadline.
    let revisit = issued_at + Duration::hours(2) + Duration::seconds(1);
    let mut cookies = jar(&token);
    let auth = f.guard().authenticate_at(&mut cookies, revisit).await.unwrap();

    assert_eq!(auth.session.expires_at, revisit + Duration::hours(2));
    let stored = f.sessions.find(session.id).await.unwrap().unwrap();
    assert_eq!(stored.expires_at, revisit + Duration::hours(2));
    assert_eq!(cookies.last_written().unwrap().expires, stored.expires_at);
}

#[tokio::test]
async fn logged_out_session_cannot_be_replayed() {
    let f = Fixture::new();
    let token = f.login(PASSWORD).await.unwrap();
    let auth = f.guard().authenticate(&mut jar(&token)).await.unwrap();

    mainframe_auth::actions::LogoutAction::new(f.sessions.clone(), &f.config)
        .execute(&auth.session)
        .await
        .unwrap();

    assert_eq!(
        f.guard().authenticate(&mut jar(&token)).await.unwrap_err(),
        AuthError::Unauthorized
    );
}
