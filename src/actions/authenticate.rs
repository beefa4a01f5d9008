//! Per-request session validation with sliding expiry.

use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::events::{AuthEvent, EventDispatcher, RejectReason};
use crate::repository::bounded;
use crate::session::{CookieTransport, SessionCookie, SessionToken};
use crate::{AuthConfig, AuthError, Session, SessionConfig, SessionRepository, User, UserRepository};

/// Identity attached to a request once its session checks out.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user: User,
    pub session: Session,
}

/// Turns a session cookie into an [`Authenticated`] identity.
///
/// Every rejection is [`AuthError::Unauthorized`]. Datastore failures are
/// passed through unchanged and never clear the cookie. When the session is
/// accepted its expiry is pushed to `now + session_lifetime` and the cookie
/// is re-issued with the same verifier.
pub struct SessionGuard<U, S> {
    user_repository: U,
    session_repository: S,
    config: SessionConfig,
    store_timeout: Duration,
    events: EventDispatcher,
}

impl<U, S> SessionGuard<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    pub fn new(user_repository: U, session_repository: S, config: &AuthConfig) -> Self {
        SessionGuard {
            user_repository,
            session_repository,
            config: config.session.clone(),
            store_timeout: config.login.store_timeout,
            events: EventDispatcher::default(),
        }
    }

    #[must_use]
    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }

    pub async fn authenticate<C: CookieTransport>(
        &self,
        cookies: &mut C,
    ) -> Result<Authenticated, AuthError> {
        self.authenticate_at(cookies, Utc::now()).await
    }

    /// [`authenticate`](Self::authenticate) with an explicit clock reading.
    ///
    /// Expiry is checked against `now` and an accepted session is renewed to
    /// `now + session_lifetime`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "authenticate", skip_all, err)
    )]
    pub async fn authenticate_at<C: CookieTransport>(
        &self,
        cookies: &mut C,
        now: DateTime<Utc>,
    ) -> Result<Authenticated, AuthError> {
        let Some(raw) = cookies.read(&self.config.cookie_name) else {
            log::debug!(target: "mainframe_auth::session", "msg=\"no session cookie\"");
            return Err(AuthError::Unauthorized);
        };

        let Some(token) = SessionToken::parse(&raw) else {
            return Err(self
                .reject(cookies, None, RejectReason::Malformed, false)
                .await);
        };
        let session_id = token.session_id;

        let found = bounded(
            self.store_timeout,
            "find_session",
            self.session_repository.find(session_id),
        )
        .await?;
        let Some(mut session) = found else {
            return Err(self
                .reject(cookies, Some(session_id), RejectReason::UnknownSession, true)
                .await);
        };

        if !token
            .verifier
            .matches(&self.config.secret_key, &session.token)
        {
            return Err(self
                .reject(cookies, Some(session_id), RejectReason::VerifierMismatch, true)
                .await);
        }

        if session.is_expired_at(now) {
            return Err(self
                .reject(cookies, Some(session_id), RejectReason::Expired, true)
                .await);
        }

        let user = bounded(
            self.store_timeout,
            "find_user_by_id",
            self.user_repository.find_user_by_id(session.user_id),
        )
        .await?;
        let Some(user) = user else {
            log::warn!(
                target: "mainframe_auth::session",
                "msg=\"session references missing user\" session_id=\"{session_id}\" user_id=\"{}\"",
                session.user_id
            );
            return Err(self
                .reject(cookies, Some(session_id), RejectReason::UserMissing, true)
                .await);
        };

        session.expires_at = now + self.config.session_lifetime;
        bounded(
            self.store_timeout,
            "update_session",
            self.session_repository.update(&session),
        )
        .await?;

        cookies.write(SessionCookie::issue(
            &self.config,
            token.encode(),
            session.expires_at,
        ));

        log::debug!(
            target: "mainframe_auth::session",
            "msg=\"session renewed\" session_id=\"{session_id}\" user_id=\"{}\"",
            user.id
        );

        Ok(Authenticated { user, session })
    }

    async fn reject<C: CookieTransport>(
        &self,
        cookies: &mut C,
        session_id: Option<Uuid>,
        reason: RejectReason,
        clear_cookie: bool,
    ) -> AuthError {
        if clear_cookie {
            cookies.write(SessionCookie::removal(&self.config));
        }

        match session_id {
            Some(id) => log::warn!(
                target: "mainframe_auth::security",
                "msg=\"session rejected\" reason=\"{reason}\" session_id=\"{id}\""
            ),
            None => log::warn!(
                target: "mainframe_auth::security",
                "msg=\"session rejected\" reason=\"{reason}\""
            ),
        }

        self.events
            .dispatch(AuthEvent::SessionRejected {
                session_id,
                reason,
                at: Utc::now(),
            })
            .await;

        AuthError::Unauthorized
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::crypto::Verifier;
    use crate::session::{InMemorySessionRepository, MemoryCookieJar};
    use crate::{MockUserRepository, SecretString};

    const KEY: &str = "test-server-key-that-is-at-least-32-bytes";

    struct Fixture {
        guard: SessionGuard<MockUserRepository, InMemorySessionRepository>,
        users: MockUserRepository,
        sessions: InMemorySessionRepository,
        user: User,
    }

    fn fixture() -> Fixture {
        let user = User::mock();
        let users = MockUserRepository::with_user(user.clone());
        let sessions = InMemorySessionRepository::new();
        let config = AuthConfig::new(SecretString::new(KEY));
        let guard = SessionGuard::new(users.clone(), sessions.clone(), &config);
        Fixture {
            guard,
            users,
            sessions,
            user,
        }
    }

    async fn issue(
        sessions: &InMemorySessionRepository,
        user_id: Uuid,
        expires_in: Duration,
    ) -> (Session, SessionToken) {
        let verifier = Verifier::generate(32).unwrap();
        let session = Session::new(
            user_id,
            verifier.digest(&SecretString::new(KEY)),
            Utc::now() + expires_in,
        );
        sessions.create(&session).await.unwrap();
        let token = SessionToken::new(session.id, verifier);
        (session, token)
    }

    #[tokio::test]
    async fn test_valid_session_is_renewed() {
        let f = fixture();
        let (session, token) = issue(&f.sessions, f.user.id, Duration::hours(1)).await;
        let mut jar = MemoryCookieJar::with_cookie("session_id", &token.encode());

        let before = Utc::now();
        let auth = f.guard.authenticate(&mut jar).await.unwrap();
        let after = Utc::now();

        assert_eq!(auth.user.id, f.user.id);
        assert_eq!(auth.session.id, session.id);
        assert!(auth.session.expires_at >= before + Duration::hours(2));
        assert!(auth.session.expires_at <= after + Duration::hours(2));

        let stored = f.sessions.find(session.id).await.unwrap().unwrap();
        assert_eq!(stored.expires_at, auth.session.expires_at);
        assert_eq!(stored.token, session.token);

        let cookie = jar.last_written().unwrap();
        assert_eq!(cookie.value, token.encode());
        assert_eq!(cookie.expires, auth.session.expires_at);
    }

    #[tokio::test]
    async fn test_missing_cookie() {
        let f = fixture();
        let mut jar = MemoryCookieJar::new();

        let err = f.guard.authenticate(&mut jar).await.unwrap_err();
        assert_eq!(err, AuthError::Unauthorized);
        assert!(jar.written.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_cookie_is_not_cleared() {
        let f = fixture();
        for value in ["", "garbage", "not-a-uuid:AAAA"] {
            let mut jar = MemoryCookieJar::with_cookie("session_id", value);
            let err = f.guard.authenticate(&mut jar).await.unwrap_err();
            assert_eq!(err, AuthError::Unauthorized);
            assert!(jar.written.is_empty());
        }
    }

    #[tokio::test]
    async fn test_unknown_session_clears_cookie() {
        let f = fixture();
        let token = SessionToken::new(Uuid::new_v4(), Verifier::generate(32).unwrap());
        let mut jar = MemoryCookieJar::with_cookie("session_id", &token.encode());

        let err = f.guard.authenticate(&mut jar).await.unwrap_err();
        assert_eq!(err, AuthError::Unauthorized);
        assert!(jar.last_written().unwrap().is_removal());
    }

    #[tokio::test]
    async fn test_forged_verifier_rejected_without_renewal() {
        let f = fixture();
        let (session, _) = issue(&f.sessions, f.user.id, Duration::hours(1)).await;
        let forged = SessionToken::new(session.id, Verifier::generate(32).unwrap());
        let mut jar = MemoryCookieJar::with_cookie("session_id", &forged.encode());

        let err = f.guard.authenticate(&mut jar).await.unwrap_err();
        assert_eq!(err, AuthError::Unauthorized);
        assert!(jar.last_written().unwrap().is_removal());

        let stored = f.sessions.find(session.id).await.unwrap().unwrap();
        assert_eq!(stored.expires_at, session.expires_at);
    }

    #[tokio::test]
    async fn test_expired_session_rejected() {
        let f = fixture();
        let (session, token) = issue(&f.sessions, f.user.id, -Duration::minutes(1)).await;
        let mut jar = MemoryCookieJar::with_cookie("session_id", &token.encode());

        let err = f.guard.authenticate(&mut jar).await.unwrap_err();
        assert_eq!(err, AuthError::Unauthorized);
        assert!(jar.last_written().unwrap().is_removal());

        let stored = f.sessions.find(session.id).await.unwrap().unwrap();
        assert_eq!(stored.expires_at, session.expires_at);
    }

    #[tokio::test]
    async fn test_deleted_user_rejected() {
        let f = fixture();
        let (session, token) = issue(&f.sessions, f.user.id, Duration::hours(1)).await;
        f.users.remove(f.user.id);
        let mut jar = MemoryCookieJar::with_cookie("session_id", &token.encode());

        let err = f.guard.authenticate(&mut jar).await.unwrap_err();
        assert_eq!(err, AuthError::Unauthorized);
        assert!(jar.last_written().unwrap().is_removal());

        let stored = f.sessions.find(session.id).await.unwrap().unwrap();
        assert_eq!(stored.expires_at, session.expires_at);
    }

    #[tokio::test]
    async fn test_renewal_is_relative_to_request_time() {
        let f = fixture();
        let issued_at = Utc::now();
        let (session, token) = issue(&f.sessions, f.user.id, Duration::hours(2)).await;
        let mut jar = MemoryCookieJar::with_cookie("session_id", &token.encode());

        let one_hour_later = issued_at + Duration::hours(1);
        let auth = f
            .guard
            .authenticate_at(&mut jar, one_hour_later)
            .await
            .unwrap();

        // now + lifetime, not the old expiry + lifetime
        assert_eq!(auth.session.expires_at, one_hour_later + Duration::hours(2));
        assert!(auth.session.expires_at < session.expires_at + Duration::hours(2));

        let stored = f.sessions.find(session.id).await.unwrap().unwrap();
        assert_eq!(stored.expires_at, one_hour_later + Duration::hours(2));
        assert_eq!(jar.last_written().unwrap().expires, stored.expires_at);
    }

    #[tokio::test]
    async fn test_activity_keeps_session_alive_past_original_expiry() {
        let f = fixture();
        let issued_at = Utc::now();
        let (session, token) = issue(&f.sessions, f.user.id, Duration::hours(2)).await;

        let first = issued_at + Duration::hours(1);
        let mut jar = MemoryCookieJar::with_cookie("session_id", &token.encode());
        f.guard.authenticate_at(&mut jar, first).await.unwrap();

        // past the original expiry but inside the renewed window
        let second = session.expires_at + Duration::seconds(1);
        let mut jar = MemoryCookieJar::with_cookie("session_id", &token.encode());
        let auth = f.guard.authenticate_at(&mut jar, second).await.unwrap();

        assert_eq!(auth.session.expires_at, second + Duration::hours(2));
        let stored = f.sessions.find(session.id).await.unwrap().unwrap();
        assert_eq!(stored.expires_at, second + Duration::hours(2));
    }

    #[tokio::test]
    async fn test_idle_session_expires_at_original_deadline() {
        let f = fixture();
        let (session, token) = issue(&f.sessions, f.user.id, Duration::hours(2)).await;
        let mut jar = MemoryCookieJar::with_cookie("session_id", &token.encode());

        let late = session.expires_at + Duration::seconds(1);
        let err = f.guard.authenticate_at(&mut jar, late).await.unwrap_err();

        assert_eq!(err, AuthError::Unauthorized);
        assert!(jar.last_written().unwrap().is_removal());
    }

    #[tokio::test]
    async fn test_rotated_key_invalidates_sessions() {
        let f = fixture();
        let (_, token) = issue(&f.sessions, f.user.id, Duration::hours(1)).await;

        let rotated = AuthConfig::new(SecretString::new(
            "a-completely-different-server-key-of-32-bytes",
        ));
        let guard = SessionGuard::new(f.users.clone(), f.sessions.clone(), &rotated);
        let mut jar = MemoryCookieJar::with_cookie("session_id", &token.encode());

        let err = guard.authenticate(&mut jar).await.unwrap_err();
        assert_eq!(err, AuthError::Unauthorized);
    }
}
