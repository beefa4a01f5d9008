use chrono::Utc;

use crate::config::AuthConfig;
use crate::crypto::{PasswordHasher, Verifier};
use crate::events::{AuthEvent, EventDispatcher};
use crate::repository::bounded;
use crate::session::{SessionCookie, SessionToken};
use crate::{
    AuthError, LoginConfig, SecretString, Session, SessionConfig, SessionRepository, User,
    UserRepository,
};

/// A successful login.
///
/// `verifier` is the only copy of the raw session secret. Turn it into the
/// outgoing cookie and drop it.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub session: Session,
    pub verifier: Verifier,
}

impl LoginOutcome {
    pub fn token(&self) -> SessionToken {
        SessionToken::new(self.session.id, self.verifier.clone())
    }

    pub fn cookie(&self, config: &SessionConfig) -> SessionCookie {
        SessionCookie::issue(config, self.token().encode(), self.session.expires_at)
    }
}

/// Exchanges a username and password for a new session.
///
/// Unknown users, wrong passwords and disabled accounts all fail with
/// [`AuthError::InvalidCredentials`] after the same amount of hashing work.
pub struct LoginAction<U, S, H> {
    user_repository: U,
    session_repository: S,
    hasher: H,
    session_config: SessionConfig,
    login_config: LoginConfig,
    events: EventDispatcher,
}

impl<U, S, H> LoginAction<U, S, H>
where
    U: UserRepository,
    S: SessionRepository,
    H: PasswordHasher + Clone + 'static,
{
    pub fn new(user_repository: U, session_repository: S, hasher: H, config: &AuthConfig) -> Self {
        LoginAction {
            user_repository,
            session_repository,
            hasher,
            session_config: config.session.clone(),
            login_config: config.login.clone(),
            events: EventDispatcher::default(),
        }
    }

    #[must_use]
    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }

    /// # Returns
    ///
    /// - `Ok(outcome)` - user with refreshed bookkeeping, the stored session and its raw verifier
    /// - `Err(AuthError::InvalidCredentials)` - unknown user, wrong password or disabled account
    /// - `Err(_)` - datastore, hashing or RNG failure
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "login", skip_all, err)
    )]
    pub async fn execute(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<LoginOutcome, AuthError> {
        let limit = self.login_config.store_timeout;

        let found = bounded(
            limit,
            "find_user_by_username",
            self.user_repository.find_user_by_username(username),
        )
        .await?;

        let Some(mut user) = found else {
            self.fake_verify(password).await?;
            log::warn!(
                target: "mainframe_auth::security",
                "msg=\"login failed\" reason=\"unknown_user\""
            );
            self.events
                .dispatch(AuthEvent::UnknownUser {
                    username: username.to_owned(),
                    at: Utc::now(),
                })
                .await;
            return Err(AuthError::InvalidCredentials);
        };

        let matched = self.verify(password, &user.password_hash).await?;
        let now = Utc::now();

        if user.is_disabled {
            log::warn!(
                target: "mainframe_auth::security",
                "msg=\"login failed\" reason=\"account_disabled\" user_id=\"{}\"",
                user.id
            );
            self.events
                .dispatch(AuthEvent::LoginBlocked {
                    user_id: user.id,
                    username: user.username,
                    at: now,
                })
                .await;
            return Err(AuthError::InvalidCredentials);
        }

        if !matched {
            return Err(self.record_failure(user, now).await);
        }

        user.record_successful_login(now);
        bounded(limit, "update_user", self.user_repository.update_basic(&user)).await?;

        let verifier = Verifier::generate(self.login_config.verifier_length)?;
        let session = Session::new(
            user.id,
            verifier.digest(&self.session_config.secret_key),
            now + self.session_config.session_lifetime,
        );
        bounded(limit, "create_session", self.session_repository.create(&session)).await?;

        log::info!(
            target: "mainframe_auth",
            "msg=\"login success\" user_id=\"{}\" session_id=\"{}\"",
            user.id,
            session.id
        );
        self.events
            .dispatch(AuthEvent::LoginSucceeded {
                user_id: user.id,
                username: user.username.clone(),
                at: now,
            })
            .await;

        Ok(LoginOutcome {
            user,
            session,
            verifier,
        })
    }

    /// Counts the failure, persists it, and returns the error for the caller.
    async fn record_failure(&self, mut user: User, now: chrono::DateTime<Utc>) -> AuthError {
        let disabled = user.record_failed_login(now, self.login_config.max_failed_attempts);

        if let Err(e) = bounded(
            self.login_config.store_timeout,
            "update_user",
            self.user_repository.update_basic(&user),
        )
        .await
        {
            return e;
        }

        log::warn!(
            target: "mainframe_auth::security",
            "msg=\"login failed\" reason=\"invalid_password\" user_id=\"{}\" failed_attempts={}",
            user.id,
            user.failed_login_attempts
        );
        self.events
            .dispatch(AuthEvent::LoginFailed {
                user_id: user.id,
                username: user.username.clone(),
                failed_attempts: user.failed_login_attempts,
                at: now,
            })
            .await;

        if disabled {
            log::warn!(
                target: "mainframe_auth::security",
                "msg=\"account disabled\" user_id=\"{}\" failed_attempts={}",
                user.id,
                user.failed_login_attempts
            );
            self.events
                .dispatch(AuthEvent::AccountDisabled {
                    user_id: user.id,
                    username: user.username,
                    failed_attempts: user.failed_login_attempts,
                    at: now,
                })
                .await;
        }

        AuthError::InvalidCredentials
    }

    async fn verify(&self, password: &SecretString, digest: &str) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        let password = password.clone();
        let digest = digest.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify(password.expose_secret(), &digest))
            .await
            .map_err(join_error)?
    }

    async fn fake_verify(&self, password: &SecretString) -> Result<(), AuthError> {
        let hasher = self.hasher.clone();
        let password = password.clone();
        tokio::task::spawn_blocking(move || hasher.fake_verify(password.expose_secret()))
            .await
            .map_err(join_error)?
    }
}

fn join_error(e: tokio::task::JoinError) -> AuthError {
    log::error!(
        target: "mainframe_auth",
        "msg=\"password hashing task failed\" error=\"{e}\""
    );
    AuthError::Internal("password hashing task failed".to_owned())
}
