//! Deletes sessions past their expiry to keep the table bounded.

use std::time::Duration;

use chrono::Utc;

use crate::events::{AuthEvent, EventDispatcher};
use crate::repository::bounded;
use crate::{AuthConfig, AuthError, SessionRepository};

pub struct PruneExpiredSessionsAction<S: SessionRepository> {
    sessions: S,
    store_timeout: Duration,
    events: EventDispatcher,
}

impl<S: SessionRepository> PruneExpiredSessionsAction<S> {
    pub fn new(sessions: S, config: &AuthConfig) -> Self {
        Self {
            sessions,
            store_timeout: config.login.store_timeout,
            events: EventDispatcher::default(),
        }
    }

    #[must_use]
    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }

    /// Returns the number of sessions deleted.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self), name = "prune_expired_sessions", err)
    )]
    pub async fn execute(&self) -> Result<u64, AuthError> {
        let now = Utc::now();
        let pruned = bounded(
            self.store_timeout,
            "prune_expired_sessions",
            self.sessions.prune_expired(now),
        )
        .await?;

        log::info!(
            target: "mainframe_auth",
            "msg=\"expired sessions pruned\" rows_affected={pruned}"
        );
        self.events
            .dispatch(AuthEvent::SessionsPruned {
                count: pruned,
                at: now,
            })
            .await;

        Ok(pruned)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use uuid::Uuid;

    use super::*;
    use crate::session::InMemorySessionRepository;
    use crate::{SecretString, Session};

    fn config() -> AuthConfig {
        AuthConfig::new(SecretString::new("test-server-key-that-is-at-least-32-bytes"))
    }

    #[tokio::test]
    async fn test_prune_expired_sessions() {
        let sessions = InMemorySessionRepository::new();
        let expired = Utc::now() - Duration::hours(1);
        let valid = Utc::now() + Duration::hours(1);

        for expires_at in [expired, expired, valid] {
            sessions
                .create(&Session::new(Uuid::new_v4(), "d".to_owned(), expires_at))
                .await
                .unwrap();
        }

        let action = PruneExpiredSessionsAction::new(sessions.clone(), &config());
        assert_eq!(action.execute().await.unwrap(), 2);
        assert_eq!(sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_prune_nothing_expired() {
        let action = PruneExpiredSessionsAction::new(InMemorySessionRepository::new(), &config());
        assert_eq!(action.execute().await.unwrap(), 0);
    }
}
