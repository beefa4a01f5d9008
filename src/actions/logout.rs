use std::time::Duration;

use chrono::Utc;

use crate::events::{AuthEvent, EventDispatcher};
use crate::repository::bounded;
use crate::{AuthConfig, AuthError, Session, SessionRepository};

pub struct LogoutAction<S: SessionRepository> {
    session_repository: S,
    store_timeout: Duration,
    events: EventDispatcher,
}

impl<S: SessionRepository> LogoutAction<S> {
    /// Revokes the given session. Deleting a session that is already gone is
    /// not an error.
    pub fn new(session_repository: S, config: &AuthConfig) -> Self {
        LogoutAction {
            session_repository,
            store_timeout: config.login.store_timeout,
            events: EventDispatcher::default(),
        }
    }

    #[must_use]
    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "logout", skip_all, err)
    )]
    pub async fn execute(&self, session: &Session) -> Result<(), AuthError> {
        bounded(
            self.store_timeout,
            "delete_session",
            self.session_repository.delete(session.id),
        )
        .await?;

        log::info!(
            target: "mainframe_auth",
            "msg=\"logout success\" user_id=\"{}\" session_id=\"{}\"",
            session.user_id,
            session.id
        );
        self.events
            .dispatch(AuthEvent::LoggedOut {
                user_id: session.user_id,
                session_id: session.id,
                at: Utc::now(),
            })
            .await;

        Ok(())
    }
}
