//! Periodic removal of expired sessions.
//!
//! ```rust,ignore
//! let shutdown = CancellationToken::new();
//! let job = SessionCleanupJob::new(sessions.clone(), &config)?.spawn(shutdown.clone());
//! // ...
//! shutdown.cancel();
//! job.await?;
//! ```

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::actions::PruneExpiredSessionsAction;
use crate::events::EventDispatcher;
use crate::{AuthConfig, AuthError, SessionRepository};

/// Runs [`PruneExpiredSessionsAction`] on a fixed interval until cancelled.
///
/// The first sweep happens immediately. A sweep is awaited before the next
/// tick is taken, so sweeps never overlap; a slow sweep delays the schedule
/// instead of queueing a burst.
pub struct SessionCleanupJob<S: SessionRepository> {
    action: PruneExpiredSessionsAction<S>,
    interval: Duration,
}

impl<S: SessionRepository + 'static> SessionCleanupJob<S> {
    /// # Errors
    ///
    /// `ConfigurationError` when the interval is zero.
    pub fn new(sessions: S, config: &AuthConfig) -> Result<Self, AuthError> {
        config
            .cleanup
            .validate()
            .map_err(|reason| AuthError::ConfigurationError(reason.to_owned()))?;

        Ok(Self {
            action: PruneExpiredSessionsAction::new(sessions, config),
            interval: config.cleanup.interval,
        })
    }

    #[must_use]
    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.action = self.action.with_events(events);
        self
    }

    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        log::info!(
            target: "mainframe_auth",
            "msg=\"session cleanup started\" interval_secs={}",
            self.interval.as_secs()
        );

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.action.execute().await {
                        log::error!(
                            target: "mainframe_auth",
                            "msg=\"session cleanup failed\" error=\"{e}\""
                        );
                    }
                }
            }
        }

        log::info!(target: "mainframe_auth", "msg=\"session cleanup stopped\"");
    }
}
