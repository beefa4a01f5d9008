use async_trait::async_trait;

use crate::events::{AuthEvent, Listener};

/// Writes every event to the `log` facade.
///
/// Refusals (failed logins, rejected sessions, denied access) are raised to
/// `Warn` under the `mainframe_auth::security` target regardless of the
/// configured level.
pub struct LoggingListener {
    level: log::Level,
}

impl LoggingListener {
    /// Creates a new logging listener at INFO level.
    pub fn new() -> Self {
        Self {
            level: log::Level::Info,
        }
    }

    pub fn with_level(level: log::Level) -> Self {
        Self { level }
    }

    fn level_for(&self, event: &AuthEvent) -> log::Level {
        if event.is_security_warning() {
            self.level.min(log::Level::Warn)
        } else {
            self.level
        }
    }
}

impl Default for LoggingListener {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Listener for LoggingListener {
    async fn handle(&self, event: &AuthEvent) {
        let level = self.level_for(event);
        if event.is_security_warning() {
            log::log!(
                target: "mainframe_auth::security",
                level,
                "event={} {:?}",
                event.name(),
                event
            );
        } else {
            log::log!(
                target: "mainframe_auth::events",
                level,
                "event={} {:?}",
                event.name(),
                event
            );
        }
    }
}
