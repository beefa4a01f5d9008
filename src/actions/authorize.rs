//! Role check that runs after [`SessionGuard`](super::SessionGuard).

use chrono::Utc;

use super::Authenticated;
use crate::events::{AuthEvent, EventDispatcher};
use crate::{AuthError, Role};

/// Requires the authenticated user to hold one role. Performs no I/O beyond
/// event delivery.
#[derive(Debug, Clone)]
pub struct RoleGuard {
    required: Role,
    events: EventDispatcher,
}

impl RoleGuard {
    pub fn new(required: Role) -> Self {
        Self {
            required,
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
    /// - `Ok(identity)` - the user holds the role
    /// - `Err(AuthError::Forbidden)` - the user lacks it
    /// - `Err(AuthError::Internal)` - no identity; the session guard did not run first
    pub async fn check<'a>(
        &self,
        identity: Option<&'a Authenticated>,
        path: &str,
    ) -> Result<&'a Authenticated, AuthError> {
        let Some(identity) = identity else {
            log::error!(
                target: "mainframe_auth",
                "msg=\"role check without authenticated identity\" required_role=\"{}\" path=\"{path}\"",
                self.required
            );
            return Err(AuthError::Internal(
                "role check ran without an authenticated identity".to_owned(),
            ));
        };

        if identity.user.has_role(self.required) {
            return Ok(identity);
        }

        log::warn!(
            target: "mainframe_auth::security",
            "msg=\"access denied\" user_id=\"{}\" required_role=\"{}\" path=\"{path}\"",
            identity.user.id,
            self.required
        );
        self.events
            .dispatch(AuthEvent::AccessDenied {
                user_id: identity.user.id,
                required: self.required,
                path: path.to_owned(),
                at: Utc::now(),
            })
            .await;

        Err(AuthError::Forbidden)
    }
}
