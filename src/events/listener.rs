use async_trait::async_trait;

use super::AuthEvent;

/// Receives authentication events.
///
/// Listeners are awaited in the request path, so slow work (network alerts,
/// metrics pushes) should be handed off to a background task.
///
/// # Example
///
/// ```rust,ignore
/// use mainframe_auth::events::{AuthEvent, Listener};
/// use async_trait::async_trait;
///
/// struct LockoutAlert;
///
/// #[async_trait]
/// impl Listener for LockoutAlert {
///     async fn handle(&self, event: &AuthEvent) {
///         if let AuthEvent::AccountDisabled { username, .. } = event {
///             // page the on-call administrator
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    async fn handle(&self, event: &AuthEvent);
}
