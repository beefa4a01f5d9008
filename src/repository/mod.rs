//! User and role storage abstractions.
//!
//! | Item | Description |
//! |------|-------------|
//! | [`UserRepository`] | Lookup by id / username, bookkeeping updates |
//! | [`User`] | Account record including lockout state |
//! | [`Role`] | Closed set of permission groups |
//!
//! Enable the `mocks` feature for [`MockUserRepository`], an in-memory
//! implementation for tests.

mod role;
mod user;

#[cfg(any(test, feature = "mocks"))]
mod user_mock;

pub use role::Role;
pub use user::User;
pub use user::UserRepository;

#[cfg(any(test, feature = "mocks"))]
pub use user_mock::MockUserRepository;

use std::future::Future;
use std::time::Duration;

use crate::AuthError;

/// Awaits a datastore call for at most `limit`.
///
/// Dropping the inner future on expiry cancels the call rather than leaving it
/// running detached.
pub(crate) async fn bounded<T, F>(
    limit: Duration,
    operation: &'static str,
    call: F,
) -> Result<T, AuthError>
where
    F: Future<Output = Result<T, AuthError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            log::error!(
                target: "mainframe_auth",
                "msg=\"datastore call timed out\" operation=\"{operation}\" limit_ms={}",
                limit.as_millis()
            );
            Err(AuthError::Timeout(operation))
        }
    }
}
