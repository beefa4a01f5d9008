//! Session repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::Session;
use crate::AuthError;

/// Repository for session storage.
///
/// Implementations:
/// - [`InMemorySessionRepository`](super::InMemorySessionRepository): in-process map
/// - `SqliteSessionRepository` (feature `sqlx_sqlite`): the `sessions` table
///
/// Every statement is atomic on its own; callers never need a transaction
/// around a session write.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Finds a session by id. A missing session is `Ok(None)`.
    async fn find(&self, id: Uuid) -> Result<Option<Session>, AuthError>;

    /// Persists a new session.
    async fn create(&self, session: &Session) -> Result<(), AuthError>;

    /// Rewrites the owner, digest and expiry of an existing session.
    ///
    /// Affecting anything other than exactly one row is an error.
    async fn update(&self, session: &Session) -> Result<(), AuthError>;

    /// Deletes a session. Deleting an absent session succeeds.
    async fn delete(&self, id: Uuid) -> Result<(), AuthError>;

    /// Deletes sessions that expired before `now`, returning how many.
    async fn prune_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthError>;
}
