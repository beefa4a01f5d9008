//! In-memory session storage.
//!
//! Suitable for development, testing, and single-instance deployments.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::AuthError;

use super::Session;
use super::repository::SessionRepository;

/// In-memory session storage.
///
/// Stores sessions in a `HashMap` protected by a `RwLock`, keyed by id.
///
/// # Note
///
/// Sessions are lost when the process restarts.
#[derive(Clone, Default)]
pub struct InMemorySessionRepository {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
}

fn poisoned<T>(_: T) -> AuthError {
    AuthError::DatabaseError("Lock poisoned".to_owned())
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of sessions currently stored.
    pub fn len(&self) -> usize {
        self.sessions.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn find(&self, id: Uuid) -> Result<Option<Session>, AuthError> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        Ok(sessions.get(&id).cloned())
    }

    async fn create(&self, session: &Session) -> Result<(), AuthError> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        if sessions.contains_key(&session.id) {
            return Err(AuthError::DatabaseError(format!(
                "session {} already exists",
                session.id
            )));
        }
        sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn update(&self, session: &Session) -> Result<(), AuthError> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        match sessions.get_mut(&session.id) {
            Some(stored) => {
                stored.clone_from(session);
                Ok(())
            }
            None => Err(AuthError::DatabaseError(
                "expected to update 1 session row, but rows affected was 0".to_owned(),
            )),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), AuthError> {
        self.sessions.write().map_err(poisoned)?.remove(&id);
        Ok(())
    }

    #[allow(clippy::significant_drop_tightening)]
    async fn prune_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthError> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;

        let before_count = sessions.len();
        sessions.retain(|_, session| session.expires_at >= now);

        let pruned = before_count.saturating_sub(sessions.len());
        Ok(u64::try_from(pruned).unwrap_or(u64::MAX))
    }
}
