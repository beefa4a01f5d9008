mod config;
mod cookie;
mod memory_store;
mod repository;
mod token;

use chrono::{DateTime, Utc};
pub use config::{MIN_SECRET_KEY_LENGTH, SameSite, SessionConfig};
#[cfg(any(test, feature = "mocks"))]
pub use cookie::MemoryCookieJar;
pub use cookie::{CookieTransport, SessionCookie, find_cookie};
pub use memory_store::InMemorySessionRepository;
pub use repository::SessionRepository;
use serde::Serialize;
pub use token::SessionToken;
use uuid::Uuid;

/// A stored authorization grant.
///
/// `token` is the MAC of the session verifier under the server key. The raw
/// verifier is never part of this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing)]
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// New session with a fresh random id.
    pub fn new(user_id: Uuid, token: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            token,
            expires_at,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
