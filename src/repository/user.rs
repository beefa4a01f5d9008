use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::Role;
use crate::AuthError;

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub last_login: Option<DateTime<Utc>>,
    pub failed_login_attempts: u32,
    pub last_failed_login_attempt: Option<DateTime<Utc>>,
    pub is_disabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub roles: Vec<Role>,
}

impl User {
    pub fn new(
        username: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
        password_hash: &str,
        roles: Vec<Role>,
    ) -> Self {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: username.to_owned(),
            email: email.to_owned(),
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            password_hash: password_hash.to_owned(),
            last_login: None,
            failed_login_attempts: 0,
            last_failed_login_attempt: None,
            is_disabled: false,
            created_at: now,
            updated_at: now,
            roles,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Counts a failed attempt and disables the account once `max_attempts`
    /// is reached. Returns whether the account is now disabled.
    pub fn record_failed_login(&mut self, at: DateTime<Utc>, max_attempts: u32) -> bool {
        self.failed_login_attempts = self.failed_login_attempts.saturating_add(1);
        self.last_failed_login_attempt = Some(at);
        self.updated_at = at;
        if self.failed_login_attempts >= max_attempts {
            self.is_disabled = true;
        }
        self.is_disabled
    }

    /// Resets the failure counter and stamps the login time.
    ///
    /// `is_disabled` is left alone; re-enabling is an administrative action.
    pub fn record_successful_login(&mut self, at: DateTime<Utc>) {
        self.failed_login_attempts = 0;
        self.last_failed_login_attempt = None;
        self.last_login = Some(at);
        self.updated_at = at;
    }
}

#[cfg(any(test, feature = "mocks"))]
impl User {
    pub fn mock() -> Self {
        User::new(
            "testuser",
            "test@example.com",
            "Test",
            "User",
            "fakehashedpassword",
            vec![Role::BasicUser],
        )
    }

    pub fn mock_from_credentials(username: &str, password_hash: &str) -> Self {
        User::new(
            username,
            &format!("{}@example.com", username.to_lowercase()),
            "Test",
            "User",
            password_hash,
            vec![Role::BasicUser],
        )
    }
}

/// Persistence contract for user accounts.
///
/// Lookups return `Ok(None)` for a missing user so that "not found" stays
/// distinguishable from a storage failure.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError>;

    /// Case-insensitive match on username.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AuthError>;

    /// Persists email, names and login bookkeeping. Never touches the id or
    /// the password hash. Must affect exactly one row.
    async fn update_basic(&self, user: &User) -> Result<(), AuthError>;
}
