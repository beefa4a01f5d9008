#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use crate::AuthError;

use super::user::{User, UserRepository};

#[derive(Clone, Default)]
pub struct MockUserRepository {
    pub users: Arc<Mutex<Vec<User>>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(user: User) -> Self {
        let repo = Self::new();
        repo.insert(user);
        repo
    }

    pub fn insert(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }

    /// Snapshot of a stored user, for assertions.
    pub fn get(&self, id: Uuid) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| u.id == id).cloned()
    }

    pub fn remove(&self, id: Uuid) {
        self.users.lock().unwrap().retain(|u| u.id != id);
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        Ok(self.get(id))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .cloned())
    }

    async fn update_basic(&self, user: &User) -> Result<(), AuthError> {
        let mut users = self.users.lock().unwrap();
        let Some(stored) = users.iter_mut().find(|u| u.id == user.id) else {
            return Err(AuthError::DatabaseError(
                "expected to update 1 user row, but rows affected was 0".to_owned(),
            ));
        };

        user.email.clone_into(&mut stored.email);
        user.first_name.clone_into(&mut stored.first_name);
        user.last_name.clone_into(&mut stored.last_name);
        stored.last_login = user.last_login;
        stored.failed_login_attempts = user.failed_login_attempts;
        stored.last_failed_login_attempt = user.last_failed_login_attempt;
        stored.is_disabled = user.is_disabled;
        stored.updated_at = user.updated_at;
        Ok(())
    }
}
