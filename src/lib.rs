//! Authentication and session management core.
//!
//! Turns a username/password pair into a revocable, tamper-evident session and
//! turns an inbound session cookie back into a verified identity with roles.
//!
//! | Piece | Where |
//! |-------|-------|
//! | Argon2id hashing, decoy verification | [`crypto::password`] |
//! | Random verifiers, HMAC-SHA256 | [`crypto::token`] |
//! | Login / logout | [`actions::LoginAction`], [`actions::LogoutAction`] |
//! | Per-request session gate | [`actions::SessionGuard`] |
//! | Role check | [`actions::RoleGuard`] |
//! | HTTP surface (axum) | `api::axum` |
//! | Expired session sweeping | [`cleanup::SessionCleanupJob`] |

pub mod actions;
pub mod api;
pub mod cleanup;
pub mod config;
pub mod crypto;
pub mod events;
pub mod repository;
pub mod secret;
pub mod session;

#[cfg(feature = "sqlx_sqlite")]
pub mod sqlite;

pub use config::{AuthConfig, CleanupConfig, LoginConfig};
pub use events::{AuthEvent, EventDispatcher};
pub use repository::{Role, User, UserRepository};
pub use secret::SecretString;
pub use session::{Session, SessionConfig, SessionRepository};

#[cfg(any(test, feature = "mocks"))]
pub use repository::MockUserRepository;

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Wrong password, unknown user or disabled account. Deliberately vague.
    InvalidCredentials,
    /// Missing, malformed, forged or expired session.
    Unauthorized,
    /// Authenticated, but lacking the required role.
    Forbidden,
    Validation(String),
    NotFound,
    DatabaseError(String),
    PasswordHashError,
    CryptoError(String),
    ConfigurationError(String),
    /// A datastore call exceeded its time budget.
    Timeout(&'static str),
    Internal(String),
}

impl AuthError {
    /// Returns true for failures of the system rather than of the caller.
    ///
    /// Internal errors are logged in full and surfaced to clients only as a
    /// generic message.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AuthError::DatabaseError(_)
                | AuthError::PasswordHashError
                | AuthError::CryptoError(_)
                | AuthError::ConfigurationError(_)
                | AuthError::Timeout(_)
                | AuthError::Internal(_)
        )
    }
}

impl std::error::Error for AuthError {}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid username or password"),
            AuthError::Unauthorized => write!(f, "Unauthorized"),
            AuthError::Forbidden => write!(f, "Forbidden"),
            AuthError::Validation(msg) => write!(f, "Validation failed: {msg}"),
            AuthError::NotFound => write!(f, "Resource not found"),
            AuthError::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            AuthError::PasswordHashError => write!(f, "Failed to hash or verify password"),
            AuthError::CryptoError(msg) => write!(f, "Cryptographic failure: {msg}"),
            AuthError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
            AuthError::Timeout(operation) => write!(f, "Datastore call timed out: {operation}"),
            AuthError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_classification() {
        assert!(AuthError::DatabaseError("x".to_owned()).is_internal());
        assert!(AuthError::Timeout("find_session").is_internal());
        assert!(AuthError::PasswordHashError.is_internal());
        assert!(!AuthError::InvalidCredentials.is_internal());
        assert!(!AuthError::Unauthorized.is_internal());
        assert!(!AuthError::Forbidden.is_internal());
        assert!(!AuthError::Validation("bad".to_owned()).is_internal());
    }

    #[test]
    fn test_invalid_credentials_message_is_vague() {
        let msg = AuthError::InvalidCredentials.to_string();
        assert_eq!(msg, "Invalid username or password");
    }
}
