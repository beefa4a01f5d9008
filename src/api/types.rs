use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AuthError, Role, SecretString, User};

// Request DTOs

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: SecretString,
}

impl LoginRequest {
    /// Both fields must be present and not blank.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.username.trim().is_empty() {
            return Err(AuthError::Validation("username is required".to_owned()));
        }
        if self.password.is_blank() {
            return Err(AuthError::Validation("password is required".to_owned()));
        }
        Ok(())
    }
}

// Response DTOs

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub last_login: Option<DateTime<Utc>>,
    pub roles: Vec<Role>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            last_login: user.last_login,
            roles: user.roles,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RolesResponse {
    pub roles: Vec<Role>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl From<&AuthError> for ErrorResponse {
    /// Internal failures collapse to a generic message; their detail is for
    /// the server log only.
    fn from(err: &AuthError) -> Self {
        let code = match err {
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::Unauthorized => "UNAUTHORIZED",
            AuthError::Forbidden => "FORBIDDEN",
            AuthError::Validation(_) => "VALIDATION_ERROR",
            AuthError::NotFound => "NOT_FOUND",
            AuthError::DatabaseError(_)
            | AuthError::PasswordHashError
            | AuthError::CryptoError(_)
            | AuthError::ConfigurationError(_)
            | AuthError::Timeout(_)
            | AuthError::Internal(_) => "INTERNAL_ERROR",
        };

        let error = if err.is_internal() {
            "Internal server error".to_owned()
        } else {
            err.to_string()
        };

        ErrorResponse {
            error,
            code: code.to_owned(),
        }
    }
}
