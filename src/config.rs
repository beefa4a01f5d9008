//! Configuration types for the authentication core.
//!
//! # Example
//!
//! ```rust
//! use mainframe_auth::config::{AuthConfig, LoginConfig};
//! use mainframe_auth::SecretString;
//!
//! let config = AuthConfig {
//!     login: LoginConfig {
//!         max_failed_attempts: 3,
//!         ..Default::default()
//!     },
//!     ..AuthConfig::new(SecretString::new("0123456789abcdef0123456789abcdef"))
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

use crate::crypto::VERIFIER_LENGTH;
use crate::session::{SameSite, SessionConfig};
use crate::{AuthError, SecretString};

/// Everything the actions, the guard and the cleanup job need.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub session: SessionConfig,
    pub login: LoginConfig,
    pub cleanup: CleanupConfig,
}

impl AuthConfig {
    /// Production defaults with the given server MAC key.
    pub fn new(secret_key: SecretString) -> Self {
        Self {
            session: SessionConfig::with_secret_key(secret_key),
            ..Self::default()
        }
    }

    /// Settings for plain-HTTP localhost development.
    ///
    /// Browsers drop `Secure` cookies over plain HTTP, so the cookie is sent
    /// without it and with `SameSite=Lax`.
    pub fn development(secret_key: SecretString) -> Self {
        Self {
            session: SessionConfig {
                cookie_secure: false,
                cookie_same_site: SameSite::Lax,
                ..SessionConfig::with_secret_key(secret_key)
            },
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// `ConfigurationError` naming the first invalid setting.
    pub fn validate(&self) -> Result<(), AuthError> {
        self.session
            .validate()
            .and_then(|()| self.login.validate())
            .and_then(|()| self.cleanup.validate())
            .map_err(|reason| AuthError::ConfigurationError(reason.to_owned()))
    }
}

/// Login policy.
#[derive(Debug, Clone)]
pub struct LoginConfig {
    /// Consecutive failures after which the account is disabled.
    ///
    /// Default: 5
    pub max_failed_attempts: u32,

    /// Upper bound on every datastore call made by the core.
    ///
    /// Default: 5 seconds
    pub store_timeout: Duration,

    /// Random bytes in each session verifier.
    ///
    /// Default: 32
    pub verifier_length: usize,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            store_timeout: Duration::from_secs(5),
            verifier_length: VERIFIER_LENGTH,
        }
    }
}

impl LoginConfig {
    fn validate(&self) -> Result<(), &'static str> {
        if self.max_failed_attempts == 0 {
            return Err("max_failed_attempts must be at least 1");
        }
        if self.store_timeout.is_zero() {
            return Err("store_timeout must be positive");
        }
        if self.verifier_length < 16 {
            return Err("verifier_length should be at least 16 bytes");
        }
        Ok(())
    }
}

/// Background sweep of expired sessions.
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// Default: 5 minutes
    pub interval: Duration,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5 * 60),
        }
    }
}

impl CleanupConfig {
    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        if self.interval.is_zero() {
            return Err("cleanup interval must be positive");
        }
        Ok(())
    }
}
