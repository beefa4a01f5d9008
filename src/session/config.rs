use std::fmt;

use chrono::Duration;

use crate::SecretString;

/// Minimum accepted length of the server MAC key, in bytes.
pub const MIN_SECRET_KEY_LENGTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    None,
    Lax,
    #[default]
    Strict,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SameSite::None => "None",
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
        })
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub cookie_path: String,
    pub cookie_domain: Option<String>,
    pub cookie_secure: bool,
    pub cookie_http_only: bool,
    pub cookie_same_site: SameSite,
    /// Validity granted at login and again on every authenticated request.
    pub session_lifetime: Duration,
    /// Server-wide key the verifier MACs are computed under.
    pub secret_key: SecretString,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session_id".to_owned(),
            cookie_path: "/".to_owned(),
            cookie_domain: None,
            cookie_secure: true,
            cookie_http_only: true,
            cookie_same_site: SameSite::Strict,
            session_lifetime: Duration::hours(2),
            secret_key: SecretString::new(""),
        }
    }
}

impl SessionConfig {
    pub fn with_secret_key(secret_key: SecretString) -> Self {
        Self {
            secret_key,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.secret_key.is_empty() {
            return Err("secret_key must not be empty");
        }
        if self.secret_key.len() < MIN_SECRET_KEY_LENGTH {
            return Err("secret_key should be at least 32 bytes");
        }
        if self.cookie_name.is_empty() {
            return Err("cookie_name must not be empty");
        }
        if self.session_lifetime <= Duration::zero() {
            return Err("session_lifetime must be positive");
        }
        if self.cookie_same_site == SameSite::None && !self.cookie_secure {
            return Err("SameSite=None requires a secure cookie");
        }
        Ok(())
    }
}
