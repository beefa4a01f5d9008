use std::borrow::Cow;

use argon2::{Algorithm, Argon2, Params, PasswordVerifier, Version};
use password_hash::{PasswordHash, PasswordHasher as ArgonPasswordHasher, SaltString};
use rand::rngs::OsRng;

use super::token::random_bytes;
use crate::AuthError;

/// Reference digest verified against when the account does not exist.
///
/// Its cost parameters (64 MiB, one pass, 16 lanes) match [`Argon2Hasher::default`], so
/// a decoy verification costs the same as a real one. Nobody knows a password
/// for it; the result of the comparison is discarded.
pub const DECOY_HASH: &str = "$argon2id$v=19$m=65536,t=1,p=16$5+5ObcY5s1LVbxJ/+Xwajg$EtvmraG0bszkPPJW4k3RFYy6UcXZTQahKIl7TLdJ0TE";

/// Password hashing and verification.
///
/// A mismatch is `Ok(false)`, never an error. Errors mean the stored digest is
/// malformed or the algorithm itself failed.
///
/// # Example
///
/// ```rust
/// use mainframe_auth::crypto::{Argon2Hasher, PasswordHasher};
///
/// let hasher = Argon2Hasher::new(8192, 1, 1).unwrap();
/// let hash = hasher.hash("Str0ng!Pw2").unwrap();
/// assert!(hasher.verify("Str0ng!Pw2", &hash).unwrap());
/// assert!(!hasher.verify("wrong", &hash).unwrap());
/// ```
pub trait PasswordHasher: Send + Sync {
    /// Hash a password with a fresh random salt.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordHashError` if hashing fails.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a stored digest.
    ///
    /// The digest carries its own cost parameters, so digests created under
    /// older settings keep verifying after the defaults change.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordHashError` if the digest is malformed.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;

    /// Run a full verification against a fixed decoy digest.
    ///
    /// Used when no account matches so that the response time does not reveal
    /// whether a username exists.
    fn fake_verify(&self, password: &str) -> Result<(), AuthError>;
}

/// Argon2id hasher with fixed cost parameters.
///
/// Defaults: 64 MiB memory, 1 iteration, 16 lanes.
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    /// Memory cost in KiB
    memory_cost: u32,
    /// Number of iterations
    time_cost: u32,
    /// Degree of parallelism
    parallelism: u32,
    decoy_hash: Cow<'static, str>,
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            memory_cost: 65536,
            time_cost: 1,
            parallelism: 16,
            decoy_hash: Cow::Borrowed(DECOY_HASH),
        }
    }
}

impl Argon2Hasher {
    /// Creates a hasher with custom cost parameters.
    ///
    /// A decoy digest with the same parameters is derived here, once, from a
    /// random throwaway password so that [`PasswordHasher::fake_verify`] keeps
    /// the same cost as a real verification.
    ///
    /// # Errors
    ///
    /// `ConfigurationError` for parameters Argon2 rejects.
    pub fn new(memory_cost: u32, time_cost: u32, parallelism: u32) -> Result<Self, AuthError> {
        let params = Params::new(memory_cost, time_cost, parallelism, None).map_err(|e| {
            AuthError::ConfigurationError(format!("invalid argon2 parameters: {e}"))
        })?;

        let throwaway = random_bytes(32)?;
        let decoy_hash = hash_with(params, &throwaway)?;

        Ok(Self {
            memory_cost,
            time_cost,
            parallelism,
            decoy_hash: Cow::Owned(decoy_hash),
        })
    }

    pub fn memory_cost(&self) -> u32 {
        self.memory_cost
    }

    pub fn time_cost(&self) -> u32 {
        self.time_cost
    }

    pub fn parallelism(&self) -> u32 {
        self.parallelism
    }

    fn params(&self) -> Result<Params, AuthError> {
        Params::new(self.memory_cost, self.time_cost, self.parallelism, None)
            .map_err(|_| AuthError::PasswordHashError)
    }
}

fn hash_with(params: Params, password: &[u8]) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password, &salt)
        .map(|h| h.to_string())
        .map_err(|_| AuthError::PasswordHashError)
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        hash_with(self.params()?, password.as_bytes())
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|_| AuthError::PasswordHashError)?;

        // params come from the digest, not from self
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(_) => Err(AuthError::PasswordHashError),
        }
    }

    fn fake_verify(&self, password: &str) -> Result<(), AuthError> {
        self.verify(password, &self.decoy_hash).map(|_| ())
    }
}
