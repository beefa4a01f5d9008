//! Cryptographic building blocks.
//!
//! - [`password`]: Argon2id hashing, verification and the decoy verification
//!   used to equalise timing for unknown accounts.
//! - [`token`]: random session verifiers and the HMAC-SHA256 digest stored in
//!   their place.

pub mod password;
pub mod token;

pub use password::{Argon2Hasher, DECOY_HASH, PasswordHasher};
pub use token::{
    SERVER_KEY_LENGTH, VERIFIER_LENGTH, Verifier, compute_mac, generate_server_key, random_bytes,
    verify_mac,
};
