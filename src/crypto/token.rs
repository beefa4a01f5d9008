//! Session verifier generation and HMAC-SHA256 digests.
//!
//! The server stores only `HMAC(verifier, server_key)`. Reading the sessions
//! table is therefore not enough to forge a cookie; the key is needed too.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;

use crate::{AuthError, SecretString};

type HmacSha256 = Hmac<Sha256>;

/// Length in bytes of a freshly issued session verifier.
pub const VERIFIER_LENGTH: usize = 32;

/// Length in bytes of a generated server key, before encoding.
pub const SERVER_KEY_LENGTH: usize = 32;

/// Fills `n` bytes from the operating system's CSPRNG.
///
/// # Errors
///
/// `CryptoError` if the entropy source fails.
pub fn random_bytes(n: usize) -> Result<Vec<u8>, AuthError> {
    let mut buf = vec![0u8; n];
    OsRng.try_fill_bytes(&mut buf).map_err(|e| {
        log::error!(target: "mainframe_auth", "msg=\"entropy source failure\" error=\"{e}\"");
        AuthError::CryptoError(e.to_string())
    })?;
    Ok(buf)
}

/// HMAC-SHA256 of `message` under `key`, as unpadded URL-safe base64.
pub fn compute_mac(message: &[u8], key: &[u8]) -> String {
    let mut mac = new_mac(key);
    mac.update(message);
    URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}

/// Checks `expected` against the HMAC of `message` under `key`.
///
/// The comparison is constant time. An `expected` value that is not valid
/// base64 simply fails.
pub fn verify_mac(message: &[u8], key: &[u8], expected: &str) -> bool {
    let Ok(expected) = URL_SAFE_NO_PAD.decode(expected) else {
        return false;
    };

    let mut mac = new_mac(key);
    mac.update(message);
    mac.verify_slice(&expected).is_ok()
}

fn new_mac(key: &[u8]) -> HmacSha256 {
    // SAFETY: HMAC accepts keys of any length, new_from_slice cannot fail here.
    #[allow(clippy::expect_used)]
    HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any size")
}

/// Generates a new server key suitable for `SERVER_KEY`.
///
/// # Errors
///
/// `CryptoError` if the entropy source fails.
pub fn generate_server_key() -> Result<SecretString, AuthError> {
    let bytes = random_bytes(SERVER_KEY_LENGTH)?;
    Ok(SecretString::new(URL_SAFE_NO_PAD.encode(bytes)))
}

/// The random per-session secret handed to the client.
///
/// Only its MAC is persisted. The raw bytes exist on the server just long
/// enough to write the cookie.
#[derive(Clone, PartialEq, Eq)]
pub struct Verifier(Vec<u8>);

impl Verifier {
    /// Draws a new verifier of `length` random bytes.
    pub fn generate(length: usize) -> Result<Self, AuthError> {
        random_bytes(length).map(Self)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Decodes the base64url form carried in cookies.
    pub fn decode(encoded: &str) -> Option<Self> {
        URL_SAFE_NO_PAD.decode(encoded).ok().map(Self)
    }

    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The digest stored in the session row.
    pub fn digest(&self, key: &SecretString) -> String {
        compute_mac(&self.0, key.as_bytes())
    }

    /// Whether `stored_digest` was produced from this verifier under `key`.
    pub fn matches(&self, key: &SecretString, stored_digest: &str) -> bool {
        verify_mac(&self.0, key.as_bytes(), stored_digest)
    }
}

impl fmt::Debug for Verifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Verifier([REDACTED])")
    }
}
