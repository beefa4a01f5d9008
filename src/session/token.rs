//! Wire form of the session cookie value: `<session id>:<base64url(verifier)>`.

use std::fmt;

use uuid::Uuid;

use crate::crypto::Verifier;

const SEPARATOR: char = ':';

/// The pair a client presents to prove it owns a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub session_id: Uuid,
    pub verifier: Verifier,
}

impl SessionToken {
    pub fn new(session_id: Uuid, verifier: Verifier) -> Self {
        Self {
            session_id,
            verifier,
        }
    }

    /// Parses a cookie value.
    ///
    /// Returns `None` when the separator is missing, the id is not a UUID, or
    /// the verifier is empty or not base64url.
    pub fn parse(value: &str) -> Option<Self> {
        let (id, verifier) = value.split_once(SEPARATOR)?;
        let session_id = Uuid::parse_str(id).ok()?;
        let verifier = Verifier::decode(verifier)?;
        if verifier.is_empty() {
            return None;
        }
        Some(Self::new(session_id, verifier))
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.session_id, self.verifier.encode())
    }
}
