use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::Role;

/// Why the session guard turned a request away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Malformed,
    UnknownSession,
    VerifierMismatch,
    Expired,
    UserMissing,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Malformed => "malformed_token",
            Self::UnknownSession => "unknown_session",
            Self::VerifierMismatch => "verifier_mismatch",
            Self::Expired => "expired",
            Self::UserMissing => "user_missing",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Security-relevant events emitted by the actions and guards.
///
/// Events never carry passwords, verifiers or digests.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    LoginSucceeded {
        user_id: Uuid,
        username: String,
        at: DateTime<Utc>,
    },
    /// Wrong password for an existing, enabled account.
    LoginFailed {
        user_id: Uuid,
        username: String,
        failed_attempts: u32,
        at: DateTime<Utc>,
    },
    /// The failure that crossed the lockout threshold.
    AccountDisabled {
        user_id: Uuid,
        username: String,
        failed_attempts: u32,
        at: DateTime<Utc>,
    },
    /// Attempt against an account that is already disabled.
    LoginBlocked {
        user_id: Uuid,
        username: String,
        at: DateTime<Utc>,
    },
    UnknownUser {
        username: String,
        at: DateTime<Utc>,
    },
    LoggedOut {
        user_id: Uuid,
        session_id: Uuid,
        at: DateTime<Utc>,
    },
    SessionRejected {
        session_id: Option<Uuid>,
        reason: RejectReason,
        at: DateTime<Utc>,
    },
    AccessDenied {
        user_id: Uuid,
        required: Role,
        path: String,
        at: DateTime<Utc>,
    },
    SessionsPruned {
        count: u64,
        at: DateTime<Utc>,
    },
}

impl AuthEvent {
    /// Returns a dot-separated event name for logging/tracing.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoginSucceeded { .. } => "auth.login.success",
            Self::LoginFailed { .. } => "auth.login.failed",
            Self::AccountDisabled { .. } => "auth.account.disabled",
            Self::LoginBlocked { .. } => "auth.login.blocked",
            Self::UnknownUser { .. } => "auth.login.unknown_user",
            Self::LoggedOut { .. } => "auth.logout.success",
            Self::SessionRejected { .. } => "auth.session.rejected",
            Self::AccessDenied { .. } => "auth.access.denied",
            Self::SessionsPruned { .. } => "auth.session.pruned",
        }
    }

    /// Returns the timestamp when this event occurred.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::LoginSucceeded { at, .. }
            | Self::LoginFailed { at, .. }
            | Self::AccountDisabled { at, .. }
            | Self::LoginBlocked { at, .. }
            | Self::UnknownUser { at, .. }
            | Self::LoggedOut { at, .. }
            | Self::SessionRejected { at, .. }
            | Self::AccessDenied { at, .. }
            | Self::SessionsPruned { at, .. } => *at,
        }
    }

    /// Whether the event indicates a failed or refused attempt.
    pub fn is_security_warning(&self) -> bool {
        matches!(
            self,
            Self::LoginFailed { .. }
                | Self::AccountDisabled { .. }
                | Self::LoginBlocked { .. }
                | Self::UnknownUser { .. }
                | Self::SessionRejected { .. }
                | Self::AccessDenied { .. }
        )
    }
}
