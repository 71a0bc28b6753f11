//! Error types for credential resolution.

use std::time::Duration;

use thiserror::Error;

use folio_core::IdentityFormatError;
use folio_policy::{CredentialKind, DenyReason};

/// Why a single resolution attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    /// The policy evaluator denied the credential.
    #[error("denied: {0}")]
    Denied(DenyReason),

    /// The authority did not answer within the attempt budget.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The authority rejected or failed to process the request.
    #[error("authority error: {0}")]
    Authority(String),

    /// The returned key share was for a different identity.
    #[error("key share is for a different identity")]
    KeyShareMismatch,

    /// The key share or the payload failed to decrypt.
    #[error("decryption failed: {0}")]
    Decryption(String),
}

/// One failed attempt, in the order it was made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {reason}")]
pub struct AttemptFailure {
    pub kind: CredentialKind,
    pub reason: FailureReason,
}

impl AttemptFailure {
    /// Whether the credential was denied for being past its validity window.
    pub fn is_expired(&self) -> bool {
        matches!(self.reason, FailureReason::Denied(DenyReason::Expired(_)))
    }
}

/// Every presented credential failed, or none was presented.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no credential unlocked the content ({} attempt(s) failed)", .reasons.len())]
pub struct CredentialExhaustedError {
    /// Per-attempt failures in priority order.
    pub reasons: Vec<AttemptFailure>,
}

/// Errors that can occur during resolution and sealing.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Exhausted(#[from] CredentialExhaustedError),

    /// The caller cancelled before any credential succeeded.
    #[error("resolution cancelled after {} failed attempt(s)", .reasons.len())]
    Cancelled { reasons: Vec<AttemptFailure> },

    /// A credential-free read was refused, e.g. because the container is gated.
    #[error("free read refused: {0}")]
    NotOpen(FailureReason),

    /// The sealed payload carries a malformed identity.
    #[error("identity rejected: {0}")]
    Identity(#[from] IdentityFormatError),

    #[error("encryption error: {0}")]
    Encryption(String),

    #[error("decryption error: {0}")]
    Decryption(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for resolution operations.
pub type Result<T> = std::result::Result<T, ResolveError>;
