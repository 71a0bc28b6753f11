//! Policy decisions.

use thiserror::Error;

use folio_core::{Address, IdentityFormatError, ObjectId};

/// A subscription was presented after its validity window closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("credential expired at {valid_until}, now {now}")]
pub struct ExpiredCredentialError {
    pub valid_until: i64,
    pub now: i64,
}

/// Why an evaluator denied access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DenyReason {
    /// The identity bytes are malformed or name another container.
    #[error("identity rejected: {0}")]
    Identity(#[from] IdentityFormatError),

    #[error(transparent)]
    Expired(#[from] ExpiredCredentialError),

    /// Container requires a credential.
    #[error("container is gated")]
    Gated,

    #[error("capability is not bound to this container")]
    NotOwner,

    #[error("{0} is not a contributor")]
    NotContributor(Address),

    #[error("{0} is not allow-listed")]
    NotAllowlisted(Address),

    /// The access token is bound to different content.
    #[error("token is bound to other content")]
    TokenMismatch,

    /// The credential refers to a different container than the request.
    #[error("credential is for container {actual}, request is for {expected}")]
    WrongContainer { expected: ObjectId, actual: ObjectId },

    #[error("container {0} not found")]
    ContainerNotFound(ObjectId),

    #[error("credential object {0} not found")]
    CredentialNotFound(ObjectId),

    /// The acting address does not hold the credential object.
    #[error("credential object {0} is not held by the caller")]
    NotCredentialHolder(ObjectId),
}

/// Outcome of a single policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Convert into a `Result`, with the deny reason as the error.
    pub fn into_result(self) -> Result<(), DenyReason> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(reason),
        }
    }
}

impl From<DenyReason> for Decision {
    fn from(reason: DenyReason) -> Self {
        Decision::Deny(reason)
    }
}
