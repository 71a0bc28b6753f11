//! Error types for the permissions module.

use thiserror::Error;

use folio_core::{Address, BlobRef, ObjectId};
use folio_store::StoreError;

/// A capability or actor failed the container authorization check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    /// The presented capability is bound to a different container.
    #[error("capability is bound to container {bound}, not {container}")]
    CapabilityMismatch {
        container: ObjectId,
        bound: ObjectId,
    },

    /// The actor presented a capability it does not hold.
    #[error("{actor} does not hold capability {capability}")]
    NotHolder {
        capability: ObjectId,
        actor: Address,
    },

    /// Neither the capability nor contributor membership authorizes the actor.
    #[error("{actor} is neither owner nor contributor of container {container}")]
    NotAuthorized { container: ObjectId, actor: Address },
}

/// Errors raised by vault operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    #[error("blob {0} already stored")]
    AlreadyExists(BlobRef),

    #[error("blob {0} not found")]
    NotFound(BlobRef),

    /// The authorization proof was issued for another container.
    #[error("vault belongs to container {vault}, authorization is for {authorized}")]
    ContainerMismatch {
        vault: ObjectId,
        authorized: ObjectId,
    },

    /// The renewal capability is not the vault's renewal authority.
    #[error("renewal capability {0} is not authorized for this vault")]
    RenewalDenied(ObjectId),
}

/// Errors that can occur during permission operations.
#[derive(Debug, Error)]
pub enum PermsError {
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error("{0} is already a contributor")]
    ContributorExists(Address),

    #[error("{0} is not a contributor")]
    ContributorNotFound(Address),

    #[error("contributor limit of {0} reached")]
    ContributorLimit(usize),

    #[error("{0} is already allow-listed")]
    AllowlistExists(Address),

    #[error("{0} is not allow-listed")]
    AllowlistNotFound(Address),

    #[error("allow-list limit of {0} reached")]
    AllowlistLimit(usize),

    /// Ledger error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
