//! Error types for the Platform.

use folio_perms::{AuthorizationError, PermsError, VaultError};
use folio_policy::PolicyError;
use folio_resolve::ResolveError;
use folio_store::StoreError;
use thiserror::Error;

/// Errors that can occur during Platform operations.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Container or contributor management error.
    #[error("permission error: {0}")]
    Perms(#[from] PermsError),

    /// Policy evaluation error.
    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),

    /// Sealing or resolution error.
    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// The operation needs an ownership capability and none was presented.
    #[error("operation requires an ownership capability")]
    CapabilityRequired,
}

impl PlatformError {
    /// The authorization failure, if this error is one.
    pub fn authorization(&self) -> Option<&AuthorizationError> {
        match self {
            PlatformError::Perms(PermsError::Authorization(e)) => Some(e),
            _ => None,
        }
    }

    /// The vault failure, if this error is one.
    pub fn vault(&self) -> Option<&VaultError> {
        match self {
            PlatformError::Perms(PermsError::Vault(e)) => Some(e),
            _ => None,
        }
    }
}

impl From<AuthorizationError> for PlatformError {
    fn from(err: AuthorizationError) -> Self {
        PlatformError::Perms(err.into())
    }
}

impl From<VaultError> for PlatformError {
    fn from(err: VaultError) -> Self {
        PlatformError::Perms(err.into())
    }
}

/// Result type for Platform operations.
pub type Result<T> = std::result::Result<T, PlatformError>;
