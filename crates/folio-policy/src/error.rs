//! Error types for policy evaluation.

use thiserror::Error;

use folio_store::StoreError;

/// Errors that prevent a policy decision from being made at all.
///
/// A denied credential is not an error; see [`Decision`](crate::Decision).
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for policy operations.
pub type Result<T> = std::result::Result<T, PolicyError>;
