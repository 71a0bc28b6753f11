//! Error types for the store module.

use thiserror::Error;

use folio_core::ObjectId;

use crate::object::ObjectKind;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Object serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Object not found.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// An object with this id already exists.
    #[error("object already exists: {0}")]
    AlreadyExists(ObjectId),

    /// Object exists but holds a different kind.
    #[error("object {id} is a {actual:?}, expected {expected:?}")]
    KindMismatch {
        id: ObjectId,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    /// Another mutation committed against this object first.
    #[error("version conflict on {id}: expected version {expected}, current {current}")]
    VersionConflict {
        id: ObjectId,
        expected: u64,
        current: u64,
    },

    /// The object is not owned by the given address.
    #[error("object {0} is not owned by the caller")]
    NotOwner(ObjectId),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock guarding ledger state was poisoned.
    #[error("ledger lock poisoned")]
    Poisoned,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
