//! Error types for Folio core.

use thiserror::Error;

use crate::types::ObjectId;

/// Core errors raised by signing and key handling.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Errors raised while decoding or checking a content identity.
///
/// Decoding is strict: any deviation from the fixed layout is an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityFormatError {
    #[error("identity truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("identity has {0} trailing byte(s)")]
    TrailingBytes(usize),

    #[error("unknown identity tag: {0:#04x}")]
    UnknownTag(u8),

    #[error("unsupported identity version: {0}")]
    UnsupportedVersion(u16),

    #[error("identity names container {identity} but container {presented} was presented")]
    ContainerMismatch {
        identity: ObjectId,
        presented: ObjectId,
    },
}
