//! Sealed content envelope.
//!
//! Gated content is stored as a [`SealedPayload`]: the ciphertext plus the
//! identity it was sealed under. The identity is authenticated as associated
//! data, so swapping the identity on a ciphertext makes it undecryptable.

use serde::{Deserialize, Serialize};

use folio_core::{decode, ContentIdentity};

use crate::crypto::{EncryptionKey, EncryptionNonce};
use crate::error::{ResolveError, Result};

/// Format identifier for sealed payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum SealFormat {
    /// ChaCha20-Poly1305 with the identity bytes as associated data.
    ChaCha20Poly1305 = 1,
}

/// Ciphertext bound to a content identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedPayload {
    pub format: SealFormat,
    /// Encoded content identity.
    pub identity: Vec<u8>,
    pub nonce: EncryptionNonce,
    /// Ciphertext including the authentication tag.
    pub ciphertext: Vec<u8>,
}

impl SealedPayload {
    /// Seal `plaintext` under `key` for `identity`.
    pub fn seal(identity: &ContentIdentity, plaintext: &[u8], key: &EncryptionKey) -> Result<Self> {
        let identity = identity.to_bytes();
        let nonce = EncryptionNonce::generate();
        let ciphertext = key.encrypt(plaintext, &identity, &nonce)?;

        Ok(Self {
            format: SealFormat::ChaCha20Poly1305,
            identity,
            nonce,
            ciphertext,
        })
    }

    /// Decrypt with `key`.
    pub fn open(&self, key: &EncryptionKey) -> Result<Vec<u8>> {
        match self.format {
            SealFormat::ChaCha20Poly1305 => {
                key.decrypt(&self.ciphertext, &self.identity, &self.nonce)
            }
        }
    }

    /// Decode the identity this payload was sealed under.
    pub fn content_identity(&self) -> Result<ContentIdentity> {
        Ok(decode(&self.identity)?)
    }

    /// Serialize to CBOR bytes, e.g. for upload to blob storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| ResolveError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| ResolveError::Serialization(e.to_string()))
    }
}
