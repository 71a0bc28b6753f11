//! Key shares: content keys wrapped for one requester.
//!
//! The authority never returns a bare content key. It wraps the key to the
//! requester's per-attempt X25519 public key, with the identity bytes as the
//! derivation context, so a share only opens for that request and that item.

use serde::{Deserialize, Serialize};

use folio_core::Blake3Hash;

use crate::crypto::{EncryptionKey, EncryptionNonce, EphemeralKeyPair, X25519PublicKey};
use crate::error::{ResolveError, Result};

/// A content key encrypted for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedKey {
    /// Digest of the identity the key belongs to.
    pub identity_digest: Blake3Hash,

    /// Wrapper's ephemeral X25519 public key.
    pub ephemeral_public: X25519PublicKey,

    /// The content key, encrypted under the derived wrap key.
    pub encrypted_key: Vec<u8>,

    pub nonce: EncryptionNonce,
}

impl WrappedKey {
    /// Wrap `content_key` for `recipient`.
    pub fn wrap(
        content_key: &EncryptionKey,
        identity: &[u8],
        recipient: &X25519PublicKey,
    ) -> Result<Self> {
        let ephemeral = EphemeralKeyPair::generate();
        let ephemeral_public = ephemeral.public_key();

        let wrap_key = ephemeral.diffie_hellman(recipient).derive_wrap_key(identity);

        let nonce = EncryptionNonce::generate();
        let encrypted_key = wrap_key.encrypt(content_key.as_bytes(), identity, &nonce)?;

        Ok(Self {
            identity_digest: Blake3Hash::hash(identity),
            ephemeral_public,
            encrypted_key,
            nonce,
        })
    }

    /// Whether this share claims to be for `identity`.
    pub fn is_for(&self, identity: &[u8]) -> bool {
        self.identity_digest == Blake3Hash::hash(identity)
    }

    /// Recover the content key with the requester's ephemeral secret.
    pub fn unwrap_key(
        &self,
        recipient: EphemeralKeyPair,
        identity: &[u8],
    ) -> Result<EncryptionKey> {
        let wrap_key = recipient
            .diffie_hellman(&self.ephemeral_public)
            .derive_wrap_key(identity);

        let key_bytes = wrap_key.decrypt(&self.encrypted_key, identity, &self.nonce)?;

        let arr: [u8; 32] = key_bytes.as_slice().try_into().map_err(|_| {
            ResolveError::Decryption(format!(
                "invalid key length: expected 32, got {}",
                key_bytes.len()
            ))
        })?;
        Ok(EncryptionKey::from_bytes(arr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_unwrap() {
        let requester = EphemeralKeyPair::generate();
        let content_key = EncryptionKey::generate();

        let share = WrappedKey::wrap(&content_key, b"identity", &requester.public_key()).unwrap();
        assert!(share.is_for(b"identity"));
        assert_eq!(share.unwrap_key(requester, b"identity").unwrap(), content_key);
    }

    #[test]
    fn test_wrong_recipient_fails() {
        let requester = EphemeralKeyPair::generate();
        let eavesdropper = EphemeralKeyPair::generate();
        let share =
            WrappedKey::wrap(&EncryptionKey::generate(), b"identity", &requester.public_key())
                .unwrap();

        assert!(share.unwrap_key(eavesdropper, b"identity").is_err());
    }

    #[test]
    fn test_wrong_identity_fails() {
        let requester = EphemeralKeyPair::generate();
        let share =
            WrappedKey::wrap(&EncryptionKey::generate(), b"identity-a", &requester.public_key())
                .unwrap();

        assert!(!share.is_for(b"identity-b"));
        assert!(share.unwrap_key(requester, b"identity-b").is_err());
    }
}
