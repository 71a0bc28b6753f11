//! Content identity: the binary name gated content is encrypted under.
//!
//! ## Layout
//!
//! ```text
//! offset  width  field
//! 0       1      tag        (ContentTag::Article = 0x00)
//! 1       2      version    (u16 little-endian, currently 1)
//! 3       32     container  (ObjectId of the owning container)
//! 35      8      nonce      (u64 little-endian)
//! ```
//!
//! Total length is fixed at [`IDENTITY_LEN`] bytes. There is no padding and no
//! length prefix. Decoding rejects any other length, any other tag or version,
//! and never ignores trailing bytes: a permissive parser would let a crafted
//! identity be mistaken for another container's content.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::IdentityFormatError;
use crate::types::ObjectId;

/// The only supported identity version.
pub const IDENTITY_VERSION: u16 = 1;

/// Exact encoded length of an identity.
pub const IDENTITY_LEN: usize = 1 + 2 + 32 + 8;

/// Discriminator for what kind of content an identity names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ContentTag {
    /// Article content published in a container.
    Article = 0x00,
}

impl ContentTag {
    /// Convert to u8 for encoding.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Try to parse from u8.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Article),
            _ => None,
        }
    }
}

/// A decoded content identity.
///
/// Immutable once produced. The tag and version are implied by the type:
/// only `Article` identities at [`IDENTITY_VERSION`] can be constructed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentIdentity {
    container: ObjectId,
    nonce: u64,
}

impl ContentIdentity {
    /// Create an identity for content in `container` with an explicit nonce.
    pub const fn new(container: ObjectId, nonce: u64) -> Self {
        Self { container, nonce }
    }

    /// Create an identity with a freshly drawn random nonce.
    pub fn new_random(container: ObjectId) -> Self {
        Self::new(container, rand::thread_rng().next_u64())
    }

    /// The content tag. Always `Article` for this version.
    pub const fn tag(&self) -> ContentTag {
        ContentTag::Article
    }

    /// The encoding version.
    pub const fn version(&self) -> u16 {
        IDENTITY_VERSION
    }

    /// The container this content belongs to.
    pub const fn container(&self) -> &ObjectId {
        &self.container
    }

    /// The uniqueness nonce.
    pub const fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Encode to the fixed-width layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        encode(&self.container, self.nonce)
    }

    /// Decode from bytes. See [`decode`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IdentityFormatError> {
        decode(bytes)
    }

    /// Check that this identity names `container`.
    pub fn ensure_container(&self, container: &ObjectId) -> Result<(), IdentityFormatError> {
        if &self.container != container {
            return Err(IdentityFormatError::ContainerMismatch {
                identity: self.container,
                presented: *container,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for ContentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ContentIdentity(article v{} {} #{:016x})",
            IDENTITY_VERSION, self.container, self.nonce
        )
    }
}

/// Encode a container reference and nonce into identity bytes.
pub fn encode(container: &ObjectId, nonce: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(IDENTITY_LEN);
    buf.push(ContentTag::Article.to_u8());
    buf.extend_from_slice(&IDENTITY_VERSION.to_le_bytes());
    buf.extend_from_slice(container.as_bytes());
    buf.extend_from_slice(&nonce.to_le_bytes());
    buf
}

/// Decode identity bytes.
///
/// Fails if the input is not exactly [`IDENTITY_LEN`] bytes long, or if the
/// tag or version is anything but the single supported value.
pub fn decode(bytes: &[u8]) -> Result<ContentIdentity, IdentityFormatError> {
    if bytes.len() < IDENTITY_LEN {
        return Err(IdentityFormatError::Truncated {
            expected: IDENTITY_LEN,
            actual: bytes.len(),
        });
    }
    if bytes.len() > IDENTITY_LEN {
        return Err(IdentityFormatError::TrailingBytes(bytes.len() - IDENTITY_LEN));
    }

    if ContentTag::from_u8(bytes[0]).is_none() {
        return Err(IdentityFormatError::UnknownTag(bytes[0]));
    }

    let version = u16::from_le_bytes([bytes[1], bytes[2]]);
    if version != IDENTITY_VERSION {
        return Err(IdentityFormatError::UnsupportedVersion(version));
    }

    let mut container = [0u8; 32];
    container.copy_from_slice(&bytes[3..35]);

    let mut nonce = [0u8; 8];
    nonce.copy_from_slice(&bytes[35..IDENTITY_LEN]);

    Ok(ContentIdentity::new(
        ObjectId::from_bytes(container),
        u64::from_le_bytes(nonce),
    ))
}
