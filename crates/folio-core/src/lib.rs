//! # Folio Core
//!
//! Pure primitives for Folio: content identities, object ids and account keys.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`ContentIdentity`] - The fixed-width binary name gated content is sealed under
//! - [`ObjectId`] - Stable identifier of a ledger object
//! - [`BlobRef`] - Content-addressed reference to a stored blob
//! - [`Address`] / [`Keypair`] - Ed25519 account keys
//!
//! ## Identity Encoding
//!
//! Identities use a bit-exact layout with strict decoding. See [`identity`].

pub mod crypto;
pub mod error;
pub mod identity;
pub mod time;
pub mod types;

pub use crypto::{Address, Blake3Hash, Keypair, Signature};
pub use error::{CoreError, IdentityFormatError};
pub use identity::{decode, encode, ContentIdentity, ContentTag, IDENTITY_LEN, IDENTITY_VERSION};
pub use time::now_millis;
pub use types::{BlobRef, ObjectId};
