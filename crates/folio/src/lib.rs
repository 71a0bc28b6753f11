//! # Folio
//!
//! The unified API for Folio - gated publications backed by an object
//! ledger, capability-based ownership and sealed content.
//!
//! ## Overview
//!
//! Folio provides a library for:
//!
//! - **Containers**: Publications with contributors, an allow-list and an access mode
//! - **Vaults**: Per-container tables of stored blobs with renewable storage
//! - **Credentials**: Subscriptions, access tokens, ownership and membership
//! - **Resolution**: Trying a reader's credentials, in order, to unlock sealed content
//!
//! ## Key Concepts
//!
//! - **Capability**: Ownership is held, not recorded. Whoever holds a
//!   container's capability owns it.
//! - **Content identity**: A 43-byte name binding content to its container.
//! - **Decryption authority**: Releases content keys only to callers that
//!   pass a policy check.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use folio::{Caller, Platform, PlatformConfig};
//! use folio::core::Keypair;
//! use folio::resolve::{MasterSecret, MemoryAuthority};
//! use folio::store::MemoryLedger;
//!
//! async fn example() {
//!     let ledger = Arc::new(MemoryLedger::new());
//!     let operator = Keypair::generate();
//!     let config = PlatformConfig::default();
//!     let platform = Platform::genesis(ledger.clone(), operator.address(), config)
//!         .await
//!         .unwrap();
//!
//!     // Create a container owned by `writer`
//!     let writer = Keypair::generate();
//!     let created = platform.create_container(writer.address(), "weekly").await.unwrap();
//!     let owner = Caller::owner(writer.address(), created.capability_id);
//!
//!     // Publish sealed content
//!     let authority = Arc::new(MemoryAuthority::new(ledger, MasterSecret::generate()));
//!     let published = platform
//!         .publish(&owner, &created.container_id, b"issue #1", "markdown", 0, authority.as_ref())
//!         .await
//!         .unwrap();
//!
//!     // Read it back with whatever credentials the writer holds
//!     let bag = platform.credentials(&writer.address(), &created.container_id).await.unwrap();
//!     let mut reader = platform.reader(authority, writer);
//!     let plaintext = reader.resolve(&published.sealed, &bag).await.unwrap();
//!     assert_eq!(plaintext, b"issue #1");
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `folio::core` - Core primitives (ContentIdentity, ObjectId, Keypair, etc.)
//! - `folio::store` - Ledger abstraction, SQLite and in-memory backends
//! - `folio::perms` - Containers, capabilities and vaults
//! - `folio::policy` - Credentials and policy evaluators
//! - `folio::resolve` - Sealing, key shares and credential resolution

pub mod config;
pub mod error;
pub mod platform;

// Re-export component crates
pub use folio_core as core;
pub use folio_perms as perms;
pub use folio_policy as policy;
pub use folio_resolve as resolve;
pub use folio_store as store;

// Re-export main types for convenience
pub use config::PlatformConfig;
pub use error::{PlatformError, Result};
pub use platform::{Caller, CreatedContainer, Platform, Published};

// Re-export commonly used types
pub use folio_core::{Address, BlobRef, ContentIdentity, IdentityFormatError, Keypair, ObjectId};
pub use folio_perms::{AccessMode, AuthorizationError, BlobMetadata, VaultError, VaultEvent};
pub use folio_policy::{Credential, CredentialKind, DenyReason, ExpiredCredentialError};
pub use folio_resolve::{CredentialExhaustedError, ResolveConfig, ResolveError, SealedPayload};
