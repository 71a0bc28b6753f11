//! # Folio Permissions
//!
//! Container ownership, contributor authorization and blob vaults.
//!
//! ## Overview
//!
//! Authority over a container is held, not looked up. The container record
//! stores no owner address; instead an [`OwnershipCapability`] is minted
//! alongside it, and whoever holds that capability may manage contributors,
//! the allow-list and the access mode.
//!
//! ## Key Concepts
//!
//! - **Container**: name, contributor set, allow-list, access mode, vault id
//! - **OwnershipCapability**: bound 1:1 to a container at creation
//! - **Authorized**: proof that an actor passed the owner-or-contributor check
//! - **Vault**: blob table of one container, mutated only with an `Authorized`
//! - **RenewalCapability**: platform-wide right to extend blob storage
//!
//! ## Usage
//!
//! ```rust,no_run
//! use folio_perms::{
//!     BlobMetadata, Container, ContainerLimits, RenewalCapability, Vault,
//!     DEFAULT_RENEWAL_LEAD_EPOCHS,
//! };
//! use folio_core::{Address, BlobRef};
//!
//! let renewal = RenewalCapability::genesis();
//! let (container, cap) = Container::create("weekly", ContainerLimits::default());
//! let mut vault = Vault::for_container(&container, &renewal, DEFAULT_RENEWAL_LEAD_EPOCHS);
//!
//! let actor = Address::from_bytes([1; 32]);
//! let auth = container.authorize(Some(&cap), actor).unwrap();
//! let metadata = BlobMetadata::new(1024, "markdown", 10, true);
//! vault.store(BlobRef::new(vec![1]), metadata, &auth).unwrap();
//! ```

pub mod authorize;
pub mod capability;
pub mod container;
pub mod error;
pub mod vault;

pub use authorize::{AuthPath, Authorized};
pub use capability::{OwnershipCapability, RenewalCapability};
pub use container::{
    AccessMode, Container, ContainerLimits, DEFAULT_MAX_ALLOWLIST, DEFAULT_MAX_CONTRIBUTORS,
};
pub use error::{AuthorizationError, PermsError, Result, VaultError};
pub use vault::{BlobMetadata, BlobRecord, Vault, VaultEvent, DEFAULT_RENEWAL_LEAD_EPOCHS};
