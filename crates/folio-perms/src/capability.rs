//! Capabilities: possession-based proofs of authority.
//!
//! A capability is a ledger object held by an address. Neither type is
//! `Clone`, and both keep their fields private: the only way to obtain one is
//! to mint it alongside the thing it governs, or to load the ledger object
//! the holder owns. Handing the value (and its ledger object) to someone else
//! hands them the authority.

use serde::{Deserialize, Serialize};

use folio_core::ObjectId;
use folio_store::{LedgerObject, ObjectKind};

/// Proof of ownership of exactly one container.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipCapability {
    id: ObjectId,
    container_id: ObjectId,
}

impl OwnershipCapability {
    /// Mint a capability bound to `container_id`.
    ///
    /// Only [`Container::create`](crate::Container::create) calls this, so a
    /// container never has more than one capability.
    pub(crate) fn mint(container_id: ObjectId) -> Self {
        Self {
            id: ObjectId::generate(),
            container_id,
        }
    }

    /// The capability's own object id.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// The container this capability is bound to.
    pub fn container_id(&self) -> ObjectId {
        self.container_id
    }
}

impl LedgerObject for OwnershipCapability {
    const KIND: ObjectKind = ObjectKind::OwnershipCapability;

    fn object_id(&self) -> ObjectId {
        self.id
    }
}

/// Platform-level right to extend blob storage in every vault.
///
/// Decoupled from container ownership so that renewal can never be blocked
/// by, or require, content-level permissions.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenewalCapability {
    id: ObjectId,
}

impl RenewalCapability {
    /// Mint the platform's renewal capability. Called once, at genesis.
    pub fn genesis() -> Self {
        Self {
            id: ObjectId::generate(),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }
}

impl LedgerObject for RenewalCapability {
    const KIND: ObjectKind = ObjectKind::RenewalCapability;

    fn object_id(&self) -> ObjectId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minted_capabilities_are_distinct() {
        let container = ObjectId::from_bytes([1; 32]);
        let a = OwnershipCapability::mint(container);
        let b = OwnershipCapability::mint(container);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.container_id(), container);
    }

    #[test]
    fn test_capability_survives_ledger_encoding() {
        let cap = OwnershipCapability::mint(ObjectId::from_bytes([2; 32]));
        let bytes = cap.to_bytes().unwrap();
        assert_eq!(OwnershipCapability::from_bytes(&bytes).unwrap(), cap);

        let renewal = RenewalCapability::genesis();
        let bytes = renewal.to_bytes().unwrap();
        assert_eq!(RenewalCapability::from_bytes(&bytes).unwrap(), renewal);
    }
}
