//! Stored objects: the unit of ledger state.
//!
//! Every object has a stable id, a kind discriminator, a monotonically
//! increasing version and an owner. The payload is opaque CBOR.

use bytes::Bytes;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use folio_core::{Address, ObjectId};

use crate::error::{Result, StoreError};

/// Version assigned to an object when it is first inserted.
pub const INITIAL_VERSION: u64 = 1;

/// The kind of object, determining how the payload is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum ObjectKind {
    // Shared records (0x0000 - 0x00FF)
    /// A publication container.
    Container = 0x0001,
    /// A container's blob vault.
    Vault = 0x0002,

    // Capabilities (0x0100 - 0x01FF)
    /// Proof of ownership of one container.
    OwnershipCapability = 0x0100,
    /// Platform-level storage renewal right.
    RenewalCapability = 0x0101,

    // Credentials (0x0200 - 0x02FF)
    /// Time-boxed subscription to a container.
    Subscription = 0x0200,
    /// Permanent access to one content item.
    AccessToken = 0x0201,
}

impl ObjectKind {
    /// Convert to u16 for serialization.
    pub fn to_u16(self) -> u16 {
        self as u16
    }

    /// Try to parse from u16.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0001 => Some(Self::Container),
            0x0002 => Some(Self::Vault),
            0x0100 => Some(Self::OwnershipCapability),
            0x0101 => Some(Self::RenewalCapability),
            0x0200 => Some(Self::Subscription),
            0x0201 => Some(Self::AccessToken),
            _ => None,
        }
    }

    /// Check if this is a capability kind.
    pub fn is_capability(self) -> bool {
        (self.to_u16() & 0xFF00) == 0x0100
    }

    /// Check if this is a credential kind.
    pub fn is_credential(self) -> bool {
        (self.to_u16() & 0xFF00) == 0x0200
    }
}

/// Who may use an object in a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    /// Any transaction may reference it; mutation is gated by object logic.
    Shared,
    /// Only transactions from this address may use it.
    Address(Address),
    /// Frozen; never mutated again.
    Immutable,
}

impl Owner {
    /// Whether `address` holds this object.
    pub fn is_held_by(&self, address: &Address) -> bool {
        matches!(self, Owner::Address(a) if a == address)
    }
}

/// A raw object as persisted by a ledger backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub version: u64,
    pub owner: Owner,
    pub data: Bytes,
}

/// A typed object that can live in the ledger.
pub trait LedgerObject: Serialize + DeserializeOwned + Send + Sync {
    /// The kind discriminator stored alongside the payload.
    const KIND: ObjectKind;

    /// The object's stable id.
    fn object_id(&self) -> ObjectId;

    /// Serialize to CBOR bytes.
    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize from CBOR bytes.
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

/// A decoded object together with its ledger metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub object: T,
    pub version: u64,
    pub owner: Owner,
}

impl StoredObject {
    /// Encode a typed object for first insertion.
    pub fn encode<T: LedgerObject>(object: &T, owner: Owner) -> Result<Self> {
        Ok(Self {
            id: object.object_id(),
            kind: T::KIND,
            version: INITIAL_VERSION,
            owner,
            data: Bytes::from(object.to_bytes()?),
        })
    }

    /// Decode into a typed object, checking the kind discriminator.
    pub fn decode<T: LedgerObject>(&self) -> Result<Versioned<T>> {
        if self.kind != T::KIND {
            return Err(StoreError::KindMismatch {
                id: self.id,
                expected: T::KIND,
                actual: self.kind,
            });
        }
        Ok(Versioned {
            object: T::from_bytes(&self.data)?,
            version: self.version,
            owner: self.owner,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Probe {
        id: ObjectId,
        label: String,
    }

    impl LedgerObject for Probe {
        const KIND: ObjectKind = ObjectKind::Container;

        fn object_id(&self) -> ObjectId {
            self.id
        }
    }

    #[test]
    fn test_kind_u16_roundtrip() {
        for kind in [
            ObjectKind::Container,
            ObjectKind::Vault,
            ObjectKind::OwnershipCapability,
            ObjectKind::RenewalCapability,
            ObjectKind::Subscription,
            ObjectKind::AccessToken,
        ] {
            assert_eq!(ObjectKind::from_u16(kind.to_u16()), Some(kind));
        }
        assert_eq!(ObjectKind::from_u16(0xffff), None);
        assert!(ObjectKind::OwnershipCapability.is_capability());
        assert!(ObjectKind::AccessToken.is_credential());
    }

    #[test]
    fn test_encode_decode_checks_kind() {
        let probe = Probe {
            id: ObjectId::from_bytes([7; 32]),
            label: "weekly".into(),
        };
        let mut stored = StoredObject::encode(&probe, Owner::Shared).unwrap();
        assert_eq!(stored.version, INITIAL_VERSION);
        assert_eq!(stored.decode::<Probe>().unwrap().object, probe);

        stored.kind = ObjectKind::Vault;
        assert!(matches!(
            stored.decode::<Probe>(),
            Err(StoreError::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_owner_is_held_by() {
        let a = Address::from_bytes([1; 32]);
        let b = Address::from_bytes([2; 32]);
        assert!(Owner::Address(a).is_held_by(&a));
        assert!(!Owner::Address(a).is_held_by(&b));
        assert!(!Owner::Shared.is_held_by(&a));
    }
}
