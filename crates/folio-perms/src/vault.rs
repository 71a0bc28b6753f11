//! Vaults: per-container tables of stored blobs.
//!
//! A vault holds no membership data. Mutations take an [`Authorized`] proof
//! produced by the owning container and only check that it was issued for
//! this vault's container. Storage renewal is gated separately by the
//! platform's [`RenewalCapability`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use folio_core::{Address, BlobRef, ObjectId};
use folio_store::{LedgerObject, ObjectKind};

use crate::authorize::Authorized;
use crate::capability::RenewalCapability;
use crate::container::Container;
use crate::error::VaultError;

/// Descriptive metadata for a stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobMetadata {
    /// Size in bytes.
    pub size: u64,
    /// Encoding tag, e.g. `"markdown"` or `"image/png"`.
    pub encoding: String,
    /// Storage epoch after which the blob may be dropped.
    pub expiry_epoch: u64,
    /// Whether the blob is sealed under a content identity.
    pub encrypted: bool,
}

impl BlobMetadata {
    pub fn new(size: u64, encoding: impl Into<String>, expiry_epoch: u64, encrypted: bool) -> Self {
        Self {
            size,
            encoding: encoding.into(),
            expiry_epoch,
            encrypted,
        }
    }
}

/// Epochs before the earliest expiry at which renewal falls due.
pub const DEFAULT_RENEWAL_LEAD_EPOCHS: u64 = 1;

/// A vault entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRecord {
    pub metadata: BlobMetadata,
    pub stored_by: Address,
}

/// Audit event emitted by a vault mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultEvent {
    Stored {
        vault: ObjectId,
        blob: BlobRef,
        by: Address,
    },
    Removed {
        vault: ObjectId,
        blob: BlobRef,
        by: Address,
        metadata: BlobMetadata,
    },
    Renewed {
        vault: ObjectId,
        extended_to: u64,
        next_renewal: u64,
        blobs: usize,
    },
}

/// The blob table of one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    id: ObjectId,
    container_id: ObjectId,
    blobs: BTreeMap<BlobRef, BlobRecord>,
    renewal_epoch: Option<u64>,
    renewal_authority: ObjectId,
    #[serde(default)]
    renewal_lead: u64,
}

impl Vault {
    /// Create the empty vault for `container`, renewable by `renewal`.
    ///
    /// Renewal falls due `renewal_lead` epochs before the earliest blob
    /// expiry, so it is signalled while every blob is still stored.
    pub fn for_container(
        container: &Container,
        renewal: &RenewalCapability,
        renewal_lead: u64,
    ) -> Self {
        Self {
            id: container.vault_id(),
            container_id: container.id(),
            blobs: BTreeMap::new(),
            renewal_epoch: None,
            renewal_authority: renewal.id(),
            renewal_lead,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn container_id(&self) -> ObjectId {
        self.container_id
    }

    /// The epoch at which storage must next be extended, if scheduled.
    pub fn renewal_epoch(&self) -> Option<u64> {
        self.renewal_epoch
    }

    pub fn renewal_lead(&self) -> u64 {
        self.renewal_lead
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    fn check_container(&self, auth: &Authorized) -> Result<(), VaultError> {
        if auth.container_id() != self.container_id {
            return Err(VaultError::ContainerMismatch {
                vault: self.container_id,
                authorized: auth.container_id(),
            });
        }
        Ok(())
    }

    fn due_for(&self, expiry_epoch: u64) -> u64 {
        expiry_epoch.saturating_sub(self.renewal_lead)
    }

    /// Recompute the schedule from the blobs still held.
    fn reschedule(&mut self) {
        self.renewal_epoch = self
            .blobs
            .values()
            .map(|r| r.metadata.expiry_epoch)
            .min()
            .map(|e| self.due_for(e));
    }

    /// Insert a blob. Fails if the reference is already present.
    ///
    /// The first stored blob schedules renewal ahead of its expiry; later
    /// blobs pull the schedule earlier if they expire sooner.
    pub fn store(
        &mut self,
        blob: BlobRef,
        metadata: BlobMetadata,
        auth: &Authorized,
    ) -> Result<VaultEvent, VaultError> {
        self.check_container(auth)?;

        if self.blobs.contains_key(&blob) {
            return Err(VaultError::AlreadyExists(blob));
        }

        let due = self.due_for(metadata.expiry_epoch);
        self.renewal_epoch = Some(self.renewal_epoch.map_or(due, |e| e.min(due)));

        self.blobs.insert(
            blob.clone(),
            BlobRecord {
                metadata,
                stored_by: auth.actor(),
            },
        );

        tracing::debug!(vault = %self.id, blob = %blob, by = %auth.actor(), "blob stored");

        Ok(VaultEvent::Stored {
            vault: self.id,
            blob,
            by: auth.actor(),
        })
    }

    /// Remove a blob and return its metadata.
    ///
    /// The renewal schedule follows the remaining blobs; an emptied vault has
    /// none.
    pub fn remove(
        &mut self,
        blob: &BlobRef,
        auth: &Authorized,
    ) -> Result<BlobMetadata, VaultError> {
        self.check_container(auth)?;

        let record = self
            .blobs
            .remove(blob)
            .ok_or_else(|| VaultError::NotFound(blob.clone()))?;
        self.reschedule();

        tracing::debug!(vault = %self.id, blob = %blob, by = %auth.actor(), "blob removed");
        Ok(record.metadata)
    }

    pub fn get(&self, blob: &BlobRef) -> Option<&BlobMetadata> {
        self.blobs.get(blob).map(|r| &r.metadata)
    }

    /// Full record including who stored the blob.
    pub fn record(&self, blob: &BlobRef) -> Option<&BlobRecord> {
        self.blobs.get(blob)
    }

    pub fn has(&self, blob: &BlobRef) -> bool {
        self.blobs.contains_key(blob)
    }

    /// True iff a renewal epoch is scheduled and `current_epoch` has reached it.
    pub fn needs_renewal(&self, current_epoch: u64) -> bool {
        self.renewal_epoch.is_some_and(|e| current_epoch >= e)
    }

    /// Blobs whose storage expiry has been reached.
    pub fn expiring(&self, current_epoch: u64) -> Vec<BlobRef> {
        self.blobs
            .iter()
            .filter(|(_, r)| r.metadata.expiry_epoch <= current_epoch)
            .map(|(b, _)| b.clone())
            .collect()
    }

    /// Extend every blob's expiry to at least `extend_to_epoch` and schedule
    /// the next renewal. An empty vault is left unscheduled.
    pub fn renew(
        &mut self,
        cap: &RenewalCapability,
        extend_to_epoch: u64,
        next_renewal: u64,
    ) -> Result<VaultEvent, VaultError> {
        if cap.id() != self.renewal_authority {
            return Err(VaultError::RenewalDenied(cap.id()));
        }

        for record in self.blobs.values_mut() {
            record.metadata.expiry_epoch = record.metadata.expiry_epoch.max(extend_to_epoch);
        }
        self.renewal_epoch = (!self.blobs.is_empty()).then_some(next_renewal);

        tracing::info!(
            vault = %self.id,
            extended_to = extend_to_epoch,
            next_renewal,
            blobs = self.blobs.len(),
            "vault renewed"
        );

        Ok(VaultEvent::Renewed {
            vault: self.id,
            extended_to: extend_to_epoch,
            next_renewal,
            blobs: self.blobs.len(),
        })
    }
}

impl LedgerObject for Vault {
    const KIND: ObjectKind = ObjectKind::Vault;

    fn object_id(&self) -> ObjectId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ContainerLimits;
    use crate::OwnershipCapability;

    struct Setup {
        container: Container,
        cap: OwnershipCapability,
        renewal: RenewalCapability,
        vault: Vault,
    }

    fn setup() -> Setup {
        let (container, cap) = Container::create("weekly", ContainerLimits::default());
        let renewal = RenewalCapability::genesis();
        let vault = Vault::for_container(&container, &renewal, 2);
        Setup {
            container,
            cap,
            renewal,
            vault,
        }
    }

    fn meta(expiry: u64) -> BlobMetadata {
        BlobMetadata::new(1024, "markdown", expiry, false)
    }

    #[test]
    fn test_store_get_remove() {
        let mut s = setup();
        let actor = Address::from_bytes([1; 32]);
        let auth = s.container.authorize(Some(&s.cap), actor).unwrap();
        let blob = BlobRef::new(vec![0x01]);

        let event = s.vault.store(blob.clone(), meta(10), &auth).unwrap();
        assert!(matches!(event, VaultEvent::Stored { by, .. } if by == actor));
        assert!(s.vault.has(&blob));
        assert_eq!(s.vault.get(&blob).unwrap().size, 1024);
        assert_eq!(s.vault.record(&blob).unwrap().stored_by, actor);

        let removed = s.vault.remove(&blob, &auth).unwrap();
        assert_eq!(removed, meta(10));
        assert!(!s.vault.has(&blob));
        assert!(s.vault.get(&blob).is_none());
    }

    #[test]
    fn test_duplicate_and_absent() {
        let mut s = setup();
        let auth = s
            .container
            .authorize(Some(&s.cap), Address::from_bytes([1; 32]))
            .unwrap();
        let blob = BlobRef::new(vec![0x02]);

        s.vault.store(blob.clone(), meta(10), &auth).unwrap();
        assert_eq!(
            s.vault.store(blob.clone(), meta(20), &auth),
            Err(VaultError::AlreadyExists(blob.clone()))
        );
        assert_eq!(s.vault.get(&blob).unwrap().expiry_epoch, 10);

        let missing = BlobRef::new(vec![0x03]);
        assert_eq!(
            s.vault.remove(&missing, &auth),
            Err(VaultError::NotFound(missing))
        );
    }

    #[test]
    fn test_foreign_authorization_rejected() {
        let mut s = setup();
        let (other, other_cap) = Container::create("other", ContainerLimits::default());
        let auth = other
            .authorize(Some(&other_cap), Address::from_bytes([1; 32]))
            .unwrap();

        assert!(matches!(
            s.vault.store(BlobRef::new(vec![1]), meta(10), &auth),
            Err(VaultError::ContainerMismatch { .. })
        ));
        assert!(s.vault.is_empty());
    }

    #[test]
    fn test_renewal_schedule() {
        let mut s = setup();
        let auth = s
            .container
            .authorize(Some(&s.cap), Address::from_bytes([1; 32]))
            .unwrap();

        assert!(!s.vault.needs_renewal(u64::MAX));

        s.vault.store(BlobRef::new(vec![1]), meta(10), &auth).unwrap();
        assert_eq!(s.vault.renewal_epoch(), Some(8));
        s.vault.store(BlobRef::new(vec![2]), meta(6), &auth).unwrap();
        assert_eq!(s.vault.renewal_epoch(), Some(4));
        assert!(!s.vault.needs_renewal(3));
        assert!(s.vault.needs_renewal(4));
        assert_eq!(s.vault.expiring(6), vec![BlobRef::new(vec![2])]);

        let event = s.vault.renew(&s.renewal, 20, 18).unwrap();
        assert!(matches!(event, VaultEvent::Renewed { blobs: 2, .. }));
        assert!(!s.vault.needs_renewal(17));
        assert!(s.vault.needs_renewal(18));
        assert!(s.vault.expiring(19).is_empty());
    }

    #[test]
    fn test_renewal_signalled_before_expiry() {
        let mut s = setup();
        let auth = s
            .container
            .authorize(Some(&s.cap), Address::from_bytes([1; 32]))
            .unwrap();
        s.vault.store(BlobRef::new(vec![1]), meta(10), &auth).unwrap();

        for epoch in 8..10 {
            assert!(s.vault.needs_renewal(epoch));
            assert!(s.vault.expiring(epoch).is_empty());
        }
        assert!(!s.vault.expiring(10).is_empty());
    }

    #[test]
    fn test_lead_saturates_at_zero() {
        let (container, cap) = Container::create("weekly", ContainerLimits::default());
        let renewal = RenewalCapability::genesis();
        let mut vault = Vault::for_container(&container, &renewal, 5);
        let auth = container
            .authorize(Some(&cap), Address::from_bytes([1; 32]))
            .unwrap();

        vault.store(BlobRef::new(vec![1]), meta(3), &auth).unwrap();
        assert_eq!(vault.renewal_epoch(), Some(0));
        assert!(vault.needs_renewal(0));
    }

    #[test]
    fn test_remove_reschedules_renewal() {
        let mut s = setup();
        let auth = s
            .container
            .authorize(Some(&s.cap), Address::from_bytes([1; 32]))
            .unwrap();
        let late = BlobRef::new(vec![1]);
        let early = BlobRef::new(vec![2]);
        s.vault.store(late.clone(), meta(10), &auth).unwrap();
        s.vault.store(early.clone(), meta(6), &auth).unwrap();

        s.vault.remove(&early, &auth).unwrap();
        assert_eq!(s.vault.renewal_epoch(), Some(8));
        assert!(!s.vault.needs_renewal(4));

        s.vault.remove(&late, &auth).unwrap();
        assert_eq!(s.vault.renewal_epoch(), None);
        assert!(!s.vault.needs_renewal(u64::MAX));

        s.vault.renew(&s.renewal, 20, 18).unwrap();
        assert_eq!(s.vault.renewal_epoch(), None);
    }

    #[test]
    fn test_foreign_renewal_denied() {
        let mut s = setup();
        let rogue = RenewalCapability::genesis();
        assert_eq!(
            s.vault.renew(&rogue, 20, 18),
            Err(VaultError::RenewalDenied(rogue.id()))
        );
        assert_eq!(s.vault.renewal_epoch(), None);
    }

    #[test]
    fn test_vault_survives_ledger_encoding() {
        let mut s = setup();
        let auth = s
            .container
            .authorize(Some(&s.cap), Address::from_bytes([1; 32]))
            .unwrap();
        s.vault.store(BlobRef::new(vec![9, 9]), meta(3), &auth).unwrap();

        let bytes = s.vault.to_bytes().unwrap();
        assert_eq!(Vault::from_bytes(&bytes).unwrap(), s.vault);
    }
}
