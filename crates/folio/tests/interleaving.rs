//! Vault writes interleaved with container and capability changes.
//!
//! The ledger below commits one competing change the first time a chosen
//! object is read, which lands it between the platform's authorization
//! check and its vault commit.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use folio::perms::{Container, OwnershipCapability};
use folio::store::{
    self, CommitResult, InsertResult, Ledger, LedgerExt, MemoryLedger, ObjectKind, Owner,
    Precondition, StoreError, StoredObject,
};
use folio::{
    Address, AuthorizationError, BlobMetadata, BlobRef, Caller, CreatedContainer, Keypair,
    ObjectId, Platform, PlatformConfig, PlatformError,
};
use folio_testkit::parties;

/// A change committed behind the platform's back.
enum Interleave {
    RemoveContributor {
        container: ObjectId,
        capability: ObjectId,
        contributor: Address,
    },
    TransferCapability {
        capability: ObjectId,
        from: Address,
        to: Address,
    },
}

/// Commits one [`Interleave`] the first time `trigger` is read.
struct InterleavingLedger {
    inner: MemoryLedger,
    pending: Mutex<Option<(ObjectId, Interleave)>>,
}

impl InterleavingLedger {
    fn new() -> Self {
        Self {
            inner: MemoryLedger::new(),
            pending: Mutex::new(None),
        }
    }

    fn arm(&self, trigger: ObjectId, change: Interleave) {
        *self.pending.lock().unwrap() = Some((trigger, change));
    }

    async fn fire(&self, id: &ObjectId) -> store::Result<()> {
        let change = {
            let mut pending = self.pending.lock().unwrap();
            match pending.take() {
                Some((trigger, change)) if trigger == *id => change,
                other => {
                    *pending = other;
                    return Ok(());
                }
            }
        };

        match change {
            Interleave::RemoveContributor {
                container,
                capability,
                contributor,
            } => {
                let cap = self
                    .inner
                    .load::<OwnershipCapability>(&capability)
                    .await?
                    .object;
                self.inner
                    .mutate::<Container, _, StoreError, _>(&container, |c| {
                        c.remove_contributor(&cap, &contributor)
                            .map_err(|e| StoreError::InvalidData(e.to_string()))
                    })
                    .await?;
            }
            Interleave::TransferCapability {
                capability,
                from,
                to,
            } => {
                self.inner.transfer(&capability, &from, to).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Ledger for InterleavingLedger {
    async fn insert_object(&self, object: &StoredObject) -> store::Result<InsertResult> {
        self.inner.insert_object(object).await
    }

    async fn get_object(&self, id: &ObjectId) -> store::Result<Option<StoredObject>> {
        self.fire(id).await?;
        self.inner.get_object(id).await
    }

    async fn has_object(&self, id: &ObjectId) -> store::Result<bool> {
        self.inner.has_object(id).await
    }

    async fn commit_guarded(
        &self,
        id: &ObjectId,
        expected_version: u64,
        owner: &Owner,
        data: &[u8],
        preconditions: &[Precondition],
    ) -> store::Result<CommitResult> {
        self.inner
            .commit_guarded(id, expected_version, owner, data, preconditions)
            .await
    }

    async fn list_owned(
        &self,
        owner: &Address,
        kind: Option<ObjectKind>,
    ) -> store::Result<Vec<ObjectId>> {
        self.inner.list_owned(owner, kind).await
    }
}

struct Setup {
    ledger: Arc<InterleavingLedger>,
    platform: Platform<InterleavingLedger>,
    created: CreatedContainer,
    owner: Caller,
}

async fn setup(owner: &Keypair) -> anyhow::Result<Setup> {
    let ledger = Arc::new(InterleavingLedger::new());
    let operator = Keypair::generate();
    let platform =
        Platform::genesis(ledger.clone(), operator.address(), PlatformConfig::default()).await?;
    let created = platform.create_container(owner.address(), "weekly").await?;
    let caller = Caller::owner(owner.address(), created.capability_id);

    Ok(Setup {
        ledger,
        platform,
        created,
        owner: caller,
    })
}

fn markdown() -> BlobMetadata {
    BlobMetadata::new(1024, "markdown", 10, true)
}

fn conflict_on(err: &PlatformError) -> Option<ObjectId> {
    match err {
        PlatformError::Store(StoreError::VersionConflict { id, .. }) => Some(*id),
        _ => None,
    }
}

#[tokio::test]
async fn test_contributor_removed_mid_store_writes_nothing() -> anyhow::Result<()> {
    let p = parties(2);
    let s = setup(&p[0]).await?;
    let cid = s.created.container_id;
    let member = Caller::member(p[1].address());
    s.platform
        .add_contributor(&s.owner, &cid, p[1].address())
        .await?;

    s.ledger.arm(
        s.created.vault_id,
        Interleave::RemoveContributor {
            container: cid,
            capability: s.created.capability_id,
            contributor: p[1].address(),
        },
    );

    let blob = BlobRef::new(vec![0x01]);
    let err = s
        .platform
        .store_blob(&member, &cid, blob.clone(), markdown())
        .await
        .unwrap_err();
    assert_eq!(conflict_on(&err), Some(cid));
    assert!(!s.platform.container(&cid).await?.is_contributor(&p[1].address()));
    assert!(!s.platform.has_blob(&cid, &blob).await?);

    // Retrying sees the new membership
    let err = s
        .platform
        .store_blob(&member, &cid, blob.clone(), markdown())
        .await
        .unwrap_err();
    assert!(matches!(err.authorization(), Some(AuthorizationError::NotAuthorized { .. })));

    Ok(())
}

#[tokio::test]
async fn test_contributor_removed_mid_remove_keeps_blob() -> anyhow::Result<()> {
    let p = parties(2);
    let s = setup(&p[0]).await?;
    let cid = s.created.container_id;
    let member = Caller::member(p[1].address());
    s.platform
        .add_contributor(&s.owner, &cid, p[1].address())
        .await?;

    let blob = BlobRef::new(vec![0x02]);
    s.platform
        .store_blob(&member, &cid, blob.clone(), markdown())
        .await?;

    s.ledger.arm(
        s.created.vault_id,
        Interleave::RemoveContributor {
            container: cid,
            capability: s.created.capability_id,
            contributor: p[1].address(),
        },
    );

    let err = s
        .platform
        .remove_blob(&member, &cid, &blob)
        .await
        .unwrap_err();
    assert_eq!(conflict_on(&err), Some(cid));
    assert!(s.platform.has_blob(&cid, &blob).await?);

    Ok(())
}

#[tokio::test]
async fn test_capability_moved_mid_store_writes_nothing() -> anyhow::Result<()> {
    let p = parties(2);
    let s = setup(&p[0]).await?;
    let cid = s.created.container_id;

    s.ledger.arm(
        s.created.vault_id,
        Interleave::TransferCapability {
            capability: s.created.capability_id,
            from: p[0].address(),
            to: p[1].address(),
        },
    );

    let blob = BlobRef::new(vec![0x03]);
    let err = s
        .platform
        .store_blob(&s.owner, &cid, blob.clone(), markdown())
        .await
        .unwrap_err();
    assert_eq!(conflict_on(&err), Some(s.created.capability_id));
    assert!(!s.platform.has_blob(&cid, &blob).await?);

    let new_owner = Caller::owner(p[1].address(), s.created.capability_id);
    s.platform
        .store_blob(&new_owner, &cid, blob.clone(), markdown())
        .await?;
    assert!(s.platform.has_blob(&cid, &blob).await?);

    Ok(())
}

#[tokio::test]
async fn test_unrelated_change_does_not_block_store() -> anyhow::Result<()> {
    let p = parties(3);
    let s = setup(&p[0]).await?;
    let cid = s.created.container_id;
    let other = s
        .platform
        .create_container(p[1].address(), "other")
        .await?;

    s.ledger.arm(
        s.created.vault_id,
        Interleave::TransferCapability {
            capability: other.capability_id,
            from: p[1].address(),
            to: p[2].address(),
        },
    );

    let blob = BlobRef::new(vec![0x04]);
    s.platform
        .store_blob(&s.owner, &cid, blob.clone(), markdown())
        .await?;
    assert!(s.platform.has_blob(&cid, &blob).await?);

    Ok(())
}
