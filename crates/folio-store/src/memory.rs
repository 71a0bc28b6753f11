//! In-memory implementation of the Ledger trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bytes::Bytes;

use folio_core::{Address, ObjectId};

use crate::error::{Result, StoreError};
use crate::object::{ObjectKind, Owner, StoredObject, INITIAL_VERSION};
use crate::traits::{CommitResult, InsertResult, Ledger, Precondition};

/// In-memory ledger implementation.
///
/// All data is lost when the ledger is dropped. Thread-safe via RwLock.
pub struct MemoryLedger {
    objects: RwLock<HashMap<ObjectId, StoredObject>>,
}

impl MemoryLedger {
    /// Create a new empty in-memory ledger.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects held.
    pub fn len(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or(0)
    }

    /// Whether the ledger holds no objects.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<ObjectId, StoredObject>>> {
        self.objects.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<ObjectId, StoredObject>>> {
        self.objects.write().map_err(|_| StoreError::Poisoned)
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn insert_object(&self, object: &StoredObject) -> Result<InsertResult> {
        if object.version != INITIAL_VERSION {
            return Err(StoreError::InvalidData(format!(
                "new object {} must start at version {}",
                object.id, INITIAL_VERSION
            )));
        }

        let mut objects = self.write()?;
        if objects.contains_key(&object.id) {
            return Ok(InsertResult::AlreadyExists);
        }
        objects.insert(object.id, object.clone());

        Ok(InsertResult::Inserted)
    }

    async fn get_object(&self, id: &ObjectId) -> Result<Option<StoredObject>> {
        Ok(self.read()?.get(id).cloned())
    }

    async fn has_object(&self, id: &ObjectId) -> Result<bool> {
        Ok(self.read()?.contains_key(id))
    }

    async fn commit_guarded(
        &self,
        id: &ObjectId,
        expected_version: u64,
        owner: &Owner,
        data: &[u8],
        preconditions: &[Precondition],
    ) -> Result<CommitResult> {
        let mut objects = self.write()?;

        for p in preconditions {
            let current = objects.get(&p.id).map(|o| o.version);
            if current != Some(p.version) {
                return Ok(CommitResult::PreconditionFailed { id: p.id, current });
            }
        }

        let Some(stored) = objects.get_mut(id) else {
            return Ok(CommitResult::Missing);
        };

        if stored.version != expected_version {
            return Ok(CommitResult::Stale {
                current: stored.version,
            });
        }

        stored.version += 1;
        stored.owner = *owner;
        stored.data = Bytes::copy_from_slice(data);

        Ok(CommitResult::Committed {
            version: stored.version,
        })
    }

    async fn list_owned(
        &self,
        owner: &Address,
        kind: Option<ObjectKind>,
    ) -> Result<Vec<ObjectId>> {
        let objects = self.read()?;

        let mut ids: Vec<ObjectId> = objects
            .values()
            .filter(|o| o.owner.is_held_by(owner))
            .filter(|o| kind.map_or(true, |k| o.kind == k))
            .map(|o| o.id)
            .collect();

        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::LedgerObject;
    use crate::traits::LedgerExt;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Counter {
        id: ObjectId,
        value: u32,
    }

    impl LedgerObject for Counter {
        const KIND: ObjectKind = ObjectKind::Vault;

        fn object_id(&self) -> ObjectId {
            self.id
        }
    }

    fn counter(byte: u8) -> Counter {
        Counter {
            id: ObjectId::from_bytes([byte; 32]),
            value: 0,
        }
    }

    #[tokio::test]
    async fn test_memory_ledger_basic() {
        let ledger = MemoryLedger::new();
        let c = counter(1);

        let version = ledger.create(&c, Owner::Shared).await.unwrap();
        assert_eq!(version, INITIAL_VERSION);

        let loaded = ledger.load::<Counter>(&c.id).await.unwrap();
        assert_eq!(loaded.object, c);
        assert!(ledger.has_object(&c.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_create_fails() {
        let ledger = MemoryLedger::new();
        let c = counter(1);

        ledger.create(&c, Owner::Shared).await.unwrap();
        let err = ledger.create(&c, Owner::Shared).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(id) if id == c.id));
    }

    #[tokio::test]
    async fn test_mutate_bumps_version() {
        let ledger = MemoryLedger::new();
        let c = counter(1);
        ledger.create(&c, Owner::Shared).await.unwrap();

        let ((), version) = ledger
            .mutate::<Counter, _, StoreError, _>(&c.id, |c| {
                c.value += 1;
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(version, 2);
        assert_eq!(ledger.load::<Counter>(&c.id).await.unwrap().object.value, 1);
    }

    #[tokio::test]
    async fn test_failed_mutation_commits_nothing() {
        let ledger = MemoryLedger::new();
        let c = counter(1);
        ledger.create(&c, Owner::Shared).await.unwrap();

        let result = ledger
            .mutate::<Counter, (), StoreError, _>(&c.id, |c| {
                c.value = 99;
                Err(StoreError::InvalidData("rejected".into()))
            })
            .await;

        assert!(result.is_err());
        let loaded = ledger.load::<Counter>(&c.id).await.unwrap();
        assert_eq!(loaded.object.value, 0);
        assert_eq!(loaded.version, INITIAL_VERSION);
    }

    #[tokio::test]
    async fn test_stale_commit_loses() {
        let ledger = MemoryLedger::new();
        let c = counter(1);
        ledger.create(&c, Owner::Shared).await.unwrap();

        let first = ledger
            .commit_object(&c.id, 1, &Owner::Shared, b"a")
            .await
            .unwrap();
        assert_eq!(first, CommitResult::Committed { version: 2 });

        let second = ledger
            .commit_object(&c.id, 1, &Owner::Shared, b"b")
            .await
            .unwrap();
        assert_eq!(second, CommitResult::Stale { current: 2 });
    }

    #[tokio::test]
    async fn test_guarded_commit_checks_other_object() {
        let ledger = MemoryLedger::new();
        let guard = counter(1);
        let target = counter(2);
        ledger.create(&guard, Owner::Shared).await.unwrap();
        ledger.create(&target, Owner::Shared).await.unwrap();

        let at_v1 = [Precondition::new(guard.id, 1)];
        ledger
            .mutate::<Counter, _, StoreError, _>(&guard.id, |c| {
                c.value = 7;
                Ok(())
            })
            .await
            .unwrap();

        let result = ledger
            .commit_guarded(&target.id, 1, &Owner::Shared, b"x", &at_v1)
            .await
            .unwrap();
        assert_eq!(
            result,
            CommitResult::PreconditionFailed {
                id: guard.id,
                current: Some(2),
            }
        );
        assert_eq!(ledger.load::<Counter>(&target.id).await.unwrap().version, 1);

        let err = ledger
            .mutate_guarded::<Counter, _, StoreError, _>(&target.id, &at_v1, |c| {
                c.value = 1;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::VersionConflict { id, expected: 1, current: 2 } if id == guard.id
        ));

        let at_v2 = [Precondition::new(guard.id, 2)];
        let ((), version) = ledger
            .mutate_guarded::<Counter, _, StoreError, _>(&target.id, &at_v2, |c| {
                c.value = 1;
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(version, 2);
    }

    #[tokio::test]
    async fn test_transfer_and_list_owned() {
        let ledger = MemoryLedger::new();
        let alice = Address::from_bytes([0xa1; 32]);
        let bob = Address::from_bytes([0xb0; 32]);
        let c = counter(3);

        ledger.create(&c, Owner::Address(alice)).await.unwrap();
        assert_eq!(ledger.list_owned(&alice, None).await.unwrap(), vec![c.id]);

        assert!(matches!(
            ledger.transfer(&c.id, &bob, alice).await,
            Err(StoreError::NotOwner(_))
        ));

        ledger.transfer(&c.id, &alice, bob).await.unwrap();
        assert!(ledger.list_owned(&alice, None).await.unwrap().is_empty());
        assert_eq!(
            ledger
                .list_owned(&bob, Some(ObjectKind::Vault))
                .await
                .unwrap(),
            vec![c.id]
        );
    }
}
