//! Ledger trait: the abstract interface for object persistence.
//!
//! This trait allows Folio to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use folio_core::{Address, ObjectId};

use crate::error::{Result, StoreError};
use crate::object::{LedgerObject, ObjectKind, Owner, StoredObject, Versioned};

/// Result of inserting an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertResult {
    /// Object was inserted at its initial version.
    Inserted,
    /// An object with this id already exists.
    AlreadyExists,
}

/// Result of a version-checked commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitResult {
    /// The write won; the object is now at `version`.
    Committed { version: u64 },
    /// Another write committed first; the object is at `current`.
    Stale { current: u64 },
    /// No object with this id exists.
    Missing,
    /// A guarded object moved on; nothing was written. `current` is `None`
    /// when the guarded object no longer exists.
    PreconditionFailed { id: ObjectId, current: Option<u64> },
}

/// A version another object must still be at for a commit to apply.
///
/// Used when a write to one object was authorized by reading another: the
/// write only lands if the object it was checked against is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precondition {
    pub id: ObjectId,
    pub version: u64,
}

impl Precondition {
    pub fn new(id: ObjectId, version: u64) -> Self {
        Self { id, version }
    }
}

/// The Ledger trait: async interface for versioned object persistence.
///
/// # Design Notes
///
/// - **Single writer per version**: `commit_object` only succeeds when the
///   caller's expected version equals the stored version, so of two writers
///   that read the same version exactly one wins.
/// - **No partial writes**: a commit replaces owner and payload together.
/// - **Guarded commits**: `commit_guarded` checks every precondition and the
///   target version under one lock or transaction.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Insert a new object. Its version must be the initial version.
    async fn insert_object(&self, object: &StoredObject) -> Result<InsertResult>;

    /// Get an object by id.
    async fn get_object(&self, id: &ObjectId) -> Result<Option<StoredObject>>;

    /// Check if an object exists.
    async fn has_object(&self, id: &ObjectId) -> Result<bool>;

    /// Replace an object's owner and payload if it is still at `expected_version`.
    async fn commit_object(
        &self,
        id: &ObjectId,
        expected_version: u64,
        owner: &Owner,
        data: &[u8],
    ) -> Result<CommitResult> {
        self.commit_guarded(id, expected_version, owner, data, &[])
            .await
    }

    /// Like [`commit_object`](Ledger::commit_object), but only if every
    /// object in `preconditions` is still at its stated version.
    async fn commit_guarded(
        &self,
        id: &ObjectId,
        expected_version: u64,
        owner: &Owner,
        data: &[u8],
        preconditions: &[Precondition],
    ) -> Result<CommitResult>;

    /// List ids of objects held by `owner`, optionally filtered by kind.
    async fn list_owned(&self, owner: &Address, kind: Option<ObjectKind>)
        -> Result<Vec<ObjectId>>;
}

/// Extension trait with typed access on top of [`Ledger`].
pub trait LedgerExt: Ledger {
    /// Insert a new typed object and return its initial version.
    fn create<T: LedgerObject>(
        &self,
        object: &T,
        owner: Owner,
    ) -> impl std::future::Future<Output = Result<u64>> + Send;

    /// Load and decode a typed object.
    fn load<T: LedgerObject>(
        &self,
        id: &ObjectId,
    ) -> impl std::future::Future<Output = Result<Versioned<T>>> + Send;

    /// Read-modify-write a typed object under a version check.
    ///
    /// If `f` returns an error nothing is committed. If another write lands
    /// between the read and the commit, `StoreError::VersionConflict` is
    /// returned and the closure's changes are discarded.
    fn mutate<T, R, E, F>(
        &self,
        id: &ObjectId,
        f: F,
    ) -> impl std::future::Future<Output = std::result::Result<(R, u64), E>> + Send
    where
        T: LedgerObject,
        R: Send,
        E: From<StoreError> + Send,
        F: FnOnce(&mut T) -> std::result::Result<R, E> + Send;

    /// [`mutate`](LedgerExt::mutate) that only commits while every object in
    /// `preconditions` is unchanged.
    fn mutate_guarded<T, R, E, F>(
        &self,
        id: &ObjectId,
        preconditions: &[Precondition],
        f: F,
    ) -> impl std::future::Future<Output = std::result::Result<(R, u64), E>> + Send
    where
        T: LedgerObject,
        R: Send,
        E: From<StoreError> + Send,
        F: FnOnce(&mut T) -> std::result::Result<R, E> + Send;

    /// Move an address-owned object to a new owner.
    fn transfer(
        &self,
        id: &ObjectId,
        from: &Address,
        to: Address,
    ) -> impl std::future::Future<Output = Result<u64>> + Send;
}

impl<L: Ledger + ?Sized> LedgerExt for L {
    async fn create<T: LedgerObject>(&self, object: &T, owner: Owner) -> Result<u64> {
        let stored = StoredObject::encode(object, owner)?;
        match self.insert_object(&stored).await? {
            InsertResult::Inserted => Ok(stored.version),
            InsertResult::AlreadyExists => Err(StoreError::AlreadyExists(stored.id)),
        }
    }

    async fn load<T: LedgerObject>(&self, id: &ObjectId) -> Result<Versioned<T>> {
        self.get_object(id)
            .await?
            .ok_or(StoreError::NotFound(*id))?
            .decode()
    }

    async fn mutate<T, R, E, F>(&self, id: &ObjectId, f: F) -> std::result::Result<(R, u64), E>
    where
        T: LedgerObject,
        R: Send,
        E: From<StoreError> + Send,
        F: FnOnce(&mut T) -> std::result::Result<R, E> + Send,
    {
        self.mutate_guarded(id, &[], f).await
    }

    async fn mutate_guarded<T, R, E, F>(
        &self,
        id: &ObjectId,
        preconditions: &[Precondition],
        f: F,
    ) -> std::result::Result<(R, u64), E>
    where
        T: LedgerObject,
        R: Send,
        E: From<StoreError> + Send,
        F: FnOnce(&mut T) -> std::result::Result<R, E> + Send,
    {
        let Versioned {
            mut object,
            version,
            owner,
        } = self.load::<T>(id).await?;

        let out = f(&mut object)?;
        let data = object.to_bytes()?;

        let result = self
            .commit_guarded(id, version, &owner, &data, preconditions)
            .await?;
        match result {
            CommitResult::Committed { version } => Ok((out, version)),
            CommitResult::Stale { current } => Err(StoreError::VersionConflict {
                id: *id,
                expected: version,
                current,
            }
            .into()),
            CommitResult::Missing => Err(StoreError::NotFound(*id).into()),
            CommitResult::PreconditionFailed { id, current } => {
                Err(precondition_error(preconditions, id, current).into())
            }
        }
    }

    async fn transfer(&self, id: &ObjectId, from: &Address, to: Address) -> Result<u64> {
        let stored = self
            .get_object(id)
            .await?
            .ok_or(StoreError::NotFound(*id))?;

        if !stored.owner.is_held_by(from) {
            return Err(StoreError::NotOwner(*id));
        }

        match self
            .commit_object(id, stored.version, &Owner::Address(to), &stored.data)
            .await?
        {
            CommitResult::Committed { version } => Ok(version),
            CommitResult::Stale { current } => Err(StoreError::VersionConflict {
                id: *id,
                expected: stored.version,
                current,
            }),
            CommitResult::Missing => Err(StoreError::NotFound(*id)),
            CommitResult::PreconditionFailed { id, current } => {
                Err(precondition_error(&[], id, current))
            }
        }
    }
}

fn precondition_error(
    preconditions: &[Precondition],
    id: ObjectId,
    current: Option<u64>,
) -> StoreError {
    let expected = preconditions
        .iter()
        .find(|p| p.id == id)
        .map_or(0, |p| p.version);

    match current {
        Some(current) => StoreError::VersionConflict {
            id,
            expected,
            current,
        },
        None => StoreError::NotFound(id),
    }
}
