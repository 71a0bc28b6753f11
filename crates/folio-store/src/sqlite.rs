//! SQLite implementation of the Ledger trait.
//!
//! This is the primary storage backend for Folio. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension};

use folio_core::{now_millis, Address, ObjectId};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::object::{ObjectKind, Owner, StoredObject, INITIAL_VERSION};
use crate::traits::{CommitResult, InsertResult, Ledger, Precondition};

/// SQLite-based ledger implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteLedger {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLedger {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking closure against the connection on the blocking pool.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|e| {
                StoreError::Database(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
                    Some(format!("mutex poisoned: {}", e)),
                ))
            })?;
            f(&mut conn)
        })
        .await
        .map_err(|e| {
            StoreError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
                Some(format!("spawn_blocking failed: {}", e)),
            ))
        })?
    }
}

fn owner_columns(owner: &Owner) -> (i64, Option<Vec<u8>>) {
    match owner {
        Owner::Shared => (0, None),
        Owner::Address(a) => (1, Some(a.as_bytes().to_vec())),
        Owner::Immutable => (2, None),
    }
}

fn owner_from_columns(kind: i64, owner: Option<Vec<u8>>) -> Result<Owner> {
    match (kind, owner) {
        (0, _) => Ok(Owner::Shared),
        (2, _) => Ok(Owner::Immutable),
        (1, Some(bytes)) => {
            let arr: [u8; 32] = bytes
                .try_into()
                .map_err(|_| StoreError::InvalidData("owner must be 32 bytes".into()))?;
            Ok(Owner::Address(Address::from_bytes(arr)))
        }
        (k, _) => Err(StoreError::InvalidData(format!("bad owner kind {}", k))),
    }
}

fn object_version(conn: &Connection, id: &ObjectId) -> Result<Option<u64>> {
    let version: Option<i64> = conn
        .query_row(
            "SELECT version FROM objects WHERE object_id = ?1",
            params![id.as_bytes().as_slice()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(version.map(|v| v as u64))
}

// Raw column values, decoded outside the rusqlite row closure so that
// malformed data maps to a StoreError rather than a rusqlite error.
struct RawRow {
    id: Vec<u8>,
    kind: i64,
    version: i64,
    owner_kind: i64,
    owner: Option<Vec<u8>>,
    data: Vec<u8>,
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        id: row.get("object_id")?,
        kind: row.get("kind")?,
        version: row.get("version")?,
        owner_kind: row.get("owner_kind")?,
        owner: row.get("owner")?,
        data: row.get("data")?,
    })
}

impl TryFrom<RawRow> for StoredObject {
    type Error = StoreError;

    fn try_from(raw: RawRow) -> Result<Self> {
        let id = ObjectId::try_from(raw.id.as_slice())
            .map_err(|_| StoreError::InvalidData("object id must be 32 bytes".into()))?;
        let kind = u16::try_from(raw.kind)
            .ok()
            .and_then(ObjectKind::from_u16)
            .ok_or_else(|| StoreError::InvalidData(format!("unknown object kind {}", raw.kind)))?;

        Ok(StoredObject {
            id,
            kind,
            version: raw.version as u64,
            owner: owner_from_columns(raw.owner_kind, raw.owner)?,
            data: Bytes::from(raw.data),
        })
    }
}

#[async_trait]
impl Ledger for SqliteLedger {
    async fn insert_object(&self, object: &StoredObject) -> Result<InsertResult> {
        if object.version != INITIAL_VERSION {
            return Err(StoreError::InvalidData(format!(
                "new object {} must start at version {}",
                object.id, INITIAL_VERSION
            )));
        }

        let object = object.clone();

        self.with_conn(move |conn| {
            let (owner_kind, owner) = owner_columns(&object.owner);
            let now = now_millis();

            let inserted = conn.execute(
                "INSERT OR IGNORE INTO objects (
                    object_id, kind, version, owner_kind, owner, data, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    object.id.as_bytes().as_slice(),
                    object.kind.to_u16() as i64,
                    object.version as i64,
                    owner_kind,
                    owner,
                    object.data.as_ref(),
                    now,
                ],
            )?;

            if inserted == 0 {
                Ok(InsertResult::AlreadyExists)
            } else {
                Ok(InsertResult::Inserted)
            }
        })
        .await
    }

    async fn get_object(&self, id: &ObjectId) -> Result<Option<StoredObject>> {
        let id = *id;

        self.with_conn(move |conn| {
            let raw = conn
                .query_row(
                    "SELECT object_id, kind, version, owner_kind, owner, data
                     FROM objects WHERE object_id = ?1",
                    params![id.as_bytes().as_slice()],
                    read_row,
                )
                .optional()?;

            raw.map(StoredObject::try_from).transpose()
        })
        .await
    }

    async fn has_object(&self, id: &ObjectId) -> Result<bool> {
        let id = *id;

        self.with_conn(move |conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM objects WHERE object_id = ?1",
                    params![id.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    async fn commit_guarded(
        &self,
        id: &ObjectId,
        expected_version: u64,
        owner: &Owner,
        data: &[u8],
        preconditions: &[Precondition],
    ) -> Result<CommitResult> {
        let id = *id;
        let owner = *owner;
        let data = data.to_vec();
        let preconditions = preconditions.to_vec();

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            for p in &preconditions {
                let current = object_version(&tx, &p.id)?;
                if current != Some(p.version) {
                    return Ok(CommitResult::PreconditionFailed { id: p.id, current });
                }
            }

            let (owner_kind, owner) = owner_columns(&owner);
            let updated = tx.execute(
                "UPDATE objects
                 SET version = version + 1, owner_kind = ?1, owner = ?2, data = ?3, updated_at = ?4
                 WHERE object_id = ?5 AND version = ?6",
                params![
                    owner_kind,
                    owner,
                    data,
                    now_millis(),
                    id.as_bytes().as_slice(),
                    expected_version as i64,
                ],
            )?;

            if updated == 1 {
                tx.commit()?;
                return Ok(CommitResult::Committed {
                    version: expected_version + 1,
                });
            }

            Ok(match object_version(&tx, &id)? {
                Some(current) => CommitResult::Stale { current },
                None => CommitResult::Missing,
            })
        })
        .await
    }

    async fn list_owned(
        &self,
        owner: &Address,
        kind: Option<ObjectKind>,
    ) -> Result<Vec<ObjectId>> {
        let owner = *owner;

        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT object_id, kind FROM objects
                 WHERE owner_kind = 1 AND owner = ?1
                 ORDER BY object_id",
            )?;

            let rows = stmt.query_map(params![owner.as_bytes().as_slice()], |row| {
                Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, i64>(1)?))
            })?;

            let mut ids = Vec::new();
            for row in rows {
                let (id_bytes, raw_kind) = row?;
                let matches_kind = kind.map_or(true, |k| k.to_u16() as i64 == raw_kind);
                if matches_kind {
                    let id = ObjectId::try_from(id_bytes.as_slice()).map_err(|_| {
                        StoreError::InvalidData("object id must be 32 bytes".into())
                    })?;
                    ids.push(id);
                }
            }
            Ok(ids)
        })
        .await
    }
}
