//! # Folio Store
//!
//! Object ledger for Folio. Provides a trait-based interface for versioned
//! object persistence with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! Ledger state is an arena of objects keyed by stable [`ObjectId`]s. Each
//! object carries a kind, an owner and a version; mutation is a
//! compare-and-swap on that version, so of two concurrent writers against
//! the same object exactly one commits.
//!
//! ## Key Types
//!
//! - [`Ledger`] - The async trait for raw object operations
//! - [`LedgerExt`] - Typed create/load/mutate/transfer on top of any ledger
//! - [`SqliteLedger`] - SQLite-based persistent storage
//! - [`MemoryLedger`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use folio_store::{LedgerExt, SqliteLedger};
//!
//! async fn example() {
//!     let ledger = SqliteLedger::open("folio.db").unwrap();
//!     // let version = ledger.create(&container, Owner::Shared).await.unwrap();
//!     // let current = ledger.load::<Container>(&container_id).await.unwrap();
//! }
//! ```
//!
//! [`ObjectId`]: folio_core::ObjectId

pub mod error;
pub mod memory;
pub mod migration;
pub mod object;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryLedger;
pub use object::{LedgerObject, ObjectKind, Owner, StoredObject, Versioned, INITIAL_VERSION};
pub use sqlite::SqliteLedger;
pub use traits::{CommitResult, InsertResult, Ledger, LedgerExt, Precondition};
