//! # Folio Testkit
//!
//! Testing utilities for Folio.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Content identity encodings every implementation must agree on
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: A platform, ledger and authority wired together
//!
//! ## Golden Vectors
//!
//! ```rust
//! use folio_testkit::vectors::verify_all_vectors;
//!
//! for (name, passed) in verify_all_vectors() {
//!     assert!(passed, "{name}");
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use folio_testkit::generators::content_identity;
//!
//! proptest! {
//!     #[test]
//!     fn identity_roundtrips(id in content_identity()) {
//!         prop_assert_eq!(folio_core::decode(&id.to_bytes()), Ok(id));
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,ignore
//! use folio_testkit::fixtures::{parties, TestFixture};
//!
//! let fixture = TestFixture::new().await;
//! let (created, owner) = fixture.container(&parties(1)[0], "weekly").await;
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{days_from_now, parties, party, TestFixture, FIXTURE_MASTER};
pub use vectors::{all_vectors, reject_vectors, verify_all_vectors, GoldenVector, RejectVector};
