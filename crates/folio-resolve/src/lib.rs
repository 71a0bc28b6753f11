//! # Folio Resolve
//!
//! Client-side credential resolution for sealed content.
//!
//! ## Overview
//!
//! Gated content is sealed under a key derived from its content identity.
//! A reader holds a bag of credentials; the [`Resolver`] tries them one at a
//! time against a [`DecryptionAuthority`], which runs the matching policy
//! evaluator and, on success, returns the content key wrapped to a one-time
//! X25519 key of the requester.
//!
//! ## Key Properties
//!
//! - **Fixed order**: subscription, owned token, owner, contributor, allow-list
//! - **First success wins**: later credentials are never presented
//! - **Precise failure**: an exhausted bag reports every attempt, in order
//! - **Bounded**: each attempt has a timeout; the whole run can be cancelled
//!
//! ## Message Flow
//!
//! ```text
//! Resolver                         DecryptionAuthority
//!   |-- KeyRequest(call, pubkey) ---->|  verify signature
//!   |                                 |  evaluate policy
//!   |<-------- WrappedKey ------------|  wrap content key
//!   |  unwrap, open SealedPayload     |
//! ```

pub mod authority;
pub mod cancel;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod keyshare;
pub mod protocol;

pub use authority::{
    AuthorityError, DecryptionAuthority, Invocation, KeyRequest, MasterSecret, MemoryAuthority,
    SealBackend,
};
pub use cancel::CancellationToken;
pub use crypto::{EncryptionKey, EncryptionNonce, EphemeralKeyPair, X25519PublicKey};
pub use envelope::{SealFormat, SealedPayload};
pub use error::{AttemptFailure, CredentialExhaustedError, FailureReason, ResolveError, Result};
pub use keyshare::WrappedKey;
pub use protocol::{PlanStep, ResolutionPlan, ResolutionState, ResolveConfig, Resolver};
