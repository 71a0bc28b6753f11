//! # Folio Policy
//!
//! Credentials and the evaluators that check them.
//!
//! Six independent predicates decide whether a caller may unlock content
//! named by an identity: free, owner, contributor, subscription, owned-token
//! and allow-list. The evaluators in [`evaluator`] are pure; the
//! [`PolicyEngine`] loads their evidence from a ledger.

pub mod credential;
pub mod decision;
pub mod engine;
pub mod error;
pub mod evaluator;

pub use credential::{AccessToken, Credential, CredentialKind, Subscription};
pub use decision::{Decision, DenyReason, ExpiredCredentialError};
pub use engine::{PolicyCall, PolicyEngine};
pub use error::{PolicyError, Result};
pub use evaluator::{EvalContext, Evidence};
