//! Decryption authority seam.
//!
//! A [`DecryptionAuthority`] holds the keys to sealed content and releases a
//! content key only when a policy evaluator allows the request. Requests are
//! signed by the acting address; the authority, not the caller, supplies the
//! current time.
//!
//! [`MemoryAuthority`] is the in-process implementation: per-identity keys
//! derived from one master secret, policy checks through a
//! [`PolicyEngine`], and an invocation log for tests and audit.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use folio_core::{now_millis, Address, ContentIdentity, CoreError, Keypair, Signature};
use folio_policy::{CredentialKind, DenyReason, EvalContext, PolicyCall, PolicyEngine};
use folio_store::Ledger;

use crate::crypto::{EncryptionKey, X25519PublicKey};
use crate::envelope::SealedPayload;
use crate::error::{FailureReason, ResolveError, Result};
use crate::keyshare::WrappedKey;

/// Errors returned by a decryption authority.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorityError {
    #[error("request signature invalid")]
    BadSignature,

    #[error("denied: {0}")]
    Denied(DenyReason),

    #[error("authority unavailable: {0}")]
    Unavailable(String),
}

impl From<AuthorityError> for FailureReason {
    fn from(err: AuthorityError) -> Self {
        match err {
            AuthorityError::Denied(reason) => FailureReason::Denied(reason),
            other => FailureReason::Authority(other.to_string()),
        }
    }
}

/// A signed request for the key to one content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRequest {
    pub actor: Address,
    pub call: PolicyCall,
    /// Requester's per-attempt X25519 key; the share is wrapped to it.
    pub reply_to: X25519PublicKey,
    pub signature: Signature,
}

const KEY_REQUEST_DOMAIN: &str = "folio-key-request-v1";

fn signing_bytes(
    actor: &Address,
    call: &PolicyCall,
    reply_to: &X25519PublicKey,
) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(&(KEY_REQUEST_DOMAIN, actor, call, reply_to), &mut buf)
        .map_err(|e| ResolveError::Serialization(e.to_string()))?;
    Ok(buf)
}

impl KeyRequest {
    /// Build and sign a request as `keypair`'s address.
    pub fn sign(keypair: &Keypair, call: PolicyCall, reply_to: X25519PublicKey) -> Result<Self> {
        let actor = keypair.address();
        let signature = keypair.sign(&signing_bytes(&actor, &call, &reply_to)?);
        Ok(Self {
            actor,
            call,
            reply_to,
            signature,
        })
    }

    /// Check the signature against `actor`.
    pub fn verify(&self) -> std::result::Result<(), CoreError> {
        let bytes = signing_bytes(&self.actor, &self.call, &self.reply_to)
            .map_err(|e| CoreError::EncodingError(e.to_string()))?;
        self.actor.verify(&bytes, &self.signature)
    }
}

/// Releases content keys to callers that pass policy.
#[async_trait]
pub trait DecryptionAuthority: Send + Sync {
    async fn fetch_key(
        &self,
        request: &KeyRequest,
    ) -> std::result::Result<WrappedKey, AuthorityError>;
}

#[async_trait]
impl<A: DecryptionAuthority + ?Sized> DecryptionAuthority for Arc<A> {
    async fn fetch_key(
        &self,
        request: &KeyRequest,
    ) -> std::result::Result<WrappedKey, AuthorityError> {
        (**self).fetch_key(request).await
    }
}

/// Seals plaintext under a content identity.
pub trait SealBackend: Send + Sync {
    fn seal(&self, identity: &ContentIdentity, plaintext: &[u8]) -> Result<SealedPayload>;
}

/// Root secret from which per-identity content keys are derived.
pub struct MasterSecret([u8; 32]);

impl MasterSecret {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The content key for `identity`.
    pub fn content_key(&self, identity: &[u8]) -> EncryptionKey {
        let mut hasher = blake3::Hasher::new_derive_key("folio-seal-v1 content key");
        hasher.update(&self.0);
        hasher.update(identity);
        EncryptionKey::from_bytes(*hasher.finalize().as_bytes())
    }
}

/// One call to [`MemoryAuthority::fetch_key`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub actor: Address,
    /// `None` for a free (open container) check.
    pub kind: Option<CredentialKind>,
    pub allowed: bool,
}

/// In-process decryption authority backed by a ledger.
pub struct MemoryAuthority<L: Ledger> {
    master: MasterSecret,
    engine: PolicyEngine<L>,
    fixed_now: Option<i64>,
    latency: Option<Duration>,
    invocations: Mutex<Vec<Invocation>>,
}

impl<L: Ledger> MemoryAuthority<L> {
    pub fn new(ledger: Arc<L>, master: MasterSecret) -> Self {
        Self {
            master,
            engine: PolicyEngine::new(ledger),
            fixed_now: None,
            latency: None,
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// Evaluate policies at a fixed time instead of the wall clock.
    pub fn with_time(mut self, now: i64) -> Self {
        self.fixed_now = Some(now);
        self
    }

    /// Delay every answer, to simulate a slow remote authority.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Calls made so far, oldest first.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    fn record(&self, invocation: Invocation) {
        match self.invocations.lock() {
            Ok(mut log) => log.push(invocation),
            Err(_) => tracing::warn!(
                actor = %invocation.actor,
                "invocation log poisoned, call not recorded"
            ),
        }
    }
}

impl<L: Ledger> SealBackend for MemoryAuthority<L> {
    fn seal(&self, identity: &ContentIdentity, plaintext: &[u8]) -> Result<SealedPayload> {
        let key = self.master.content_key(&identity.to_bytes());
        SealedPayload::seal(identity, plaintext, &key)
    }
}

#[async_trait]
impl<L: Ledger> DecryptionAuthority for MemoryAuthority<L> {
    async fn fetch_key(
        &self,
        request: &KeyRequest,
    ) -> std::result::Result<WrappedKey, AuthorityError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if request.verify().is_err() {
            tracing::warn!(actor = %request.actor, "key request with bad signature");
            return Err(AuthorityError::BadSignature);
        }

        let ctx = EvalContext::new(request.actor, self.fixed_now.unwrap_or_else(now_millis));
        let decision = self
            .engine
            .evaluate(&request.call, &ctx)
            .await
            .map_err(|e| AuthorityError::Unavailable(e.to_string()))?;

        self.record(Invocation {
            actor: request.actor,
            kind: request.call.credential.as_ref().map(|c| c.kind()),
            allowed: decision.is_allow(),
        });

        decision.into_result().map_err(AuthorityError::Denied)?;

        let key = self.master.content_key(&request.call.identity);
        WrappedKey::wrap(&key, &request.call.identity, &request.reply_to)
            .map_err(|e| AuthorityError::Unavailable(e.to_string()))
    }
}
