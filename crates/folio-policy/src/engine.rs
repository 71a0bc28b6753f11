//! Ledger-backed policy engine.
//!
//! The engine is the call surface a decryption authority invokes. It loads
//! the container and the evidence a credential points at, verifies that the
//! acting address holds any address-owned evidence, then hands off to the
//! pure evaluators.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use folio_core::ObjectId;
use folio_perms::{Container, OwnershipCapability};
use folio_store::{Ledger, LedgerExt, LedgerObject, StoreError};

use crate::credential::{AccessToken, Credential, Subscription};
use crate::decision::{Decision, DenyReason};
use crate::error::Result;
use crate::evaluator::{self, EvalContext, Evidence};

/// One policy check: identity bytes plus the evidence to check them against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyCall {
    /// Encoded content identity.
    pub identity: Vec<u8>,
    /// Container the identity is expected to name.
    pub container_id: ObjectId,
    /// `None` runs the free evaluator.
    pub credential: Option<Credential>,
}

impl PolicyCall {
    pub fn new(identity: Vec<u8>, container_id: ObjectId, credential: Credential) -> Self {
        Self {
            identity,
            container_id,
            credential: Some(credential),
        }
    }

    /// A call that only passes for open containers.
    pub fn free(identity: Vec<u8>, container_id: ObjectId) -> Self {
        Self {
            identity,
            container_id,
            credential: None,
        }
    }
}

/// Evaluates [`PolicyCall`]s against ledger state.
pub struct PolicyEngine<L: Ledger> {
    ledger: Arc<L>,
}

impl<L: Ledger> Clone for PolicyEngine<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
        }
    }
}

impl<L: Ledger> PolicyEngine<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    /// Evaluate a call. Ledger failures are errors; every policy outcome,
    /// including missing evidence, is a [`Decision`].
    pub async fn evaluate(&self, call: &PolicyCall, ctx: &EvalContext) -> Result<Decision> {
        let decision = self.decide(call, ctx).await?;

        match &decision {
            Decision::Allow => tracing::debug!(
                container = %call.container_id,
                kind = call.credential.as_ref().map_or("free", |c| c.kind().as_str()),
                actor = %ctx.actor,
                "policy allowed"
            ),
            Decision::Deny(reason) => tracing::debug!(
                container = %call.container_id,
                kind = call.credential.as_ref().map_or("free", |c| c.kind().as_str()),
                actor = %ctx.actor,
                %reason,
                "policy denied"
            ),
        }

        Ok(decision)
    }

    async fn decide(&self, call: &PolicyCall, ctx: &EvalContext) -> Result<Decision> {
        let container = match self.find::<Container>(&call.container_id).await? {
            Some(c) => c,
            None => return Ok(DenyReason::ContainerNotFound(call.container_id).into()),
        };
        let identity = call.identity.as_slice();

        let decision = match &call.credential {
            None => evaluator::evaluate(identity, Evidence::Free, &container, ctx),
            Some(Credential::Subscription { subscription_id }) => {
                match self.held::<Subscription>(subscription_id, ctx).await? {
                    Ok(sub) => evaluator::evaluate(
                        identity,
                        Evidence::Subscription(&sub),
                        &container,
                        ctx,
                    ),
                    Err(reason) => reason.into(),
                }
            }
            Some(Credential::OwnedToken { token_id }) => {
                match self.held::<AccessToken>(token_id, ctx).await? {
                    Ok(token) => {
                        evaluator::evaluate(identity, Evidence::OwnedToken(&token), &container, ctx)
                    }
                    Err(reason) => reason.into(),
                }
            }
            Some(Credential::Owner { capability_id }) => {
                match self.held::<OwnershipCapability>(capability_id, ctx).await? {
                    Ok(cap) => {
                        evaluator::evaluate(identity, Evidence::Owner(&cap), &container, ctx)
                    }
                    Err(reason) => reason.into(),
                }
            }
            Some(Credential::Contributor { container_id }) => {
                match same_container(call, container_id) {
                    Ok(()) => evaluator::evaluate(identity, Evidence::Contributor, &container, ctx),
                    Err(reason) => reason.into(),
                }
            }
            Some(Credential::Allowlist { container_id }) => {
                match same_container(call, container_id) {
                    Ok(()) => evaluator::evaluate(identity, Evidence::Allowlist, &container, ctx),
                    Err(reason) => reason.into(),
                }
            }
        };

        Ok(decision)
    }

    /// Load an object, treating absence or a kind mismatch as "not there".
    async fn find<T: LedgerObject>(&self, id: &ObjectId) -> Result<Option<T>> {
        match self.ledger.load::<T>(id).await {
            Ok(v) => Ok(Some(v.object)),
            Err(StoreError::NotFound(_)) | Err(StoreError::KindMismatch { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Load an address-owned credential object held by the acting address.
    async fn held<T: LedgerObject>(
        &self,
        id: &ObjectId,
        ctx: &EvalContext,
    ) -> Result<std::result::Result<T, DenyReason>> {
        let versioned = match self.ledger.load::<T>(id).await {
            Ok(v) => v,
            Err(StoreError::NotFound(_)) | Err(StoreError::KindMismatch { .. }) => {
                return Ok(Err(DenyReason::CredentialNotFound(*id)))
            }
            Err(e) => return Err(e.into()),
        };

        if !versioned.owner.is_held_by(&ctx.actor) {
            return Ok(Err(DenyReason::NotCredentialHolder(*id)));
        }
        Ok(Ok(versioned.object))
    }
}

fn same_container(
    call: &PolicyCall,
    credential_container: &ObjectId,
) -> std::result::Result<(), DenyReason> {
    if &call.container_id != credential_container {
        return Err(DenyReason::WrongContainer {
            expected: call.container_id,
            actual: *credential_container,
        });
    }
    Ok(())
}
