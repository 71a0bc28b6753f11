//! Pure policy evaluators.
//!
//! Each evaluator binds an identity to one kind of evidence and one rule.
//! All of them decode the identity first and check that it names the
//! container passed alongside, so a valid credential for one container can
//! never unlock content of another. None of them touch the ledger; loading
//! evidence and checking who holds it is the engine's job.

use folio_core::{decode, Address, ContentIdentity};
use folio_perms::{AccessMode, Container, OwnershipCapability};

use crate::credential::{AccessToken, Subscription};
use crate::decision::{Decision, DenyReason, ExpiredCredentialError};

/// Ambient context of an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalContext {
    /// The address the request is authenticated as.
    pub actor: Address,
    /// Current time in Unix milliseconds.
    pub now: i64,
}

impl EvalContext {
    pub fn new(actor: Address, now: i64) -> Self {
        Self { actor, now }
    }
}

/// Loaded evidence for one evaluation.
#[derive(Debug, Clone, Copy)]
pub enum Evidence<'a> {
    /// No credential; only open containers pass.
    Free,
    Subscription(&'a Subscription),
    OwnedToken(&'a AccessToken),
    Owner(&'a OwnershipCapability),
    Contributor,
    Allowlist,
}

fn bind(identity: &[u8], container: &Container) -> Result<ContentIdentity, DenyReason> {
    let decoded = decode(identity)?;
    decoded.ensure_container(&container.id())?;
    Ok(decoded)
}

/// Dispatch to the evaluator for `evidence`.
pub fn evaluate(
    identity: &[u8],
    evidence: Evidence<'_>,
    container: &Container,
    ctx: &EvalContext,
) -> Decision {
    match evidence {
        Evidence::Free => free(identity, container),
        Evidence::Subscription(sub) => subscription(identity, sub, container, ctx),
        Evidence::OwnedToken(token) => owned_token(identity, token, container),
        Evidence::Owner(cap) => owner(identity, cap, container),
        Evidence::Contributor => contributor(identity, container, ctx),
        Evidence::Allowlist => allowlist(identity, container, ctx),
    }
}

/// Allow iff the container is open.
pub fn free(identity: &[u8], container: &Container) -> Decision {
    if let Err(reason) = bind(identity, container) {
        return reason.into();
    }
    match container.access() {
        AccessMode::Open => Decision::Allow,
        AccessMode::Gated => DenyReason::Gated.into(),
    }
}

/// Allow iff `cap` is bound to the identity's container.
pub fn owner(identity: &[u8], cap: &OwnershipCapability, container: &Container) -> Decision {
    if let Err(reason) = bind(identity, container) {
        return reason.into();
    }
    if container.is_owner(cap) {
        Decision::Allow
    } else {
        DenyReason::NotOwner.into()
    }
}

/// Allow iff the acting address is a contributor.
pub fn contributor(identity: &[u8], container: &Container, ctx: &EvalContext) -> Decision {
    if let Err(reason) = bind(identity, container) {
        return reason.into();
    }
    if container.is_contributor(&ctx.actor) {
        Decision::Allow
    } else {
        DenyReason::NotContributor(ctx.actor).into()
    }
}

/// Allow iff the subscription covers this container and `now < valid_until`.
pub fn subscription(
    identity: &[u8],
    sub: &Subscription,
    container: &Container,
    ctx: &EvalContext,
) -> Decision {
    let decoded = match bind(identity, container) {
        Ok(d) => d,
        Err(reason) => return reason.into(),
    };
    if &sub.container_id != decoded.container() {
        return DenyReason::WrongContainer {
            expected: *decoded.container(),
            actual: sub.container_id,
        }
        .into();
    }
    if ctx.now >= sub.valid_until {
        return DenyReason::Expired(ExpiredCredentialError {
            valid_until: sub.valid_until,
            now: ctx.now,
        })
        .into();
    }
    Decision::Allow
}

/// Allow iff the token is bound to exactly this content item.
pub fn owned_token(identity: &[u8], token: &AccessToken, container: &Container) -> Decision {
    let decoded = match bind(identity, container) {
        Ok(d) => d,
        Err(reason) => return reason.into(),
    };
    if token.content == decoded {
        Decision::Allow
    } else {
        DenyReason::TokenMismatch.into()
    }
}

/// Allow iff the acting address is on the container's allow-list.
pub fn allowlist(identity: &[u8], container: &Container, ctx: &EvalContext) -> Decision {
    if let Err(reason) = bind(identity, container) {
        return reason.into();
    }
    if container.is_allowlisted(&ctx.actor) {
        Decision::Allow
    } else {
        DenyReason::NotAllowlisted(ctx.actor).into()
    }
}
