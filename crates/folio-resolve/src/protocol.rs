//! Credential resolution state machine.
//!
//! Given a sealed payload and the caller's credential bag, try each
//! credential against the decryption authority in a fixed priority order:
//! subscription, owned token, owner capability, contributor, allow-list.
//! The first credential that yields a working key wins and nothing after it
//! is tried. If none does, the caller gets every failure, in order.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use folio_core::{decode, Keypair};
use folio_policy::{Credential, CredentialKind, PolicyCall};

use crate::authority::{DecryptionAuthority, KeyRequest};
use crate::cancel::CancellationToken;
use crate::crypto::EphemeralKeyPair;
use crate::envelope::SealedPayload;
use crate::error::{AttemptFailure, CredentialExhaustedError, FailureReason, ResolveError, Result};

/// Configuration for resolution behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveConfig {
    /// Budget for one authority round trip, including unwrapping.
    pub attempt_timeout: Duration,
    /// Reject key shares whose identity digest does not match the request.
    pub verify_key_share: bool,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(10),
            verify_key_share: true,
        }
    }
}

/// Where a resolution currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionState {
    NotAttempted,
    Trying(CredentialKind),
    Succeeded(Vec<u8>),
    ExhaustedFailed(Vec<AttemptFailure>),
}

/// One planned attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep {
    pub kind: CredentialKind,
    pub credential: Credential,
}

/// The ordered attempts a resolution will make.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolutionPlan {
    steps: Vec<PlanStep>,
}

impl ResolutionPlan {
    /// Order a credential bag by priority. Credentials of the same kind
    /// keep their bag order.
    pub fn from_bag(bag: &[Credential]) -> Self {
        let mut steps: Vec<PlanStep> = bag
            .iter()
            .map(|c| PlanStep {
                kind: c.kind(),
                credential: c.clone(),
            })
            .collect();

        steps.sort_by_key(|s| priority(s.kind));
        Self { steps }
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn kinds(&self) -> Vec<CredentialKind> {
        self.steps.iter().map(|s| s.kind).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

fn priority(kind: CredentialKind) -> usize {
    CredentialKind::PRIORITY
        .iter()
        .position(|k| *k == kind)
        .unwrap_or(CredentialKind::PRIORITY.len())
}

/// Client side of the resolution protocol.
pub struct Resolver<A: DecryptionAuthority> {
    authority: Arc<A>,
    keypair: Keypair,
    config: ResolveConfig,
    state: ResolutionState,
}

impl<A: DecryptionAuthority> Resolver<A> {
    /// Create a resolver acting as `keypair`'s address.
    pub fn new(authority: Arc<A>, keypair: Keypair, config: ResolveConfig) -> Self {
        Self {
            authority,
            keypair,
            config,
            state: ResolutionState::NotAttempted,
        }
    }

    pub fn state(&self) -> &ResolutionState {
        &self.state
    }

    /// Unlock `sealed` with the first credential in `bag` that works.
    pub async fn resolve(&mut self, sealed: &SealedPayload, bag: &[Credential]) -> Result<Vec<u8>> {
        self.resolve_with_cancel(sealed, bag, &CancellationToken::new())
            .await
    }

    /// Like [`resolve`](Self::resolve), but stops early once `cancel` trips.
    ///
    /// A cancelled resolution ends in `ExhaustedFailed` with the failures
    /// collected so far and returns [`ResolveError::Cancelled`].
    pub async fn resolve_with_cancel(
        &mut self,
        sealed: &SealedPayload,
        bag: &[Credential],
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        self.state = ResolutionState::NotAttempted;

        let identity = decode(&sealed.identity)?;
        let plan = ResolutionPlan::from_bag(bag);
        let mut failures = Vec::new();

        tracing::debug!(
            container = %identity.container(),
            plan = ?plan.kinds(),
            "resolving content key"
        );

        for step in plan.steps() {
            if cancel.is_cancelled() {
                return Err(self.cancelled(failures));
            }

            self.state = ResolutionState::Trying(step.kind);

            let call = PolicyCall::new(
                sealed.identity.clone(),
                *identity.container(),
                step.credential.clone(),
            );
            let attempt =
                tokio::time::timeout(self.config.attempt_timeout, self.attempt(sealed, call));

            let outcome = tokio::select! {
                _ = cancel.cancelled() => None,
                outcome = attempt => Some(outcome),
            };
            let Some(outcome) = outcome else {
                return Err(self.cancelled(failures));
            };

            let reason = match outcome {
                Ok(Ok(plaintext)) => {
                    tracing::debug!(
                        container = %identity.container(),
                        kind = %step.kind,
                        failed_before = failures.len(),
                        "content key resolved"
                    );
                    self.state = ResolutionState::Succeeded(plaintext.clone());
                    return Ok(plaintext);
                }
                Ok(Err(reason)) => reason,
                Err(_) => FailureReason::Timeout(self.config.attempt_timeout),
            };

            tracing::debug!(kind = %step.kind, %reason, "credential attempt failed");
            failures.push(AttemptFailure {
                kind: step.kind,
                reason,
            });
        }

        tracing::info!(
            container = %identity.container(),
            attempts = failures.len(),
            "credentials exhausted"
        );
        self.state = ResolutionState::ExhaustedFailed(failures.clone());
        Err(CredentialExhaustedError { reasons: failures }.into())
    }

    /// Unlock content in an open container without presenting a credential.
    pub async fn resolve_free(&mut self, sealed: &SealedPayload) -> Result<Vec<u8>> {
        self.state = ResolutionState::NotAttempted;

        let identity = decode(&sealed.identity)?;
        let call = PolicyCall::free(sealed.identity.clone(), *identity.container());

        let outcome =
            tokio::time::timeout(self.config.attempt_timeout, self.attempt(sealed, call)).await;
        let reason = match outcome {
            Ok(Ok(plaintext)) => {
                self.state = ResolutionState::Succeeded(plaintext.clone());
                return Ok(plaintext);
            }
            Ok(Err(reason)) => reason,
            Err(_) => FailureReason::Timeout(self.config.attempt_timeout),
        };

        tracing::debug!(container = %identity.container(), %reason, "free read refused");
        self.state = ResolutionState::ExhaustedFailed(Vec::new());
        Err(ResolveError::NotOpen(reason))
    }

    fn cancelled(&mut self, failures: Vec<AttemptFailure>) -> ResolveError {
        tracing::debug!(attempts = failures.len(), "resolution cancelled");
        self.state = ResolutionState::ExhaustedFailed(failures.clone());
        ResolveError::Cancelled { reasons: failures }
    }

    async fn attempt(
        &self,
        sealed: &SealedPayload,
        call: PolicyCall,
    ) -> std::result::Result<Vec<u8>, FailureReason> {
        let ephemeral = EphemeralKeyPair::generate();
        let request = KeyRequest::sign(&self.keypair, call, ephemeral.public_key())
            .map_err(|e| FailureReason::Authority(e.to_string()))?;

        let share = self.authority.fetch_key(&request).await?;

        if self.config.verify_key_share && !share.is_for(&sealed.identity) {
            return Err(FailureReason::KeyShareMismatch);
        }

        let key = share
            .unwrap_key(ephemeral, &sealed.identity)
            .map_err(|e| FailureReason::Decryption(e.to_string()))?;

        sealed
            .open(&key)
            .map_err(|e| FailureReason::Decryption(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::ObjectId;

    #[test]
    fn test_plan_follows_priority() {
        let c = ObjectId::from_bytes([1; 32]);
        let bag = vec![
            Credential::Allowlist { container_id: c },
            Credential::Owner {
                capability_id: ObjectId::from_bytes([2; 32]),
            },
            Credential::Contributor { container_id: c },
            Credential::Subscription {
                subscription_id: ObjectId::from_bytes([3; 32]),
            },
            Credential::OwnedToken {
                token_id: ObjectId::from_bytes([4; 32]),
            },
        ];

        let plan = ResolutionPlan::from_bag(&bag);
        assert_eq!(plan.kinds(), CredentialKind::PRIORITY.to_vec());
    }

    #[test]
    fn test_plan_keeps_bag_order_within_kind() {
        let first = Credential::Subscription {
            subscription_id: ObjectId::from_bytes([1; 32]),
        };
        let second = Credential::Subscription {
            subscription_id: ObjectId::from_bytes([2; 32]),
        };
        let owner = Credential::Owner {
            capability_id: ObjectId::from_bytes([3; 32]),
        };

        let plan = ResolutionPlan::from_bag(&[owner.clone(), first.clone(), second.clone()]);
        let credentials: Vec<_> = plan.steps().iter().map(|s| s.credential.clone()).collect();
        assert_eq!(credentials, vec![first, second, owner]);
    }

    #[test]
    fn test_empty_plan() {
        assert!(ResolutionPlan::from_bag(&[]).is_empty());
    }
}
