//! Credentials: what a reader presents to unlock gated content.
//!
//! A [`Credential`] is only a reference. The evidence it points at lives in
//! the ledger as an address-owned object (a subscription, an access token or
//! an ownership capability), or is implied by container membership.

use serde::{Deserialize, Serialize};

use folio_core::{ContentIdentity, ObjectId};
use folio_store::{LedgerObject, ObjectKind};

/// The kind of a credential, in resolution priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CredentialKind {
    Subscription,
    OwnedToken,
    Owner,
    Contributor,
    Allowlist,
}

impl CredentialKind {
    /// Fixed resolution order. Cheaper and more specific credentials first.
    pub const PRIORITY: [CredentialKind; 5] = [
        CredentialKind::Subscription,
        CredentialKind::OwnedToken,
        CredentialKind::Owner,
        CredentialKind::Contributor,
        CredentialKind::Allowlist,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CredentialKind::Subscription => "subscription",
            CredentialKind::OwnedToken => "owned-token",
            CredentialKind::Owner => "owner",
            CredentialKind::Contributor => "contributor",
            CredentialKind::Allowlist => "allowlist",
        }
    }
}

impl std::fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference to evidence the caller claims to hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Credential {
    Subscription { subscription_id: ObjectId },
    OwnedToken { token_id: ObjectId },
    Owner { capability_id: ObjectId },
    Contributor { container_id: ObjectId },
    Allowlist { container_id: ObjectId },
}

impl Credential {
    pub fn kind(&self) -> CredentialKind {
        match self {
            Credential::Subscription { .. } => CredentialKind::Subscription,
            Credential::OwnedToken { .. } => CredentialKind::OwnedToken,
            Credential::Owner { .. } => CredentialKind::Owner,
            Credential::Contributor { .. } => CredentialKind::Contributor,
            Credential::Allowlist { .. } => CredentialKind::Allowlist,
        }
    }
}

/// Time-boxed access to every item in one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: ObjectId,
    pub container_id: ObjectId,
    /// Unix milliseconds; access is granted strictly before this instant.
    pub valid_until: i64,
}

impl Subscription {
    pub fn new(container_id: ObjectId, valid_until: i64) -> Self {
        Self {
            id: ObjectId::generate(),
            container_id,
            valid_until,
        }
    }

    /// The credential reference for this subscription.
    pub fn credential(&self) -> Credential {
        Credential::Subscription {
            subscription_id: self.id,
        }
    }
}

impl LedgerObject for Subscription {
    const KIND: ObjectKind = ObjectKind::Subscription;

    fn object_id(&self) -> ObjectId {
        self.id
    }
}

/// Permanent access to exactly one content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub id: ObjectId,
    pub container_id: ObjectId,
    pub content: ContentIdentity,
}

impl AccessToken {
    /// Mint a token bound to `content`.
    pub fn new(content: ContentIdentity) -> Self {
        Self {
            id: ObjectId::generate(),
            container_id: *content.container(),
            content,
        }
    }

    pub fn credential(&self) -> Credential {
        Credential::OwnedToken { token_id: self.id }
    }
}

impl LedgerObject for AccessToken {
    const KIND: ObjectKind = ObjectKind::AccessToken;

    fn object_id(&self) -> ObjectId {
        self.id
    }
}
