//! Authorization proofs.

use folio_core::{Address, ObjectId};

/// How an actor was authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPath {
    /// The actor presented the container's ownership capability.
    Owner,
    /// The actor is in the container's contributor set.
    Contributor,
}

/// Proof that `actor` passed the owner-or-contributor check on a container.
///
/// Only [`Container::authorize`](crate::Container::authorize) produces one.
/// Vault mutations and content creation take it by reference instead of
/// re-checking membership themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorized {
    container_id: ObjectId,
    actor: Address,
    via: AuthPath,
}

impl Authorized {
    pub(crate) fn new(container_id: ObjectId, actor: Address, via: AuthPath) -> Self {
        Self {
            container_id,
            actor,
            via,
        }
    }

    pub fn container_id(&self) -> ObjectId {
        self.container_id
    }

    pub fn actor(&self) -> Address {
        self.actor
    }

    pub fn via(&self) -> AuthPath {
        self.via
    }
}
