//! Containers and their authorization model.
//!
//! A container never records an owner address. Ownership is proven by
//! presenting the [`OwnershipCapability`] bound to the container's id, and
//! contributors are a small explicit set managed by the capability holder.
//! Owner and contributor are independent paths: holding the capability does
//! not make an address a contributor.

use serde::{Deserialize, Serialize};

use folio_core::{Address, ObjectId};
use folio_store::{LedgerObject, ObjectKind};

use crate::authorize::{AuthPath, Authorized};
use crate::capability::OwnershipCapability;
use crate::error::{AuthorizationError, PermsError, Result};

/// Default bound on the contributor set.
pub const DEFAULT_MAX_CONTRIBUTORS: usize = 32;

/// Default bound on the allow-list.
pub const DEFAULT_MAX_ALLOWLIST: usize = 1024;

/// Whether a container's content needs a credential to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AccessMode {
    /// Anyone may decrypt.
    Open,
    /// A credential is required.
    #[default]
    Gated,
}

/// Size bounds for a container's address sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerLimits {
    pub max_contributors: usize,
    pub max_allowlist: usize,
}

impl Default for ContainerLimits {
    fn default() -> Self {
        Self {
            max_contributors: DEFAULT_MAX_CONTRIBUTORS,
            max_allowlist: DEFAULT_MAX_ALLOWLIST,
        }
    }
}

/// A publication: the unit that owns content and a vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    id: ObjectId,
    name: String,
    contributors: Vec<Address>,
    allowlist: Vec<Address>,
    access: AccessMode,
    vault_id: ObjectId,
    limits: ContainerLimits,
}

impl Container {
    /// Create a container together with its one ownership capability.
    ///
    /// The vault id is derived from the container id, so the pair is fixed
    /// at creation.
    pub fn create(name: impl Into<String>, limits: ContainerLimits) -> (Self, OwnershipCapability) {
        let id = ObjectId::generate();
        let container = Self {
            id,
            name: name.into(),
            contributors: Vec::new(),
            allowlist: Vec::new(),
            access: AccessMode::default(),
            vault_id: ObjectId::derive("vault", id.as_bytes()),
            limits,
        };
        let cap = OwnershipCapability::mint(id);
        (container, cap)
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vault_id(&self) -> ObjectId {
        self.vault_id
    }

    pub fn access(&self) -> AccessMode {
        self.access
    }

    pub fn contributors(&self) -> &[Address] {
        &self.contributors
    }

    pub fn allowlist(&self) -> &[Address] {
        &self.allowlist
    }

    pub fn limits(&self) -> ContainerLimits {
        self.limits
    }

    /// Whether `cap` is bound to this container.
    pub fn is_owner(&self, cap: &OwnershipCapability) -> bool {
        cap.container_id() == self.id
    }

    /// Whether `address` is a current contributor.
    pub fn is_contributor(&self, address: &Address) -> bool {
        self.contributors.contains(address)
    }

    /// Whether `address` is on the allow-list.
    pub fn is_allowlisted(&self, address: &Address) -> bool {
        self.allowlist.contains(address)
    }

    fn require_owner(
        &self,
        cap: &OwnershipCapability,
    ) -> std::result::Result<(), AuthorizationError> {
        if !self.is_owner(cap) {
            return Err(AuthorizationError::CapabilityMismatch {
                container: self.id,
                bound: cap.container_id(),
            });
        }
        Ok(())
    }

    /// Add a contributor. Requires this container's capability.
    pub fn add_contributor(&mut self, cap: &OwnershipCapability, address: Address) -> Result<()> {
        self.require_owner(cap)?;

        if self.is_contributor(&address) {
            return Err(PermsError::ContributorExists(address));
        }
        if self.contributors.len() >= self.limits.max_contributors {
            return Err(PermsError::ContributorLimit(self.limits.max_contributors));
        }

        self.contributors.push(address);
        tracing::debug!(container = %self.id, contributor = %address, "contributor added");
        Ok(())
    }

    /// Remove a contributor. Requires this container's capability.
    pub fn remove_contributor(
        &mut self,
        cap: &OwnershipCapability,
        address: &Address,
    ) -> Result<()> {
        self.require_owner(cap)?;

        let pos = self
            .contributors
            .iter()
            .position(|a| a == address)
            .ok_or(PermsError::ContributorNotFound(*address))?;

        self.contributors.remove(pos);
        tracing::debug!(container = %self.id, contributor = %address, "contributor removed");
        Ok(())
    }

    /// Add an address to the allow-list. Requires this container's capability.
    pub fn add_to_allowlist(&mut self, cap: &OwnershipCapability, address: Address) -> Result<()> {
        self.require_owner(cap)?;

        if self.is_allowlisted(&address) {
            return Err(PermsError::AllowlistExists(address));
        }
        if self.allowlist.len() >= self.limits.max_allowlist {
            return Err(PermsError::AllowlistLimit(self.limits.max_allowlist));
        }

        self.allowlist.push(address);
        Ok(())
    }

    /// Remove an address from the allow-list. Requires this container's capability.
    pub fn remove_from_allowlist(
        &mut self,
        cap: &OwnershipCapability,
        address: &Address,
    ) -> Result<()> {
        self.require_owner(cap)?;

        let pos = self
            .allowlist
            .iter()
            .position(|a| a == address)
            .ok_or(PermsError::AllowlistNotFound(*address))?;

        self.allowlist.remove(pos);
        Ok(())
    }

    /// Switch between open and gated access. Requires this container's capability.
    pub fn set_access(&mut self, cap: &OwnershipCapability, mode: AccessMode) -> Result<()> {
        self.require_owner(cap)?;
        self.access = mode;
        Ok(())
    }

    /// Authorize `actor` for content creation and vault mutation.
    ///
    /// Succeeds if `cap` is this container's capability OR `actor` is a
    /// contributor. The capability path is checked first; a foreign
    /// capability does not fail the check on its own.
    pub fn authorize(
        &self,
        cap: Option<&OwnershipCapability>,
        actor: Address,
    ) -> std::result::Result<Authorized, AuthorizationError> {
        if cap.is_some_and(|c| self.is_owner(c)) {
            return Ok(Authorized::new(self.id, actor, AuthPath::Owner));
        }
        if self.is_contributor(&actor) {
            return Ok(Authorized::new(self.id, actor, AuthPath::Contributor));
        }
        Err(AuthorizationError::NotAuthorized {
            container: self.id,
            actor,
        })
    }
}

impl LedgerObject for Container {
    const KIND: ObjectKind = ObjectKind::Container;

    fn object_id(&self) -> ObjectId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::Keypair;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 32])
    }

    #[test]
    fn test_is_owner_across_containers() {
        let (a, cap_a) = Container::create("a", ContainerLimits::default());
        let (b, cap_b) = Container::create("b", ContainerLimits::default());

        assert!(a.is_owner(&cap_a));
        assert!(b.is_owner(&cap_b));
        assert!(!a.is_owner(&cap_b));
        assert!(!b.is_owner(&cap_a));
    }

    #[test]
    fn test_contributor_add_remove() {
        let (mut c, cap) = Container::create("weekly", ContainerLimits::default());
        let x = addr(1);

        assert!(!c.is_contributor(&x));
        c.add_contributor(&cap, x).unwrap();
        assert!(c.is_contributor(&x));

        assert!(matches!(
            c.add_contributor(&cap, x),
            Err(PermsError::ContributorExists(a)) if a == x
        ));

        c.remove_contributor(&cap, &x).unwrap();
        assert!(!c.is_contributor(&x));

        assert!(matches!(
            c.remove_contributor(&cap, &x),
            Err(PermsError::ContributorNotFound(_))
        ));
    }

    #[test]
    fn test_foreign_capability_rejected() {
        let (mut c, _cap) = Container::create("mine", ContainerLimits::default());
        let (_, other_cap) = Container::create("theirs", ContainerLimits::default());

        let err = c.add_contributor(&other_cap, addr(1)).unwrap_err();
        assert!(matches!(
            err,
            PermsError::Authorization(AuthorizationError::CapabilityMismatch { .. })
        ));
        assert!(c.contributors().is_empty());

        assert!(c.set_access(&other_cap, AccessMode::Open).is_err());
        assert_eq!(c.access(), AccessMode::Gated);
    }

    #[test]
    fn test_contributor_limit() {
        let limits = ContainerLimits {
            max_contributors: 2,
            max_allowlist: 1,
        };
        let (mut c, cap) = Container::create("small", limits);

        c.add_contributor(&cap, addr(1)).unwrap();
        c.add_contributor(&cap, addr(2)).unwrap();
        assert!(matches!(
            c.add_contributor(&cap, addr(3)),
            Err(PermsError::ContributorLimit(2))
        ));

        c.add_to_allowlist(&cap, addr(9)).unwrap();
        assert!(matches!(
            c.add_to_allowlist(&cap, addr(8)),
            Err(PermsError::AllowlistLimit(1))
        ));
    }

    #[test]
    fn test_allowlist_management() {
        let (mut c, cap) = Container::create("list", ContainerLimits::default());
        let reader = addr(7);

        c.add_to_allowlist(&cap, reader).unwrap();
        assert!(c.is_allowlisted(&reader));
        assert!(matches!(
            c.add_to_allowlist(&cap, reader),
            Err(PermsError::AllowlistExists(_))
        ));

        c.remove_from_allowlist(&cap, &reader).unwrap();
        assert!(!c.is_allowlisted(&reader));
        assert!(matches!(
            c.remove_from_allowlist(&cap, &reader),
            Err(PermsError::AllowlistNotFound(_))
        ));
    }

    #[test]
    fn test_authorize_is_inclusive_or() {
        let (mut c, cap) = Container::create("pub", ContainerLimits::default());
        let owner = Keypair::generate().address();
        let writer = Keypair::generate().address();
        let outsider = Keypair::generate().address();

        c.add_contributor(&cap, writer).unwrap();

        let by_owner = c.authorize(Some(&cap), owner).unwrap();
        assert_eq!(by_owner.via(), AuthPath::Owner);
        assert_eq!(by_owner.container_id(), c.id());

        let by_writer = c.authorize(None, writer).unwrap();
        assert_eq!(by_writer.via(), AuthPath::Contributor);

        assert!(matches!(
            c.authorize(None, outsider),
            Err(AuthorizationError::NotAuthorized { .. })
        ));
    }

    #[test]
    fn test_owner_is_not_implicit_contributor() {
        let (c, cap) = Container::create("solo", ContainerLimits::default());
        let owner = addr(5);

        assert!(c.authorize(Some(&cap), owner).is_ok());
        assert!(!c.is_contributor(&owner));
        assert!(c.authorize(None, owner).is_err());
    }

    proptest::proptest! {
        #[test]
        fn contributor_set_matches_model(
            ops in proptest::collection::vec((proptest::bool::ANY, 0u8..6), 0..64)
        ) {
            let (mut c, cap) = Container::create("p", ContainerLimits::default());
            let mut model = std::collections::HashSet::new();

            for (add, byte) in ops {
                let a = addr(byte);
                if add {
                    let result = c.add_contributor(&cap, a);
                    proptest::prop_assert_eq!(result.is_ok(), model.insert(a));
                } else {
                    let result = c.remove_contributor(&cap, &a);
                    proptest::prop_assert_eq!(result.is_ok(), model.remove(&a));
                }

                for byte in 0u8..6 {
                    let who = addr(byte);
                    proptest::prop_assert_eq!(c.is_contributor(&who), model.contains(&who));
                }
            }
            proptest::prop_assert_eq!(c.contributors().len(), model.len());
        }
    }
}
