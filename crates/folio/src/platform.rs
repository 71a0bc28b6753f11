//! The Platform: unified API for Folio.
//!
//! The Platform brings together the ledger, container permissions, vaults
//! and credentials into one interface. Callers identify themselves with a
//! [`Caller`]: an acting address plus, optionally, the id of an ownership
//! capability they hold in the ledger.

use std::sync::Arc;

use folio_core::{Address, BlobRef, ContentIdentity, Keypair, ObjectId};
use folio_perms::{
    AccessMode, AuthorizationError, Authorized, BlobMetadata, Container, OwnershipCapability,
    RenewalCapability, Vault, VaultEvent,
};
use folio_policy::{AccessToken, Credential, Subscription};
use folio_resolve::{DecryptionAuthority, Resolver, SealBackend, SealedPayload};
use folio_store::{Ledger, LedgerExt, LedgerObject, ObjectKind, Owner, Precondition, Versioned};

use crate::config::PlatformConfig;
use crate::error::{PlatformError, Result};

/// An authorization proof with the object versions it was checked against.
struct Checked {
    auth: Authorized,
    preconditions: Vec<Precondition>,
}

/// Who is performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub actor: Address,
    /// Ownership capability the actor presents, if any.
    pub capability: Option<ObjectId>,
}

impl Caller {
    /// An actor presenting no capability, e.g. a contributor.
    pub fn member(actor: Address) -> Self {
        Self {
            actor,
            capability: None,
        }
    }

    /// An actor presenting the ownership capability `capability`.
    pub fn owner(actor: Address, capability: ObjectId) -> Self {
        Self {
            actor,
            capability: Some(capability),
        }
    }
}

/// Ids of the objects created alongside a new container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedContainer {
    pub container_id: ObjectId,
    pub vault_id: ObjectId,
    pub capability_id: ObjectId,
}

/// Result of publishing a content item.
#[derive(Debug, Clone)]
pub struct Published {
    pub identity: ContentIdentity,
    /// The sealed payload to hand to blob storage.
    pub sealed: SealedPayload,
    pub blob: BlobRef,
    pub event: VaultEvent,
}

/// The main Platform struct.
///
/// Provides a unified API for:
/// - Creating containers with their vault and ownership capability
/// - Managing contributors, the allow-list and the access mode
/// - Storing, removing and renewing blobs
/// - Publishing sealed content
/// - Minting subscriptions and access tokens
pub struct Platform<L: Ledger> {
    /// The ledger backend.
    ledger: Arc<L>,
    /// Configuration.
    config: PlatformConfig,
    /// The platform-wide renewal capability.
    renewal_id: ObjectId,
}

impl<L: Ledger> Platform<L> {
    /// Bootstrap a platform on an empty ledger.
    ///
    /// Mints the renewal capability and hands it to `operator`.
    pub async fn genesis(
        ledger: Arc<L>,
        operator: Address,
        config: PlatformConfig,
    ) -> Result<Self> {
        let renewal = RenewalCapability::genesis();
        ledger.create(&renewal, Owner::Address(operator)).await?;

        tracing::info!(renewal = %renewal.id(), %operator, "platform genesis");

        Ok(Self {
            ledger,
            config,
            renewal_id: renewal.id(),
        })
    }

    /// Reopen a platform whose genesis minted `renewal_id`.
    pub async fn open(
        ledger: Arc<L>,
        renewal_id: ObjectId,
        config: PlatformConfig,
    ) -> Result<Self> {
        ledger.load::<RenewalCapability>(&renewal_id).await?;
        Ok(Self {
            ledger,
            config,
            renewal_id,
        })
    }

    /// Get the ledger reference.
    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Id of the renewal capability minted at genesis.
    pub fn renewal_capability_id(&self) -> ObjectId {
        self.renewal_id
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Container Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a container, its vault and its ownership capability.
    ///
    /// The container and vault are shared objects; the capability is held
    /// by `owner`.
    pub async fn create_container(&self, owner: Address, name: &str) -> Result<CreatedContainer> {
        let renewal = self.ledger.load::<RenewalCapability>(&self.renewal_id).await?;
        let (container, cap) = Container::create(name, self.config.limits());
        let vault = Vault::for_container(
            &container,
            &renewal.object,
            self.config.renewal_lead_epochs,
        );

        self.ledger.create(&container, Owner::Shared).await?;
        self.ledger.create(&vault, Owner::Shared).await?;
        self.ledger.create(&cap, Owner::Address(owner)).await?;

        tracing::info!(
            container = %container.id(),
            vault = %vault.id(),
            %owner,
            container_name = name,
            "container created"
        );

        Ok(CreatedContainer {
            container_id: container.id(),
            vault_id: vault.id(),
            capability_id: cap.id(),
        })
    }

    /// Get a container by id.
    pub async fn container(&self, id: &ObjectId) -> Result<Container> {
        Ok(self.ledger.load::<Container>(id).await?.object)
    }

    async fn container_versioned(&self, id: &ObjectId) -> Result<Versioned<Container>> {
        Ok(self.ledger.load::<Container>(id).await?)
    }

    /// Get the vault of a container.
    pub async fn vault(&self, container_id: &ObjectId) -> Result<Vault> {
        let container = self.container(container_id).await?;
        Ok(self.ledger.load::<Vault>(&container.vault_id()).await?.object)
    }

    /// Add a contributor. Owner only.
    pub async fn add_contributor(
        &self,
        caller: &Caller,
        container_id: &ObjectId,
        contributor: Address,
    ) -> Result<()> {
        let version = self
            .manage(caller, container_id, |c, cap| c.add_contributor(cap, contributor))
            .await?;
        tracing::info!(container = %container_id, %contributor, version, "contributor added");
        Ok(())
    }

    /// Remove a contributor. Owner only.
    pub async fn remove_contributor(
        &self,
        caller: &Caller,
        container_id: &ObjectId,
        contributor: &Address,
    ) -> Result<()> {
        let version = self
            .manage(caller, container_id, |c, cap| c.remove_contributor(cap, contributor))
            .await?;
        tracing::info!(container = %container_id, %contributor, version, "contributor removed");
        Ok(())
    }

    /// Allow-list an address. Owner only.
    pub async fn add_to_allowlist(
        &self,
        caller: &Caller,
        container_id: &ObjectId,
        reader: Address,
    ) -> Result<()> {
        let version = self
            .manage(caller, container_id, |c, cap| c.add_to_allowlist(cap, reader))
            .await?;
        tracing::info!(container = %container_id, %reader, version, "allow-listed");
        Ok(())
    }

    /// Drop an address from the allow-list. Owner only.
    pub async fn remove_from_allowlist(
        &self,
        caller: &Caller,
        container_id: &ObjectId,
        reader: &Address,
    ) -> Result<()> {
        let version = self
            .manage(caller, container_id, |c, cap| c.remove_from_allowlist(cap, reader))
            .await?;
        tracing::info!(container = %container_id, %reader, version, "removed from allow-list");
        Ok(())
    }

    /// Switch a container between open and gated. Owner only.
    pub async fn set_access(
        &self,
        caller: &Caller,
        container_id: &ObjectId,
        mode: AccessMode,
    ) -> Result<()> {
        let version = self
            .manage(caller, container_id, |c, cap| c.set_access(cap, mode))
            .await?;
        tracing::info!(container = %container_id, ?mode, version, "access mode set");
        Ok(())
    }

    /// Hand the caller's ownership capability to `to`.
    pub async fn transfer_capability(&self, caller: &Caller, to: Address) -> Result<u64> {
        let cap = self.capability(caller).await?.object;
        let version = self.ledger.transfer(&cap.id(), &caller.actor, to).await?;

        tracing::info!(
            capability = %cap.id(),
            container = %cap.container_id(),
            from = %caller.actor,
            %to,
            "capability transferred"
        );
        Ok(version)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Vault Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Store a blob in a container's vault. Owner or contributor.
    pub async fn store_blob(
        &self,
        caller: &Caller,
        container_id: &ObjectId,
        blob: BlobRef,
        metadata: BlobMetadata,
    ) -> Result<VaultEvent> {
        let container = self.container_versioned(container_id).await?;
        let Checked {
            auth,
            preconditions,
        } = self.authorize(caller, &container).await?;

        let (event, version) = self
            .ledger
            .mutate_guarded::<Vault, _, PlatformError, _>(
                &container.object.vault_id(),
                &preconditions,
                |vault| Ok(vault.store(blob, metadata, &auth)?),
            )
            .await?;

        tracing::debug!(container = %container_id, version, via = ?auth.via(), "vault updated");
        Ok(event)
    }

    /// Remove a blob from a container's vault. Owner or contributor.
    ///
    /// Returns a [`VaultEvent::Removed`] carrying the removed metadata.
    pub async fn remove_blob(
        &self,
        caller: &Caller,
        container_id: &ObjectId,
        blob: &BlobRef,
    ) -> Result<VaultEvent> {
        let container = self.container_versioned(container_id).await?;
        let Checked {
            auth,
            preconditions,
        } = self.authorize(caller, &container).await?;

        let ((vault_id, metadata), version) = self
            .ledger
            .mutate_guarded::<Vault, _, PlatformError, _>(
                &container.object.vault_id(),
                &preconditions,
                |vault| Ok((vault.id(), vault.remove(blob, &auth)?)),
            )
            .await?;

        tracing::debug!(container = %container_id, version, via = ?auth.via(), "vault updated");
        Ok(VaultEvent::Removed {
            vault: vault_id,
            blob: blob.clone(),
            by: auth.actor(),
            metadata,
        })
    }

    /// Metadata of a stored blob. Anyone may read.
    pub async fn get_blob(
        &self,
        container_id: &ObjectId,
        blob: &BlobRef,
    ) -> Result<Option<BlobMetadata>> {
        Ok(self.vault(container_id).await?.get(blob).cloned())
    }

    /// Whether a container's vault holds `blob`.
    pub async fn has_blob(&self, container_id: &ObjectId, blob: &BlobRef) -> Result<bool> {
        Ok(self.vault(container_id).await?.has(blob))
    }

    /// Whether a container's vault is due for storage renewal.
    pub async fn needs_renewal(
        &self,
        container_id: &ObjectId,
        current_epoch: u64,
    ) -> Result<bool> {
        Ok(self.vault(container_id).await?.needs_renewal(current_epoch))
    }

    /// Blobs whose paid storage has run out at `current_epoch`.
    pub async fn expiring_blobs(
        &self,
        container_id: &ObjectId,
        current_epoch: u64,
    ) -> Result<Vec<BlobRef>> {
        Ok(self.vault(container_id).await?.expiring(current_epoch))
    }

    /// Extend storage of every blob in a container's vault by the configured
    /// number of epochs. Requires the renewal capability, held by `operator`.
    ///
    /// The next renewal falls due `renewal_lead_epochs` before the new expiry.
    pub async fn renew(
        &self,
        operator: &Address,
        container_id: &ObjectId,
        current_epoch: u64,
    ) -> Result<VaultEvent> {
        let renewal = self
            .held::<RenewalCapability>(&self.renewal_id, operator)
            .await?;
        let container = self.container(container_id).await?;

        let extend_to = current_epoch.saturating_add(self.config.storage_epochs);
        let next_renewal = extend_to.saturating_sub(self.config.renewal_lead_epochs);
        let held = [Precondition::new(self.renewal_id, renewal.version)];
        let (event, _) = self
            .ledger
            .mutate_guarded::<Vault, _, PlatformError, _>(&container.vault_id(), &held, |vault| {
                Ok(vault.renew(&renewal.object, extend_to, next_renewal)?)
            })
            .await?;

        Ok(event)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Content Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Seal `plaintext` under a fresh identity in `container_id` and record
    /// the sealed blob in the vault. Owner or contributor.
    ///
    /// The caller is expected to upload [`Published::sealed`] to blob storage.
    pub async fn publish<B: SealBackend>(
        &self,
        caller: &Caller,
        container_id: &ObjectId,
        plaintext: &[u8],
        encoding: &str,
        current_epoch: u64,
        backend: &B,
    ) -> Result<Published> {
        let container = self.container_versioned(container_id).await?;
        let Checked {
            auth,
            preconditions,
        } = self.authorize(caller, &container).await?;

        let identity = ContentIdentity::new_random(*container_id);
        let sealed = backend.seal(&identity, plaintext)?;
        let bytes = sealed.to_bytes()?;
        let blob = BlobRef::of_content(&bytes);
        let metadata = BlobMetadata::new(
            bytes.len() as u64,
            encoding,
            current_epoch.saturating_add(self.config.storage_epochs),
            true,
        );

        let stored = blob.clone();
        let (event, _) = self
            .ledger
            .mutate_guarded::<Vault, _, PlatformError, _>(
                &container.object.vault_id(),
                &preconditions,
                |vault| Ok(vault.store(stored, metadata, &auth)?),
            )
            .await?;

        tracing::info!(
            container = %container_id,
            blob = %blob,
            nonce = identity.nonce(),
            by = %caller.actor,
            "content published"
        );

        Ok(Published {
            identity,
            sealed,
            blob,
            event,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Credential Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Grant `subscriber` access to every item in a container until
    /// `valid_until` (unix millis). Owner only.
    pub async fn subscribe(
        &self,
        caller: &Caller,
        container_id: &ObjectId,
        subscriber: Address,
        valid_until: i64,
    ) -> Result<Subscription> {
        self.require_owner(caller, container_id).await?;

        let sub = Subscription::new(*container_id, valid_until);
        self.ledger.create(&sub, Owner::Address(subscriber)).await?;

        tracing::info!(
            subscription = %sub.id,
            container = %container_id,
            %subscriber,
            valid_until,
            "subscription minted"
        );
        Ok(sub)
    }

    /// Grant `holder` permanent access to one content item. Owner only.
    pub async fn mint_access_token(
        &self,
        caller: &Caller,
        content: ContentIdentity,
        holder: Address,
    ) -> Result<AccessToken> {
        self.require_owner(caller, content.container()).await?;

        let token = AccessToken::new(content);
        self.ledger.create(&token, Owner::Address(holder)).await?;

        tracing::info!(
            token = %token.id,
            container = %token.container_id,
            nonce = content.nonce(),
            %holder,
            "access token minted"
        );
        Ok(token)
    }

    /// Hand an access token to another address.
    pub async fn transfer_token(
        &self,
        holder: &Address,
        token_id: &ObjectId,
        to: Address,
    ) -> Result<u64> {
        self.held::<AccessToken>(token_id, holder).await?;
        let version = self.ledger.transfer(token_id, holder, to).await?;
        tracing::debug!(token = %token_id, from = %holder, %to, "access token transferred");
        Ok(version)
    }

    /// Every credential `holder` can present for content in `container_id`.
    pub async fn credentials(
        &self,
        holder: &Address,
        container_id: &ObjectId,
    ) -> Result<Vec<Credential>> {
        let container = self.container(container_id).await?;
        let mut bag = Vec::new();

        for id in self.owned(holder, ObjectKind::Subscription).await? {
            let sub = self.ledger.load::<Subscription>(&id).await?.object;
            if sub.container_id == *container_id {
                bag.push(sub.credential());
            }
        }
        for id in self.owned(holder, ObjectKind::AccessToken).await? {
            let token = self.ledger.load::<AccessToken>(&id).await?.object;
            if token.container_id == *container_id {
                bag.push(token.credential());
            }
        }
        for id in self.owned(holder, ObjectKind::OwnershipCapability).await? {
            let cap = self.ledger.load::<OwnershipCapability>(&id).await?.object;
            if container.is_owner(&cap) {
                bag.push(Credential::Owner { capability_id: id });
            }
        }
        if container.is_contributor(holder) {
            bag.push(Credential::Contributor {
                container_id: *container_id,
            });
        }
        if container.is_allowlisted(holder) {
            bag.push(Credential::Allowlist {
                container_id: *container_id,
            });
        }

        Ok(bag)
    }

    /// A resolver acting as `reader`, configured from this platform.
    pub fn reader<A: DecryptionAuthority>(
        &self,
        authority: Arc<A>,
        reader: Keypair,
    ) -> Resolver<A> {
        Resolver::new(authority, reader, self.config.resolve.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Capability Checks
    // ─────────────────────────────────────────────────────────────────────────

    /// Load a ledger object, failing unless `actor` holds it.
    async fn held<T: LedgerObject>(&self, id: &ObjectId, actor: &Address) -> Result<Versioned<T>> {
        let held = self.ledger.load::<T>(id).await?;
        if !held.owner.is_held_by(actor) {
            tracing::warn!(object = %id, %actor, "capability presented by non-holder");
            return Err(AuthorizationError::NotHolder {
                capability: *id,
                actor: *actor,
            }
            .into());
        }
        Ok(held)
    }

    async fn owned(&self, holder: &Address, kind: ObjectKind) -> Result<Vec<ObjectId>> {
        Ok(self.ledger.list_owned(holder, Some(kind)).await?)
    }

    /// The caller's ownership capability.
    async fn capability(&self, caller: &Caller) -> Result<Versioned<OwnershipCapability>> {
        let id = caller.capability.ok_or(PlatformError::CapabilityRequired)?;
        self.held::<OwnershipCapability>(&id, &caller.actor).await
    }

    /// Check that the caller's capability is bound to `container_id`.
    async fn require_owner(&self, caller: &Caller, container_id: &ObjectId) -> Result<()> {
        let cap = self.capability(caller).await?.object;
        let container = self.container(container_id).await?;
        if !container.is_owner(&cap) {
            return Err(AuthorizationError::CapabilityMismatch {
                container: *container_id,
                bound: cap.container_id(),
            }
            .into());
        }
        Ok(())
    }

    /// Owner-or-contributor check for content creation and vault mutation.
    ///
    /// The returned preconditions pin the container, and any presented
    /// capability, at the versions the check saw.
    async fn authorize(
        &self,
        caller: &Caller,
        container: &Versioned<Container>,
    ) -> Result<Checked> {
        let id = container.object.id();
        let mut preconditions = vec![Precondition::new(id, container.version)];

        let cap = match caller.capability {
            Some(cap_id) => {
                let held = self
                    .held::<OwnershipCapability>(&cap_id, &caller.actor)
                    .await?;
                preconditions.push(Precondition::new(cap_id, held.version));
                Some(held.object)
            }
            None => None,
        };

        let auth = container
            .object
            .authorize(cap.as_ref(), caller.actor)
            .map_err(|e| {
                tracing::debug!(container = %id, actor = %caller.actor, "not authorized");
                PlatformError::from(e)
            })?;

        Ok(Checked {
            auth,
            preconditions,
        })
    }

    /// Apply an owner-only change to a container under a version check.
    ///
    /// The commit also requires the capability to be unmoved since it was
    /// checked.
    async fn manage<F>(&self, caller: &Caller, container_id: &ObjectId, f: F) -> Result<u64>
    where
        F: FnOnce(&mut Container, &OwnershipCapability) -> folio_perms::Result<()> + Send,
    {
        let cap = self.capability(caller).await?;
        let held = [Precondition::new(cap.object.id(), cap.version)];
        let ((), version) = self
            .ledger
            .mutate_guarded::<Container, _, PlatformError, _>(container_id, &held, |container| {
                Ok(f(container, &cap.object)?)
            })
            .await?;
        Ok(version)
    }
}
