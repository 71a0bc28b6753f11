//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: an in-memory ledger, a platform
//! bootstrapped on it and a decryption authority reading the same ledger.

use std::sync::Arc;

use folio::{Caller, CreatedContainer, Platform, PlatformConfig};
use folio_core::{now_millis, Keypair};
use folio_resolve::{MasterSecret, MemoryAuthority};
use folio_store::MemoryLedger;

/// Fixed master secret so sealed fixtures are reproducible.
pub const FIXTURE_MASTER: [u8; 32] = [0x5e; 32];

/// A platform, its ledger and an authority sharing that ledger.
pub struct TestFixture {
    pub ledger: Arc<MemoryLedger>,
    pub platform: Platform<MemoryLedger>,
    pub authority: Arc<MemoryAuthority<MemoryLedger>>,
    /// Holder of the platform's renewal capability.
    pub operator: Keypair,
}

impl TestFixture {
    /// Create a fixture with default config and a wall-clock authority.
    pub async fn new() -> Self {
        Self::with_config(PlatformConfig::default(), |a| a).await
    }

    /// Create a fixture whose authority evaluates policies at `now`.
    pub async fn at_time(now: i64) -> Self {
        Self::with_config(PlatformConfig::default(), |a| a.with_time(now)).await
    }

    /// Create a fixture with a custom config and authority setup.
    pub async fn with_config(
        config: PlatformConfig,
        setup: impl FnOnce(MemoryAuthority<MemoryLedger>) -> MemoryAuthority<MemoryLedger>,
    ) -> Self {
        let ledger = Arc::new(MemoryLedger::new());
        let operator = Keypair::from_seed(&[0xee; 32]);
        let platform = Platform::genesis(ledger.clone(), operator.address(), config)
            .await
            .expect("genesis on an empty ledger");
        let authority = Arc::new(setup(MemoryAuthority::new(
            ledger.clone(),
            MasterSecret::from_bytes(FIXTURE_MASTER),
        )));

        Self {
            ledger,
            platform,
            authority,
            operator,
        }
    }

    /// Create a container owned by `owner` and return it with the owner's caller.
    pub async fn container(&self, owner: &Keypair, name: &str) -> (CreatedContainer, Caller) {
        let created = self
            .platform
            .create_container(owner.address(), name)
            .await
            .expect("container creation");
        let caller = Caller::owner(owner.address(), created.capability_id);
        (created, caller)
    }
}

/// The deterministic keypair of party `i`.
pub fn party(i: usize) -> Keypair {
    let mut seed = [0u8; 32];
    seed[0] = i as u8;
    seed[31] = 0xa5;
    Keypair::from_seed(&seed)
}

/// Create `count` deterministic, distinct keypairs.
pub fn parties(count: usize) -> Vec<Keypair> {
    (0..count).map(party).collect()
}

/// Unix millis `days` days from now.
pub fn days_from_now(days: i64) -> i64 {
    now_millis() + days * 24 * 60 * 60 * 1000
}
