//! Platform configuration.

use serde::{Deserialize, Serialize};

use folio_perms::{
    ContainerLimits, DEFAULT_MAX_ALLOWLIST, DEFAULT_MAX_CONTRIBUTORS, DEFAULT_RENEWAL_LEAD_EPOCHS,
};
use folio_resolve::ResolveConfig;

/// Configuration for a [`Platform`](crate::Platform).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Contributor cap applied to new containers.
    pub max_contributors: usize,
    /// Allow-list cap applied to new containers.
    pub max_allowlist: usize,
    /// How many storage epochs a blob is paid for when stored or renewed.
    pub storage_epochs: u64,
    /// How many epochs before the earliest blob expiry renewal falls due.
    pub renewal_lead_epochs: u64,
    /// Resolution behavior for readers built by the platform.
    pub resolve: ResolveConfig,
}

impl PlatformConfig {
    /// Limits stamped onto containers created under this config.
    pub fn limits(&self) -> ContainerLimits {
        ContainerLimits {
            max_contributors: self.max_contributors,
            max_allowlist: self.max_allowlist,
        }
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            max_contributors: DEFAULT_MAX_CONTRIBUTORS,
            max_allowlist: DEFAULT_MAX_ALLOWLIST,
            storage_epochs: 52,
            renewal_lead_epochs: DEFAULT_RENEWAL_LEAD_EPOCHS,
            resolve: ResolveConfig::default(),
        }
    }
}
