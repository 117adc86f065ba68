//! Configuration for the homenet-consolidate engine.

use serde::Deserialize;

/// Top-level consolidate configuration.
///
/// Loaded from the `homenet.toml` `[consolidate]` section or
/// `HOMENET__CONSOLIDATE__` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsolidateConfig {
    /// Drop the `by_ip` alias a MAC-keyed host leaves behind when its address
    /// changes, so later IP-only records for the old address are not merged
    /// into it.
    #[serde(default = "default_true")]
    pub prune_stale_ip_aliases: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ConsolidateConfig {
    fn default() -> Self {
        Self {
            prune_stale_ip_aliases: default_true(),
        }
    }
}
