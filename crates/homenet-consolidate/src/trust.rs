//! Trust ranking of discovery methods.

use std::collections::BTreeSet;

use homenet_core::DiscoveryMethod;

/// Trust score of a record: the highest rank among the methods that
/// contributed to it, or 0 when none did.
pub fn trust_score(discovered_by: &BTreeSet<DiscoveryMethod>) -> u8 {
    discovered_by.iter().map(DiscoveryMethod::rank).max().unwrap_or(0)
}
