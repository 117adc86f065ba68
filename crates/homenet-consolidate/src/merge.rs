//! Trust-ranked merging of two records that describe the same host.

use homenet_core::HostRecord;

use crate::trust::trust_score;

/// Fold `incoming` into `existing`, producing a new record.
///
/// The record with the strictly higher trust score is primary; ties keep
/// `existing` as primary so re-merging equal-trust data never flips fields
/// that are already settled. Scalar fields take the primary's value unless
/// it is empty; sets are unioned; metadata is a shallow union with primary
/// keys winning.
pub fn merge(existing: &HostRecord, incoming: &HostRecord) -> HostRecord {
    let (primary, secondary) =
        if trust_score(&incoming.discovered_by) > trust_score(&existing.discovered_by) {
            (incoming, existing)
        } else {
            (existing, incoming)
        };

    let mut metadata = secondary.metadata.clone();
    metadata.extend(primary.metadata.clone());

    HostRecord {
        ip: prefer(&primary.ip, &secondary.ip),
        mac: prefer(&primary.mac, &secondary.mac),
        hostname: prefer(&primary.hostname, &secondary.hostname),
        os: prefer(&primary.os, &secondary.os),
        services: primary.services.union(&secondary.services).cloned().collect(),
        discovered_by: primary
            .discovered_by
            .union(&secondary.discovered_by)
            .cloned()
            .collect(),
        metadata,
        proxy_routes: if primary.proxy_routes.is_empty() {
            secondary.proxy_routes.clone()
        } else {
            primary.proxy_routes.clone()
        },
    }
}

fn prefer(primary: &str, secondary: &str) -> String {
    if primary.is_empty() {
        secondary.to_string()
    } else {
        primary.to_string()
    }
}
