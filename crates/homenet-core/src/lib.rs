//! homenet-core: Canonical record types for the homenet inventory tools.
//!
//! Every producer (vendor export parsers, scanners, probes) and the
//! consolidation engine exchange data in these shapes:
//! - `HostRecord` for one physical or virtual network entity
//! - `VlanRecord` for one configured VLAN
//! - `DiscoveryMethod` tags with their trust rank
//! - `MetadataValue` for source-specific extra facts

pub mod types;

pub use types::{DiscoveryMethod, HostRecord, Metadata, MetadataValue, VlanRecord};
