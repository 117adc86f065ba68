//! Inventory assembly: drive discovery files through normalization and
//! identity resolution, then build the ordered inventory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use homenet_core::{HostRecord, VlanRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ConsolidateConfig;
use crate::error::Result;
use crate::identity::IdentityIndex;
use crate::normalize::{normalize, Provenance};

/// Sort key for addresses that are not four dot-separated integers.
const UNPARSABLE_IP: [u32; 4] = [999, 999, 999, 999];

/// One discovery file and the producer that wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    pub provenance: Provenance,
}

impl InputFile {
    /// Input whose producer is inferred from its `discovery-<kind>` name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let provenance = Provenance::from_path(&path);
        Self { path, provenance }
    }
}

/// The consolidated inventory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub hosts: Vec<HostRecord>,
    pub vlans: Vec<VlanRecord>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConsolidateSummary {
    pub files_read: u32,
    pub files_skipped: u32,
    pub records_seen: u32,
    pub records_dropped: u32,
    pub hosts: u32,
    pub vlans: u32,
}

/// What a discovery file turned out to contain.
enum Payload {
    Vlans(Vec<Value>),
    Hosts(Vec<Value>),
    Unrecognized,
}

/// Accumulates discovery files, in order, into one inventory.
pub struct Consolidator {
    index: IdentityIndex,
    vlans: BTreeMap<u32, VlanRecord>,
    summary: ConsolidateSummary,
}

impl Consolidator {
    pub fn new(config: &ConsolidateConfig) -> Self {
        Self {
            index: IdentityIndex::new(config),
            vlans: BTreeMap::new(),
            summary: ConsolidateSummary::default(),
        }
    }

    /// Read one file. Missing or malformed files are skipped whole.
    pub fn ingest_file(&mut self, input: &InputFile) {
        match read_json(&input.path) {
            Ok(value) => {
                self.summary.files_read += 1;
                tracing::debug!(
                    path = %input.path.display(),
                    provenance = ?input.provenance,
                    "Reading discovery file"
                );
                self.ingest_value(value, input.provenance);
            }
            Err(e) => {
                self.summary.files_skipped += 1;
                tracing::warn!(
                    path = %input.path.display(),
                    error = %e,
                    "Skipping unreadable input"
                );
            }
        }
    }

    /// Fold an already-parsed file body into the tables.
    pub fn ingest_value(&mut self, value: Value, provenance: Provenance) {
        match classify(value) {
            Payload::Vlans(items) => self.ingest_vlans(items),
            Payload::Hosts(items) => self.ingest_hosts(items, provenance),
            Payload::Unrecognized => {
                tracing::warn!(provenance = ?provenance, "Input is neither host nor VLAN data");
            }
        }
    }

    fn ingest_vlans(&mut self, items: Vec<Value>) {
        for item in &items {
            match parse_vlan(item) {
                Some(vlan) => {
                    self.vlans.insert(vlan.vlan_id, vlan);
                }
                None => tracing::debug!(vlan = %item, "Dropping VLAN without a usable id"),
            }
        }
    }

    fn ingest_hosts(&mut self, items: Vec<Value>, provenance: Provenance) {
        for item in items {
            self.summary.records_seen += 1;

            let Value::Object(raw) = item else {
                self.summary.records_dropped += 1;
                tracing::warn!(
                    provenance = ?provenance,
                    "Dropping host record that is not an object"
                );
                continue;
            };

            let host = normalize(&raw, provenance);
            if self.index.upsert(host).is_none() {
                self.summary.records_dropped += 1;
                tracing::debug!(provenance = ?provenance, "Dropping host record without an ip");
            }
        }
    }

    /// Deduplicate, sort and return the inventory.
    pub fn finish(self) -> (Inventory, ConsolidateSummary) {
        let mut hosts = self.index.into_hosts();
        hosts.sort_by_key(|h| ip_sort_key(&h.ip));
        let vlans: Vec<VlanRecord> = self.vlans.into_values().collect();

        let summary = ConsolidateSummary {
            hosts: hosts.len() as u32,
            vlans: vlans.len() as u32,
            ..self.summary
        };

        (Inventory { hosts, vlans }, summary)
    }
}

/// Consolidate `inputs`, in order, into one inventory.
pub fn consolidate(inputs: &[InputFile], config: &ConsolidateConfig) -> Inventory {
    let mut consolidator = Consolidator::new(config);
    for input in inputs {
        consolidator.ingest_file(input);
    }

    let (inventory, summary) = consolidator.finish();
    tracing::info!(
        files_read = summary.files_read,
        files_skipped = summary.files_skipped,
        records_seen = summary.records_seen,
        records_dropped = summary.records_dropped,
        hosts = summary.hosts,
        vlans = summary.vlans,
        "Consolidation complete"
    );

    inventory
}

/// Octets of a dotted-quad address for ordering. Anything else sorts last.
pub fn ip_sort_key(ip: &str) -> [u32; 4] {
    let mut octets = [0u32; 4];
    let mut parts = ip.split('.');

    for octet in &mut octets {
        match parts.next().map(str::parse::<u32>) {
            Some(Ok(n)) => *octet = n,
            _ => return UNPARSABLE_IP,
        }
    }
    if parts.next().is_some() {
        return UNPARSABLE_IP;
    }

    octets
}

fn read_json(path: &Path) -> Result<Value> {
    let body = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&body)?)
}

fn classify(value: Value) -> Payload {
    match value {
        Value::Array(items) if is_vlan_list(&items) => Payload::Vlans(items),
        Value::Array(items) => Payload::Hosts(items),
        Value::Object(mut map) => match map.remove("hosts") {
            Some(Value::Array(items)) => Payload::Hosts(items),
            None => Payload::Hosts(Vec::new()),
            Some(_) => Payload::Unrecognized,
        },
        _ => Payload::Unrecognized,
    }
}

/// A list is VLAN data when its first element carries a `vlan_id`.
fn is_vlan_list(items: &[Value]) -> bool {
    items
        .first()
        .and_then(Value::as_object)
        .is_some_and(|first| first.contains_key("vlan_id"))
}

/// Zero, missing and non-integer ids are treated as absent.
fn parse_vlan(item: &Value) -> Option<VlanRecord> {
    let fields = item.as_object()?;
    let vlan_id = match fields.get("vlan_id")? {
        Value::Number(n) => u32::try_from(n.as_u64()?).ok()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    if vlan_id == 0 {
        return None;
    }

    let text = |key: &str| {
        fields
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    Some(VlanRecord {
        vlan_id,
        name: text("name"),
        interface: text("interface"),
        vlanif: text("vlanif"),
    })
}
