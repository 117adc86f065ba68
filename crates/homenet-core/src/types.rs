//! Canonical record types for the homenet inventory.
//!
//! These types are the interchange format between the vendor export
//! parsers, the external discovery producers and the consolidation engine.
//! All fields default when absent so partially populated producer output
//! deserializes cleanly.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

// ── Discovery Methods ─────────────────────────────────────────────

/// The discovery method that contributed data to a host record.
///
/// Serialized as its plain string form. Equality, ordering and hashing all
/// go through [`DiscoveryMethod::as_str`], so `Other("ssh")` and `Ssh` can
/// never coexist in a set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DiscoveryMethod {
    Ssh,
    Nmap,
    Dns,
    SshDetected,
    ManualOpnsense,
    ManualProxmox,
    ManualUnifi,
    Other(String),
}

impl DiscoveryMethod {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ssh => "ssh",
            Self::Nmap => "nmap",
            Self::Dns => "dns",
            Self::SshDetected => "ssh-detected",
            Self::ManualOpnsense => "manual-opnsense",
            Self::ManualProxmox => "manual-proxmox",
            Self::ManualUnifi => "manual-unifi",
            Self::Other(s) => s,
        }
    }

    /// Trust rank of this method; higher is more authoritative.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Ssh => 4,
            Self::Nmap => 3,
            Self::Dns | Self::SshDetected => 2,
            Self::ManualOpnsense | Self::ManualProxmox | Self::ManualUnifi => 1,
            Self::Other(_) => 0,
        }
    }
}

impl From<&str> for DiscoveryMethod {
    fn from(s: &str) -> Self {
        match s {
            "ssh" => Self::Ssh,
            "nmap" => Self::Nmap,
            "dns" => Self::Dns,
            "ssh-detected" => Self::SshDetected,
            "manual-opnsense" => Self::ManualOpnsense,
            "manual-proxmox" => Self::ManualProxmox,
            "manual-unifi" => Self::ManualUnifi,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for DiscoveryMethod {
    fn from(s: String) -> Self {
        match Self::from(s.as_str()) {
            Self::Other(_) => Self::Other(s),
            known => known,
        }
    }
}

impl From<DiscoveryMethod> for String {
    fn from(method: DiscoveryMethod) -> Self {
        match method {
            DiscoveryMethod::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for DiscoveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq for DiscoveryMethod {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for DiscoveryMethod {}

impl PartialOrd for DiscoveryMethod {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DiscoveryMethod {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl Hash for DiscoveryMethod {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

// ── Metadata ──────────────────────────────────────────────────────

/// A source-specific extra fact attached to a host record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<MetadataValue>),
    Map(BTreeMap<String, MetadataValue>),
}

/// Key → value bag of source-specific facts.
pub type Metadata = BTreeMap<String, MetadataValue>;

impl MetadataValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Number(n) => n.as_u64(),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for MetadataValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => Self::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<u64> for MetadataValue {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

impl From<bool> for MetadataValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

// ── Records ───────────────────────────────────────────────────────

/// One physical or virtual network entity in canonical form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostRecord {
    /// Dotted-quad IPv4 address. Records without one never reach the inventory.
    pub ip: String,
    /// Hardware address, empty if unknown.
    pub mac: String,
    pub hostname: String,
    pub os: String,
    pub services: BTreeSet<String>,
    /// Every method that contributed data to this record. Only ever grows.
    pub discovered_by: BTreeSet<DiscoveryMethod>,
    pub metadata: Metadata,
    /// Route descriptors, passed through untouched.
    pub proxy_routes: Vec<serde_json::Value>,
}

impl HostRecord {
    /// An empty record tagged with a single discovery method.
    pub fn discovered_by(method: DiscoveryMethod) -> Self {
        Self {
            discovered_by: BTreeSet::from([method]),
            ..Default::default()
        }
    }
}

/// A configured VLAN, keyed by `vlan_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanRecord {
    pub vlan_id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub interface: String,
    #[serde(default)]
    pub vlanif: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_method_roundtrips_as_plain_string() {
        let json = serde_json::to_string(&DiscoveryMethod::ManualProxmox).unwrap();
        assert_eq!(json, "\"manual-proxmox\"");

        let parsed: DiscoveryMethod = serde_json::from_str("\"ssh-detected\"").unwrap();
        assert_eq!(parsed, DiscoveryMethod::SshDetected);

        let unknown: DiscoveryMethod = serde_json::from_str("\"lldp\"").unwrap();
        assert_eq!(unknown, DiscoveryMethod::Other("lldp".to_string()));
        assert_eq!(unknown.rank(), 0);
    }

    #[test]
    fn discovery_method_equality_is_by_name() {
        assert_eq!(DiscoveryMethod::Other("nmap".to_string()), DiscoveryMethod::Nmap);

        let set: BTreeSet<DiscoveryMethod> = ["ssh", "nmap", "manual", "dns"]
            .into_iter()
            .map(DiscoveryMethod::from)
            .collect();
        let names: Vec<&str> = set.iter().map(|m| m.as_str()).collect();
        assert_eq!(names, vec!["dns", "manual", "nmap", "ssh"]);
    }

    #[test]
    fn host_record_fields_default_when_absent() {
        let host: HostRecord = serde_json::from_str(r#"{"ip": "10.0.0.7"}"#).unwrap();
        assert_eq!(host.ip, "10.0.0.7");
        assert!(host.mac.is_empty());
        assert!(host.services.is_empty());
        assert!(host.discovered_by.is_empty());
        assert!(host.metadata.is_empty());
        assert!(host.proxy_routes.is_empty());
    }

    #[test]
    fn host_record_serializes_in_canonical_field_order() {
        let mut host = HostRecord::discovered_by(DiscoveryMethod::Dns);
        host.ip = "10.0.0.1".to_string();
        host.hostname = "gw".to_string();

        let json = serde_json::to_string(&host).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"ip":"10.0.0.1","mac":"","hostname":"gw","os":"","services":[],"#,
                r#""discovered_by":["dns"],"metadata":{},"proxy_routes":[]}"#,
            )
        );
    }

    #[test]
    fn metadata_value_accepts_nested_json() {
        let raw = serde_json::json!({
            "interfaces": {"eth0": "10.0.0.2"},
            "containers": ["plex", "pihole"],
            "uptime": 3600,
            "virtual": false,
            "note": null
        });
        let value = MetadataValue::from(raw.clone());

        let MetadataValue::Map(map) = &value else {
            panic!("expected a map");
        };
        assert_eq!(map["uptime"].as_u64(), Some(3600));
        assert_eq!(map["virtual"], MetadataValue::Bool(false));
        assert_eq!(map["note"], MetadataValue::Null);
        assert!(matches!(&map["containers"], MetadataValue::List(items) if items.len() == 2));

        let back = serde_json::to_value(&value).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn vlan_record_requires_only_an_id() {
        let vlan: VlanRecord = serde_json::from_str(r#"{"vlan_id": 20}"#).unwrap();
        assert_eq!(vlan.vlan_id, 20);
        assert!(vlan.name.is_empty());
    }
}
