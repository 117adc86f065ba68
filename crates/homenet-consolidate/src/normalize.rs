//! Source normalization: map producer-specific records to `HostRecord`.
//!
//! Every producer emits JSON objects with its own keys. The caller names the
//! producer with a [`Provenance`]; each variant has exactly one mapping.

use std::collections::BTreeSet;
use std::path::Path;

use homenet_core::{DiscoveryMethod, HostRecord, Metadata, MetadataValue};
use serde_json::{Map, Value};

/// Which producer emitted a discovery file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Active scan output: `{ip, mac, vendor, services}`.
    Nmap,
    /// SSH probe output, canonical or the legacy
    /// `{ip, hostname, os, services, interfaces, containers}` shape.
    Ssh,
    /// DNS enumeration: `{hostname, ip}`.
    Dns,
    /// Vendor export parser output, already canonical.
    Manual,
    /// Anything else; canonical when tagged, best-effort otherwise.
    Other,
}

impl Provenance {
    /// Infer the producer from the `discovery-<kind>` marker in a file path.
    pub fn from_path(path: &Path) -> Self {
        let path = path.to_string_lossy();
        if path.contains("discovery-nmap") {
            Self::Nmap
        } else if path.contains("discovery-ssh") {
            Self::Ssh
        } else if path.contains("discovery-dns") {
            Self::Dns
        } else if path.contains("discovery-manual") {
            Self::Manual
        } else {
            Self::Other
        }
    }
}

/// Normalize one raw record emitted by `provenance` into canonical form.
pub fn normalize(raw: &Map<String, Value>, provenance: Provenance) -> HostRecord {
    let raw = RawRecord(raw);
    match provenance {
        Provenance::Nmap => from_nmap(raw),
        Provenance::Ssh if raw.has("discovered_by") && raw.has("metadata") => {
            raw.canonical(DiscoveryMethod::Ssh)
        }
        Provenance::Ssh => from_legacy_ssh(raw),
        Provenance::Dns => HostRecord {
            ip: raw.string("ip"),
            hostname: raw.string("hostname"),
            ..HostRecord::discovered_by(DiscoveryMethod::Dns)
        },
        Provenance::Manual => raw.canonical(DiscoveryMethod::from("manual")),
        Provenance::Other => raw.canonical(DiscoveryMethod::from("unknown")),
    }
}

fn from_nmap(raw: RawRecord<'_>) -> HostRecord {
    let vendor = raw.string("vendor");
    let mut metadata = Metadata::new();
    if !vendor.is_empty() {
        metadata.insert("vendor".to_string(), vendor.into());
    }

    HostRecord {
        ip: raw.string("ip"),
        mac: raw.string("mac"),
        services: raw.string_set("services"),
        metadata,
        ..HostRecord::discovered_by(DiscoveryMethod::Nmap)
    }
}

fn from_legacy_ssh(raw: RawRecord<'_>) -> HostRecord {
    let interfaces = raw
        .value("interfaces")
        .unwrap_or_else(|| MetadataValue::Map(Default::default()));
    let containers = raw
        .value("containers")
        .unwrap_or_else(|| MetadataValue::List(Vec::new()));

    HostRecord {
        ip: raw.string("ip"),
        hostname: raw.string("hostname"),
        os: raw.string("os"),
        services: raw.string_set("services"),
        metadata: Metadata::from([
            ("interfaces".to_string(), interfaces),
            ("containers".to_string(), containers),
        ]),
        proxy_routes: raw.routes(),
        ..HostRecord::discovered_by(DiscoveryMethod::Ssh)
    }
}

/// Lenient read-only view over a producer's JSON object.
#[derive(Clone, Copy)]
struct RawRecord<'a>(&'a Map<String, Value>);

impl RawRecord<'_> {
    fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// String field; absent, null or non-string values read as empty.
    fn string(&self, key: &str) -> String {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// Array of strings (numbers stringified), or a single string.
    fn string_set(&self, key: &str) -> BTreeSet<String> {
        match self.0.get(key) {
            Some(Value::Array(items)) => items.iter().filter_map(scalar_string).collect(),
            Some(Value::String(s)) => BTreeSet::from([s.clone()]),
            _ => BTreeSet::new(),
        }
    }

    fn value(&self, key: &str) -> Option<MetadataValue> {
        self.0.get(key).cloned().map(MetadataValue::from)
    }

    fn metadata(&self) -> Metadata {
        match self.0.get("metadata") {
            Some(Value::Object(map)) => map
                .iter()
                .map(|(k, v)| (k.clone(), MetadataValue::from(v.clone())))
                .collect(),
            _ => Metadata::new(),
        }
    }

    fn routes(&self) -> Vec<Value> {
        match self.0.get("proxy_routes") {
            Some(Value::Array(routes)) => routes.clone(),
            _ => Vec::new(),
        }
    }

    /// Read a record that is already in canonical shape. `fallback` tags it
    /// only when the producer left `discovered_by` out entirely.
    fn canonical(&self, fallback: DiscoveryMethod) -> HostRecord {
        let discovered_by = if self.has("discovered_by") {
            self.string_set("discovered_by")
                .into_iter()
                .map(DiscoveryMethod::from)
                .collect()
        } else {
            BTreeSet::from([fallback])
        };

        HostRecord {
            ip: self.string("ip"),
            mac: self.string("mac"),
            hostname: self.string("hostname"),
            os: self.string("os"),
            services: self.string_set("services"),
            discovered_by,
            metadata: self.metadata(),
            proxy_routes: self.routes(),
        }
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
