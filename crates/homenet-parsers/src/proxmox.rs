//! Proxmox VE API exports: `/nodes` and `/cluster/resources`.

use homenet_core::{DiscoveryMethod, HostRecord, Metadata, MetadataValue};
use serde::Deserialize;

use crate::envelope::parse_list;
use crate::error::Result;
use crate::lenient;

/// One entry of the `/nodes` listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProxmoxNode {
    #[serde(deserialize_with = "lenient::string")]
    pub node: String,
    #[serde(deserialize_with = "lenient::string")]
    pub ip: String,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub version: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient::count")]
    pub uptime: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub maxcpu: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub maxmem: u64,
}

/// One entry of `/cluster/resources`. Only `qemu` and `lxc` entries matter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProxmoxResource {
    #[serde(rename = "type", deserialize_with = "lenient::string")]
    pub resource_type: String,
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub ip: String,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient::opt_count")]
    pub vmid: Option<u64>,
    #[serde(deserialize_with = "lenient::string")]
    pub node: String,
    #[serde(deserialize_with = "lenient::count")]
    pub maxcpu: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub maxmem: u64,
    pub netin: Option<serde_json::Value>,
    pub netout: Option<serde_json::Value>,
}

impl ProxmoxResource {
    fn is_guest(&self) -> bool {
        matches!(self.resource_type.as_str(), "qemu" | "lxc")
    }

    /// Traffic counters are only reported for running guests, which are the
    /// only ones whose `ip` can be trusted.
    fn has_network(&self) -> bool {
        self.netin.is_some() || self.netout.is_some()
    }
}

/// Parse a `/nodes` export into hypervisor host records.
pub fn parse_nodes(input: &str) -> Result<Vec<HostRecord>> {
    let nodes: Vec<ProxmoxNode> = parse_list(input)?;
    Ok(nodes.iter().map(node_to_host).collect())
}

/// Parse a `/cluster/resources` export into VM and container host records.
pub fn parse_resources(input: &str) -> Result<Vec<HostRecord>> {
    let resources: Vec<ProxmoxResource> = parse_list(input)?;
    let hosts: Vec<HostRecord> = resources
        .iter()
        .filter(|r| r.is_guest())
        .map(resource_to_host)
        .collect();

    tracing::debug!(
        resources = resources.len(),
        guests = hosts.len(),
        "Parsed Proxmox cluster resources"
    );
    Ok(hosts)
}

pub fn node_to_host(node: &ProxmoxNode) -> HostRecord {
    let version = node.version.as_deref().unwrap_or("unknown");

    let metadata = Metadata::from([
        ("type".to_string(), MetadataValue::from("hypervisor")),
        ("status".to_string(), status_or_unknown(&node.status)),
        ("uptime".to_string(), node.uptime.into()),
        ("cpu_count".to_string(), node.maxcpu.into()),
        ("mem_total".to_string(), node.maxmem.into()),
    ]);

    HostRecord {
        ip: node.ip.clone(),
        hostname: node.node.clone(),
        os: format!("Proxmox VE {version}"),
        services: ["proxmox", "kvm"].into_iter().map(String::from).collect(),
        metadata,
        ..HostRecord::discovered_by(DiscoveryMethod::ManualProxmox)
    }
}

pub fn resource_to_host(resource: &ProxmoxResource) -> HostRecord {
    let is_vm = resource.resource_type == "qemu";
    let ip = if resource.has_network() {
        resource.ip.clone()
    } else {
        String::new()
    };
    let vmid = resource
        .vmid
        .map(MetadataValue::from)
        .unwrap_or_else(|| MetadataValue::from(""));

    let metadata = Metadata::from([
        (
            "type".to_string(),
            MetadataValue::from(if is_vm { "vm" } else { "container" }),
        ),
        ("status".to_string(), status_or_unknown(&resource.status)),
        ("vmid".to_string(), vmid),
        ("node".to_string(), resource.node.clone().into()),
        ("cpu_count".to_string(), resource.maxcpu.into()),
        ("mem_total".to_string(), resource.maxmem.into()),
    ]);

    HostRecord {
        ip,
        hostname: resource.name.clone(),
        os: if is_vm { "VM" } else { "LXC" }.to_string(),
        metadata,
        ..HostRecord::discovered_by(DiscoveryMethod::ManualProxmox)
    }
}

fn status_or_unknown(status: &Option<String>) -> MetadataValue {
    status.as_deref().unwrap_or("unknown").into()
}
