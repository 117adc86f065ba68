//! Nmap XML output deserialization.
//!
//! Nmap's `-oX` flag writes structured XML. This module deserializes it with
//! `quick-xml` + serde and flattens each live host into the nmap producer
//! record shape (`ip`, `mac`, `vendor`, `services`) that the consolidation
//! engine normalizes for `discovery-nmap` inputs.

use serde::{Deserialize, Serialize};

use crate::error::{ParseError, Result};

/// Root element: `<nmaprun>`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename = "nmaprun")]
pub struct NmapRun {
    #[serde(rename = "@args")]
    pub args: Option<String>,
    #[serde(rename = "host", default)]
    pub hosts: Vec<NmapHost>,
}

/// A single host from scan results.
#[derive(Debug, Clone, Deserialize)]
pub struct NmapHost {
    pub status: Option<HostStatus>,
    #[serde(rename = "address", default)]
    pub addresses: Vec<Address>,
    pub ports: Option<Ports>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostStatus {
    #[serde(rename = "@state")]
    pub state: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Address {
    #[serde(rename = "@addr")]
    pub addr: String,
    #[serde(rename = "@addrtype")]
    pub addr_type: String,
    #[serde(rename = "@vendor")]
    pub vendor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ports {
    #[serde(rename = "port", default)]
    pub ports: Vec<NmapPort>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NmapPort {
    #[serde(rename = "@protocol")]
    pub protocol: String,
    #[serde(rename = "@portid")]
    pub port_id: u16,
    pub state: PortState,
    pub service: Option<NmapService>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortState {
    #[serde(rename = "@state")]
    pub state: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NmapService {
    #[serde(rename = "@name")]
    pub name: String,
}

/// One host in the nmap producer shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanRecord {
    pub ip: String,
    pub mac: String,
    pub vendor: String,
    pub services: Vec<String>,
}

impl NmapHost {
    /// Extract the IPv4 address, if present.
    pub fn ipv4(&self) -> Option<&str> {
        self.addresses
            .iter()
            .find(|a| a.addr_type == "ipv4")
            .map(|a| a.addr.as_str())
    }

    /// The MAC address entry, which also carries the OUI vendor.
    pub fn mac_address(&self) -> Option<&Address> {
        self.addresses.iter().find(|a| a.addr_type == "mac")
    }

    /// Check if the host is up.
    pub fn is_up(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.state == "up")
    }

    /// Service names of open ports, `<port>/<protocol>` where nmap named none.
    pub fn open_services(&self) -> Vec<String> {
        let Some(ports) = &self.ports else {
            return Vec::new();
        };

        ports
            .ports
            .iter()
            .filter(|p| p.state.state == "open")
            .map(|p| match &p.service {
                Some(svc) if !svc.name.is_empty() => svc.name.clone(),
                _ => format!("{}/{}", p.port_id, p.protocol),
            })
            .collect()
    }
}

/// Parse nmap XML bytes into a structured `NmapRun`.
pub fn parse_nmap_xml(xml: &[u8]) -> Result<NmapRun> {
    quick_xml::de::from_reader(xml).map_err(|e| ParseError::XmlParse(format!("{e}")))
}

/// Flatten every up host with an IPv4 address into a `ScanRecord`.
pub fn scan_records(run: &NmapRun) -> Vec<ScanRecord> {
    run.hosts
        .iter()
        .filter(|h| h.is_up())
        .filter_map(|h| {
            let ip = h.ipv4()?;
            let mac = h.mac_address();

            Some(ScanRecord {
                ip: ip.to_string(),
                mac: mac.map(|a| a.addr.clone()).unwrap_or_default(),
                vendor: mac.and_then(|a| a.vendor.clone()).unwrap_or_default(),
                services: h.open_services(),
            })
        })
        .collect()
}
