//! OPNsense `config.xml` deserialization.
//!
//! Hosts come from two places in the configuration backup: DHCP static
//! mappings (`<dhcpd><IFACE><staticmap>`) and Unbound host overrides
//! (`<unboundplus><hosts><host>`). VLAN definitions live under `<vlans>`.

use std::collections::BTreeMap;

use homenet_core::{DiscoveryMethod, HostRecord, Metadata, MetadataValue, VlanRecord};
use serde::Deserialize;

use crate::error::{ParseError, Result};

/// Root element: `<opnsense>`. Only the sections this parser reads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename = "opnsense")]
pub struct OpnsenseConfig {
    /// DHCP server settings keyed by interface name (`lan`, `opt1`, ...).
    #[serde(default)]
    pub dhcpd: BTreeMap<String, DhcpdInterface>,
    #[serde(alias = "unbound")]
    pub unboundplus: Option<Unbound>,
    pub vlans: Option<Vlans>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DhcpdInterface {
    #[serde(rename = "staticmap", default)]
    pub static_maps: Vec<StaticMap>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaticMap {
    pub mac: Option<String>,
    pub ipaddr: Option<String>,
    pub hostname: Option<String>,
    pub descr: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Unbound {
    pub hosts: Option<HostOverrides>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostOverrides {
    #[serde(rename = "host", default)]
    pub hosts: Vec<HostOverride>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostOverride {
    pub hostname: Option<String>,
    pub domain: Option<String>,
    /// Unbound stores the override target address as `<server>`.
    pub server: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Vlans {
    #[serde(rename = "vlan", default)]
    pub vlans: Vec<Vlan>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Vlan {
    #[serde(rename = "if")]
    pub interface: Option<String>,
    pub tag: Option<String>,
    pub descr: Option<String>,
    pub vlanif: Option<String>,
}

impl HostOverride {
    /// `hostname.domain`, or the bare hostname when no domain is set.
    pub fn fqdn(&self) -> Option<String> {
        let hostname = self.hostname.as_deref()?;
        match self.domain.as_deref() {
            Some(domain) if !domain.is_empty() => Some(format!("{hostname}.{domain}")),
            _ => Some(hostname.to_string()),
        }
    }
}

/// Parse OPNsense config XML into a structured `OpnsenseConfig`.
pub fn parse_config(xml: &str) -> Result<OpnsenseConfig> {
    quick_xml::de::from_str(xml).map_err(|e| ParseError::XmlParse(format!("{e}")))
}

/// Extract DHCP static mappings, then DNS host overrides, as host records.
pub fn hosts(config: &OpnsenseConfig) -> Vec<HostRecord> {
    let static_hosts = config
        .dhcpd
        .values()
        .flat_map(|iface| iface.static_maps.iter())
        .filter_map(static_map_to_host);

    let override_hosts = config
        .unboundplus
        .iter()
        .flat_map(|u| u.hosts.iter())
        .flat_map(|h| h.hosts.iter())
        .filter_map(override_to_host);

    static_hosts.chain(override_hosts).collect()
}

/// Extract VLAN definitions. Entries without a numeric `<tag>` are skipped.
pub fn vlans(config: &OpnsenseConfig) -> Vec<VlanRecord> {
    config
        .vlans
        .iter()
        .flat_map(|v| v.vlans.iter())
        .filter_map(|vlan| {
            let tag = vlan.tag.as_deref()?.trim();
            let vlan_id = if tag.is_empty() {
                0
            } else {
                match tag.parse() {
                    Ok(id) => id,
                    Err(_) => {
                        tracing::warn!(tag, "Skipping VLAN with non-numeric tag");
                        return None;
                    }
                }
            };

            Some(VlanRecord {
                vlan_id,
                name: text(&vlan.descr),
                interface: text(&vlan.interface),
                vlanif: text(&vlan.vlanif),
            })
        })
        .collect()
}

fn static_map_to_host(map: &StaticMap) -> Option<HostRecord> {
    let mac = map.mac.as_deref()?;
    let ip = map.ipaddr.as_deref()?;

    Some(HostRecord {
        ip: ip.to_string(),
        mac: mac.to_string(),
        hostname: text(&map.hostname),
        metadata: describe("dhcp-static", &map.descr),
        ..HostRecord::discovered_by(DiscoveryMethod::ManualOpnsense)
    })
}

fn override_to_host(entry: &HostOverride) -> Option<HostRecord> {
    let ip = entry.server.as_deref()?;
    let hostname = entry.fqdn()?;

    Some(HostRecord {
        ip: ip.to_string(),
        hostname,
        metadata: describe("dns-override", &entry.description),
        ..HostRecord::discovered_by(DiscoveryMethod::ManualOpnsense)
    })
}

fn describe(kind: &str, description: &Option<String>) -> Metadata {
    Metadata::from([
        ("type".to_string(), MetadataValue::from(kind)),
        ("description".to_string(), text(description).into()),
    ])
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG_XML: &str = r#"<?xml version="1.0"?>
<opnsense>
  <version>24.7</version>
  <system>
    <hostname>fw</hostname>
    <domain>home.arpa</domain>
  </system>
  <vlans>
    <vlan>
      <if>igc1</if>
      <tag>10</tag>
      <descr>IoT</descr>
      <vlanif>vlan01</vlanif>
    </vlan>
    <vlan>
      <if>igc1</if>
      <tag>20</tag>
      <descr>Guest</descr>
      <vlanif>vlan02</vlanif>
    </vlan>
    <vlan>
      <if>igc1</if>
      <tag>trunk</tag>
    </vlan>
  </vlans>
  <dhcpd>
    <lan>
      <enable>1</enable>
      <staticmap>
        <mac>00:11:32:aa:bb:cc</mac>
        <ipaddr>10.0.0.5</ipaddr>
        <hostname>nas1</hostname>
        <descr>Synology</descr>
      </staticmap>
      <range>
        <from>10.0.0.100</from>
        <to>10.0.0.200</to>
      </range>
      <staticmap>
        <mac>00:11:32:aa:bb:dd</mac>
        <ipaddr>10.0.0.6</ipaddr>
      </staticmap>
      <staticmap>
        <mac>00:11:32:aa:bb:ee</mac>
        <hostname>no-address</hostname>
      </staticmap>
    </lan>
  </dhcpd>
  <unboundplus version="1.0.8">
    <hosts>
      <host uuid="6f1c">
        <enabled>1</enabled>
        <hostname>proxmox</hostname>
        <domain>home.arpa</domain>
        <rr>A</rr>
        <server>10.0.10.2</server>
        <description>hypervisor</description>
      </host>
      <host uuid="7a2d">
        <enabled>1</enabled>
        <hostname>printer</hostname>
        <server>10.0.0.30</server>
      </host>
    </hosts>
  </unboundplus>
</opnsense>"#;

    #[test]
    fn test_static_maps_then_overrides() {
        let config = parse_config(CONFIG_XML).unwrap();
        let hosts = hosts(&config);
        assert_eq!(hosts.len(), 4);

        let nas = &hosts[0];
        assert_eq!(nas.ip, "10.0.0.5");
        assert_eq!(nas.mac, "00:11:32:aa:bb:cc");
        assert_eq!(nas.hostname, "nas1");
        assert_eq!(nas.metadata["type"].as_str(), Some("dhcp-static"));
        assert_eq!(nas.metadata["description"].as_str(), Some("Synology"));
        assert!(nas.discovered_by.contains(&DiscoveryMethod::ManualOpnsense));

        assert_eq!(hosts[1].ip, "10.0.0.6");
        assert_eq!(hosts[1].hostname, "");

        let proxmox = &hosts[2];
        assert_eq!(proxmox.ip, "10.0.10.2");
        assert_eq!(proxmox.hostname, "proxmox.home.arpa");
        assert_eq!(proxmox.mac, "");
        assert_eq!(proxmox.metadata["type"].as_str(), Some("dns-override"));

        assert_eq!(hosts[3].hostname, "printer");
        assert_eq!(hosts[3].metadata["description"].as_str(), Some(""));
    }

    #[test]
    fn test_vlans_skip_non_numeric_tags() {
        let config = parse_config(CONFIG_XML).unwrap();
        let vlans = vlans(&config);

        assert_eq!(
            vlans,
            vec![
                VlanRecord {
                    vlan_id: 10,
                    name: "IoT".to_string(),
                    interface: "igc1".to_string(),
                    vlanif: "vlan01".to_string(),
                },
                VlanRecord {
                    vlan_id: 20,
                    name: "Guest".to_string(),
                    interface: "igc1".to_string(),
                    vlanif: "vlan02".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_config_without_sections() {
        let config = parse_config("<opnsense><version>24.7</version></opnsense>").unwrap();
        assert!(hosts(&config).is_empty());
        assert!(vlans(&config).is_empty());
    }

    #[test]
    fn test_invalid_xml() {
        let err = parse_config("<opnsense><dhcpd>").unwrap_err();
        assert!(matches!(err, ParseError::XmlParse(_)));
    }
}
