//! UniFi controller device exports (`/api/s/<site>/stat/device`).

use homenet_core::{DiscoveryMethod, HostRecord, Metadata, MetadataValue};
use serde::Deserialize;

use crate::envelope::parse_list;
use crate::error::Result;
use crate::lenient;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UnifiDevice {
    #[serde(deserialize_with = "lenient::string")]
    pub ip: String,
    #[serde(deserialize_with = "lenient::string")]
    pub mac: String,
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub hostname: String,
    #[serde(rename = "type", deserialize_with = "lenient::opt_string")]
    pub device_type: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub model: String,
    #[serde(deserialize_with = "lenient::string")]
    pub version: String,
    #[serde(deserialize_with = "lenient::count")]
    pub state: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub uptime: u64,
}

/// Parse a device listing into network-device host records.
pub fn parse_devices(input: &str) -> Result<Vec<HostRecord>> {
    let devices: Vec<UnifiDevice> = parse_list(input)?;
    Ok(devices.iter().map(device_to_host).collect())
}

pub fn device_to_host(device: &UnifiDevice) -> HostRecord {
    let device_type = device.device_type.as_deref().unwrap_or("unknown");
    let hostname = if device.name.is_empty() {
        &device.hostname
    } else {
        &device.name
    };
    let os = if device.version.is_empty() {
        "UniFi".to_string()
    } else {
        format!("UniFi {}", device.version)
    };

    let metadata = Metadata::from([
        ("type".to_string(), MetadataValue::from("network-device")),
        ("model".to_string(), device.model.clone().into()),
        ("device_type".to_string(), device_type.into()),
        ("state".to_string(), device.state.into()),
        ("uptime".to_string(), device.uptime.into()),
    ]);

    HostRecord {
        ip: device.ip.clone(),
        mac: device.mac.clone(),
        hostname: hostname.clone(),
        os,
        services: ["unifi", device_type].into_iter().map(String::from).collect(),
        metadata,
        ..HostRecord::discovered_by(DiscoveryMethod::ManualUnifi)
    }
}
