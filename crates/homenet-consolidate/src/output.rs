//! Inventory serialization and atomic file replacement.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::assemble::Inventory;
use crate::error::{ConsolidateError, Result};

/// Pretty-printed `{hosts, vlans}` document with a trailing newline.
pub fn render_json(inventory: &Inventory) -> Result<String> {
    let mut body = serde_json::to_string_pretty(inventory)?;
    body.push('\n');
    Ok(body)
}

/// One compact host object per line, in inventory order.
pub fn render_jsonl(inventory: &Inventory) -> Result<String> {
    let mut body = String::new();
    for host in &inventory.hosts {
        body.push_str(&serde_json::to_string(host)?);
        body.push('\n');
    }
    Ok(body)
}

/// Write both artifacts. Each file is replaced atomically, and nothing is
/// touched unless both render successfully.
pub fn write_inventory(inventory: &Inventory, json_path: &Path, jsonl_path: &Path) -> Result<()> {
    let json = render_json(inventory)?;
    let jsonl = render_jsonl(inventory)?;

    write_atomic(json_path, json.as_bytes())?;
    write_atomic(jsonl_path, jsonl.as_bytes())?;

    tracing::debug!(
        json = %json_path.display(),
        jsonl = %jsonl_path.display(),
        hosts = inventory.hosts.len(),
        "Wrote inventory"
    );
    Ok(())
}

/// Stage `contents` next to `path`, then rename it over the target.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(contents)?;
    staged.as_file().sync_all()?;
    staged
        .persist(path)
        .map_err(|e| ConsolidateError::Persist {
            path: path.display().to_string(),
            source: e.error,
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use homenet_core::{DiscoveryMethod, HostRecord, VlanRecord};

    fn inventory() -> Inventory {
        let mut nas = HostRecord::discovered_by(DiscoveryMethod::Ssh);
        nas.ip = "10.0.0.5".to_string();
        nas.hostname = "nas1".to_string();
        let mut printer = HostRecord::discovered_by(DiscoveryMethod::Dns);
        printer.ip = "10.0.0.7".to_string();

        Inventory {
            hosts: vec![nas, printer],
            vlans: vec![VlanRecord {
                vlan_id: 10,
                name: "iot".to_string(),
                interface: "igb1".to_string(),
                vlanif: "vlan0.10".to_string(),
            }],
        }
    }

    #[test]
    fn test_render_jsonl_one_line_per_host() {
        let body = render_jsonl(&inventory()).unwrap();
        let lines: Vec<&str> = body.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(body.ends_with('\n'));
        let first: HostRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.hostname, "nas1");
        assert!(!lines[1].contains('\n'));
    }

    #[test]
    fn test_render_jsonl_empty_inventory() {
        assert_eq!(render_jsonl(&Inventory::default()).unwrap(), "");
    }

    #[test]
    fn test_render_json_shape() {
        let body = render_json(&inventory()).unwrap();
        assert!(body.ends_with("}\n"));

        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["hosts"].as_array().unwrap().len(), 2);
        assert_eq!(value["vlans"][0]["vlan_id"], 10);
        assert_eq!(value["hosts"][0]["discovered_by"][0], "ssh");
    }

    #[test]
    fn test_write_inventory_replaces_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("inventory.json");
        let jsonl_path = dir.path().join("inventory.jsonl");
        std::fs::write(&json_path, "stale").unwrap();

        write_inventory(&inventory(), &json_path, &jsonl_path).unwrap();

        let written: Inventory =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(written, inventory());
        assert_eq!(std::fs::read_to_string(&jsonl_path).unwrap().lines().count(), 2);

        // no staging files left behind
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 2);
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("missing").join("inventory.json");
        let jsonl_path = dir.path().join("inventory.jsonl");

        assert!(write_inventory(&inventory(), &json_path, &jsonl_path).is_err());
        assert!(!jsonl_path.exists());
    }
}
