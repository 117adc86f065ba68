//! Identity resolution across MAC- and IP-keyed sources.
//!
//! Hosts live in a single arena. `by_mac` and `by_ip` are indices into it,
//! so a MAC-keyed host that also owns an IP is one entity reachable from
//! both sides: merging through either key updates the same record and the
//! two views can never diverge.

use std::collections::{BTreeSet, HashMap, HashSet};

use homenet_core::HostRecord;

use crate::config::ConsolidateConfig;
use crate::merge::merge;

#[derive(Debug)]
struct Entity {
    record: HostRecord,
    /// Created from a record that carried a MAC.
    mac_keyed: bool,
    /// `by_ip` keys currently pointing at this entity.
    aliases: BTreeSet<String>,
    /// Cleared when a MAC-keyed host takes over this entity's address.
    live: bool,
}

/// Working identity tables for one consolidation run.
#[derive(Debug)]
pub struct IdentityIndex {
    entities: Vec<Entity>,
    by_mac: HashMap<String, usize>,
    by_ip: HashMap<String, usize>,
    prune_stale_aliases: bool,
}

impl IdentityIndex {
    pub fn new(config: &ConsolidateConfig) -> Self {
        Self {
            entities: Vec::new(),
            by_mac: HashMap::new(),
            by_ip: HashMap::new(),
            prune_stale_aliases: config.prune_stale_ip_aliases,
        }
    }

    /// Resolve the identity of `record` and merge it into the tables.
    ///
    /// Returns the host it now belongs to, or `None` when the record has no
    /// IP and was dropped.
    pub fn upsert(&mut self, record: HostRecord) -> Option<&HostRecord> {
        if record.ip.is_empty() {
            return None;
        }

        let id = if record.mac.is_empty() {
            self.upsert_by_ip(record)
        } else {
            self.upsert_by_mac(record)
        };
        Some(&self.entities[id].record)
    }

    pub fn by_mac(&self, mac: &str) -> Option<&HostRecord> {
        self.by_mac.get(mac).map(|&id| &self.entities[id].record)
    }

    pub fn by_ip(&self, ip: &str) -> Option<&HostRecord> {
        self.by_ip.get(ip).map(|&id| &self.entities[id].record)
    }

    /// Number of distinct hosts currently tracked.
    pub fn len(&self) -> usize {
        self.entities.iter().filter(|e| e.live).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every MAC-keyed host, then every IP-keyed host whose address no
    /// MAC-keyed host already claimed. Each entity appears at most once.
    pub fn into_hosts(self) -> Vec<HostRecord> {
        let (mac_keyed, ip_keyed): (Vec<Entity>, Vec<Entity>) = self
            .entities
            .into_iter()
            .filter(|e| e.live)
            .partition(|e| e.mac_keyed);

        let mut seen_ips = HashSet::new();
        let mut hosts = Vec::with_capacity(mac_keyed.len() + ip_keyed.len());

        for entity in mac_keyed {
            seen_ips.insert(entity.record.ip.clone());
            hosts.push(entity.record);
        }
        for entity in ip_keyed {
            if seen_ips.contains(&entity.record.ip) {
                tracing::debug!(
                    ip = %entity.record.ip,
                    "Dropping IP-only shadow of a MAC-keyed host"
                );
                continue;
            }
            hosts.push(entity.record);
        }

        hosts
    }

    fn upsert_by_mac(&mut self, record: HostRecord) -> usize {
        let mac = record.mac.clone();
        let ip = record.ip.clone();

        let id = match self.by_mac.get(&mac).copied() {
            Some(id) => {
                let merged = merge(&self.entities[id].record, &record);
                self.entities[id].record = merged;
                if self.prune_stale_aliases {
                    self.prune_aliases(id, &ip);
                }
                id
            }
            None => {
                let id = self.push(record, true);
                self.by_mac.insert(mac, id);
                id
            }
        };

        // The address a MAC-keyed record arrives with always points at it,
        // which is how a DHCP renumbering is absorbed.
        self.claim_ip(id, ip);
        id
    }

    fn upsert_by_ip(&mut self, record: HostRecord) -> usize {
        match self.by_ip.get(&record.ip).copied() {
            Some(id) => {
                let merged = merge(&self.entities[id].record, &record);
                self.entities[id].record = merged;
                id
            }
            None => {
                let ip = record.ip.clone();
                let id = self.push(record, false);
                self.claim_ip(id, ip);
                id
            }
        }
    }

    fn push(&mut self, record: HostRecord, mac_keyed: bool) -> usize {
        self.entities.push(Entity {
            record,
            mac_keyed,
            aliases: BTreeSet::new(),
            live: true,
        });
        self.entities.len() - 1
    }

    /// Point `by_ip[ip]` at `id` unconditionally. An IP-only host that held
    /// the slot is shadowed by the MAC-keyed one and dropped without merging;
    /// a MAC-keyed one just loses the alias.
    fn claim_ip(&mut self, id: usize, ip: String) {
        self.entities[id].aliases.insert(ip.clone());

        let Some(displaced) = self.by_ip.insert(ip.clone(), id) else {
            return;
        };
        if displaced == id {
            return;
        }

        let entity = &mut self.entities[displaced];
        entity.aliases.remove(&ip);
        if !entity.mac_keyed {
            entity.live = false;
            tracing::debug!(
                ip = %ip,
                mac = %self.entities[id].record.mac,
                "IP-only host shadowed by MAC-keyed host"
            );
        }
    }

    /// Drop `by_ip` aliases of `id` other than its current address and the
    /// address `incoming_ip` it was just seen at.
    fn prune_aliases(&mut self, id: usize, incoming_ip: &str) {
        let current_ip = self.entities[id].record.ip.clone();
        let stale: Vec<String> = self.entities[id]
            .aliases
            .iter()
            .filter(|alias| **alias != current_ip && alias.as_str() != incoming_ip)
            .cloned()
            .collect();

        for alias in stale {
            self.entities[id].aliases.remove(&alias);
            if self.by_ip.get(&alias) == Some(&id) {
                self.by_ip.remove(&alias);
                tracing::debug!(ip = %alias, current_ip = %current_ip, "Pruned stale IP alias");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homenet_core::DiscoveryMethod;

    fn host(ip: &str, mac: &str, method: &str) -> HostRecord {
        HostRecord {
            ip: ip.to_string(),
            mac: mac.to_string(),
            ..HostRecord::discovered_by(DiscoveryMethod::from(method))
        }
    }

    fn index() -> IdentityIndex {
        IdentityIndex::new(&ConsolidateConfig::default())
    }

    #[test]
    fn test_record_without_ip_is_dropped() {
        let mut index = index();
        assert!(index.upsert(host("", "aa:bb", "nmap")).is_none());
        assert!(index.is_empty());
        assert!(index.by_mac("aa:bb").is_none());
    }

    #[test]
    fn test_same_mac_merges() {
        let mut index = index();
        index.upsert(host("10.0.0.5", "aa:bb", "nmap"));
        let mut ssh = host("10.0.0.5", "aa:bb", "ssh");
        ssh.hostname = "nas1".to_string();
        let merged = index.upsert(ssh).unwrap().clone();

        assert_eq!(index.len(), 1);
        assert_eq!(merged.hostname, "nas1");
        assert_eq!(index.by_ip("10.0.0.5"), Some(&merged));
    }

    #[test]
    fn test_ip_only_record_refreshes_mac_keyed_host() {
        let mut index = index();
        index.upsert(host("10.0.0.5", "aa:bb", "nmap"));
        let mut dns = host("10.0.0.5", "", "dns");
        dns.hostname = "nas.home.arpa".to_string();
        index.upsert(dns);

        let via_mac = index.by_mac("aa:bb").unwrap();
        let via_ip = index.by_ip("10.0.0.5").unwrap();
        assert_eq!(via_mac, via_ip);
        assert_eq!(via_mac.ip, "10.0.0.5");
        assert_eq!(via_mac.hostname, "nas.home.arpa");
        assert_eq!(index.len(), 1);

        // a later MAC record merges against the refreshed data
        let mut ssh = host("10.0.0.5", "aa:bb", "ssh");
        ssh.os = "DSM 7".to_string();
        let latest = index.upsert(ssh).unwrap();
        assert_eq!(latest.hostname, "nas.home.arpa");
        assert_eq!(latest.os, "DSM 7");
    }

    #[test]
    fn test_mac_record_shadows_earlier_ip_only_host() {
        let mut index = index();
        let mut dns = host("10.0.0.5", "", "dns");
        dns.hostname = "nas.home.arpa".to_string();
        index.upsert(dns);
        index.upsert(host("10.0.0.5", "aa:bb", "nmap"));

        assert_eq!(index.len(), 1);
        assert_eq!(index.by_ip("10.0.0.5"), index.by_mac("aa:bb"));
        let hosts = index.into_hosts();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].mac, "aa:bb");
        assert_eq!(hosts[0].hostname, "");
        let methods: Vec<&str> = hosts[0].discovered_by.iter().map(|m| m.as_str()).collect();
        assert_eq!(methods, vec!["nmap"]);
    }

    #[test]
    fn test_shadowed_host_stays_gone_after_renumbering() {
        let mut index = index();
        index.upsert(host("10.0.0.5", "", "dns"));
        index.upsert(host("10.0.0.5", "aa:bb", "manual-unifi"));
        index.upsert(host("10.0.0.9", "aa:bb", "nmap"));

        let hosts = index.into_hosts();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].ip, "10.0.0.9");
    }

    #[test]
    fn test_renumbered_host_is_emitted_once() {
        let mut index = index();
        index.upsert(host("10.0.0.5", "aa:bb", "nmap"));
        index.upsert(host("10.0.0.50", "aa:bb", "manual-unifi"));
        index.upsert(host("10.0.0.60", "aa:bb", "nmap"));

        let hosts = index.into_hosts();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].ip, "10.0.0.5", "first nmap sighting keeps priority on ties");
    }

    #[test]
    fn test_stale_alias_is_pruned() {
        let mut index = index();
        index.upsert(host("10.0.0.5", "aa:bb", "manual-unifi"));
        index.upsert(host("10.0.0.9", "aa:bb", "nmap"));

        assert_eq!(index.by_mac("aa:bb").unwrap().ip, "10.0.0.9");
        assert!(index.by_ip("10.0.0.5").is_none());

        let mut dns = host("10.0.0.5", "", "dns");
        dns.hostname = "new-tenant".to_string();
        index.upsert(dns);

        assert_eq!(index.by_mac("aa:bb").unwrap().hostname, "");
        let hosts = index.into_hosts();
        assert_eq!(hosts.len(), 2);
    }

    #[test]
    fn test_stale_alias_kept_when_pruning_disabled() {
        let config = ConsolidateConfig {
            prune_stale_ip_aliases: false,
        };
        let mut index = IdentityIndex::new(&config);
        index.upsert(host("10.0.0.5", "aa:bb", "manual-unifi"));
        index.upsert(host("10.0.0.9", "aa:bb", "nmap"));

        assert_eq!(index.by_ip("10.0.0.5"), index.by_mac("aa:bb"));

        let mut dns = host("10.0.0.5", "", "dns");
        dns.hostname = "old-name".to_string();
        index.upsert(dns);

        assert_eq!(index.by_mac("aa:bb").unwrap().hostname, "old-name");
        assert_eq!(index.into_hosts().len(), 1);
    }

    #[test]
    fn test_two_macs_sharing_an_ip_stay_separate() {
        let mut index = index();
        index.upsert(host("10.0.0.5", "aa:bb", "nmap"));
        index.upsert(host("10.0.0.5", "cc:dd", "nmap"));

        assert_eq!(index.by_ip("10.0.0.5").unwrap().mac, "cc:dd");
        assert_eq!(index.by_mac("aa:bb").unwrap().ip, "10.0.0.5");
        assert_eq!(index.into_hosts().len(), 2);
    }
}
