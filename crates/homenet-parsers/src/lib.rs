//! homenet-parsers: Producers of canonical homenet records.
//!
//! Converts management-console exports (Proxmox VE, OPNsense, UniFi) into
//! `HostRecord`/`VlanRecord` lists, and nmap XML into the nmap producer
//! shape that the consolidation engine normalizes.

pub mod error;
pub mod nmap_xml;
pub mod opnsense;
pub mod proxmox;
pub mod unifi;

mod envelope;
mod lenient;
