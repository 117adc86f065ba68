//! CLI entry point for the homenet export parsers.
//!
//! Reads a vendor export from stdin and writes canonical records as
//! pretty-printed JSON to stdout, ready to be saved as a `discovery-*` file
//! for `homenet-consolidate`.

use std::io::Read;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use homenet_parsers::{nmap_xml, opnsense, proxmox, unifi};

#[derive(Parser)]
#[command(name = "homenet-parse")]
#[command(about = "Convert management-console exports into canonical homenet records")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Proxmox VE API JSON (`pvesh get /nodes` or `/cluster/resources`).
    Proxmox {
        #[arg(value_enum)]
        mode: ProxmoxMode,
    },
    /// OPNsense configuration backup XML.
    Opnsense {
        #[arg(value_enum, default_value = "hosts")]
        mode: OpnsenseMode,
    },
    /// UniFi controller device JSON.
    Unifi,
    /// Nmap XML output (`nmap -oX`).
    Nmap,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProxmoxMode {
    Nodes,
    Resources,
}

#[derive(Clone, Copy, ValueEnum)]
enum OpnsenseMode {
    Hosts,
    Vlans,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;

    match cli.command {
        Command::Proxmox { mode } => {
            let hosts = match mode {
                ProxmoxMode::Nodes => proxmox::parse_nodes(&input)?,
                ProxmoxMode::Resources => proxmox::parse_resources(&input)?,
            };
            emit(&hosts)?;
        }
        Command::Opnsense { mode } => {
            let config = opnsense::parse_config(&input)?;
            match mode {
                OpnsenseMode::Hosts => emit(&opnsense::hosts(&config))?,
                OpnsenseMode::Vlans => emit(&opnsense::vlans(&config))?,
            }
        }
        Command::Unifi => emit(&unifi::parse_devices(&input)?)?,
        Command::Nmap => {
            let run = nmap_xml::parse_nmap_xml(input.as_bytes())?;
            let records = nmap_xml::scan_records(&run);
            tracing::info!(
                hosts = run.hosts.len(),
                up = records.len(),
                "Parsed nmap scan"
            );
            emit(&records)?;
        }
    }

    Ok(())
}

fn emit<T: Serialize>(records: &[T]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(records)?);
    Ok(())
}
