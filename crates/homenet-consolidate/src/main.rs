//! CLI entry point for the homenet inventory consolidator.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use homenet_consolidate::config::ConsolidateConfig;
use homenet_consolidate::output::write_inventory;
use homenet_consolidate::{consolidate, InputFile};

#[derive(Parser)]
#[command(name = "homenet-consolidate")]
#[command(about = "Merge homenet discovery files into one canonical inventory")]
#[command(version)]
struct Cli {
    /// Destination for the pretty-printed inventory document.
    output_json: PathBuf,

    /// Destination for the one-host-per-line inventory.
    output_jsonl: PathBuf,

    /// Discovery files, in merge order. The producer is read from the
    /// `discovery-<kind>` part of each name.
    #[arg(required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Config file prefix (default: homenet).
    #[arg(short, long, default_value = "homenet")]
    config: String,
}

fn main() -> anyhow::Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            e.print()?;
            return Ok(if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            });
        }
    };

    let config = load_consolidate_config(&cli.config)?;
    let inputs: Vec<InputFile> = cli.inputs.into_iter().map(InputFile::from_path).collect();

    let inventory = consolidate(&inputs, &config);
    write_inventory(&inventory, &cli.output_json, &cli.output_jsonl)?;

    println!(
        "Consolidated {} hosts -> {} and {}",
        inventory.hosts.len(),
        cli.output_json.display(),
        cli.output_jsonl.display()
    );
    Ok(ExitCode::SUCCESS)
}

fn load_consolidate_config(file_prefix: &str) -> anyhow::Result<ConsolidateConfig> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("HOMENET")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    match cfg.get::<ConsolidateConfig>("consolidate") {
        Ok(c) => Ok(c),
        Err(_) => Ok(ConsolidateConfig::default()),
    }
}
