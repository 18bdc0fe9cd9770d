//! Proxmox VE SDN zone CLI (pvesdn-zone)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pve_api_client::{ClientConfig, PveZoneGateway};
use pve_sdn_core::{ProviderContext, ZoneReconciler};
use pvesdn_zone::commands::{SchemaCommand, ZoneCommand};
use pvesdn_zone::state::{Declaration, StateFile};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "pvesdn-zone")]
#[command(about = "Proxmox VE SDN zone management CLI")]
#[command(version)]
#[command(long_about = "
Proxmox VE SDN zone management CLI

Reconciles one SDN zone per state file against the cluster controller.
Connection settings come from the configuration file and PVE_SDN_*
environment variables (PVE_SDN_API_URL, PVE_SDN_TOKEN_ID, ...).

Examples:
  pvesdn-zone create -s z1.json -a type=vxlan -a zone=z1 -a mtu=1500 -a tag=10
  pvesdn-zone read -s z1.json
  pvesdn-zone update -s z1.json -a peers=10.0.0.1,10.0.0.2
  pvesdn-zone update -s z1.json --unset mtu
  pvesdn-zone import z1 -s z1.json
  pvesdn-zone delete -s z1.json
  pvesdn-zone schema --format json
")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a zone from declared attributes
    Create {
        /// State file of the zone
        #[arg(short, long)]
        state: PathBuf,

        #[command(flatten)]
        declaration: Declaration,
    },

    /// Refresh the state file from the controller
    Read {
        /// State file of the zone
        #[arg(short, long)]
        state: PathBuf,
    },

    /// Converge a tracked zone to the declared attributes
    Update {
        /// State file of the zone
        #[arg(short, long)]
        state: PathBuf,

        #[command(flatten)]
        declaration: Declaration,
    },

    /// Delete a tracked zone
    Delete {
        /// State file of the zone
        #[arg(short, long)]
        state: PathBuf,
    },

    /// Start tracking an existing zone
    Import {
        /// Zone identifier
        zone: String,

        /// State file to write
        #[arg(short, long)]
        state: PathBuf,
    },

    /// Show the declared attribute schema
    Schema {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Generate example configuration
    GenerateConfig {
        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match run(&cli).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {}", e);
                for cause in e.chain().skip(1) {
                    eprintln!("  Caused by: {}", cause);
                }
            }
            std::process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Create { state, declaration } => {
            zone_command(cli.config.as_deref())?
                .create(&StateFile::new(state), declaration)
                .await
        }
        Commands::Read { state } => {
            zone_command(cli.config.as_deref())?
                .read(&StateFile::new(state))
                .await
        }
        Commands::Update { state, declaration } => {
            zone_command(cli.config.as_deref())?
                .update(&StateFile::new(state), declaration)
                .await
        }
        Commands::Delete { state } => {
            zone_command(cli.config.as_deref())?
                .delete(&StateFile::new(state))
                .await
        }
        Commands::Import { zone, state } => {
            zone_command(cli.config.as_deref())?
                .import(zone, &StateFile::new(state))
                .await
        }
        Commands::Schema { format } => SchemaCommand::execute(format),
        Commands::GenerateConfig { output } => generate_config(output.as_deref()),
    }
}

fn zone_command(config_path: Option<&Path>) -> Result<ZoneCommand> {
    let config = match config_path {
        Some(path) => ClientConfig::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ClientConfig::load_from_env().context("Failed to load configuration")?,
    };

    log::debug!("Using PVE API at {}", config.api_url);

    let gateway = PveZoneGateway::from_config(&config).context("Failed to set up API client")?;
    let context = ProviderContext::new(Arc::new(gateway)).with_timeouts(config.reconcile_timeouts());

    Ok(ZoneCommand::new(ZoneReconciler::new(Arc::new(context))))
}

fn generate_config(output: Option<&Path>) -> Result<()> {
    let config_toml = toml::to_string_pretty(&ClientConfig::default())?;

    match output {
        Some(path) => {
            std::fs::write(path, config_toml)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Example configuration written to: {}", path.display());
        }
        None => println!("{}", config_toml),
    }
    Ok(())
}
