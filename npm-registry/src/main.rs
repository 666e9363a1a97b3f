//! Standalone npm registry server binary

use anyhow::Result;
use clap::{Parser, Subcommand};
use npm_registry::{run_server, Config};
use registry_logging::{init_subscriber, LogSettings};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "npm-registry")]
#[command(about = "Minimal npm package registry backed by the local filesystem")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the registry server
    Start {
        /// JSON configuration file; defaults apply when it does not exist
        #[arg(long, default_value = "registry.json")]
        config: PathBuf,

        /// Host to bind to (overrides the configuration file)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides the configuration file)
        #[arg(long)]
        port: Option<u16>,

        /// Data directory for package storage (overrides the configuration file)
        #[arg(long)]
        data: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = init_subscriber(&LogSettings::from_env());

    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            config,
            host,
            port,
            data,
        } => {
            let mut settings = Config::load_or_default(&config)?;
            if let Some(host) = host {
                settings.server.host = host;
            }
            if let Some(port) = port {
                settings.server.port = port;
            }
            if let Some(data) = data {
                settings.storage.data_dir = data;
            }

            info!(config = %config.display(), "Configuration loaded");
            run_server(settings).await
        }
    }
}
