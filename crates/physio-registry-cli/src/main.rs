//! Command-line front end for the patient registry.

mod commands;
mod i18n;

use anyhow::{Context, Result};
use clap::Parser;
use physio_registry_core::config::{BACKEND_ENV, DATA_DIR_ENV};
use physio_registry_core::{Language, RegistryClient, RegistryConfig};
use tracing_subscriber::EnvFilter;

use commands::{App, Command};

#[derive(Parser)]
#[command(name = "physio-registry")]
#[command(about = "Physiotherapy patient registry")]
struct Cli {
    /// Storage directory (overrides PHYSIO_REGISTRY_DIR)
    #[arg(long, global = true)]
    data_dir: Option<String>,

    /// Storage backend: files or local (overrides PHYSIO_REGISTRY_BACKEND)
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Display language: en or tr
    #[arg(long, global = true, default_value = "en")]
    lang: Language,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = RegistryConfig::resolve(
        cli.data_dir.or_else(|| std::env::var(DATA_DIR_ENV).ok()),
        cli.backend.or_else(|| std::env::var(BACKEND_ENV).ok()),
    )
    .context("invalid registry configuration")?;

    let client = RegistryClient::from_config(&config).context("failed to open registry")?;
    let app = App::new(client, config, cli.lang);

    let stdout = std::io::stdout();
    app.run(cli.command, &mut stdout.lock())
}
