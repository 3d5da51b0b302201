#![forbid(unsafe_code)]

use accountd::{gateway, Config};
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Account service: signup, signin, bearer tokens and profiles over HTTP.
///
/// The token signing key is read from `JWT_SECRET`; the service will not
/// start without it.
#[derive(Parser, Debug)]
#[command(name = "accountd", version, about)]
struct Cli {
    /// Address to bind (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Path of the JSON user document (overrides ACCOUNTD_DB)
    #[arg(long)]
    db: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    tracing::debug!(?config, "Configuration loaded");

    gateway::run_gateway(config).await
}
