use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use folio_server::{FolioServer, ServerConfig};
use tracing_subscriber::EnvFilter;

/// Serve Folio's commit, folder and notification API.
#[derive(Debug, Parser)]
#[command(name = "folio-server", version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, env = "FOLIO_CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured listen address.
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    FolioServer::new(config).serve().await?;
    Ok(())
}
