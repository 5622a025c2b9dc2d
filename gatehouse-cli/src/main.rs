use clap::Parser;
use std::path::PathBuf;

use gatehouse_server::{ListenConfig, Server, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "gatehouse", about = "Strict HTTP/1.1 front door")]
struct Cli {
    /// TOML configuration file; written with defaults when missing.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the configured listen address, as `host:port`.
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatehouse=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load_or_create(path).map_err(|err| err.to_string())?,
        None => ServerConfig::default(),
    };
    if let Some(listen) = &cli.listen {
        config.listen = ListenConfig::parse(listen).map_err(|err| err.to_string())?;
    }

    tracing::info!(
        max_header_count = config.limits.max_header_count,
        max_request_line_bytes = config.limits.max_request_line_bytes,
        idle_read_timeout = ?config.limits.idle_read_timeout,
        "gatehouse v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let server = Server::bind(config).await.map_err(|err| err.to_string())?;
    server.run().await.map_err(|err| err.to_string())
}
