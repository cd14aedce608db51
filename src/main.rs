use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use bbs_client::cli::{self, Cli};
use bbs_client::config::ClientConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv::dotenv();
    let cli = Cli::parse();

    // stdout carries the board, logs go to stderr
    let filter = match &cli.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.apply(ClientConfig::from_env());
    debug!(api_url = %config.api_url, page_size = config.page_size, "client configured");
    cli::run(cli, config).await
}
