mod app;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use hubswap::application::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the JSON report
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    app::run(cli).await
}
