//! Grid trading bot entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Automated grid trading bot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via GRIDBOT_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    grid_bot::init_logging();

    info!("Starting grid bot v{}", env!("CARGO_PKG_VERSION"));

    // Config path: CLI arg > GRIDBOT_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("GRIDBOT_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = grid_bot::AppConfig::from_file(&config_path)?;
    info!(symbol = %config.engine.symbol, "Configuration loaded");

    let mut app = grid_bot::Application::new(config)?;
    app.run().await?;

    Ok(())
}
