use anyhow::{Context, Result};
use clap::Parser;

mod app;
mod config;
mod controller;
mod persona;
mod relay;
mod store;
mod ui;

use config::Config;

#[derive(Parser)]
#[command(name = "oculo")]
#[command(version = "0.1.0")]
#[command(about = "Terminal consultation client for an ophthalmologist AI assistant", long_about = None)]
struct Cli {
    /// Override the configured model for this run
    #[arg(long)]
    model: Option<String>,

    /// Skip the medical disclaimer overlay on startup
    #[arg(long)]
    no_disclaimer: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(model) = cli.model {
        config.model = model;
    }

    init_logging(&config)?;

    app::run(config, !cli.no_disclaimer).await
}

/// Send logs to a file under the oculo home; the terminal belongs to the TUI.
fn init_logging(config: &Config) -> Result<()> {
    let log_path = config.oculo_home.join("oculo.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .context("Failed to open log file")?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("oculo=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(file)
        .with_ansi(false)
        .init();

    Ok(())
}
