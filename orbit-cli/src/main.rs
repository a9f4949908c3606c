//! Orbit command-line client.
//!
//! Usage:
//!   orbit --db orbit.db board create "Work"
//!   orbit card move <card-id> --column <column-id> --index 0
//!
//! Results are printed to stdout as JSON; logs go to stderr.

use anyhow::Result;
use clap::Parser;
use orbit_cli::{Cli, execute, open_controller};
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str()));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let controller = open_controller(&cli.db)?;
    let output = execute(&controller, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
