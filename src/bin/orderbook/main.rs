//! Order book command line client.
//!
//! Prints the order book built from recently placed orders, places market
//! and limit orders, and follows newly placed orders.

mod app;
mod config;
mod error;

use clap::Parser;
use std::process::exit;
use tracing::error;

use config::{Cli, EnvConfig};

#[tokio::main]
async fn main() {
    // Load .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Failed to load .env file: {}", e);
    }

    // Parse CLI arguments
    let cli = Cli::parse();

    // Parse environment configuration
    let env_config = match EnvConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to parse environment configuration: {}", e);
            exit(1);
        }
    };

    // Set up logging
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(e) = app::run(cli.command, env_config).await {
        error!(%e, "Command failed");
        exit(1);
    }
}
