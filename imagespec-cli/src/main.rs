//! Chef image CLI
//!
//! Command-line interface for the image records kept in the `images` data
//! bag of a Chef server.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "chef-image")]
#[command(about = "Manage machine image specifications on a Chef server", long_about = None)]
struct Cli {
    /// Chef server URL
    #[arg(long, env = "CHEF_SERVER_URL", default_value = "http://localhost:8889")]
    server_url: String,

    /// API client name
    #[arg(long, env = "CHEF_CLIENT_NAME")]
    client_name: Option<String>,

    /// Path to the API client key
    #[arg(long, env = "CHEF_CLIENT_KEY")]
    client_key: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imagespec_cli=info,imagespec_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::new(cli.server_url, cli.client_name, cli.client_key)?;

    handle_command(cli.command, &config).await
}
