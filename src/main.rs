mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.connectivity();

    match cli.command {
        Command::Classify { identifier } => commands::classify(&identifier),
        Command::Resolve { identifiers } => {
            if let Err(e) = commands::resolve(config, identifiers).await {
                tracing::error!(error = %e, "resolve failed");
                eprintln!("xaresolve resolve: {e}");
                std::process::exit(1);
            }
        }
        Command::Scan { identifiers } => {
            if let Err(e) = commands::scan(config, identifiers).await {
                tracing::error!(error = %e, "scan failed");
                eprintln!("xaresolve scan: {e}");
                std::process::exit(1);
            }
        }
    }
}
