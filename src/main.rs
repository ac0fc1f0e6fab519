mod audit;
mod cli;
mod config;
mod desk;
mod identity;
mod model;
mod storage;
mod triage;

use std::io;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::Config;
use storage::Storage;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("HELPDESK_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(1);
    });

    let path = config.database_path().unwrap_or_else(|| {
        eprintln!("Could not determine home directory.");
        process::exit(1);
    });

    let storage = match Storage::new(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to initialize storage: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = cli::run(cli, &config, &storage).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
