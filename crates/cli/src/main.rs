//! Luma Living CLI - Database migrations and catalog seeding.
//!
//! # Usage
//!
//! ```bash
//! # Create the catalog, cart, order and session tables
//! luma-cli migrate
//!
//! # Load the bundled demo catalog
//! luma-cli seed
//!
//! # Replace the catalog with one from a file
//! luma-cli seed --file catalog.yaml --clear
//!
//! # Validate a catalog file without touching the database
//! luma-cli seed --file catalog.yaml --check
//! ```
//!
//! Both commands read `LUMA_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "luma-cli")]
#[command(author, version, about = "Luma Living storefront tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations (storefront schema and session table)
    Migrate,
    /// Seed the catalog (categories, products, journal posts)
    Seed {
        /// YAML catalog file; the bundled demo catalog if omitted
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Remove existing posts and never-ordered products first
        #[arg(long)]
        clear: bool,

        /// Only parse and validate the file
        #[arg(long, conflicts_with = "clear")]
        check: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file, clear, check } => {
            commands::seed::catalog(file.as_deref(), clear, check).await?;
        }
    }
    Ok(())
}
