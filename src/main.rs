//! # Geobucket CLI
//!
//! The `geobucket` binary manages the listing database and runs the HTTP
//! server.
//!
//! ## Usage
//!
//! ```bash
//! geobucket --config ./config/geobucket.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `geobucket init` | Create the SQLite database and run schema migrations |
//! | `geobucket serve` | Start the HTTP API server |
//! | `geobucket seed` | Post demo listings to a running server and verify grouping |
//! | `geobucket stats` | Print bucket distribution from the database |
//!
//! The server needs the geocoding API key in the environment variable
//! named by `[geocoder].api_key_env` (default `GOOGLE_MAPS_API_KEY`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use geobucket::{config, migrate, seed, server, stats};

/// Geobucket — groups real-estate listings into canonical geographic
/// buckets so inconsistent location inputs search and aggregate
/// consistently.
#[derive(Parser)]
#[command(
    name = "geobucket",
    about = "Geo-bucketed real-estate listing service",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/geobucket.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the geo_buckets and
    /// properties tables. Idempotent — running it multiple times is safe.
    Init,

    /// Start the HTTP API server.
    Serve,

    /// Post demo listings to a running server and run the verification
    /// search.
    Seed {
        /// Base URL of the running server.
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        base_url: String,
    },

    /// Print bucket distribution from the database.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&config).await?;
            println!("Database initialized at {}", config.db.path.display());
        }
        Commands::Serve => {
            server::run_server(&config).await?;
        }
        Commands::Seed { base_url } => {
            seed::run_seed(&base_url).await?;
        }
        Commands::Stats => {
            stats::run_stats(&config).await?;
        }
    }

    Ok(())
}
