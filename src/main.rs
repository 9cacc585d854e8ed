//! # Scorecard Explorer CLI (`scorecard`)
//!
//! ## Usage
//!
//! ```bash
//! scorecard --config ./config/scorecard.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `scorecard load` | Load every `MERGED<yyyy>_<yy>_PP.csv` into its own table |
//! | `scorecard serve` | Start the JSON HTTP API |
//! | `scorecard stats` | Show tables with row and column counts |
//! | `scorecard query "<sql>"` | Run a read-only `SELECT` |
//!
//! When the config file does not exist, built-in defaults are used
//! (`data.duckdb`, `datasets/college_scorecard`, `0.0.0.0:5000`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

use scorecard_explorer::{config, loader, server, stats};

/// Scorecard Explorer: load College Scorecard CSVs into DuckDB and browse them.
#[derive(Parser)]
#[command(
    name = "scorecard",
    about = "Scorecard Explorer: load College Scorecard CSVs into DuckDB and browse them over HTTP",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/scorecard.toml`. Missing files fall back to the
    /// built-in defaults.
    #[arg(long, global = true, default_value = "./config/scorecard.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load yearly CSV files into the database.
    ///
    /// Each `MERGED<yyyy>_<yy>_PP.csv` in the data directory becomes the table
    /// `scorecard_<yyyy>_<yy>`, replacing any previous version. Files that fail
    /// to load are reported and skipped.
    Load {
        /// Show which files map to which tables without touching the database.
        #[arg(long)]
        dry_run: bool,

        /// Override `[loader].data_dir` for this run.
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Start the HTTP API.
    ///
    /// Binds to `[server].bind` and serves the `/api/*` endpoints.
    Serve,

    /// Show database size and per-table row and column counts.
    Stats,

    /// Run a read-only SELECT and print the result as tab-separated values.
    Query {
        /// SQL statement; must start with SELECT.
        sql: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config_or_default(&cli.config)?;

    match cli.command {
        Commands::Load { dry_run, data_dir } => {
            loader::run_load(&cfg, data_dir, dry_run)?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg)?;
        }
        Commands::Query { sql } => {
            stats::run_query(&cfg, &sql)?;
        }
    }

    Ok(())
}
