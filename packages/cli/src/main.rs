#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for building a department census from snapshot files.
//!
//! Reads a JSON array of location rows and, optionally, a JSON array of
//! bed registry overrides, runs [`ward_census_occupancy::build_census`]
//! and prints the resulting report as JSON. Fetching the snapshot from the
//! clinical data warehouse or the registry service is left to whatever
//! produces those files.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use ward_census_location_models::LocationRecord;
use ward_census_occupancy::{build_census, default_config, parse_config_toml};
use ward_census_occupancy_models::{CensusConfig, ClosedBedOverride};

#[derive(Parser)]
#[command(name = "ward_census", about = "Hospital department census tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the per-department census from a location snapshot
    Summarize {
        /// JSON file containing an array of location rows
        #[arg(long)]
        locations: PathBuf,
        /// JSON file containing an array of closed-bed overrides
        #[arg(long)]
        overrides: Option<PathBuf>,
        /// TOML config file (defaults to the built-in configuration)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Drop permanently closed departments from the output
        #[arg(long)]
        drop_permanently_closed: bool,
        /// Pretty-print the JSON report
        #[arg(long)]
        pretty: bool,
    },
    /// Print the built-in configuration as TOML
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Summarize {
            locations,
            overrides,
            config,
            drop_permanently_closed,
            pretty,
        } => {
            let start = Instant::now();

            let mut config = load_config(config.as_deref())?;
            if drop_permanently_closed {
                config.include_permanently_closed = false;
            }

            let records: Vec<LocationRecord> = read_json(&locations)?;
            let overrides: Vec<ClosedBedOverride> = match overrides {
                Some(path) => read_json(&path)?,
                None => Vec::new(),
            };

            let report = build_census(records, &overrides, &config)?;

            if !report.anomalies.is_empty() {
                log::warn!("{} anomaly(ies) flagged", report.anomalies.len());
            }
            log::info!(
                "Census of {} department(s) built in {:.2?}",
                report.departments.len(),
                start.elapsed()
            );

            let json = if pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            println!("{json}");
        }
        Commands::Config => {
            print!("{}", toml::to_string(&default_config())?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<CensusConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(default_config());
    };
    log::info!("Loading config from {}", path.display());
    let contents = std::fs::read_to_string(path)?;
    Ok(parse_config_toml(&contents)?)
}

fn read_json<T: serde::de::DeserializeOwned>(
    path: &Path,
) -> Result<T, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let value = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse {}: {e}", path.display()))?;
    Ok(value)
}
