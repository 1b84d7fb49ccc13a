#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI tool that runs the civic quest pipeline and writes its artifacts.

use std::path::PathBuf;

use civic_quest_cli_utils::IndicatifProgress;
use civic_quest_pipeline::config::PipelineConfig;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "civic_quest_generate", about = "Civic quest dataset generator")]
struct Cli {
    /// Pipeline config file (TOML). Defaults to the built-in config.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline and write the static export document
    Build {
        /// Write the export here instead of the configured paths
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Build the precomputed county identity lookup
    Lookup {
        /// Write the lookup here instead of the configured path
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Override lookup names and states from a county `GeoJSON` file
    EnrichLookup {
        /// Lookup file to update in place
        #[arg(long)]
        lookup: Option<PathBuf>,
        /// County `GeoJSON` file
        #[arg(long)]
        geojson: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = civic_quest_cli_utils::init_logger();
    let cli = Cli::parse();
    let config = PipelineConfig::load(cli.config.as_deref())?;

    match cli.command {
        None => civic_quest_generate::interactive::run(&multi, &config)?,
        Some(Commands::Build { output }) => {
            let progress = IndicatifProgress::steps_bar(&multi, "Building dataset");
            let snapshot =
                civic_quest_generate::run_build(&config, output.as_deref(), &progress)?;
            log::info!(
                "Exported {} counties across {} states ({})",
                snapshot.metadata().county_count,
                snapshot.metadata().state_count,
                snapshot.urbanicity_source()
            );
        }
        Some(Commands::Lookup { output }) => {
            let count = civic_quest_generate::run_lookup(&config, output.as_deref())?;
            log::info!("Wrote {count} lookup entries");
        }
        Some(Commands::EnrichLookup { lookup, geojson }) => {
            let matched = civic_quest_generate::run_enrich_lookup(
                &config,
                lookup.as_deref(),
                geojson.as_deref(),
            )?;
            log::info!("Updated {matched} lookup entries");
        }
    }

    Ok(())
}
