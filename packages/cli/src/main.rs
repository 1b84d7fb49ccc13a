#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Interactive CLI orchestrator for the civic quest toolchain.
//!
//! Provides a single entry point that lets users interactively select
//! which tool to run (full pipeline, generate, server) and guides them
//! through the configuration for each.
//!
//! Uses `indicatif-log-bridge` (via [`civic_quest_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod pipeline;

use civic_quest_pipeline::config::PipelineConfig;
use dialoguer::Select;

/// Top-level tool selection for the civic quest toolchain.
enum Tool {
    RunPipeline,
    Generate,
    Server,
}

impl Tool {
    const ALL: &[Self] = &[Self::RunPipeline, Self::Generate, Self::Server];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::RunPipeline => "Run full pipeline",
            Self::Generate => "Generate artifacts",
            Self::Server => "Start server",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = civic_quest_cli_utils::init_logger();

    println!("Civic Quest Toolchain");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Tool::ALL[idx] {
        Tool::RunPipeline => pipeline::run(&multi).await?,
        Tool::Generate => {
            let config = PipelineConfig::load(None)?;
            civic_quest_generate::interactive::run(&multi, &config)?;
        }
        Tool::Server => pipeline::serve(PipelineConfig::load(None)?).await?,
    }

    Ok(())
}
