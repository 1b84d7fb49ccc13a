//! Full pipeline orchestrator for the civic quest toolchain.
//!
//! Chains lookup -> enrich -> export -> serve in a single interactive
//! flow. Uses an `indicatif` progress bar for the export build.

use std::time::Instant;

use civic_quest_cli_utils::{IndicatifProgress, MultiProgress};
use civic_quest_pipeline::config::PipelineConfig;
use dialoguer::{Confirm, Input, MultiSelect};

/// Steps available in the pipeline.
enum PipelineStep {
    Lookup,
    Enrich,
    Export,
}

impl PipelineStep {
    const ALL: &[Self] = &[Self::Lookup, Self::Enrich, Self::Export];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Lookup => "Build county lookup",
            Self::Enrich => "Enrich lookup from GeoJSON",
            Self::Export => "Build dataset export",
        }
    }
}

/// Runs the selected pipeline steps, then optionally starts the server.
///
/// # Errors
///
/// Returns an error if user input or any selected step fails.
pub async fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline_start = Instant::now();

    let config_path: String = Input::new()
        .with_prompt("Pipeline config (leave empty for built-in)")
        .allow_empty(true)
        .interact_text()?;
    let config_path = config_path.trim();
    let config = if config_path.is_empty() {
        PipelineConfig::load(None)?
    } else {
        PipelineConfig::load(Some(std::path::Path::new(config_path)))?
    };

    let labels: Vec<&str> = PipelineStep::ALL.iter().map(PipelineStep::label).collect();
    let selected_steps = MultiSelect::new()
        .with_prompt("Select steps to run (space to toggle, enter to confirm)")
        .items(&labels)
        .defaults(&[false, false, true])
        .interact()?;

    if selected_steps.is_empty() {
        println!("No steps selected.");
        return Ok(());
    }

    for idx in selected_steps {
        match PipelineStep::ALL[idx] {
            PipelineStep::Lookup => {
                let count = civic_quest_generate::run_lookup(&config, None)?;
                log::info!("Lookup: {count} entries");
            }
            PipelineStep::Enrich => {
                let matched = civic_quest_generate::run_enrich_lookup(&config, None, None)?;
                log::info!("Enrich: {matched} entries updated");
            }
            PipelineStep::Export => {
                let progress = IndicatifProgress::steps_bar(multi, "Building dataset");
                let build_config = config.clone();
                let snapshot = tokio::task::spawn_blocking(move || {
                    civic_quest_generate::run_build(&build_config, None, &progress)
                })
                .await??;
                log::info!(
                    "Export: {} counties, {} states ({})",
                    snapshot.metadata().county_count,
                    snapshot.metadata().state_count,
                    snapshot.urbanicity_source()
                );
            }
        }
    }

    log::info!(
        "Pipeline finished in {:.1}s",
        pipeline_start.elapsed().as_secs_f64()
    );

    if Confirm::new()
        .with_prompt("Start the server now?")
        .default(false)
        .interact()?
    {
        serve(config).await?;
    }

    Ok(())
}

/// Starts the interactive server with `config`.
///
/// # Errors
///
/// Returns an error if the server fails to start or exits with an error.
pub async fn serve(config: PipelineConfig) -> Result<(), Box<dyn std::error::Error>> {
    // The server uses actix-web's runtime, so run it in a blocking task to
    // avoid nesting tokio runtimes.
    tokio::task::spawn_blocking(move || {
        actix_web::rt::System::new().block_on(civic_quest_server::interactive::run(config))
    })
    .await??;
    Ok(())
}
