//! Interactive menu for the generate tool.
//!
//! Lets users pick which artifact to generate and where to write it
//! without memorizing CLI flags.

use std::path::PathBuf;

use civic_quest_cli_utils::{IndicatifProgress, MultiProgress};
use civic_quest_pipeline::config::PipelineConfig;
use dialoguer::{Input, Select};

use crate::{lookup_path, run_build, run_enrich_lookup, run_lookup};

/// Runs the interactive generation menu.
///
/// # Errors
///
/// Returns an error if user input or the chosen generation step fails.
pub fn run(multi: &MultiProgress, config: &PipelineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let choices = &[
        "Build dataset export",
        "Build county lookup",
        "Enrich county lookup from GeoJSON",
    ];

    let selection = Select::new()
        .with_prompt("What would you like to generate?")
        .items(choices)
        .default(0)
        .interact()?;

    match selection {
        0 => {
            let output = prompt_optional_path("Export path (leave empty for configured paths)")?;
            let progress = IndicatifProgress::steps_bar(multi, "Building dataset");
            let snapshot = run_build(config, output.as_deref(), &progress)?;
            println!(
                "Exported {} counties across {} states.",
                snapshot.metadata().county_count,
                snapshot.metadata().state_count
            );
        }
        1 => {
            let default = lookup_path(config);
            let output = prompt_optional_path(&format!(
                "Lookup path (leave empty for {})",
                default.display()
            ))?;
            let count = run_lookup(config, output.as_deref())?;
            println!("Wrote {count} lookup entries.");
        }
        2 => {
            let geojson = prompt_optional_path("GeoJSON path (leave empty for configured path)")?;
            let matched = run_enrich_lookup(config, None, geojson.as_deref())?;
            println!("Updated {matched} lookup entries.");
        }
        _ => unreachable!(),
    }

    Ok(())
}

fn prompt_optional_path(prompt: &str) -> Result<Option<PathBuf>, dialoguer::Error> {
    let input: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    let trimmed = input.trim();
    Ok((!trimmed.is_empty()).then(|| PathBuf::from(trimmed)))
}
