#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Generates the civic quest artifacts from the raw county tables.
//!
//! Three outputs are produced:
//!
//! - the static export document (`build`), bundling every county record,
//!   state summary and the run metadata
//! - the precomputed identity lookup (`lookup`), mapping FIPS codes to
//!   name, state, centroid and population
//! - an enriched lookup (`enrich-lookup`), with names and states overridden
//!   from a county `GeoJSON` file

pub mod interactive;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use civic_quest_pipeline::config::PipelineConfig;
use civic_quest_pipeline::lookup::{build_lookup, enrich_lookup_file, write_lookup};
use civic_quest_pipeline::progress::ProgressCallback;
use civic_quest_pipeline::snapshot::Snapshot;
use civic_quest_pipeline::table::RawTable;
use civic_quest_pipeline::{PipelineError, assemble, export, paths, run_export};

/// Default lookup file name under `data/` when the config names none.
const DEFAULT_LOOKUP_FILE: &str = "county_lookup.json";

/// Default county `GeoJSON` file name under `data/`.
const DEFAULT_GEOJSON_FILE: &str = "counties.geojson";

/// Runs the pipeline and writes the export document.
///
/// With `output` set, the document is written only there; otherwise to
/// every export path in the config.
///
/// # Errors
///
/// Returns any pipeline or write error.
pub fn run_build(
    config: &PipelineConfig,
    output: Option<&Path>,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Snapshot, PipelineError> {
    let Some(output) = output else {
        return run_export(config, progress);
    };

    let snapshot = assemble::build_snapshot(config, progress)?;
    export::write_export(&snapshot.to_export(), output)?;
    Ok(snapshot)
}

/// Configured identity lookup path, or `data/county_lookup.json`.
#[must_use]
pub fn lookup_path(config: &PipelineConfig) -> PathBuf {
    config.inputs.identity_lookup.as_ref().map_or_else(
        || paths::data_dir(&config.root).join(DEFAULT_LOOKUP_FILE),
        |p| config.resolve(p),
    )
}

/// Configured county `GeoJSON` path, or `data/counties.geojson`.
#[must_use]
pub fn geojson_path(config: &PipelineConfig) -> PathBuf {
    config.inputs.county_geojson.as_ref().map_or_else(
        || paths::data_dir(&config.root).join(DEFAULT_GEOJSON_FILE),
        |p| config.resolve(p),
    )
}

/// Builds the identity lookup from the metrics table (and the reference
/// table, when it exists) and writes it. Returns the entry count.
///
/// # Errors
///
/// Fails if the metrics table is missing or lacks its FIPS column, or the
/// write fails.
pub fn run_lookup(config: &PipelineConfig, output: Option<&Path>) -> Result<usize, PipelineError> {
    let metrics = RawTable::read(&config.resolve(&config.inputs.county_metrics), "metrics")?;

    let reference_path = config.resolve(&config.inputs.county_reference);
    let reference = if reference_path.exists() {
        Some(RawTable::read(&reference_path, "reference")?)
    } else {
        log::warn!(
            "No reference table at {}; lookup names fall back to metrics columns",
            reference_path.display()
        );
        None
    };

    let lookup = build_lookup(&metrics, reference.as_ref(), &config.columns)?;
    let output = output.map_or_else(|| lookup_path(config), Path::to_path_buf);
    write_lookup(&lookup, &output)?;
    Ok(lookup.len())
}

/// Enriches the lookup in place from county `GeoJSON`. Returns the number
/// of matched entries.
///
/// # Errors
///
/// Fails if either file is missing or unparsable, or the write fails.
pub fn run_enrich_lookup(
    config: &PipelineConfig,
    lookup: Option<&Path>,
    geojson: Option<&Path>,
) -> Result<usize, PipelineError> {
    let lookup = lookup.map_or_else(|| lookup_path(config), Path::to_path_buf);
    let geojson = geojson.map_or_else(|| geojson_path(config), Path::to_path_buf);
    enrich_lookup_file(&lookup, &geojson)
}
