#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Batch analytics pipeline for county civic-opportunity data.
//!
//! Reads the raw county metrics, civic-organization and county reference
//! tables, resolves county identities, classifies urbanicity, ranks
//! counties, aggregates organization types, finds peer counties and
//! summarizes states. The result is an immutable [`snapshot::Snapshot`]
//! that the query server reads and the static export serializes.
//!
//! Stages, in order:
//!
//! 1. [`table`]: string-typed table loading
//! 2. [`normalize`]: lenient numeric and geometry coercion
//! 3. [`identity`]: `fips -> (name, state)` resolution
//! 4. [`urbanicity`]: continuum-code or population-tertile labels
//! 5. [`ranking`]: national and within-state ranks
//! 6. [`org_types`]: per-class organization counts
//! 7. [`peers`]: closest-scoring counties per stratum
//! 8. [`states`]: per-state summaries

pub mod assemble;
pub mod config;
pub mod export;
pub mod identity;
pub mod lookup;
pub mod normalize;
pub mod org_types;
pub mod paths;
pub mod peers;
pub mod progress;
pub mod ranking;
pub mod snapshot;
pub mod states;
pub mod table;
pub mod urbanicity;

use std::path::PathBuf;
use std::sync::Arc;

use config::PipelineConfig;
use progress::ProgressCallback;
use snapshot::Snapshot;

/// Errors that can abort a pipeline run.
///
/// Malformed values and missing optional inputs never surface here; they
/// are recovered with defaults or fallback policies and logged.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A required input file does not exist.
    #[error("Missing required input: {}", path.display())]
    MissingInput {
        /// The path that was expected.
        path: PathBuf,
    },

    /// No accepted spelling of a required column was found.
    #[error("Missing column '{field}' in {table} table")]
    MissingColumn {
        /// Table label.
        table: String,
        /// Logical field name.
        field: &'static str,
    },

    /// CSV reading error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Pipeline config could not be parsed.
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// GeoJSON parse error.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}

/// Builds a snapshot and writes the static export to every configured
/// output path.
///
/// # Errors
///
/// Returns any error from [`assemble::build_snapshot`] or from writing the
/// export.
pub fn run_export(
    config: &PipelineConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Snapshot, PipelineError> {
    let snapshot = assemble::build_snapshot(config, progress)?;
    let document = snapshot.to_export();
    for path in config.export_paths() {
        export::write_export(&document, &path)?;
    }
    Ok(snapshot)
}
