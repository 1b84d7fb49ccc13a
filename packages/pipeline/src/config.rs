//! Pipeline configuration: input locations, outputs and column aliases.
//!
//! The default configuration is embedded at compile time from
//! `config/default.toml`. A user-supplied file with the same shape can
//! replace it entirely. Each logical column is described by an ordered list
//! of accepted header spellings; [`crate::table::RawTable::column`]
//! resolves them once per table.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::PipelineError;
use crate::paths;

/// Embedded default configuration.
const DEFAULT_CONFIG_TOML: &str = include_str!("../config/default.toml");

/// Ordered header spellings accepted for one logical field.
pub type Aliases = Vec<String>;

/// Complete pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Input file locations.
    pub inputs: InputPaths,
    /// Output artifact locations.
    pub output: OutputPaths,
    /// Column alias lists per input table.
    pub columns: ColumnSchemas,
    /// Directory relative paths are resolved against. Not part of the file.
    #[serde(skip)]
    pub root: PathBuf,
}

/// Where the raw inputs live.
#[derive(Debug, Clone, Deserialize)]
pub struct InputPaths {
    /// County metrics table (required).
    pub county_metrics: PathBuf,
    /// Civic-organization class counts (required).
    pub civic_orgs: PathBuf,
    /// County reference names table. Required only when the identity
    /// lookup is missing or empty.
    pub county_reference: PathBuf,
    /// Optional precomputed FIPS identity lookup (JSON).
    pub identity_lookup: Option<PathBuf>,
    /// Optional county GeoJSON used to enrich the identity lookup.
    pub county_geojson: Option<PathBuf>,
    /// Candidate rural-urban continuum tables; the first existing one is used.
    #[serde(default)]
    pub urbanicity_references: Vec<PathBuf>,
}

/// Where generated artifacts are written.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputPaths {
    /// Every path the static export document is written to.
    pub export_paths: Vec<PathBuf>,
}

/// Column alias lists for every input table.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnSchemas {
    /// County metrics table.
    pub metrics: MetricsColumns,
    /// Civic-organization table.
    pub civic_orgs: CivicOrgColumns,
    /// County reference table.
    pub reference: ReferenceColumns,
    /// Rural-urban continuum table.
    pub urbanicity: UrbanicityColumns,
}

/// Logical fields of the county metrics table.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsColumns {
    pub fips: Aliases,
    pub population: Aliases,
    pub score: Aliases,
    pub geolocation: Aliases,
    pub state: Aliases,
    pub civic_org_sum: Aliases,
    pub volunteer_sum: Aliases,
    pub events_sum: Aliases,
    pub membership_sum: Aliases,
    pub take_action_sum: Aliases,
    pub nonprofit_count: Aliases,
}

/// Logical fields of the civic-organization table.
#[derive(Debug, Clone, Deserialize)]
pub struct CivicOrgColumns {
    pub fips: Aliases,
    pub class: Aliases,
    pub count: Aliases,
}

/// Logical fields of the county reference table.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceColumns {
    pub fips: Aliases,
    pub name: Aliases,
    pub state: Aliases,
}

/// Logical fields of the rural-urban continuum table.
#[derive(Debug, Clone, Deserialize)]
pub struct UrbanicityColumns {
    pub fips: Aliases,
    pub code: Aliases,
}

impl PipelineConfig {
    /// Parses a configuration document and anchors it at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the TOML is malformed or missing
    /// required keys.
    pub fn parse(toml_text: &str, root: PathBuf) -> Result<Self, PipelineError> {
        let mut config: Self = toml::from_str(toml_text)?;
        config.root = root;
        Ok(config)
    }

    /// Returns the embedded default configuration anchored at `root`.
    ///
    /// # Panics
    ///
    /// Panics if the embedded default config is malformed, which the tests
    /// below rule out.
    #[must_use]
    pub fn embedded(root: PathBuf) -> Self {
        Self::parse(DEFAULT_CONFIG_TOML, root)
            .unwrap_or_else(|e| panic!("embedded default config is invalid: {e}"))
    }

    /// Loads the config at `path`, or the embedded default when `path` is
    /// `None`. Both are anchored at [`paths::project_root`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MissingInput`] if `path` does not exist and
    /// [`PipelineError::Config`] if it cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, PipelineError> {
        let root = paths::project_root();
        let Some(path) = path else {
            return Ok(Self::embedded(root));
        };

        if !path.exists() {
            return Err(PipelineError::MissingInput {
                path: path.to_path_buf(),
            });
        }
        log::info!("Loading pipeline config from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, root)
    }

    /// Resolves a configured path against the config root.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        paths::resolve(&self.root, path)
    }

    /// Resolved export output paths.
    #[must_use]
    pub fn export_paths(&self) -> Vec<PathBuf> {
        self.output
            .export_paths
            .iter()
            .map(|p| self.resolve(p))
            .collect()
    }
}
