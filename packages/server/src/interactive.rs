//! Interactive mode for the server.
//!
//! Asks where the snapshot should come from and where to listen, then
//! serves it.

use civic_quest_pipeline::PipelineError;
use civic_quest_pipeline::assemble::build_snapshot;
use civic_quest_pipeline::config::PipelineConfig;
use civic_quest_pipeline::progress::null_progress;
use civic_quest_pipeline::snapshot::Snapshot;
use dialoguer::{Confirm, Input, Select};

use crate::{DEFAULT_BIND_ADDR, DEFAULT_PORT};

/// Where the served snapshot comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotChoice {
    /// Run the pipeline over the raw inputs.
    Rebuild,
    /// Load the last exported document.
    LastExport,
}

impl SnapshotChoice {
    const ALL: &[Self] = &[Self::Rebuild, Self::LastExport];

    const fn label(self) -> &'static str {
        match self {
            Self::Rebuild => "Rebuild from raw inputs",
            Self::LastExport => "Serve the last exported dataset",
        }
    }

    /// Loads the snapshot this choice names.
    ///
    /// # Errors
    ///
    /// Returns the pipeline error for a failed rebuild, or
    /// [`PipelineError::MissingInput`] naming the first export path when no
    /// export document can be read.
    pub fn load(self, config: &PipelineConfig) -> Result<Snapshot, PipelineError> {
        match self {
            Self::Rebuild => build_snapshot(config, &null_progress()),
            Self::LastExport => crate::load_exported_snapshot(config).ok_or_else(|| {
                PipelineError::MissingInput {
                    path: config.export_paths().into_iter().next().unwrap_or_default(),
                }
            }),
        }
    }
}

/// Prompts for a snapshot source and listen address, then serves.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the snapshot cannot be loaded or
/// the server fails to bind.
#[allow(clippy::future_not_send)]
pub async fn run(config: PipelineConfig) -> std::io::Result<()> {
    let labels: Vec<&str> = SnapshotChoice::ALL.iter().map(|c| c.label()).collect();
    let idx = Select::new()
        .with_prompt("Snapshot source")
        .items(&labels)
        .default(0)
        .interact()
        .unwrap_or(0);

    let snapshot = SnapshotChoice::ALL[idx]
        .load(&config)
        .map_err(std::io::Error::other)?;

    let bind_addr: String = Input::new()
        .with_prompt("Listen address")
        .default(DEFAULT_BIND_ADDR.to_string())
        .interact_text()
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

    let port: u16 = Input::new()
        .with_prompt("Port")
        .default(DEFAULT_PORT)
        .interact_text()
        .unwrap_or(DEFAULT_PORT);

    let prompt = format!(
        "Serve {} counties ({}) on {bind_addr}:{port}?",
        snapshot.metadata().county_count,
        snapshot.urbanicity_source()
    );
    if !Confirm::new()
        .with_prompt(prompt)
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    crate::serve(config, snapshot, bind_addr, port).await
}

#[cfg(test)]
mod tests {
    use civic_quest_pipeline::export::write_export;

    use super::*;

    #[test]
    fn last_export_loads_written_document() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::embedded(dir.path().to_path_buf());
        let exported = crate::queries::tests::sample_snapshot();
        write_export(&exported.to_export(), &config.export_paths()[0]).unwrap();

        let snapshot = SnapshotChoice::LastExport.load(&config).unwrap();
        assert_eq!(snapshot.counties().len(), 16);
    }

    #[test]
    fn last_export_missing_names_export_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::embedded(dir.path().to_path_buf());

        let err = SnapshotChoice::LastExport.load(&config).unwrap_err();
        assert!(
            matches!(err, PipelineError::MissingInput { ref path } if *path == config.export_paths()[0])
        );
    }

    #[test]
    fn rebuild_without_raw_inputs_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::embedded(dir.path().to_path_buf());
        assert!(matches!(
            SnapshotChoice::Rebuild.load(&config),
            Err(PipelineError::MissingInput { .. })
        ));
    }
}
