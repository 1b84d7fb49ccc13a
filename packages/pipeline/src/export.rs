//! Static export document I/O.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use civic_quest_county_models::ExportDocument;
use serde::Serialize;

use crate::PipelineError;
use crate::paths::ensure_parent;

/// Writes `value` as pretty JSON to `path`.
///
/// Writes to a `.tmp` sibling first and renames it into place so readers
/// never observe a partial document.
///
/// # Errors
///
/// Returns an error if serialization, the write, or the rename fails.
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<(), PipelineError> {
    ensure_parent(path)?;
    let tmp_path = tmp_sibling(path);
    let contents = serde_json::to_string_pretty(value)?;
    std::fs::write(&tmp_path, contents)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Writes the export document to `path`.
///
/// # Errors
///
/// See [`write_json`].
pub fn write_export(document: &ExportDocument, path: &Path) -> Result<(), PipelineError> {
    write_json(document, path)?;
    log::info!(
        "Wrote export ({} counties, {} states) to {}",
        document.counties.len(),
        document.states.len(),
        path.display()
    );
    Ok(())
}

/// Reads a previously written export document.
///
/// # Errors
///
/// Returns [`PipelineError::MissingInput`] if the file does not exist and
/// [`PipelineError::Json`] if it does not parse.
pub fn read_export(path: &Path) -> Result<ExportDocument, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("export"), ToOwned::to_owned);
    name.push(".tmp");
    path.with_file_name(name)
}
