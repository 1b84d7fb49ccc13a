#![allow(clippy::module_name_repetitions)]
//! Canonical file locations for raw inputs and generated artifacts.
//!
//! Relative paths in the pipeline config are resolved against the project
//! root returned by [`project_root`].

use std::path::{Path, PathBuf};

/// Environment variable that overrides the project root.
pub const ROOT_ENV_VAR: &str = "CIVIC_QUEST_ROOT";

/// Returns the project root directory.
///
/// Uses `CIVIC_QUEST_ROOT` when set, otherwise the workspace root resolved
/// at compile time from `CARGO_MANIFEST_DIR`.
#[must_use]
pub fn project_root() -> PathBuf {
    if let Ok(root) = std::env::var(ROOT_ENV_VAR)
        && !root.trim().is_empty()
    {
        return PathBuf::from(root);
    }

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .nth(2)
        .unwrap_or(manifest_dir)
        .to_path_buf()
}

/// Returns the `data/` directory path.
#[must_use]
pub fn data_dir(root: &Path) -> PathBuf {
    root.join("data")
}

/// Returns the `data/generated/` directory for output artifacts.
#[must_use]
pub fn generated_dir(root: &Path) -> PathBuf {
    data_dir(root).join("generated")
}

/// Resolves `path` against `root` unless it is already absolute.
#[must_use]
pub fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Ensures the parent directory of `path` exists.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_parent(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_against_root() {
        let root = Path::new("/srv/civic");
        assert_eq!(
            resolve(root, Path::new("raw_data/counties.csv")),
            PathBuf::from("/srv/civic/raw_data/counties.csv")
        );
        assert_eq!(
            resolve(root, Path::new("/tmp/x.csv")),
            PathBuf::from("/tmp/x.csv")
        );
        assert_eq!(generated_dir(root), PathBuf::from("/srv/civic/data/generated"));
    }

    #[test]
    fn creates_missing_parent() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a/b/out.json");
        ensure_parent(&target).unwrap();
        assert!(dir.path().join("a/b").is_dir());
    }
}
