//! Identity Resolver.
//!
//! Builds the `fips -> (name, state)` mapping. A precomputed lookup document
//! is preferred; when it is absent, unreadable, or has no named entries,
//! the mapping is derived from the raw county reference table instead.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use civic_quest_county_models::fips::normalize_fips;
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::ReferenceColumns;
use crate::normalize::parse_optional_count;
use crate::table::RawTable;
use crate::PipelineError;

/// One entry of the precomputed identity lookup document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupEntry {
    /// County display name.
    pub name: Option<String>,
    /// State postal abbreviation.
    pub state: Option<String>,
    /// Centroid latitude.
    pub lat: Option<f64>,
    /// Centroid longitude.
    pub lon: Option<f64>,
    /// Total population. Accepts integers, whole or fractional floats and
    /// numeric strings; anything else reads as `None`.
    #[serde(default, deserialize_with = "lenient_population")]
    pub population: Option<u64>,
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lenient_population<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v.trunc() as u64)
        }),
        Some(serde_json::Value::String(s)) => parse_optional_count(Some(&s)),
        _ => None,
    })
}

/// The identity lookup document: zero-padded FIPS to entry.
pub type IdentityLookup = BTreeMap<String, LookupEntry>;

/// Name and state resolved for one county.
#[derive(Debug, Clone, PartialEq)]
pub struct CountyIdentity {
    /// Canonical county name (never empty).
    pub name: String,
    /// State abbreviation, if the source carried one.
    pub state: Option<String>,
}

/// Which source produced an [`IdentityMap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentitySource {
    /// The precomputed lookup document at this path.
    Lookup(PathBuf),
    /// The raw county reference table.
    ReferenceTable,
}

/// Resolved county identities keyed by normalized FIPS.
#[derive(Debug, Clone)]
pub struct IdentityMap {
    entries: HashMap<String, CountyIdentity>,
    source: IdentitySource,
}

impl IdentityMap {
    /// Builds a map from the lookup document, keeping only named entries.
    #[must_use]
    pub fn from_lookup(lookup: &IdentityLookup, path: &Path) -> Self {
        let entries = lookup
            .iter()
            .filter_map(|(key, entry)| {
                let fips = normalize_fips(key)?;
                let name = non_empty(entry.name.as_deref())?;
                Some((
                    fips,
                    CountyIdentity {
                        name,
                        state: non_empty(entry.state.as_deref()),
                    },
                ))
            })
            .collect();

        Self {
            entries,
            source: IdentitySource::Lookup(path.to_path_buf()),
        }
    }

    /// Builds a map from the raw reference table's identifier, name and
    /// state columns. Later rows overwrite earlier ones for the same FIPS.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MissingColumn`] if the identifier or name
    /// column cannot be resolved.
    pub fn from_reference(
        table: &RawTable,
        columns: &ReferenceColumns,
    ) -> Result<Self, PipelineError> {
        let fips_col = Some(table.require_column(&columns.fips, "fips")?);
        let name_col = Some(table.require_column(&columns.name, "name")?);
        let state_col = table.column(&columns.state);

        let mut entries = HashMap::new();
        for row in table.rows() {
            let Some(fips) = row.get(fips_col).and_then(normalize_fips) else {
                continue;
            };
            let Some(name) = non_empty(row.get(name_col)) else {
                continue;
            };
            entries.insert(
                fips,
                CountyIdentity {
                    name,
                    state: non_empty(row.get(state_col)),
                },
            );
        }

        Ok(Self {
            entries,
            source: IdentitySource::ReferenceTable,
        })
    }

    /// Looks up a normalized FIPS code.
    #[must_use]
    pub fn get(&self, fips: &str) -> Option<&CountyIdentity> {
        self.entries.get(fips)
    }

    /// Number of resolvable counties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no county is resolvable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Which source produced the map.
    #[must_use]
    pub const fn source(&self) -> &IdentitySource {
        &self.source
    }
}

/// Reads the lookup document at `path`.
///
/// Returns `None` when the file does not exist or cannot be parsed; a
/// broken lookup degrades to the reference-table fallback instead of
/// failing the run.
#[must_use]
pub fn read_lookup(path: &Path) -> Option<IdentityLookup> {
    if !path.exists() {
        log::info!("No identity lookup at {}", path.display());
        return None;
    }

    let parsed = std::fs::read_to_string(path)
        .map_err(PipelineError::from)
        .and_then(|text| serde_json::from_str::<IdentityLookup>(&text).map_err(Into::into));

    match parsed {
        Ok(lookup) => Some(lookup),
        Err(e) => {
            log::warn!(
                "Ignoring unreadable identity lookup {}: {e}",
                path.display()
            );
            None
        }
    }
}

/// Resolves identities, preferring the lookup document.
///
/// `load_reference` is only called when the lookup is missing or has no
/// named entries, so the reference table is read lazily.
///
/// # Errors
///
/// Propagates errors from `load_reference` (a missing reference file is
/// fatal once it is actually needed) and from [`IdentityMap::from_reference`].
pub fn resolve_identities<F>(
    lookup: Option<(&IdentityLookup, &Path)>,
    columns: &ReferenceColumns,
    load_reference: F,
) -> Result<IdentityMap, PipelineError>
where
    F: FnOnce() -> Result<RawTable, PipelineError>,
{
    if let Some((lookup, path)) = lookup {
        let map = IdentityMap::from_lookup(lookup, path);
        if !map.is_empty() {
            log::info!(
                "Resolved {} county identities from lookup {}",
                map.len(),
                path.display()
            );
            return Ok(map);
        }
        log::warn!(
            "Identity lookup {} has no named entries; falling back to reference table",
            path.display()
        );
    }

    let table = load_reference()?;
    let map = IdentityMap::from_reference(&table, columns)?;
    log::info!(
        "Resolved {} county identities from reference table",
        map.len()
    );
    Ok(map)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}
