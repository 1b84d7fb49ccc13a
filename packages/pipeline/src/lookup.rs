//! Builds and enriches the precomputed identity lookup artifact.
//!
//! The lookup maps every metrics-table FIPS to its name, state, centroid
//! and population so later runs can resolve identities without the raw
//! reference table.

use std::collections::HashMap;
use std::path::Path;

use civic_quest_county_models::fips::normalize_fips;
use geojson::GeoJson;
use serde_json::Value;

use crate::PipelineError;
use crate::config::ColumnSchemas;
use crate::export::write_json;
use crate::identity::{IdentityLookup, IdentityMap, LookupEntry};
use crate::normalize::{parse_optional_count, parse_point};
use crate::table::RawTable;

const GEOID_PROPERTIES: [&str; 3] = ["GEOID", "geoid", "AFFGEOID"];
const NAME_PROPERTIES: [&str; 2] = ["NAME", "name"];
const STATE_PROPERTIES: [&str; 2] = ["STUSPS", "STATE_NAME"];

/// Builds the lookup from the metrics table and, when present, the county
/// reference table.
///
/// Names come from the reference table, then from any metrics column whose
/// header mentions "county" (or is exactly "name"), and finally fall back
/// to the FIPS code itself.
///
/// # Errors
///
/// Returns [`PipelineError::MissingColumn`] if the metrics FIPS column
/// cannot be resolved.
pub fn build_lookup(
    metrics: &RawTable,
    reference: Option<&RawTable>,
    columns: &ColumnSchemas,
) -> Result<IdentityLookup, PipelineError> {
    let fips_col = Some(metrics.require_column(&columns.metrics.fips, "fips")?);
    let population_col = metrics.column(&columns.metrics.population);
    let geo_col = metrics.column(&columns.metrics.geolocation);
    let name_cols = metrics.columns_where(|h| {
        let lower = h.to_ascii_lowercase();
        lower.contains("county") || lower == "name"
    });

    let names = match reference {
        Some(table) => match IdentityMap::from_reference(table, &columns.reference) {
            Ok(map) => Some(map),
            Err(e) => {
                log::warn!("Reference table unusable for lookup names: {e}");
                None
            }
        },
        None => None,
    };

    let mut lookup = IdentityLookup::new();
    for row in metrics.rows() {
        let Some(fips) = row.get(fips_col).and_then(normalize_fips) else {
            continue;
        };
        let identity = names.as_ref().and_then(|map| map.get(&fips));
        let point = parse_point(row.get(geo_col));

        let name = identity
            .map(|i| i.name.clone())
            .or_else(|| {
                name_cols
                    .iter()
                    .find_map(|&c| row.get(Some(c)).filter(|v| !v.is_empty()))
                    .map(str::to_owned)
            })
            .unwrap_or_else(|| fips.clone());

        lookup.insert(
            fips,
            LookupEntry {
                name: Some(name),
                state: identity.and_then(|i| i.state.clone()),
                lat: point.map(|p| p.latitude),
                lon: point.map(|p| p.longitude),
                population: parse_optional_count(row.get(population_col)),
            },
        );
    }

    log::info!("Built identity lookup with {} entries", lookup.len());
    Ok(lookup)
}

/// Writes the lookup as pretty JSON.
///
/// # Errors
///
/// See [`write_json`].
pub fn write_lookup(lookup: &IdentityLookup, path: &Path) -> Result<(), PipelineError> {
    write_json(lookup, path)?;
    log::info!("Wrote {} lookup entries to {}", lookup.len(), path.display());
    Ok(())
}

/// Overrides lookup names and states from county GeoJSON feature
/// properties.
///
/// Only FIPS codes already present in the lookup are touched. Returns the
/// number of matched entries.
///
/// # Errors
///
/// Returns [`PipelineError::GeoJson`] if `geojson_text` is not valid
/// GeoJSON.
pub fn enrich_lookup_from_geojson(
    lookup: &mut IdentityLookup,
    geojson_text: &str,
) -> Result<usize, PipelineError> {
    let features = match geojson_text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => Vec::new(),
    };

    let mut matched = 0;
    for feature in &features {
        let Some(fips) = first_property(feature, &GEOID_PROPERTIES)
            .map(|geoid| strip_geoid_prefix(&geoid).to_owned())
            .and_then(|geoid| normalize_fips(&geoid))
        else {
            continue;
        };
        let Some(entry) = lookup.get_mut(&fips) else {
            continue;
        };

        if let Some(name) = first_property(feature, &NAME_PROPERTIES) {
            entry.name = Some(name);
        }
        if let Some(state) = first_property(feature, &STATE_PROPERTIES) {
            entry.state = Some(state);
        }
        matched += 1;
    }

    log::info!(
        "Enriched {matched} lookup entries from {} GeoJSON features",
        features.len()
    );
    Ok(matched)
}

/// Reads, enriches and rewrites the lookup at `lookup_path` in place.
///
/// # Errors
///
/// Returns [`PipelineError::MissingInput`] if either file is absent, and
/// propagates parse and write errors.
pub fn enrich_lookup_file(lookup_path: &Path, geojson_path: &Path) -> Result<usize, PipelineError> {
    for path in [lookup_path, geojson_path] {
        if !path.exists() {
            return Err(PipelineError::MissingInput {
                path: path.to_path_buf(),
            });
        }
    }

    let mut lookup: IdentityLookup =
        serde_json::from_str(&std::fs::read_to_string(lookup_path)?)?;
    let matched = enrich_lookup_from_geojson(&mut lookup, &std::fs::read_to_string(geojson_path)?)?;
    write_lookup(&lookup, lookup_path)?;
    Ok(matched)
}

/// Returns the first non-empty string (or numeric) property among `keys`.
fn first_property(feature: &geojson::Feature, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match feature.property(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// `AFFGEOID` values look like `0500000US01001`; keep the part after `US`.
fn strip_geoid_prefix(geoid: &str) -> &str {
    geoid.rsplit_once("US").map_or(geoid, |(_, tail)| tail)
}

/// Collects lookup coordinates per FIPS for quick access during assembly.
#[must_use]
pub fn lookup_coordinates(lookup: &IdentityLookup) -> HashMap<String, (f64, f64)> {
    lookup
        .iter()
        .filter_map(|(key, entry)| {
            Some((normalize_fips(key)?, (entry.lat?, entry.lon?)))
        })
        .collect()
}
