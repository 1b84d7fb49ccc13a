//! Urbanicity Classifier.
//!
//! The policy is chosen once per run. When a rural-urban continuum table is
//! available and covers at least one resolved county, counties are labelled
//! from their continuum code. Otherwise labels come from population tertiles
//! computed over all resolved counties.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use civic_quest_county_models::Urbanicity;
use civic_quest_county_models::fips::normalize_fips;

use crate::config::UrbanicityColumns;
use crate::normalize::parse_optional_count;
use crate::table::RawTable;

/// Cut points used when the population quantiles cannot be computed.
pub const DEFAULT_TERTILE_CUTS: (f64, f64) = (30_000.0, 120_000.0);

/// Lower and upper tertile quantiles.
const TERTILE_QUANTILES: (f64, f64) = (0.33, 0.67);

/// A loaded continuum-code table.
#[derive(Debug, Clone)]
pub struct ContinuumReference {
    /// File the codes were read from.
    pub source: PathBuf,
    /// Continuum code per normalized FIPS.
    pub codes: HashMap<String, u32>,
}

impl ContinuumReference {
    /// Extracts `fips -> code` pairs from a parsed table.
    ///
    /// Returns `None` if either column cannot be resolved. Rows with an
    /// unusable FIPS or a non-numeric code are dropped.
    #[must_use]
    pub fn from_table(table: &RawTable, columns: &UrbanicityColumns, source: &Path) -> Option<Self> {
        let fips_col = table.column(&columns.fips);
        let code_col = table.column(&columns.code);
        if fips_col.is_none() || code_col.is_none() {
            log::warn!(
                "Urbanicity reference {} lacks a FIPS or continuum code column",
                source.display()
            );
            return None;
        }

        let codes = table
            .rows()
            .filter_map(|row| {
                let fips = normalize_fips(row.get(fips_col)?)?;
                let code = parse_optional_count(row.get(code_col))?;
                Some((fips, u32::try_from(code).unwrap_or(u32::MAX)))
            })
            .collect();

        Some(Self {
            source: source.to_path_buf(),
            codes,
        })
    }
}

/// Loads the first existing candidate continuum table.
///
/// Any failure along the way (no candidate exists, unreadable file, missing
/// columns) yields `None` so the caller falls back to population tertiles.
#[must_use]
pub fn load_reference(candidates: &[PathBuf], columns: &UrbanicityColumns) -> Option<ContinuumReference> {
    let Some(path) = candidates.iter().find(|p| p.exists()) else {
        log::info!("No urbanicity reference table found");
        return None;
    };

    let table = match RawTable::read(path, "urbanicity") {
        Ok(table) => table,
        Err(e) => {
            log::warn!("Ignoring urbanicity reference {}: {e}", path.display());
            return None;
        }
    };

    ContinuumReference::from_table(&table, columns, path)
}

/// Maps a continuum code to a label: 1-3 urban, 4-7 suburban, 8+ rural.
#[must_use]
pub const fn urbanicity_for_code(code: u32) -> Urbanicity {
    match code {
        0..=3 => Urbanicity::Urban,
        4..=7 => Urbanicity::Suburban,
        _ => Urbanicity::Rural,
    }
}

/// The classification policy selected for a run.
#[derive(Debug, Clone)]
pub enum UrbanicityPolicy {
    /// Labels from continuum codes; counties missing from the table are
    /// labelled suburban.
    ReferenceTable(ContinuumReference),
    /// Labels from population cut points.
    PopulationTertile {
        /// Populations at or below this are rural.
        lower: f64,
        /// Populations at or below this (and above `lower`) are suburban.
        upper: f64,
    },
}

impl UrbanicityPolicy {
    /// Chooses the policy for a set of `(fips, population)` pairs.
    ///
    /// The reference table is used only if it yields a code for at least
    /// one of the given counties.
    #[must_use]
    pub fn select(reference: Option<ContinuumReference>, counties: &[(&str, u64)]) -> Self {
        if let Some(reference) = reference {
            let covered = counties
                .iter()
                .filter(|(fips, _)| reference.codes.contains_key(*fips))
                .count();
            if covered > 0 {
                log::info!(
                    "Classifying urbanicity from {} ({covered}/{} counties coded)",
                    reference.source.display(),
                    counties.len()
                );
                return Self::ReferenceTable(reference);
            }
            log::warn!(
                "Urbanicity reference {} covers no resolved county; using population tertiles",
                reference.source.display()
            );
        }

        #[allow(clippy::cast_precision_loss)]
        let mut populations: Vec<f64> = counties.iter().map(|(_, pop)| *pop as f64).collect();
        populations.sort_by(f64::total_cmp);

        let lower = quantile(&populations, TERTILE_QUANTILES.0).unwrap_or(DEFAULT_TERTILE_CUTS.0);
        let upper = quantile(&populations, TERTILE_QUANTILES.1).unwrap_or(DEFAULT_TERTILE_CUTS.1);
        log::info!("Classifying urbanicity by population tertiles ({lower:.0}, {upper:.0})");

        Self::PopulationTertile { lower, upper }
    }

    /// Labels one county.
    #[must_use]
    pub fn classify(&self, fips: &str, population: u64) -> Urbanicity {
        match self {
            Self::ReferenceTable(reference) => reference
                .codes
                .get(fips)
                .map_or(Urbanicity::Suburban, |code| urbanicity_for_code(*code)),
            Self::PopulationTertile { lower, upper } => {
                #[allow(clippy::cast_precision_loss)]
                let population = population as f64;
                if population <= *lower {
                    Urbanicity::Rural
                } else if population <= *upper {
                    Urbanicity::Suburban
                } else {
                    Urbanicity::Urban
                }
            }
        }
    }

    /// Human-readable description of the policy and its source.
    #[must_use]
    pub fn provenance(&self) -> String {
        match self {
            Self::ReferenceTable(reference) => format!("RUCC ({})", reference.source.display()),
            Self::PopulationTertile { .. } => "Population tertiles (fallback)".to_string(),
        }
    }
}

/// Linear-interpolated quantile of ascending-sorted values.
///
/// Returns `None` for an empty slice.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let pos = q.clamp(0.0, 1.0) * last as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - pos.floor();
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(pairs: &[(&str, u32)]) -> ContinuumReference {
        ContinuumReference {
            source: PathBuf::from("raw_data/rucc_county.csv"),
            codes: pairs.iter().map(|(f, c)| ((*f).to_string(), *c)).collect(),
        }
    }

    #[test]
    fn code_boundaries() {
        assert_eq!(urbanicity_for_code(1), Urbanicity::Urban);
        assert_eq!(urbanicity_for_code(3), Urbanicity::Urban);
        assert_eq!(urbanicity_for_code(4), Urbanicity::Suburban);
        assert_eq!(urbanicity_for_code(7), Urbanicity::Suburban);
        assert_eq!(urbanicity_for_code(8), Urbanicity::Rural);
        assert_eq!(urbanicity_for_code(9), Urbanicity::Rural);
    }

    #[test]
    fn tertile_fallback_scenario() {
        let counties = [("00001", 10_000), ("00002", 50_000), ("00003", 200_000)];
        let policy = UrbanicityPolicy::select(None, &counties);

        let UrbanicityPolicy::PopulationTertile { lower, upper } = policy else {
            panic!("expected tertile policy");
        };
        assert!((lower - 36_400.0).abs() < 1e-6);
        assert!((upper - 101_000.0).abs() < 1e-6);

        assert_eq!(policy.classify("00001", 10_000), Urbanicity::Rural);
        assert_eq!(policy.classify("00002", 50_000), Urbanicity::Suburban);
        assert_eq!(policy.classify("00003", 200_000), Urbanicity::Urban);
        assert_eq!(policy.provenance(), "Population tertiles (fallback)");
    }

    #[test]
    fn empty_dataset_uses_default_cuts() {
        let policy = UrbanicityPolicy::select(None, &[]);
        let UrbanicityPolicy::PopulationTertile { lower, upper } = policy else {
            panic!("expected tertile policy");
        };
        assert!((lower - DEFAULT_TERTILE_CUTS.0).abs() < f64::EPSILON);
        assert!((upper - DEFAULT_TERTILE_CUTS.1).abs() < f64::EPSILON);
    }

    #[test]
    fn reference_mode_labels_by_code_and_defaults_missing_to_suburban() {
        let counties = [("01001", 55_000), ("01003", 200_000), ("01005", 25_000)];
        let policy = UrbanicityPolicy::select(
            Some(reference(&[("01001", 2), ("01005", 9)])),
            &counties,
        );

        assert!(matches!(policy, UrbanicityPolicy::ReferenceTable(_)));
        assert_eq!(policy.classify("01001", 55_000), Urbanicity::Urban);
        assert_eq!(policy.classify("01005", 25_000), Urbanicity::Rural);
        assert_eq!(policy.classify("01003", 200_000), Urbanicity::Suburban);
        assert_eq!(policy.provenance(), "RUCC (raw_data/rucc_county.csv)");
    }

    #[test]
    fn reference_covering_no_county_is_unusable() {
        let counties = [("01001", 10), ("01003", 20), ("01005", 30)];
        let policy = UrbanicityPolicy::select(Some(reference(&[("99001", 1)])), &counties);
        assert!(matches!(policy, UrbanicityPolicy::PopulationTertile { .. }));
    }

    #[test]
    fn reads_reference_with_alternate_spellings() {
        let csv = "FIPStxt,State,RUCC_2023\n1001,AL,2\n1003,AL,x\n1005,AL,6.0\n";
        let table = RawTable::from_reader(csv.as_bytes(), "urbanicity").unwrap();
        let columns = crate::config::PipelineConfig::embedded(PathBuf::new())
            .columns
            .urbanicity;

        let reference =
            ContinuumReference::from_table(&table, &columns, Path::new("County_Classifications.csv"))
                .unwrap();
        assert_eq!(reference.codes.len(), 2);
        assert_eq!(reference.codes.get("01001"), Some(&2));
        assert_eq!(reference.codes.get("01005"), Some(&6));
    }

    #[test]
    fn missing_candidates_yield_none() {
        let columns = crate::config::PipelineConfig::embedded(PathBuf::new())
            .columns
            .urbanicity;
        assert!(load_reference(&[PathBuf::from("/no/such/rucc.csv")], &columns).is_none());
    }

    #[test]
    fn quantile_interpolates() {
        assert_eq!(quantile(&[], 0.5), None);
        assert_eq!(quantile(&[7.0], 0.33), Some(7.0));
        let q = quantile(&[0.0, 10.0], 0.25).unwrap();
        assert!((q - 2.5).abs() < f64::EPSILON);
    }
}
