#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! County civic-opportunity record types.
//!
//! These are the derived, fully-resolved types produced by the analytics
//! pipeline and consumed by the query server and the static export. They
//! carry no behavior beyond small accessors; all computation lives in the
//! pipeline crate.

pub mod fips;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Three-way urbanicity bucket assigned to every resolved county.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Urbanicity {
    /// Metropolitan core counties.
    Urban,
    /// Fringe metro and large non-metro counties.
    Suburban,
    /// Small and remote counties.
    Rural,
}

impl Urbanicity {
    /// All labels, in urban-to-rural order.
    pub const ALL: [Self; 3] = [Self::Urban, Self::Suburban, Self::Rural];
}

/// Aggregate civic metric sums reported per county in the metrics table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountyMetrics {
    /// Civic organization sum.
    pub civic_org_sum: u64,
    /// Volunteering sum.
    pub volunteer_sum: f64,
    /// Civic events sum.
    pub events_sum: f64,
    /// Membership sum.
    pub membership_sum: f64,
    /// Take-action sum.
    pub take_action_sum: f64,
    /// Number of nonprofit organizations.
    pub nonprofit_count: u64,
}

/// Summed organization count for one organization class in a county.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgTypeCount {
    /// Organization class label (e.g. `"arts"`).
    pub class: String,
    /// Summed count across all raw rows for this county and class.
    pub count: u64,
}

/// A closest-scoring county in the same state and urbanicity stratum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerCounty {
    /// Peer FIPS code.
    pub fips: String,
    /// Peer county name.
    pub name: String,
    /// Peer state abbreviation.
    pub state: String,
    /// Peer score, rounded to two decimals.
    pub score: f64,
    /// Peer urbanicity (always equal to the subject county's).
    pub urbanicity: Urbanicity,
}

/// One fully resolved county with rankings, org types and peers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountyRecord {
    /// Five-character zero-padded FIPS code.
    pub fips: String,
    /// Canonical county name. Never empty.
    pub name: String,
    /// State postal abbreviation.
    #[serde(rename = "state")]
    pub state_abbr: String,
    /// Total population (0 when the source value was unusable).
    pub population: u64,
    /// Normalized civic-opportunity score.
    pub score: f64,
    /// Centroid latitude.
    #[serde(rename = "lat")]
    pub latitude: Option<f64>,
    /// Centroid longitude.
    #[serde(rename = "lon")]
    pub longitude: Option<f64>,
    /// Urbanicity bucket.
    pub urbanicity: Urbanicity,
    /// 1-based national rank by descending score; ties share the minimum.
    pub national_rank: u32,
    /// Share of counties scoring at or below this one, 0-100, one decimal.
    pub national_percentile: f64,
    /// 1-based rank within the state; ties share the minimum.
    pub state_rank: u32,
    /// Raw metric sums.
    pub metrics: CountyMetrics,
    /// Organization classes ordered by descending count.
    pub org_types: Vec<OrgTypeCount>,
    /// Up to five closest-scoring peers.
    pub peers: Vec<PeerCounty>,
}

/// Per-state summary statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSummary {
    /// State postal abbreviation.
    pub state: String,
    /// Number of resolved counties in the state.
    pub county_count: u32,
    /// Mean county score, two decimals.
    pub avg_score: f64,
    /// Mean score of urban counties (0.0 if none).
    pub urban_avg: f64,
    /// Mean score of suburban counties (0.0 if none).
    pub suburban_avg: f64,
    /// Mean score of rural counties (0.0 if none).
    pub rural_avg: f64,
    /// Number of urban counties.
    pub urban_count: u32,
    /// Number of suburban counties.
    pub suburban_count: u32,
    /// Number of rural counties.
    pub rural_count: u32,
    /// Name of the highest-scoring county.
    pub top_county: String,
    /// FIPS of the highest-scoring county.
    pub top_county_fips: String,
    /// Score of the highest-scoring county, two decimals.
    pub top_score: f64,
    /// Name of the lowest-scoring county.
    pub bottom_county: String,
    /// FIPS of the lowest-scoring county.
    pub bottom_county_fips: String,
    /// Score of the lowest-scoring county, two decimals.
    pub bottom_score: f64,
}

impl StateSummary {
    /// Mean score restricted to one urbanicity label.
    #[must_use]
    pub const fn avg_for(&self, urbanicity: Urbanicity) -> f64 {
        match urbanicity {
            Urbanicity::Urban => self.urban_avg,
            Urbanicity::Suburban => self.suburban_avg,
            Urbanicity::Rural => self.rural_avg,
        }
    }

    /// County count restricted to one urbanicity label.
    #[must_use]
    pub const fn count_for(&self, urbanicity: Urbanicity) -> u32 {
        match urbanicity {
            Urbanicity::Urban => self.urban_count,
            Urbanicity::Suburban => self.suburban_count,
            Urbanicity::Rural => self.rural_count,
        }
    }
}

/// Run metadata bundled with the static export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// Which urbanicity policy produced the labels, and from which file.
    pub urbanicity_source: String,
    /// Number of resolved counties.
    pub county_count: usize,
    /// Number of states with at least one resolved county.
    pub state_count: usize,
    /// RFC 3339 timestamp of the pipeline run.
    #[serde(default)]
    pub generated_at: Option<String>,
}

/// The full static export document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    /// Run metadata.
    pub metadata: ExportMetadata,
    /// State summaries sorted by state code.
    pub states: Vec<StateSummary>,
    /// County records in source table order.
    pub counties: Vec<CountyRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urbanicity_string_roundtrip() {
        for label in Urbanicity::ALL {
            let parsed: Urbanicity = label.to_string().parse().unwrap();
            assert_eq!(parsed, label);
        }
        assert_eq!(Urbanicity::Suburban.as_ref(), "Suburban");
        assert!("Exurban".parse::<Urbanicity>().is_err());
    }

    #[test]
    fn county_record_uses_export_field_names() {
        let record = CountyRecord {
            fips: "06037".to_string(),
            name: "Los Angeles".to_string(),
            state_abbr: "CA".to_string(),
            population: 10_000_000,
            score: 1.5,
            latitude: Some(34.0),
            longitude: None,
            urbanicity: Urbanicity::Urban,
            national_rank: 1,
            national_percentile: 100.0,
            state_rank: 1,
            metrics: CountyMetrics::default(),
            org_types: vec![OrgTypeCount {
                class: "arts".to_string(),
                count: 5,
            }],
            peers: Vec::new(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["state"], "CA");
        assert_eq!(value["lat"], 34.0);
        assert!(value["lon"].is_null());
        assert_eq!(value["urbanicity"], "Urban");
        assert_eq!(value["org_types"][0]["class"], "arts");
        assert_eq!(value["metrics"]["nonprofit_count"], 0);
    }
}
