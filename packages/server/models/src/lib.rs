#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the civic quest server.
//!
//! Field names are `snake_case` to match the static export document, so a
//! county returned by the API and a county in the export serialize the
//! same way.

use civic_quest_county_models::{CountyRecord, ExportMetadata, StateSummary, Urbanicity};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the server is serving a snapshot.
    pub healthy: bool,
    /// Server crate version.
    pub version: String,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable reason.
    pub error: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// One state available in the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateInfo {
    /// Postal abbreviation.
    pub state: String,
    /// Full state name, or the abbreviation if it is not a known state.
    pub name: String,
    /// Number of resolved counties.
    pub county_count: u32,
}

/// `GET /api/states` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatesResponse {
    /// States sorted by postal code.
    pub states: Vec<StateInfo>,
    /// Classifier provenance.
    pub urbanicity_source: String,
}

/// `GET /api/search` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    /// Free-text query matched against name, state code and FIPS.
    pub q: Option<String>,
}

/// One county search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// FIPS code.
    pub fips: String,
    /// `"<name>, <state>"`.
    pub display: String,
    /// Total population.
    pub population: u64,
    /// Centroid latitude.
    pub lat: Option<f64>,
    /// Centroid longitude.
    pub lon: Option<f64>,
    /// Civic-opportunity score.
    pub score: f64,
    /// Urbanicity label.
    pub urbanicity: Urbanicity,
}

impl From<&CountyRecord> for SearchHit {
    fn from(county: &CountyRecord) -> Self {
        Self {
            fips: county.fips.clone(),
            display: format!("{}, {}", county.name, county.state_abbr),
            population: county.population,
            lat: county.latitude,
            lon: county.longitude,
            score: county.score,
            urbanicity: county.urbanicity,
        }
    }
}

/// `GET /api/state/{code}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateProfile {
    /// The state's summary.
    pub summary: StateSummary,
    /// Highest-scoring counties in the state, best first.
    pub top_counties: Vec<CountyRecord>,
    /// Classifier provenance.
    pub urbanicity_source: String,
}

/// `GET /api/compare` query parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct CompareParams {
    /// First state code.
    pub a: String,
    /// Second state code.
    pub b: String,
}

/// Score differences between two states (`a - b`), two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreGaps {
    /// Difference in mean score.
    pub overall: f64,
    /// Difference in urban mean score.
    pub urban: f64,
    /// Difference in suburban mean score.
    pub suburban: f64,
    /// Difference in rural mean score.
    pub rural: f64,
}

/// `GET /api/compare` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateComparison {
    /// Summary of the first state.
    pub a: StateSummary,
    /// Summary of the second state.
    pub b: StateSummary,
    /// Score gaps between them.
    pub gaps: ScoreGaps,
}

/// `POST /api/reload` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadResponse {
    /// Metadata of the snapshot now being served.
    pub metadata: ExportMetadata,
}

#[cfg(test)]
mod tests {
    use civic_quest_county_models::CountyMetrics;

    use super::*;

    #[test]
    fn search_hit_display_joins_name_and_state() {
        let county = CountyRecord {
            fips: "01001".to_string(),
            name: "Autauga".to_string(),
            state_abbr: "AL".to_string(),
            population: 55_000,
            score: 0.42,
            latitude: Some(32.5),
            longitude: Some(-86.6),
            urbanicity: Urbanicity::Suburban,
            national_rank: 10,
            national_percentile: 80.0,
            state_rank: 2,
            metrics: CountyMetrics::default(),
            org_types: Vec::new(),
            peers: Vec::new(),
        };

        let hit = SearchHit::from(&county);
        assert_eq!(hit.display, "Autauga, AL");

        let value = serde_json::to_value(&hit).unwrap();
        assert_eq!(value["lat"], 32.5);
        assert_eq!(value["urbanicity"], "Suburban");
    }

    #[test]
    fn error_body_shape() {
        let value = serde_json::to_value(ApiError::new("County not found")).unwrap();
        assert_eq!(value, serde_json::json!({"error": "County not found"}));
    }
}
