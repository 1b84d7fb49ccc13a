//! Read-only queries over a snapshot.
//!
//! Not-found is `None`, which the handlers turn into a 404. An empty
//! search is a successful empty list.

use civic_quest_county_models::fips::state_by_abbr;
use civic_quest_county_models::{CountyRecord, Urbanicity};
use civic_quest_pipeline::normalize::round_to;
use civic_quest_pipeline::snapshot::Snapshot;
use civic_quest_server_models::{
    ScoreGaps, SearchHit, StateComparison, StateInfo, StateProfile, StatesResponse,
};

/// Maximum number of search results.
pub const MAX_SEARCH_RESULTS: usize = 12;

/// Number of counties listed in a state profile.
pub const STATE_TOP_COUNTIES: usize = 8;

/// Lists the states present in the snapshot.
#[must_use]
pub fn list_states(snapshot: &Snapshot) -> StatesResponse {
    let states = snapshot
        .states()
        .iter()
        .map(|summary| StateInfo {
            state: summary.state.clone(),
            name: state_by_abbr(&summary.state)
                .map_or_else(|| summary.state.clone(), |s| s.name.to_string()),
            county_count: summary.county_count,
        })
        .collect();

    StatesResponse {
        states,
        urbanicity_source: snapshot.urbanicity_source().to_string(),
    }
}

/// Case-insensitive substring search over county name, state code and
/// FIPS, in table order.
#[must_use]
pub fn search(snapshot: &Snapshot, query: &str) -> Vec<SearchHit> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    snapshot
        .counties()
        .iter()
        .filter(|c| {
            c.name.to_lowercase().contains(&needle)
                || c.state_abbr.to_lowercase().contains(&needle)
                || c.fips.contains(&needle)
        })
        .take(MAX_SEARCH_RESULTS)
        .map(SearchHit::from)
        .collect()
}

/// Fetches one county by FIPS.
#[must_use]
pub fn county(snapshot: &Snapshot, fips: &str) -> Option<CountyRecord> {
    snapshot.county(fips).cloned()
}

/// Fetches a state's summary and its highest-scoring counties.
#[must_use]
pub fn state_profile(snapshot: &Snapshot, code: &str) -> Option<StateProfile> {
    let summary = snapshot.state(code)?.clone();

    let mut counties: Vec<&CountyRecord> = snapshot.counties_in_state(&summary.state).collect();
    counties.sort_by(|a, b| b.score.total_cmp(&a.score));
    let top_counties = counties
        .into_iter()
        .take(STATE_TOP_COUNTIES)
        .cloned()
        .collect();

    Some(StateProfile {
        summary,
        top_counties,
        urbanicity_source: snapshot.urbanicity_source().to_string(),
    })
}

/// Compares two states. `None` if either is unknown.
#[must_use]
pub fn compare(snapshot: &Snapshot, a: &str, b: &str) -> Option<StateComparison> {
    let a = snapshot.state(a)?.clone();
    let b = snapshot.state(b)?.clone();
    let gap = |label: Urbanicity| round_to(a.avg_for(label) - b.avg_for(label), 2);

    let gaps = ScoreGaps {
        overall: round_to(a.avg_score - b.avg_score, 2),
        urban: gap(Urbanicity::Urban),
        suburban: gap(Urbanicity::Suburban),
        rural: gap(Urbanicity::Rural),
    };

    Some(StateComparison { a, b, gaps })
}

#[cfg(test)]
pub(crate) mod tests {
    use civic_quest_county_models::{CountyMetrics, ExportMetadata};
    use civic_quest_pipeline::states::summarize_states;

    use super::*;

    fn county(fips: &str, name: &str, state: &str, score: f64, urbanicity: Urbanicity) -> CountyRecord {
        CountyRecord {
            fips: fips.to_string(),
            name: name.to_string(),
            state_abbr: state.to_string(),
            population: 1_000,
            score,
            latitude: Some(1.0),
            longitude: Some(2.0),
            urbanicity,
            national_rank: 1,
            national_percentile: 100.0,
            state_rank: 1,
            metrics: CountyMetrics::default(),
            org_types: Vec::new(),
            peers: Vec::new(),
        }
    }

    pub(crate) fn sample_snapshot() -> Snapshot {
        let mut counties = vec![
            county("06001", "Alameda", "CA", 10.0, Urbanicity::Urban),
            county("06003", "Alpine", "CA", 2.0, Urbanicity::Rural),
            county("01001", "Autauga", "AL", 4.0, Urbanicity::Suburban),
            county("01003", "Baldwin", "AL", 6.5, Urbanicity::Urban),
        ];
        for i in 0..12 {
            counties.push(county(
                &format!("48{:03}", 2 * i + 1),
                &format!("Texan {i}"),
                "TX",
                f64::from(i),
                Urbanicity::Rural,
            ));
        }
        let states = summarize_states(&counties);
        let metadata = ExportMetadata {
            urbanicity_source: "Population tertiles (fallback)".to_string(),
            county_count: counties.len(),
            state_count: states.len(),
            generated_at: None,
        };
        Snapshot::new(metadata, counties, states)
    }

    #[test]
    fn lists_states_with_names() {
        let response = list_states(&sample_snapshot());
        let names: Vec<(&str, &str, u32)> = response
            .states
            .iter()
            .map(|s| (s.state.as_str(), s.name.as_str(), s.county_count))
            .collect();
        assert_eq!(
            names,
            vec![("AL", "Alabama", 2), ("CA", "California", 2), ("TX", "Texas", 12)]
        );
        assert_eq!(response.urbanicity_source, "Population tertiles (fallback)");
    }

    #[test]
    fn search_matches_name_state_and_fips() {
        let snapshot = sample_snapshot();

        let by_name: Vec<String> = search(&snapshot, "ALA").into_iter().map(|h| h.fips).collect();
        assert_eq!(by_name, vec!["06001"]);

        let by_fips = search(&snapshot, "0100");
        assert_eq!(by_fips.len(), 2);
        assert_eq!(by_fips[0].display, "Autauga, AL");

        assert_eq!(search(&snapshot, "ca").len(), 2);
    }

    #[test]
    fn search_caps_results_in_table_order() {
        let hits = search(&sample_snapshot(), "tx");
        assert_eq!(hits.len(), MAX_SEARCH_RESULTS);
        assert_eq!(hits[0].fips, "48001");
    }

    #[test]
    fn empty_search_is_empty() {
        assert!(search(&sample_snapshot(), "   ").is_empty());
        assert!(search(&sample_snapshot(), "zzz").is_empty());
    }

    #[test]
    fn county_lookup_pads_fips() {
        let snapshot = sample_snapshot();
        assert_eq!(super::county(&snapshot, "1001").unwrap().name, "Autauga");
        assert!(super::county(&snapshot, "99999").is_none());
    }

    #[test]
    fn state_profile_lists_top_eight_by_score() {
        let profile = state_profile(&sample_snapshot(), "tx").unwrap();
        assert_eq!(profile.summary.state, "TX");
        assert_eq!(profile.top_counties.len(), STATE_TOP_COUNTIES);
        assert!((profile.top_counties[0].score - 11.0).abs() < f64::EPSILON);
        assert!(
            profile
                .top_counties
                .windows(2)
                .all(|w| w[0].score >= w[1].score)
        );
        assert!(state_profile(&sample_snapshot(), "ZZ").is_none());
    }

    #[test]
    fn compare_reports_rounded_gaps() {
        let comparison = compare(&sample_snapshot(), "CA", "AL").unwrap();
        assert!((comparison.gaps.overall - 0.75).abs() < 1e-9);
        assert!((comparison.gaps.urban - 3.5).abs() < 1e-9);
        assert!((comparison.gaps.suburban + 4.0).abs() < 1e-9);
        assert!((comparison.gaps.rural - 2.0).abs() < 1e-9);
        assert!(compare(&sample_snapshot(), "CA", "ZZ").is_none());
    }
}
