//! Peer Finder.
//!
//! A county's peers are the other counties in its stratum (same state and
//! urbanicity) with the closest scores.

use std::collections::HashMap;

use civic_quest_county_models::{CountyRecord, PeerCounty, Urbanicity};

use crate::normalize::round_to;

/// Maximum number of peers listed per county.
pub const MAX_PEERS: usize = 5;

/// Finds peers for every county, aligned with `counties`.
///
/// Candidates are ordered by absolute score gap, ties by ascending FIPS.
#[must_use]
pub fn find_peers(counties: &[CountyRecord]) -> Vec<Vec<PeerCounty>> {
    let mut strata: HashMap<(&str, Urbanicity), Vec<usize>> = HashMap::new();
    for (idx, county) in counties.iter().enumerate() {
        strata
            .entry((county.state_abbr.as_str(), county.urbanicity))
            .or_default()
            .push(idx);
    }

    counties
        .iter()
        .enumerate()
        .map(|(idx, county)| {
            let members = &strata[&(county.state_abbr.as_str(), county.urbanicity)];
            peers_of(idx, county, members, counties)
        })
        .collect()
}

fn peers_of(
    idx: usize,
    county: &CountyRecord,
    members: &[usize],
    counties: &[CountyRecord],
) -> Vec<PeerCounty> {
    let mut candidates: Vec<(f64, &CountyRecord)> = members
        .iter()
        .filter(|&&other| other != idx)
        .map(|&other| {
            let peer = &counties[other];
            ((peer.score - county.score).abs(), peer)
        })
        .collect();

    candidates.sort_by(|(gap_a, a), (gap_b, b)| {
        gap_a.total_cmp(gap_b).then_with(|| a.fips.cmp(&b.fips))
    });

    candidates
        .into_iter()
        .take(MAX_PEERS)
        .map(|(_, peer)| PeerCounty {
            fips: peer.fips.clone(),
            name: peer.name.clone(),
            state: peer.state_abbr.clone(),
            score: round_to(peer.score, 2),
            urbanicity: peer.urbanicity,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use civic_quest_county_models::CountyMetrics;

    use super::*;

    fn county(fips: &str, state: &str, score: f64, urbanicity: Urbanicity) -> CountyRecord {
        CountyRecord {
            fips: fips.to_string(),
            name: format!("County {fips}"),
            state_abbr: state.to_string(),
            population: 1_000,
            score,
            latitude: None,
            longitude: None,
            urbanicity,
            national_rank: 1,
            national_percentile: 100.0,
            state_rank: 1,
            metrics: CountyMetrics::default(),
            org_types: Vec::new(),
            peers: Vec::new(),
        }
    }

    #[test]
    fn peers_share_stratum_and_exclude_self() {
        let counties = vec![
            county("01001", "AL", 1.0, Urbanicity::Rural),
            county("01003", "AL", 1.2, Urbanicity::Rural),
            county("01005", "AL", 1.1, Urbanicity::Urban),
            county("13001", "GA", 1.0, Urbanicity::Rural),
        ];
        let peers = find_peers(&counties);

        assert_eq!(peers[0].len(), 1);
        assert_eq!(peers[0][0].fips, "01003");
        assert!(peers[2].is_empty());
        assert!(peers[3].is_empty());
        for (county, list) in counties.iter().zip(&peers) {
            for peer in list {
                assert_ne!(peer.fips, county.fips);
                assert_eq!(peer.state, county.state_abbr);
                assert_eq!(peer.urbanicity, county.urbanicity);
            }
        }
    }

    #[test]
    fn sorted_by_gap_and_capped() {
        let scores = [5.0, 1.0, 4.5, 9.0, 5.25, 6.0, 3.0, 5.1];
        let counties: Vec<CountyRecord> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| county(&format!("060{i:02}"), "CA", *s, Urbanicity::Suburban))
            .collect();
        let peers = find_peers(&counties);

        let subject = &peers[0];
        assert_eq!(subject.len(), MAX_PEERS);
        let gaps: Vec<f64> = subject.iter().map(|p| (p.score - 5.0).abs()).collect();
        assert!(gaps.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(subject[0].fips, "06007");
    }

    #[test]
    fn ties_break_by_fips() {
        let counties = vec![
            county("48009", "TX", 2.0, Urbanicity::Rural),
            county("48005", "TX", 3.0, Urbanicity::Rural),
            county("48003", "TX", 1.0, Urbanicity::Rural),
        ];
        let peers = find_peers(&counties);
        let order: Vec<&str> = peers[0].iter().map(|p| p.fips.as_str()).collect();
        assert_eq!(order, vec!["48003", "48005"]);
    }

    #[test]
    fn peer_scores_are_rounded() {
        let counties = vec![
            county("01001", "AL", 1.0, Urbanicity::Urban),
            county("01003", "AL", 1.23456, Urbanicity::Urban),
        ];
        let peers = find_peers(&counties);
        assert!((peers[0][0].score - 1.23).abs() < 1e-9);
    }
}
