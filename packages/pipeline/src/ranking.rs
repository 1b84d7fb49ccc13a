//! Ranking Engine.
//!
//! Pure functions of the score column. Ranks use minimum-tie semantics:
//! a county's rank is one plus the number of counties with a strictly
//! greater score.

use std::collections::BTreeMap;

use crate::normalize::round_to;

/// Ranks computed for one county.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountyRanks {
    /// 1-based national rank.
    pub national_rank: u32,
    /// Percent of counties scoring at or below this one, one decimal.
    pub national_percentile: f64,
    /// 1-based rank within the county's state.
    pub state_rank: u32,
}

/// Minimum-tie descending ranks, aligned with `scores`.
#[must_use]
pub fn min_ranks(scores: &[f64]) -> Vec<u32> {
    let mut descending = scores.to_vec();
    descending.sort_by(|a, b| b.total_cmp(a));

    scores
        .iter()
        .map(|score| {
            let greater = descending.partition_point(|other| other > score);
            u32::try_from(greater + 1).unwrap_or(u32::MAX)
        })
        .collect()
}

/// Percentile ranks in `[0, 100]`, rounded to one decimal, aligned with
/// `scores`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percentiles(scores: &[f64]) -> Vec<f64> {
    let mut ascending = scores.to_vec();
    ascending.sort_by(f64::total_cmp);
    let total = ascending.len() as f64;

    scores
        .iter()
        .map(|score| {
            let at_or_below = ascending.partition_point(|other| other <= score);
            round_to(at_or_below as f64 / total * 100.0, 1)
        })
        .collect()
}

/// Computes national and within-state ranks.
///
/// `scores` and `states` are parallel slices in county order.
#[must_use]
pub fn rank_counties(scores: &[f64], states: &[&str]) -> Vec<CountyRanks> {
    debug_assert_eq!(scores.len(), states.len());

    let national = min_ranks(scores);
    let pct = percentiles(scores);

    let mut by_state: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, state) in states.iter().enumerate() {
        by_state.entry(*state).or_default().push(idx);
    }

    let mut state_ranks = vec![0_u32; scores.len()];
    for members in by_state.values() {
        let member_scores: Vec<f64> = members.iter().map(|&i| scores[i]).collect();
        for (&idx, rank) in members.iter().zip(min_ranks(&member_scores)) {
            state_ranks[idx] = rank;
        }
    }

    national
        .into_iter()
        .zip(pct)
        .zip(state_ranks)
        .map(|((national_rank, national_percentile), state_rank)| CountyRanks {
            national_rank,
            national_percentile,
            state_rank,
        })
        .collect()
}
