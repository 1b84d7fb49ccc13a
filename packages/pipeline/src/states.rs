//! State Aggregator.

use std::collections::BTreeMap;

use civic_quest_county_models::{CountyRecord, StateSummary, Urbanicity};

use crate::normalize::round_to;

#[derive(Default)]
struct Accumulator<'a> {
    total: f64,
    count: u32,
    by_label: [(f64, u32); 3],
    top: Option<&'a CountyRecord>,
    bottom: Option<&'a CountyRecord>,
}

impl<'a> Accumulator<'a> {
    fn add(&mut self, county: &'a CountyRecord) {
        self.total += county.score;
        self.count += 1;

        let slot = &mut self.by_label[label_index(county.urbanicity)];
        slot.0 += county.score;
        slot.1 += 1;

        // Strict comparisons: the earliest county in table order wins ties.
        if self.top.is_none_or(|top| county.score > top.score) {
            self.top = Some(county);
        }
        if self.bottom.is_none_or(|bottom| county.score < bottom.score) {
            self.bottom = Some(county);
        }
    }

    fn finish(self, state: String) -> Option<StateSummary> {
        let top = self.top?;
        let bottom = self.bottom?;
        let label_avg = |urbanicity: Urbanicity| {
            let (sum, count) = self.by_label[label_index(urbanicity)];
            mean(sum, count)
        };

        Some(StateSummary {
            state,
            county_count: self.count,
            avg_score: mean(self.total, self.count),
            urban_avg: label_avg(Urbanicity::Urban),
            suburban_avg: label_avg(Urbanicity::Suburban),
            rural_avg: label_avg(Urbanicity::Rural),
            urban_count: self.by_label[label_index(Urbanicity::Urban)].1,
            suburban_count: self.by_label[label_index(Urbanicity::Suburban)].1,
            rural_count: self.by_label[label_index(Urbanicity::Rural)].1,
            top_county: top.name.clone(),
            top_county_fips: top.fips.clone(),
            top_score: round_to(top.score, 2),
            bottom_county: bottom.name.clone(),
            bottom_county_fips: bottom.fips.clone(),
            bottom_score: round_to(bottom.score, 2),
        })
    }
}

const fn label_index(urbanicity: Urbanicity) -> usize {
    match urbanicity {
        Urbanicity::Urban => 0,
        Urbanicity::Suburban => 1,
        Urbanicity::Rural => 2,
    }
}

/// Mean rounded to two decimals; `0.0` for an empty group.
fn mean(sum: f64, count: u32) -> f64 {
    if count == 0 {
        0.0
    } else {
        round_to(sum / f64::from(count), 2)
    }
}

/// Summarizes counties per state, sorted by state code.
///
/// Top and bottom counties are the first county in input order holding the
/// maximum (minimum) score.
#[must_use]
pub fn summarize_states(counties: &[CountyRecord]) -> Vec<StateSummary> {
    let mut by_state: BTreeMap<&str, Accumulator<'_>> = BTreeMap::new();
    for county in counties {
        by_state
            .entry(county.state_abbr.as_str())
            .or_default()
            .add(county);
    }

    let summaries: Vec<StateSummary> = by_state
        .into_iter()
        .filter_map(|(state, acc)| acc.finish(state.to_owned()))
        .collect();

    log::info!("Summarized {} states", summaries.len());
    summaries
}
