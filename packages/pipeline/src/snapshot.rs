//! The immutable, fully computed dataset.
//!
//! A [`Snapshot`] is built once per pipeline run and never mutated. Readers
//! share it behind an `Arc`; a rebuild produces a new snapshot that
//! replaces the old one wholesale.

use std::collections::HashMap;

use civic_quest_county_models::fips::normalize_fips;
use civic_quest_county_models::{CountyRecord, ExportDocument, ExportMetadata, StateSummary};

/// Resolved counties and state summaries with lookup indexes.
#[derive(Debug, Clone)]
pub struct Snapshot {
    metadata: ExportMetadata,
    counties: Vec<CountyRecord>,
    states: Vec<StateSummary>,
    by_fips: HashMap<String, usize>,
    by_state: HashMap<String, usize>,
}

impl Snapshot {
    /// Indexes assembled counties and state summaries.
    #[must_use]
    pub fn new(
        metadata: ExportMetadata,
        counties: Vec<CountyRecord>,
        states: Vec<StateSummary>,
    ) -> Self {
        let by_fips = counties
            .iter()
            .enumerate()
            .map(|(i, c)| (c.fips.clone(), i))
            .collect();
        let by_state = states
            .iter()
            .enumerate()
            .map(|(i, s)| (s.state.to_ascii_uppercase(), i))
            .collect();

        Self {
            metadata,
            counties,
            states,
            by_fips,
            by_state,
        }
    }

    /// Rebuilds a snapshot from a previously exported document.
    #[must_use]
    pub fn from_export(document: ExportDocument) -> Self {
        Self::new(document.metadata, document.counties, document.states)
    }

    /// Produces the static export document.
    #[must_use]
    pub fn to_export(&self) -> ExportDocument {
        ExportDocument {
            metadata: self.metadata.clone(),
            states: self.states.clone(),
            counties: self.counties.clone(),
        }
    }

    /// Run metadata.
    #[must_use]
    pub const fn metadata(&self) -> &ExportMetadata {
        &self.metadata
    }

    /// Classifier provenance string.
    #[must_use]
    pub fn urbanicity_source(&self) -> &str {
        &self.metadata.urbanicity_source
    }

    /// Counties in source table order.
    #[must_use]
    pub fn counties(&self) -> &[CountyRecord] {
        &self.counties
    }

    /// State summaries sorted by state code.
    #[must_use]
    pub fn states(&self) -> &[StateSummary] {
        &self.states
    }

    /// Looks up a county by FIPS. Unpadded codes such as `"1001"` are
    /// normalized first.
    #[must_use]
    pub fn county(&self, fips: &str) -> Option<&CountyRecord> {
        let fips = normalize_fips(fips)?;
        self.by_fips.get(&fips).map(|&i| &self.counties[i])
    }

    /// Looks up a state summary by postal code, case-insensitively.
    #[must_use]
    pub fn state(&self, code: &str) -> Option<&StateSummary> {
        self.by_state
            .get(&code.trim().to_ascii_uppercase())
            .map(|&i| &self.states[i])
    }

    /// Counties in one state, in source table order.
    pub fn counties_in_state<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a CountyRecord> {
        self.counties
            .iter()
            .filter(move |c| c.state_abbr.eq_ignore_ascii_case(code.trim()))
    }
}
