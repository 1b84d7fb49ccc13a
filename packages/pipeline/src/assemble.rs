//! Snapshot assembly: joins the normalized tables and runs every
//! derivation stage in order.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use civic_quest_county_models::fips::{normalize_fips, state_for_county};
use civic_quest_county_models::{CountyMetrics, CountyRecord, ExportMetadata};

use crate::PipelineError;
use crate::config::{ColumnSchemas, MetricsColumns, PipelineConfig};
use crate::identity::{IdentityMap, read_lookup, resolve_identities};
use crate::lookup::lookup_coordinates;
use crate::normalize::{parse_count, parse_point, parse_real};
use crate::org_types::{aggregate_org_types, org_types_for};
use crate::peers::find_peers;
use crate::progress::ProgressCallback;
use crate::ranking::rank_counties;
use crate::snapshot::Snapshot;
use crate::states::summarize_states;
use crate::table::{RawRow, RawTable};
use crate::urbanicity::{ContinuumReference, UrbanicityPolicy, load_reference};

/// Stages reported through [`ProgressCallback`] by [`build_snapshot`].
const STAGES: u64 = 7;

/// Everything read from disk for one pipeline run.
#[derive(Debug)]
pub struct PipelineInputs {
    /// County metrics table.
    pub metrics: RawTable,
    /// Civic-organization class counts.
    pub civic_orgs: RawTable,
    /// Resolved `fips -> (name, state)` mapping.
    pub identities: IdentityMap,
    /// Centroids carried by the identity lookup, used when the metrics
    /// geometry is unusable.
    pub lookup_coordinates: HashMap<String, (f64, f64)>,
    /// Continuum-code table, if one was found and readable.
    pub continuum: Option<ContinuumReference>,
}

impl PipelineInputs {
    /// Reads every input named by `config`.
    ///
    /// # Errors
    ///
    /// Fails if a required table is absent or lacks a required column. The
    /// county reference table is only required when the identity lookup
    /// is missing or has no named entries.
    pub fn load(config: &PipelineConfig) -> Result<Self, PipelineError> {
        let inputs = &config.inputs;
        let metrics = RawTable::read(&config.resolve(&inputs.county_metrics), "metrics")?;
        let civic_orgs = RawTable::read(&config.resolve(&inputs.civic_orgs), "civic_orgs")?;

        let lookup_path = inputs.identity_lookup.as_ref().map(|p| config.resolve(p));
        let lookup = lookup_path.as_deref().and_then(read_lookup);
        let reference_path = config.resolve(&inputs.county_reference);

        let identities = resolve_identities(
            lookup.as_ref().zip(lookup_path.as_deref()),
            &config.columns.reference,
            || RawTable::read(&reference_path, "reference"),
        )?;
        let coordinates = lookup.as_ref().map(lookup_coordinates).unwrap_or_default();

        let candidates: Vec<PathBuf> = inputs
            .urbanicity_references
            .iter()
            .map(|p| config.resolve(p))
            .collect();
        let continuum = load_reference(&candidates, &config.columns.urbanicity);

        Ok(Self {
            metrics,
            civic_orgs,
            identities,
            lookup_coordinates: coordinates,
            continuum,
        })
    }
}

/// A metrics row joined with its identity, before classification.
struct ResolvedCounty {
    fips: String,
    name: String,
    state: String,
    population: u64,
    score: f64,
    latitude: Option<f64>,
    longitude: Option<f64>,
    metrics: CountyMetrics,
}

/// Resolved column indexes of the metrics table.
struct MetricsLayout {
    fips: Option<usize>,
    population: Option<usize>,
    score: Option<usize>,
    geolocation: Option<usize>,
    state: Option<usize>,
    civic_org_sum: Option<usize>,
    volunteer_sum: Option<usize>,
    events_sum: Option<usize>,
    membership_sum: Option<usize>,
    take_action_sum: Option<usize>,
    nonprofit_count: Option<usize>,
}

impl MetricsLayout {
    fn resolve(table: &RawTable, columns: &MetricsColumns) -> Result<Self, PipelineError> {
        let layout = Self {
            fips: Some(table.require_column(&columns.fips, "fips")?),
            score: Some(table.require_column(&columns.score, "score")?),
            population: table.column(&columns.population),
            geolocation: table.column(&columns.geolocation),
            state: table.column(&columns.state),
            civic_org_sum: table.column(&columns.civic_org_sum),
            volunteer_sum: table.column(&columns.volunteer_sum),
            events_sum: table.column(&columns.events_sum),
            membership_sum: table.column(&columns.membership_sum),
            take_action_sum: table.column(&columns.take_action_sum),
            nonprofit_count: table.column(&columns.nonprofit_count),
        };
        if layout.population.is_none() {
            log::warn!("[{}] No population column; populations default to 0", table.label());
        }
        if layout.geolocation.is_none() {
            log::warn!("[{}] No geometry column; coordinates come from the lookup only", table.label());
        }
        Ok(layout)
    }

    fn metrics(&self, row: &RawRow<'_>) -> CountyMetrics {
        CountyMetrics {
            civic_org_sum: parse_count(row.get(self.civic_org_sum)),
            volunteer_sum: parse_real(row.get(self.volunteer_sum)),
            events_sum: parse_real(row.get(self.events_sum)),
            membership_sum: parse_real(row.get(self.membership_sum)),
            take_action_sum: parse_real(row.get(self.take_action_sum)),
            nonprofit_count: parse_count(row.get(self.nonprofit_count)),
        }
    }
}

/// Joins metrics rows with identities.
///
/// Rows are dropped when the FIPS is unusable, the county has no resolved
/// name, or no state can be found through the lookup/reference, the
/// metrics state column, or the FIPS state prefix. Repeated FIPS codes keep
/// their first row.
fn resolve_counties(
    inputs: &PipelineInputs,
    columns: &MetricsColumns,
) -> Result<Vec<ResolvedCounty>, PipelineError> {
    let layout = MetricsLayout::resolve(&inputs.metrics, columns)?;
    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(inputs.metrics.len());
    let (mut unnamed, mut stateless, mut duplicates) = (0_usize, 0_usize, 0_usize);

    for row in inputs.metrics.rows() {
        let Some(fips) = row.get(layout.fips).and_then(normalize_fips) else {
            continue;
        };
        let Some(identity) = inputs.identities.get(&fips) else {
            unnamed += 1;
            continue;
        };

        let state = identity
            .state
            .clone()
            .or_else(|| {
                row.get(layout.state)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
            })
            .or_else(|| state_for_county(&fips).map(|s| s.abbr.to_owned()));
        let Some(state) = state else {
            stateless += 1;
            continue;
        };

        if !seen.insert(fips.clone()) {
            duplicates += 1;
            continue;
        }

        let (latitude, longitude) = parse_point(row.get(layout.geolocation))
            .map(|p| (p.latitude, p.longitude))
            .or_else(|| inputs.lookup_coordinates.get(&fips).copied())
            .unzip();

        resolved.push(ResolvedCounty {
            name: identity.name.clone(),
            state,
            population: parse_count(row.get(layout.population)),
            score: parse_real(row.get(layout.score)),
            latitude,
            longitude,
            metrics: layout.metrics(&row),
            fips,
        });
    }

    if unnamed > 0 {
        log::info!("Excluded {unnamed} counties without a resolvable name");
    }
    if stateless > 0 {
        log::warn!("Excluded {stateless} counties without a resolvable state");
    }
    if duplicates > 0 {
        log::warn!("Ignored {duplicates} repeated FIPS rows in the metrics table");
    }
    log::info!("Resolved {} counties", resolved.len());

    Ok(resolved)
}

/// Runs every derivation stage over loaded inputs.
///
/// # Errors
///
/// Fails if the metrics table lacks its FIPS or score column, or the
/// civic-organization table lacks its FIPS or class column.
pub fn assemble(
    inputs: PipelineInputs,
    columns: &ColumnSchemas,
    progress: &dyn ProgressCallback,
) -> Result<Snapshot, PipelineError> {
    progress.set_message("Resolving counties".to_string());
    let resolved = resolve_counties(&inputs, &columns.metrics)?;
    progress.inc(1);

    progress.set_message("Classifying urbanicity".to_string());
    let population_keys: Vec<(&str, u64)> = resolved
        .iter()
        .map(|c| (c.fips.as_str(), c.population))
        .collect();
    let policy = UrbanicityPolicy::select(inputs.continuum, &population_keys);
    progress.inc(1);

    progress.set_message("Ranking counties".to_string());
    let scores: Vec<f64> = resolved.iter().map(|c| c.score).collect();
    let states: Vec<&str> = resolved.iter().map(|c| c.state.as_str()).collect();
    let ranks = rank_counties(&scores, &states);
    progress.inc(1);

    progress.set_message("Aggregating organization types".to_string());
    let org_types = aggregate_org_types(&inputs.civic_orgs, &columns.civic_orgs)?;
    progress.inc(1);

    let mut counties: Vec<CountyRecord> = resolved
        .into_iter()
        .zip(ranks)
        .map(|(county, ranks)| CountyRecord {
            urbanicity: policy.classify(&county.fips, county.population),
            org_types: org_types_for(&org_types, &county.fips),
            national_rank: ranks.national_rank,
            national_percentile: ranks.national_percentile,
            state_rank: ranks.state_rank,
            fips: county.fips,
            name: county.name,
            state_abbr: county.state,
            population: county.population,
            score: county.score,
            latitude: county.latitude,
            longitude: county.longitude,
            metrics: county.metrics,
            peers: Vec::new(),
        })
        .collect();

    progress.set_message("Finding peers".to_string());
    let peers = find_peers(&counties);
    for (county, peers) in counties.iter_mut().zip(peers) {
        county.peers = peers;
    }
    progress.inc(1);

    progress.set_message("Summarizing states".to_string());
    let summaries = summarize_states(&counties);
    progress.inc(1);

    let metadata = ExportMetadata {
        urbanicity_source: policy.provenance(),
        county_count: counties.len(),
        state_count: summaries.len(),
        generated_at: Some(chrono::Utc::now().to_rfc3339()),
    };

    Ok(Snapshot::new(metadata, counties, summaries))
}

/// Loads inputs and assembles a fresh snapshot.
///
/// # Errors
///
/// See [`PipelineInputs::load`] and [`assemble`].
pub fn build_snapshot(
    config: &PipelineConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Snapshot, PipelineError> {
    progress.set_total(STAGES);
    progress.set_message("Loading inputs".to_string());
    let inputs = PipelineInputs::load(config)?;
    progress.inc(1);

    let snapshot = assemble(inputs, &config.columns, &**progress)?;
    progress.finish(format!(
        "Built {} counties across {} states",
        snapshot.metadata().county_count,
        snapshot.metadata().state_count
    ));
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use civic_quest_county_models::Urbanicity;

    use super::*;
    use crate::progress::null_progress;

    const METRICS: &str = "\
FIPS,state,TotalPopulation,civic_opp_sum_normalized,Geolocation,civic_org_sum,volunteer_sum,events_sum,membership_sum,take_action_sum,n
6001,,1600000,10.0,POINT (-122.0 37.6),40,1.5,2.5,3.5,4.5,120
6003,,1200,20.0,POINT (-119.8 38.6),4,0.5,0.5,0.5,0.5,8
6005,CA,40000,15.0,,7,nan,1,1,1,9
1001,,55000,3.0,garbage,2,1,1,1,1,5
1003,,230000,,POINT (-87.7 30.7),9,1,1,1,1,30
1003,,1,99.0,,0,0,0,0,0,0
99001,,100,1.0,,0,0,0,0,0,0
";

    const CIVIC: &str = "\
fips,class,n
06001,arts,3
06001,arts,2
06001,health,7
1001,sports,1
NA,arts,50
";

    const REFERENCE: &str = "\
GEOID,NAME,STUSPS
06001,Alameda,CA
06003,Alpine,CA
06005,Amador,
01001,Autauga,
01003,Baldwin,AL
99001,Nowhere,
";

    fn write(dir: &Path, name: &str, body: &str) {
        let path = dir.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    fn config(dir: &Path) -> PipelineConfig {
        PipelineConfig::embedded(dir.to_path_buf())
    }

    fn build(dir: &Path) -> Snapshot {
        build_snapshot(&config(dir), &null_progress()).unwrap()
    }

    fn seed(dir: &Path) {
        write(dir, "raw_data/cnty_counts_cov.csv", METRICS);
        write(dir, "raw_data/cnty_civic_type_dashboard.csv", CIVIC);
        write(dir, "raw_data/counties.csv", REFERENCE);
    }

    #[test]
    fn builds_from_reference_table_with_tertiles() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());

        let snapshot = build(dir.path());

        // 99001 has no state anywhere; 1003's second row is a repeat.
        assert_eq!(snapshot.counties().len(), 5);
        assert_eq!(snapshot.urbanicity_source(), "Population tertiles (fallback)");

        let alameda = snapshot.county("06001").unwrap();
        assert_eq!(alameda.name, "Alameda");
        assert_eq!(alameda.state_abbr, "CA");
        assert_eq!(alameda.latitude, Some(37.6));
        assert_eq!(alameda.national_rank, 3);
        assert_eq!(alameda.state_rank, 3);
        assert_eq!(alameda.org_types[0].class, "health");
        assert_eq!(alameda.org_types[1].count, 5);
        assert_eq!(alameda.metrics.nonprofit_count, 120);

        let alpine = snapshot.county("06003").unwrap();
        assert_eq!(alpine.national_rank, 1);
        assert!((alpine.national_percentile - 100.0).abs() < f64::EPSILON);
        assert_eq!(alpine.urbanicity, Urbanicity::Rural);

        // State from the metrics column, then from the FIPS prefix.
        assert_eq!(snapshot.county("06005").unwrap().state_abbr, "CA");
        assert_eq!(snapshot.county("01001").unwrap().state_abbr, "AL");
        assert_eq!(snapshot.county("01001").unwrap().latitude, None);

        let baldwin = snapshot.county("01003").unwrap();
        assert!(baldwin.score.abs() < f64::EPSILON);
        assert_eq!(baldwin.population, 230_000);
        assert!(baldwin.org_types.is_empty());

        assert_eq!(snapshot.states().len(), 2);
        assert_eq!(snapshot.state("CA").unwrap().county_count, 3);
        assert!(snapshot.metadata().generated_at.is_some());
    }

    #[test]
    fn prefers_lookup_and_reference_continuum() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        std::fs::remove_file(dir.path().join("raw_data/counties.csv")).unwrap();
        write(
            dir.path(),
            "data/county_lookup.json",
            r#"{"06001": {"name": "Alameda County", "state": "CA", "lat": null, "lon": null},
                "01001": {"name": "Autauga County", "state": "AL", "lat": 32.5, "lon": -86.6}}"#,
        );
        write(
            dir.path(),
            "raw_data/rucc_county.csv",
            "FIPS,State,RUCC_2023\n06001,CA,1\n01001,AL,9\n",
        );

        let snapshot = build(dir.path());

        assert_eq!(snapshot.counties().len(), 2);
        assert!(snapshot.urbanicity_source().starts_with("RUCC ("));
        assert!(snapshot.urbanicity_source().ends_with("rucc_county.csv)"));

        let autauga = snapshot.county("01001").unwrap();
        assert_eq!(autauga.name, "Autauga County");
        assert_eq!(autauga.urbanicity, Urbanicity::Rural);
        assert_eq!(autauga.latitude, Some(32.5));
        assert_eq!(autauga.longitude, Some(-86.6));
        assert_eq!(snapshot.county("06001").unwrap().urbanicity, Urbanicity::Urban);
    }

    #[test]
    fn missing_required_input_names_path() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "raw_data/cnty_counts_cov.csv", METRICS);

        match build_snapshot(&config(dir.path()), &null_progress()) {
            Err(PipelineError::MissingInput { path }) => {
                assert!(path.ends_with("raw_data/cnty_civic_type_dashboard.csv"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_reference_without_lookup_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        std::fs::remove_file(dir.path().join("raw_data/counties.csv")).unwrap();

        assert!(matches!(
            build_snapshot(&config(dir.path()), &null_progress()),
            Err(PipelineError::MissingInput { .. })
        ));
    }

    #[test]
    fn peers_stay_within_stratum() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        let snapshot = build(dir.path());

        for county in snapshot.counties() {
            assert!(county.peers.len() <= crate::peers::MAX_PEERS);
            for peer in &county.peers {
                assert_ne!(peer.fips, county.fips);
                assert_eq!(peer.state, county.state_abbr);
                assert_eq!(peer.urbanicity, county.urbanicity);
            }
        }
    }
}
