//! Organization-Type Aggregator.
//!
//! Sums raw per-class organization counts by `(fips, class)`. Each county's
//! classes are ordered by descending count, then by class name.

use std::collections::{BTreeMap, HashMap};

use civic_quest_county_models::OrgTypeCount;
use civic_quest_county_models::fips::normalize_fips;

use crate::PipelineError;
use crate::config::CivicOrgColumns;
use crate::normalize::parse_real;
use crate::table::RawTable;

/// Ordered class counts per normalized FIPS.
pub type OrgTypeLookup = HashMap<String, Vec<OrgTypeCount>>;

/// Aggregates the civic-organization table.
///
/// Rows with a missing or `"NA"` FIPS, or an empty class, are dropped.
/// Unparsable counts contribute `0`. Raw counts are summed as reals and the
/// total is truncated once, with negative totals clamped to `0`. When the
/// table has no count column every row counts as one organization.
///
/// # Errors
///
/// Returns [`PipelineError::MissingColumn`] if the FIPS or class column
/// cannot be resolved.
pub fn aggregate_org_types(
    table: &RawTable,
    columns: &CivicOrgColumns,
) -> Result<OrgTypeLookup, PipelineError> {
    let fips_col = Some(table.require_column(&columns.fips, "fips")?);
    let class_col = Some(table.require_column(&columns.class, "class")?);
    let count_col = table.column(&columns.count);
    if count_col.is_none() {
        log::warn!("[{}] No count column; counting one per row", table.label());
    }

    let mut sums: HashMap<String, BTreeMap<String, f64>> = HashMap::new();
    let mut dropped = 0_usize;

    for row in table.rows() {
        let Some(fips) = row.get(fips_col).and_then(normalize_fips) else {
            dropped += 1;
            continue;
        };
        let Some(class) = row.get(class_col).filter(|c| !c.is_empty()) else {
            dropped += 1;
            continue;
        };
        let count = if count_col.is_some() {
            parse_real(row.get(count_col))
        } else {
            1.0
        };

        *sums
            .entry(fips)
            .or_default()
            .entry(class.to_owned())
            .or_default() += count;
    }

    if dropped > 0 {
        log::debug!(
            "[{}] Dropped {dropped} rows without a usable FIPS or class",
            table.label()
        );
    }

    let lookup: OrgTypeLookup = sums
        .into_iter()
        .map(|(fips, classes)| {
            let mut ordered: Vec<OrgTypeCount> = classes
                .into_iter()
                .map(|(class, total)| OrgTypeCount {
                    class,
                    count: truncate_total(total),
                })
                .collect();
            // BTreeMap yields classes in name order; a stable sort keeps it for ties.
            ordered.sort_by(|a, b| b.count.cmp(&a.count));
            (fips, ordered)
        })
        .collect();

    log::info!("Aggregated organization types for {} counties", lookup.len());
    Ok(lookup)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn truncate_total(total: f64) -> u64 {
    if total > 0.0 { total.trunc() as u64 } else { 0 }
}

/// Returns a county's ordered class counts, empty when the county has none.
#[must_use]
pub fn org_types_for(lookup: &OrgTypeLookup, fips: &str) -> Vec<OrgTypeCount> {
    lookup.get(fips).cloned().unwrap_or_default()
}
