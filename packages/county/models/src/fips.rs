//! County FIPS key normalization and US state lookups.
//!
//! Every table in the pipeline is joined on a five-character, zero-padded
//! county FIPS code. [`normalize_fips`] is the single place that turns a
//! raw identifier into that key.

/// Width of a county FIPS code (two-digit state + three-digit county).
pub const COUNTY_FIPS_WIDTH: usize = 5;

/// Sentinel value some extracts use for a missing identifier.
const MISSING_SENTINEL: &str = "NA";

/// A US state (or DC) with its FIPS prefix, postal abbreviation and name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsState {
    /// Two-digit state FIPS code.
    pub fips: &'static str,
    /// Two-letter postal abbreviation.
    pub abbr: &'static str,
    /// Full state name.
    pub name: &'static str,
}

const fn st(fips: &'static str, abbr: &'static str, name: &'static str) -> UsState {
    UsState { fips, abbr, name }
}

/// The 50 states plus DC, ordered by FIPS code.
pub const US_STATES: &[UsState] = &[
    st("01", "AL", "Alabama"),
    st("02", "AK", "Alaska"),
    st("04", "AZ", "Arizona"),
    st("05", "AR", "Arkansas"),
    st("06", "CA", "California"),
    st("08", "CO", "Colorado"),
    st("09", "CT", "Connecticut"),
    st("10", "DE", "Delaware"),
    st("11", "DC", "District of Columbia"),
    st("12", "FL", "Florida"),
    st("13", "GA", "Georgia"),
    st("15", "HI", "Hawaii"),
    st("16", "ID", "Idaho"),
    st("17", "IL", "Illinois"),
    st("18", "IN", "Indiana"),
    st("19", "IA", "Iowa"),
    st("20", "KS", "Kansas"),
    st("21", "KY", "Kentucky"),
    st("22", "LA", "Louisiana"),
    st("23", "ME", "Maine"),
    st("24", "MD", "Maryland"),
    st("25", "MA", "Massachusetts"),
    st("26", "MI", "Michigan"),
    st("27", "MN", "Minnesota"),
    st("28", "MS", "Mississippi"),
    st("29", "MO", "Missouri"),
    st("30", "MT", "Montana"),
    st("31", "NE", "Nebraska"),
    st("32", "NV", "Nevada"),
    st("33", "NH", "New Hampshire"),
    st("34", "NJ", "New Jersey"),
    st("35", "NM", "New Mexico"),
    st("36", "NY", "New York"),
    st("37", "NC", "North Carolina"),
    st("38", "ND", "North Dakota"),
    st("39", "OH", "Ohio"),
    st("40", "OK", "Oklahoma"),
    st("41", "OR", "Oregon"),
    st("42", "PA", "Pennsylvania"),
    st("44", "RI", "Rhode Island"),
    st("45", "SC", "South Carolina"),
    st("46", "SD", "South Dakota"),
    st("47", "TN", "Tennessee"),
    st("48", "TX", "Texas"),
    st("49", "UT", "Utah"),
    st("50", "VT", "Vermont"),
    st("51", "VA", "Virginia"),
    st("53", "WA", "Washington"),
    st("54", "WV", "West Virginia"),
    st("55", "WI", "Wisconsin"),
    st("56", "WY", "Wyoming"),
];

/// Normalizes a raw county identifier into the canonical 5-character key.
///
/// Surrounding whitespace is trimmed and the value is left-padded with
/// zeros. Returns `None` for empty values, the `"NA"` sentinel, values with
/// non-digit characters, and values longer than five digits, since none of
/// those can act as a join key.
#[must_use]
pub fn normalize_fips(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(MISSING_SENTINEL) {
        return None;
    }
    if trimmed.len() > COUNTY_FIPS_WIDTH || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("{trimmed:0>width$}", width = COUNTY_FIPS_WIDTH))
}

/// Looks up the state owning a normalized county FIPS code by its
/// two-digit prefix.
#[must_use]
pub fn state_for_county(fips: &str) -> Option<&'static UsState> {
    let prefix = fips.get(..2)?;
    US_STATES.iter().find(|s| s.fips == prefix)
}

/// Looks up a state by its postal abbreviation (case-insensitive).
#[must_use]
pub fn state_by_abbr(abbr: &str) -> Option<&'static UsState> {
    let abbr = abbr.trim();
    US_STATES.iter().find(|s| s.abbr.eq_ignore_ascii_case(abbr))
}
