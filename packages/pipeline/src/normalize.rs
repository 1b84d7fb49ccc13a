//! Field Normalizer.
//!
//! Lenient coercions from raw text to typed values. None of these functions
//! can fail: missing, empty, `"nan"` or otherwise unparsable input maps to a
//! fixed default (`0`, `0.0`, or `None` for geometry).

use std::sync::LazyLock;

use regex::Regex;

/// `POINT (<lon> <lat>)`, case-insensitive, flexible whitespace.
static POINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)POINT\s*\(\s*([-+0-9.eE]+)\s+([-+0-9.eE]+)\s*\)")
        .unwrap_or_else(|_| unreachable!())
});

/// A parsed latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

/// Parses a finite real number, or `None`.
#[must_use]
pub fn parse_optional_real(raw: Option<&str>) -> Option<f64> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a real number, defaulting to `0.0`.
#[must_use]
pub fn parse_real(raw: Option<&str>) -> f64 {
    parse_optional_real(raw).unwrap_or(0.0)
}

/// Parses a non-negative integer count, or `None`.
///
/// Fractional values are truncated toward zero and negative values are
/// rejected, so `"3.9"` yields `3`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_optional_count(raw: Option<&str>) -> Option<u64> {
    parse_optional_real(raw)
        .filter(|v| *v >= 0.0)
        .map(|v| v.trunc() as u64)
}

/// Parses a non-negative integer count, defaulting to `0`.
#[must_use]
pub fn parse_count(raw: Option<&str>) -> u64 {
    parse_optional_count(raw).unwrap_or(0)
}

/// Extracts latitude and longitude from `POINT (<lon> <lat>)` text.
///
/// Returns `None` when the text is missing, does not contain the pattern,
/// or either coordinate is not a finite number.
#[must_use]
pub fn parse_point(raw: Option<&str>) -> Option<GeoPoint> {
    let caps = POINT_RE.captures(raw?)?;
    let longitude = parse_optional_real(caps.get(1).map(|m| m.as_str()))?;
    let latitude = parse_optional_real(caps.get(2).map(|m| m.as_str()))?;
    Some(GeoPoint {
        latitude,
        longitude,
    })
}

/// Rounds half away from zero to `decimals` places.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_defaults_on_garbage() {
        assert!((parse_real(Some("2.5")) - 2.5).abs() < f64::EPSILON);
        assert!((parse_real(Some(" -1.25 ")) + 1.25).abs() < f64::EPSILON);
        for raw in ["", "nan", "NaN", "inf", "abc", "1.2.3"] {
            assert!(parse_real(Some(raw)).abs() < f64::EPSILON, "{raw}");
        }
        assert!(parse_real(None).abs() < f64::EPSILON);
    }

    #[test]
    fn count_truncates_and_defaults() {
        assert_eq!(parse_count(Some("55000")), 55_000);
        assert_eq!(parse_count(Some("3.9")), 3);
        assert_eq!(parse_count(Some("1e3")), 1000);
        assert_eq!(parse_count(Some("-4")), 0);
        assert_eq!(parse_count(Some("nan")), 0);
        assert_eq!(parse_count(Some("")), 0);
        assert_eq!(parse_count(None), 0);
        assert_eq!(parse_optional_count(Some("x")), None);
    }

    #[test]
    fn parses_point_geometry() {
        let p = parse_point(Some("POINT (-122.4 37.8)")).unwrap();
        assert!((p.latitude - 37.8).abs() < f64::EPSILON);
        assert!((p.longitude + 122.4).abs() < f64::EPSILON);
    }

    #[test]
    fn point_is_case_and_whitespace_tolerant() {
        let p = parse_point(Some("point(  -86.64   32.53 )")).unwrap();
        assert!((p.latitude - 32.53).abs() < f64::EPSILON);
        assert!((p.longitude + 86.64).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_points_are_none() {
        assert_eq!(parse_point(Some("POINT ()")), None);
        assert_eq!(parse_point(Some("POINT (1.2.3 4)")), None);
        assert_eq!(parse_point(Some("LINESTRING (1 2, 3 4)")), None);
        assert_eq!(parse_point(Some("")), None);
        assert_eq!(parse_point(None), None);
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert!((round_to(2.345, 1) - 2.3).abs() < 1e-9);
        assert!((round_to(66.666_666, 1) - 66.7).abs() < 1e-9);
        assert!((round_to(1.005_1, 2) - 1.01).abs() < 1e-9);
        assert!((round_to(-0.125, 2) + 0.13).abs() < 1e-9);
    }
}
