//! Polygon text parsing.
//!
//! Accepts `POLYGON ((lon lat, ...))`, `MULTIPOLYGON (((lon lat, ...)), ...)`
//! and any text with a parenthesized list of `lon lat` pairs. Only the first
//! innermost list is used, so holes and secondary polygons are dropped.

use crate::domain::model::Coordinate;
use regex::Regex;
use std::sync::LazyLock;

static INNERMOST_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^()]*)\)").expect("innermost group pattern is valid"));

/// Parse polygon text into `(lat, lon)` coordinates.
///
/// Never fails: absent or group-less text yields an empty vector, and
/// non-numeric components become `NaN`.
pub fn parse(text: Option<&str>) -> Vec<Coordinate> {
    let Some(text) = text else {
        return Vec::new();
    };

    let Some(caps) = INNERMOST_GROUP.captures(text) else {
        return Vec::new();
    };

    let body = &caps[1];
    if body.trim().is_empty() {
        return Vec::new();
    }

    body.split(',').map(parse_pair).collect()
}

fn parse_pair(pair: &str) -> Coordinate {
    let mut parts = pair.split_whitespace();
    let lon = parse_component(parts.next());
    let lat = parse_component(parts.next());
    // 輸入為 (lon, lat)，輸出交換為 (lat, lon)
    Coordinate::new(lat, lon)
}

fn parse_component(token: Option<&str>) -> f64 {
    token.and_then(|t| t.parse::<f64>().ok()).unwrap_or(f64::NAN)
}

/// Keep only the coordinates that can be drawn.
pub fn valid_coordinates(coordinates: &[Coordinate]) -> Vec<Coordinate> {
    coordinates.iter().copied().filter(Coordinate::is_valid).collect()
}
