//! Minimal WKT geometry parsing.
//!
//! The backend stores zone geometry as WKT text.  Only the two shapes that
//! actually occur there are supported:
//!
//! ```text
//! POLYGON ((lon lat, lon lat, ...), (hole ...))
//! MULTIPOLYGON (((lon lat, ...)), ((lon lat, ...)))
//! ```
//!
//! WKT coordinate order is `lon lat` (x y); parsed vertices are converted to
//! [`GeoPoint`] `lat`/`lon` fields.  A `MULTIPOLYGON` is flattened into its
//! member polygons.  Rings that are not explicitly closed are closed during
//! parsing.

use fleet_core::GeoPoint;
use thiserror::Error;

use crate::polygon::Polygon;

/// Parse failure for a WKT string.
#[derive(Debug, Error)]
pub enum WktError {
    #[error("unsupported WKT geometry type: {0}")]
    UnsupportedType(String),

    #[error("empty geometry")]
    Empty,

    #[error("malformed WKT: {0}")]
    Malformed(String),

    #[error("degenerate ring with {0} distinct vertices")]
    DegenerateRing(usize),
}

/// Parse a WKT string into one or more polygons.
pub fn parse_wkt(input: &str) -> Result<Vec<Polygon>, WktError> {
    let trimmed = input.trim();
    let upper = trimmed.to_ascii_uppercase();

    if let Some(rest) = strip_tag(&upper, trimmed, "POLYGON") {
        if rest.eq_ignore_ascii_case("EMPTY") {
            return Err(WktError::Empty);
        }
        Ok(vec![parse_polygon_body(rest)?])
    } else if let Some(rest) = strip_tag(&upper, trimmed, "MULTIPOLYGON") {
        if rest.eq_ignore_ascii_case("EMPTY") {
            return Err(WktError::Empty);
        }
        parse_multipolygon_body(rest)
    } else {
        let tag: String = trimmed.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
        Err(WktError::UnsupportedType(tag))
    }
}

/// Strip a leading geometry tag, returning the remainder (body or `EMPTY`).
fn strip_tag<'a>(upper: &str, original: &'a str, tag: &str) -> Option<&'a str> {
    // Match on the uppercased copy, slice the original at the same offset.
    if !upper.starts_with(tag) {
        return None;
    }
    let rest = original[tag.len()..].trim_start();
    // Reject lookalike tags such as POLYGONZ.
    if rest.starts_with('(') || rest.eq_ignore_ascii_case("EMPTY") {
        Some(rest)
    } else {
        None
    }
}

/// `((ring), (ring), ...)` — the parenthesised body of a POLYGON.
fn parse_polygon_body(body: &str) -> Result<Polygon, WktError> {
    let inner = unwrap_parens(body)?;
    let mut rings = Vec::new();
    for ring_text in split_top_level(inner) {
        rings.push(parse_ring(unwrap_parens(ring_text.trim())?)?);
    }
    let mut it = rings.into_iter();
    let exterior = it.next().ok_or(WktError::Empty)?;
    Ok(Polygon {
        exterior,
        holes: it.collect(),
    })
}

/// `(((ring)), ((ring)))` — the body of a MULTIPOLYGON.
fn parse_multipolygon_body(body: &str) -> Result<Vec<Polygon>, WktError> {
    let inner = unwrap_parens(body)?;
    split_top_level(inner)
        .into_iter()
        .map(|poly_text| parse_polygon_body(poly_text.trim()))
        .collect()
}

/// `lon lat, lon lat, ...` — one ring's coordinate list.
fn parse_ring(text: &str) -> Result<Vec<GeoPoint>, WktError> {
    let mut ring = Vec::new();
    for pair in text.split(',') {
        let mut nums = pair.split_whitespace();
        let lon: f64 = parse_num(nums.next(), pair)?;
        let lat: f64 = parse_num(nums.next(), pair)?;
        if nums.next().is_some() {
            return Err(WktError::Malformed(format!("extra ordinate in '{pair}'")));
        }
        ring.push(GeoPoint::new(lat, lon));
    }

    // Close the ring if the source didn't.
    if ring.first() != ring.last() {
        if let Some(&first) = ring.first() {
            ring.push(first);
        }
    }
    // A closed triangle has 4 vertices; anything smaller cannot bound area.
    let distinct = ring.len().saturating_sub(1);
    if distinct < 3 {
        return Err(WktError::DegenerateRing(distinct));
    }
    Ok(ring)
}

fn parse_num(tok: Option<&str>, ctx: &str) -> Result<f64, WktError> {
    tok.ok_or_else(|| WktError::Malformed(format!("missing ordinate in '{ctx}'")))?
        .parse()
        .map_err(|_| WktError::Malformed(format!("bad number in '{ctx}'")))
}

/// Strip one layer of balanced outer parentheses.
fn unwrap_parens(s: &str) -> Result<&str, WktError> {
    let s = s.trim();
    if !s.starts_with('(') || !s.ends_with(')') {
        return Err(WktError::Malformed(format!("expected parenthesised group, got '{s}'")));
    }
    Ok(&s[1..s.len() - 1])
}

/// Split a comma-separated list at depth zero (commas inside nested parens
/// belong to inner groups).
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < s.len() {
        parts.push(&s[start..]);
    }
    parts
}
