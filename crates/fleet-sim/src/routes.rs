//! Route polylines and their per-trip direction.
//!
//! Routes are predefined polylines, so scooters don't cut through buildings.
//! Each completed trip flips the traversal direction: even trip counts walk
//! the polyline forward, odd counts walk it backward, and the scooter
//! retraces the exact same path home.
//!
//! # CSV format
//!
//! One row per waypoint, grouped by route and ordered by `seq`:
//!
//! ```csv
//! route_id,seq,lat,lon
//! 0,0,55.6050,12.9945
//! 0,1,55.6072,12.9961
//! 1,0,55.5930,13.0120
//! ```

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use fleet_core::{GeoPoint, RouteId};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use thiserror::Error;

/// Route loading/definition failure.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("route parse error: {0}")]
    Parse(String),

    #[error("route {0} has no waypoints")]
    Empty(RouteId),
}

// ── RouteTable ────────────────────────────────────────────────────────────────

/// All known route polylines, keyed by id.
///
/// Insertion order is remembered: the builder's default binding assigns the
/// n-th seeded scooter to the n-th inserted route.
#[derive(Default)]
pub struct RouteTable {
    routes: FxHashMap<RouteId, Vec<GeoPoint>>,
    order: Vec<RouteId>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a route.  Routes must have at least one waypoint.
    pub fn insert(&mut self, id: RouteId, points: Vec<GeoPoint>) -> Result<(), RouteError> {
        if points.is_empty() {
            return Err(RouteError::Empty(id));
        }
        if self.routes.insert(id, points).is_none() {
            self.order.push(id);
        }
        Ok(())
    }

    pub fn get(&self, id: RouteId) -> Option<&[GeoPoint]> {
        self.routes.get(&id).map(Vec::as_slice)
    }

    /// One-way arc length of a route in metres.
    pub fn length_m(&self, id: RouteId) -> Option<f64> {
        self.get(id).map(fleet_core::geo::polyline_length_m)
    }

    /// The directional view of a route for a given completed-trip count.
    pub fn directed(&self, id: RouteId, trip_count: u32) -> Option<DirectedRoute<'_>> {
        self.routes.get(&id).map(|points| DirectedRoute {
            points,
            reversed: trip_count % 2 == 1,
        })
    }

    /// Route ids in insertion order.
    pub fn ids(&self) -> &[RouteId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    // ── CSV loading ───────────────────────────────────────────────────────

    /// Load a route table from a CSV file.
    pub fn from_csv_path(path: &Path) -> Result<Self, RouteError> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Like [`from_csv_path`][Self::from_csv_path] but for any `Read` source
    /// (tests pass a `Cursor`).
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, RouteError> {
        #[derive(Deserialize)]
        struct RouteRecord {
            route_id: u32,
            seq: u32,
            lat: f64,
            lon: f64,
        }

        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut by_route: BTreeMap<u32, Vec<(u32, GeoPoint)>> = BTreeMap::new();

        for result in csv_reader.deserialize::<RouteRecord>() {
            let row = result.map_err(|e| RouteError::Parse(e.to_string()))?;
            by_route
                .entry(row.route_id)
                .or_default()
                .push((row.seq, GeoPoint::new(row.lat, row.lon)));
        }

        let mut table = RouteTable::new();
        for (route_id, mut rows) in by_route {
            rows.sort_by_key(|(seq, _)| *seq);
            table.insert(RouteId(route_id), rows.into_iter().map(|(_, p)| p).collect())?;
        }
        Ok(table)
    }
}

// ── DirectedRoute ─────────────────────────────────────────────────────────────

/// A borrowed view of a route in one traversal direction.
///
/// Indexing is direction-aware: `point(0)` is the start of *this trip*,
/// which for a reversed trip is the polyline's last waypoint.
#[derive(Copy, Clone)]
pub struct DirectedRoute<'a> {
    points: &'a [GeoPoint],
    reversed: bool,
}

impl DirectedRoute<'_> {
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn point(&self, i: usize) -> GeoPoint {
        if self.reversed {
            self.points[self.points.len() - 1 - i]
        } else {
            self.points[i]
        }
    }
}
