//! The `City` zone store.
//!
//! # Containment strategy
//!
//! Zone counts are small (tens of polygons) but containment runs for every
//! scooter on every tick, so an R-tree over polygon bounding boxes rejects
//! most candidates before the exact ring test runs.  Entries carry the zone
//! type and the polygon's slot in its per-type store.

use fleet_core::GeoPoint;
use rstar::{RTree, RTreeObject, AABB};
use tracing::{info, warn};

use crate::polygon::Polygon;
use crate::wkt::parse_wkt;
use crate::zone::{Zone, ZoneSpec};

// ── R-tree entry ──────────────────────────────────────────────────────────────

/// Bounding box of one polygon: `[lon, lat]` envelope plus its location in
/// the per-zone polygon store.
#[derive(Clone)]
struct ZoneEntry {
    envelope: AABB<[f64; 2]>,
    zone: Zone,
    slot: usize,
}

impl RTreeObject for ZoneEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

// ── City ──────────────────────────────────────────────────────────────────────

/// A single city and its complete set of geographic zones.
///
/// Construct from the backend's zone records with [`City::new`]; malformed
/// records are skipped with a warning rather than failing the whole load.
pub struct City {
    pub name: String,
    charging: Vec<Polygon>,
    parking: Vec<Polygon>,
    free: Vec<Polygon>,
    slow: Vec<Polygon>,
    speed_limits: SpeedLimits,
    index: RTree<ZoneEntry>,
}

#[derive(Default)]
struct SpeedLimits {
    charging: Option<f64>,
    parking: Option<f64>,
    slow: Option<f64>,
}

impl City {
    /// Build a city from backend zone records.
    ///
    /// Records with an unknown `zone_type` are ignored.  Records whose WKT
    /// fails to parse are skipped with a warning — but a `speed_limit`
    /// carried by such a record is still stored for its zone type.
    pub fn new(name: impl Into<String>, zones: Vec<ZoneSpec>) -> Self {
        let name = name.into();
        let mut city = City {
            name: name.clone(),
            charging: Vec::new(),
            parking: Vec::new(),
            free: Vec::new(),
            slow: Vec::new(),
            speed_limits: SpeedLimits::default(),
            index: RTree::new(),
        };

        let mut entries = Vec::new();
        for spec in zones {
            let Some(zone) = Zone::from_zone_type(&spec.zone_type) else {
                continue;
            };

            match parse_wkt(&spec.coordinates_wkt) {
                Ok(polys) => {
                    for poly in polys {
                        let (min, max) = poly.bbox();
                        let store = city.store_mut(zone);
                        entries.push(ZoneEntry {
                            envelope: AABB::from_corners(min, max),
                            zone,
                            slot: store.len(),
                        });
                        store.push(poly);
                    }
                }
                Err(e) => {
                    warn!(city = %name, zone = %zone, error = %e,
                        "skipping invalid or empty polygon");
                }
            }

            if let Some(limit) = spec.speed_limit {
                city.set_speed_limit(zone, limit);
            }
        }

        city.index = RTree::bulk_load(entries);
        info!(city = %name, zones = city.index.size(), "city zones loaded");
        city
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// True if the point is inside (or on the boundary of) any polygon of
    /// the given zone type.
    pub fn is_inside(&self, lat: f64, lon: f64, zone: Zone) -> bool {
        let p = GeoPoint::new(lat, lon);
        let probe = AABB::from_point([lon, lat]);
        self.index
            .locate_in_envelope_intersecting(&probe)
            .filter(|e| e.zone == zone)
            .any(|e| self.store(zone)[e.slot].contains_or_touches(p))
    }

    /// Classify a position by fixed priority:
    /// charging > parking > free (city interior) > slow, else out of bounds.
    pub fn classify_zone(&self, lat: f64, lon: f64) -> Zone {
        for zone in [Zone::Charging, Zone::Parking, Zone::Free, Zone::Slow] {
            if self.is_inside(lat, lon, zone) {
                return zone;
            }
        }
        Zone::OutOfBounds
    }

    /// Is the point inside the overall city boundary?
    pub fn is_in_city_boundary(&self, lat: f64, lon: f64) -> bool {
        self.is_inside(lat, lon, Zone::Free)
    }

    /// The configured speed cap for a zone type, if any.
    pub fn speed_limit(&self, zone: Zone) -> Option<f64> {
        match zone {
            Zone::Charging => self.speed_limits.charging,
            Zone::Parking  => self.speed_limits.parking,
            Zone::Slow     => self.speed_limits.slow,
            Zone::Free | Zone::OutOfBounds => None,
        }
    }

    /// All polygons of a zone type, in load order.
    pub fn polygons(&self, zone: Zone) -> &[Polygon] {
        self.store(zone)
    }

    /// The polygon of `zone` whose centroid is closest to `p`, if any exist.
    /// Used by parking/charging scenario hooks to pick a destination.
    pub fn nearest_polygon(&self, zone: Zone, p: GeoPoint) -> Option<&Polygon> {
        self.store(zone).iter().min_by(|a, b| {
            a.centroid_distance_deg(p)
                .total_cmp(&b.centroid_distance_deg(p))
        })
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn store(&self, zone: Zone) -> &[Polygon] {
        match zone {
            Zone::Charging    => &self.charging,
            Zone::Parking     => &self.parking,
            Zone::Free        => &self.free,
            Zone::Slow        => &self.slow,
            Zone::OutOfBounds => &[],
        }
    }

    fn store_mut(&mut self, zone: Zone) -> &mut Vec<Polygon> {
        match zone {
            Zone::Charging => &mut self.charging,
            Zone::Parking  => &mut self.parking,
            Zone::Free     => &mut self.free,
            // OutOfBounds never reaches here: from_zone_type filters it out.
            Zone::Slow | Zone::OutOfBounds => &mut self.slow,
        }
    }

    fn set_speed_limit(&mut self, zone: Zone, limit: f64) {
        match zone {
            Zone::Charging => self.speed_limits.charging = Some(limit),
            Zone::Parking  => self.speed_limits.parking = Some(limit),
            Zone::Slow     => self.speed_limits.slow = Some(limit),
            Zone::Free | Zone::OutOfBounds => {}
        }
    }
}
