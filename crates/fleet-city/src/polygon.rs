//! Ring polygons with boundary-inclusive containment.
//!
//! Containment treats the boundary as inside ("contains or touches"): a
//! scooter parked exactly on a charging-zone edge counts as charging.  The
//! interior test is an even-odd ray cast over the exterior ring, minus any
//! interior rings (holes); hole boundaries still count as touching.

use fleet_core::GeoPoint;

/// Tolerance for the on-boundary test, in degrees (~0.1 mm).
const BOUNDARY_EPS_DEG: f64 = 1e-9;

/// A simple polygon: one exterior ring and zero or more holes.
///
/// Rings are stored closed (first vertex == last vertex).
#[derive(Clone, Debug)]
pub struct Polygon {
    pub exterior: Vec<GeoPoint>,
    pub holes: Vec<Vec<GeoPoint>>,
}

impl Polygon {
    /// True when the point is inside the polygon or on any of its rings.
    pub fn contains_or_touches(&self, p: GeoPoint) -> bool {
        if on_ring(&self.exterior, p) {
            return true;
        }
        if !inside_ring(&self.exterior, p) {
            return false;
        }
        for hole in &self.holes {
            if on_ring(hole, p) {
                return true;
            }
            if inside_ring(hole, p) {
                return false;
            }
        }
        true
    }

    /// Area centroid of the exterior ring (shoelace formula), in lat/lon
    /// degrees.  Falls back to the vertex mean for degenerate rings.
    pub fn centroid(&self) -> GeoPoint {
        let ring = &self.exterior;
        let n = ring.len().saturating_sub(1); // closed ring: skip duplicate last
        let mut area2 = 0.0;
        let mut cx = 0.0; // lon
        let mut cy = 0.0; // lat
        for i in 0..n {
            let a = ring[i];
            let b = ring[i + 1];
            let cross = a.lon * b.lat - b.lon * a.lat;
            area2 += cross;
            cx += (a.lon + b.lon) * cross;
            cy += (a.lat + b.lat) * cross;
        }
        if area2.abs() < f64::EPSILON {
            let (mut lat, mut lon) = (0.0, 0.0);
            for v in ring.iter().take(n.max(1)) {
                lat += v.lat;
                lon += v.lon;
            }
            let m = n.max(1) as f64;
            return GeoPoint::new(lat / m, lon / m);
        }
        GeoPoint::new(cy / (3.0 * area2), cx / (3.0 * area2))
    }

    /// Axis-aligned bounding box as `([min_lon, min_lat], [max_lon, max_lat])`.
    pub fn bbox(&self) -> ([f64; 2], [f64; 2]) {
        let mut min = [f64::INFINITY, f64::INFINITY];
        let mut max = [f64::NEG_INFINITY, f64::NEG_INFINITY];
        for v in &self.exterior {
            min[0] = min[0].min(v.lon);
            min[1] = min[1].min(v.lat);
            max[0] = max[0].max(v.lon);
            max[1] = max[1].max(v.lat);
        }
        (min, max)
    }

    /// Planar distance (degrees) from a point to the exterior centroid.
    /// Used only to rank polygons by proximity; not a metric distance.
    pub fn centroid_distance_deg(&self, p: GeoPoint) -> f64 {
        let c = self.centroid();
        let dlat = c.lat - p.lat;
        let dlon = c.lon - p.lon;
        (dlat * dlat + dlon * dlon).sqrt()
    }
}

// ── Ring primitives ───────────────────────────────────────────────────────────

/// Even-odd ray cast: does a ray from `p` toward +lon cross an odd number of
/// ring segments?  Boundary points are resolved by `on_ring` before this is
/// consulted.
fn inside_ring(ring: &[GeoPoint], p: GeoPoint) -> bool {
    let n = ring.len();
    if n < 4 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 2; // last distinct vertex (ring is closed)
    for i in 0..n - 1 {
        let a = ring[i];
        let b = ring[j];
        if (a.lat > p.lat) != (b.lat > p.lat) {
            let lon_at = (b.lon - a.lon) * (p.lat - a.lat) / (b.lat - a.lat) + a.lon;
            if p.lon < lon_at {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// True when `p` lies on any segment of the ring (within tolerance).
fn on_ring(ring: &[GeoPoint], p: GeoPoint) -> bool {
    ring.windows(2)
        .any(|seg| point_segment_distance_deg(p, seg[0], seg[1]) <= BOUNDARY_EPS_DEG)
}

/// Planar point-to-segment distance in degrees.
fn point_segment_distance_deg(p: GeoPoint, a: GeoPoint, b: GeoPoint) -> f64 {
    let (px, py) = (p.lon, p.lat);
    let (ax, ay) = (a.lon, a.lat);
    let (bx, by) = (b.lon, b.lat);

    let dx = bx - ax;
    let dy = by - ay;
    let len2 = dx * dx + dy * dy;
    let t = if len2 == 0.0 {
        0.0
    } else {
        (((px - ax) * dx + (py - ay) * dy) / len2).clamp(0.0, 1.0)
    };
    let qx = ax + t * dx;
    let qy = ay + t * dy;
    ((px - qx).powi(2) + (py - qy).powi(2)).sqrt()
}
