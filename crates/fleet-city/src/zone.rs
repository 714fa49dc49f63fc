//! Zone types and the backend zone record.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of a geographic position.
///
/// Priority when polygons overlap: charging > parking > free > slow.
/// `OutOfBounds` is never stored as a polygon type — it is what
/// classification returns when no polygon contains the point.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Charging,
    Parking,
    /// Inside the city boundary, outside any special zone.
    Free,
    Slow,
    OutOfBounds,
}

impl Zone {
    pub fn as_str(self) -> &'static str {
        match self {
            Zone::Charging    => "charging",
            Zone::Parking     => "parking",
            Zone::Free        => "free",
            Zone::Slow        => "slow",
            Zone::OutOfBounds => "outofbounds",
        }
    }

    /// Zone types that carry a speed cap.
    #[inline]
    pub fn is_speed_limited(self) -> bool {
        matches!(self, Zone::Slow | Zone::Parking | Zone::Charging)
    }

    /// Map a backend `zone_type` string to the polygon family it describes.
    ///
    /// The backend calls the city-boundary polygons `"city"`; points inside
    /// them classify as [`Zone::Free`].  Unknown strings yield `None` and the
    /// zone record is skipped.
    pub fn from_zone_type(s: &str) -> Option<Zone> {
        match s.to_ascii_lowercase().as_str() {
            "charging" => Some(Zone::Charging),
            "parking"  => Some(Zone::Parking),
            "city"     => Some(Zone::Free),
            "slow"     => Some(Zone::Slow),
            _          => None,
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One zone row as served by `GET /cities/{name}/zones`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ZoneSpec {
    pub zone_type: String,
    pub coordinates_wkt: String,
    #[serde(default)]
    pub speed_limit: Option<f64>,
}
