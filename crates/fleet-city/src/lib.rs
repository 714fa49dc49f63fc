//! `fleet-city` — geographic zone model for the scooter simulator.
//!
//! A [`City`] holds the typed zone polygons fetched from the backend
//! (charging, parking, city boundary, slow) and answers the three questions
//! the simulator asks every tick:
//!
//! - is this point inside a zone of a given type? ([`City::is_inside`])
//! - which zone type does this point classify as? ([`City::classify_zone`])
//! - what speed cap applies in that zone type? ([`City::speed_limit`])
//!
//! # Crate layout
//!
//! | Module      | Contents                                              |
//! |-------------|-------------------------------------------------------|
//! | [`zone`]    | `Zone` enum, `ZoneSpec` backend record                |
//! | [`polygon`] | ring polygon, boundary-inclusive containment, centroid|
//! | [`wkt`]     | `POLYGON`/`MULTIPOLYGON` WKT parsing                  |
//! | [`city`]    | `City` — zone store + R-tree bbox pre-filter          |

pub mod city;
pub mod polygon;
pub mod wkt;
pub mod zone;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use city::City;
pub use polygon::Polygon;
pub use wkt::WktError;
pub use zone::{Zone, ZoneSpec};
