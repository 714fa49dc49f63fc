//! `fleet-core` — foundational types for the fleet scooter simulator.
//!
//! This crate is a dependency of every other `fleet-*` crate.  It
//! intentionally has no `fleet-*` dependencies and only one external one
//! (`serde`, for the wire derives).
//!
//! # What lives here
//!
//! | Module      | Contents                                              |
//! |-------------|-------------------------------------------------------|
//! | [`ids`]     | `ScooterId`, `RouteId`                                |
//! | [`geo`]     | `GeoPoint`, haversine distance                        |
//! | [`status`]  | `Status` enum, the non-rentable set                   |
//! | [`time`]    | `Tick`, `TickClock`                                   |
//! | [`params`]  | `SimParams` — every runtime knob, with the defaults   |

pub mod geo;
pub mod ids;
pub mod params;
pub mod status;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use geo::GeoPoint;
pub use ids::{RouteId, ScooterId};
pub use params::SimParams;
pub use status::Status;
pub use time::{Tick, TickClock};
