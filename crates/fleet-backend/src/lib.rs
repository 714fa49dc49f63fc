//! `fleet-backend` — the simulator's view of the backend HTTP API.
//!
//! The simulator depends on the [`Backend`] trait only.  [`HttpBackend`] is
//! the production implementation (blocking `reqwest`, short per-endpoint
//! timeouts); [`RecordingBackend`] is the scripted double used by tests and
//! demos.
//!
//! Rental creation/completion and status writes are best-effort from the
//! simulator's point of view: a failed call is logged and the tick carries
//! on with local state unchanged by that call.  Zone loading is the
//! exception — the caller needs to distinguish "city not found" from
//! transport trouble, so it returns a full [`BackendError`].

pub mod error;
pub mod http;
pub mod recording;
pub mod types;

#[cfg(test)]
mod tests;

use fleet_city::ZoneSpec;
use fleet_core::{GeoPoint, ScooterId, Status};
use fleet_telemetry::TrailPoint;

pub use error::BackendError;
pub use http::{BackendConfig, HttpBackend};
pub use recording::{BackendCall, RecordingBackend};
pub use types::{CreatedRental, User};

/// Operations the simulator performs against the backend.
pub trait Backend {
    /// All registered customers; a deterministic synthetic list on failure.
    fn fetch_users(&self) -> Vec<User>;

    /// All zone records for a city.  `Err(BackendError::NotFound)` when the
    /// backend has no such city.
    fn fetch_zones(&self, city: &str) -> Result<Vec<ZoneSpec>, BackendError>;

    /// Create a rental.  `Some` iff the backend answered 201 with a
    /// `rental_id`; the returned id supersedes any locally generated token.
    fn create_rental(
        &self,
        customer_id: i64,
        bike_id: ScooterId,
        start_point: GeoPoint,
        start_zone: &str,
    ) -> Option<CreatedRental>;

    /// Complete a rental with its end point and full breadcrumb route.
    /// An empty route is treated as failure without touching the network.
    fn complete_rental(
        &self,
        rental_id: &str,
        end_point: GeoPoint,
        end_zone: &str,
        route: &[TrailPoint],
    ) -> bool;

    /// Canonical status + position write for one bike.
    fn update_status_and_position(
        &self,
        bike_id: ScooterId,
        status: Status,
        pos: GeoPoint,
    ) -> bool;
}
