//! `Broadcaster` — the fleet's domain operations over a [`Bus`].
//!
//! This is the IoT-like emitter of each simulated scooter: live state every
//! tick, a breadcrumb trail per rental, and a summary event when a rental
//! completes.

use crate::bus::{Bus, BusError};
use crate::payload::{CompletedRental, StatePayload, TrailPoint};

/// Channel carrying the per-tick state payloads.
///
/// Earlier revisions of the wire protocol used `scooter:delta`; this
/// implementation standardises on `scooter:state:tick`.  Consumers subscribe
/// here for live map updates; late joiners read the `scooter:{id}` keys.
pub const STATE_CHANNEL: &str = "scooter:state:tick";

/// Channel carrying completed-rental events.
pub const COMPLETED_CHANNEL: &str = "rental:completed";

/// List of recent completed rentals (newest first).
pub const COMPLETED_LIST: &str = "completed_rentals";

fn state_key(id: fleet_core::ScooterId) -> String {
    format!("scooter:{id}")
}

fn coords_key(rental_id: &str) -> String {
    format!("rental:{rental_id}:coords")
}

/// Emits scooter telemetry over a bus.
#[derive(Clone)]
pub struct Broadcaster<B: Bus> {
    bus: B,
}

impl<B: Bus> Broadcaster<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Access the underlying bus (e.g. to open subscriptions).
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Broadcast current scooter state: overwrite the latest-known key and
    /// push on the state channel.  Called exactly once per scooter per tick.
    pub fn broadcast_state(&self, payload: &StatePayload) -> Result<(), BusError> {
        let encoded = serde_json::to_string(payload).map_err(BusError::Encode)?;
        self.bus.set(&state_key(payload.id), &encoded)?;
        self.bus.publish(STATE_CHANNEL, &encoded)
    }

    /// Append one breadcrumb to a rental's trail.
    pub fn log_coord(
        &self,
        rental_id: &str,
        lat: f64,
        lng: f64,
        spd: f64,
    ) -> Result<(), BusError> {
        let coord = serde_json::to_string(&TrailPoint { lat, lng, spd })
            .map_err(BusError::Encode)?;
        self.bus.push_back(&coords_key(rental_id), &coord)
    }

    /// Drop a rental's trail.  Trails are never reused once the rental is
    /// persisted, so clearing prevents stale entries from accumulating.
    pub fn clear_coords(&self, rental_id: &str) -> Result<(), BusError> {
        self.bus.delete(&coords_key(rental_id))
    }

    /// Read back the full breadcrumb trail recorded for a rental.
    pub fn load_coords(&self, rental_id: &str) -> Result<Vec<TrailPoint>, BusError> {
        self.bus
            .range_all(&coords_key(rental_id))?
            .iter()
            .map(|raw| serde_json::from_str(raw).map_err(BusError::Decode))
            .collect()
    }

    /// Publish a completed rental: prepend to the recent-rentals list and
    /// push on the completion channel.
    pub fn publish_completed(&self, rental: &CompletedRental) -> Result<(), BusError> {
        let encoded = serde_json::to_string(rental).map_err(BusError::Encode)?;
        self.bus.push_front(COMPLETED_LIST, &encoded)?;
        self.bus.publish(COMPLETED_CHANNEL, &encoded)
    }
}
