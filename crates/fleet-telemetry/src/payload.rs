//! Wire payload structs.

use fleet_core::geo::round_dp;
use fleet_core::{ScooterId, Status};
use serde::{Deserialize, Serialize};

/// Per-tick scooter state, as set under `scooter:{id}` and published on the
/// state channel.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatePayload {
    pub id: ScooterId,
    pub lat: f64,
    pub lng: f64,
    pub bat: f64,
    pub st: Status,
    pub spd: f64,
    #[serde(rename = "inChargingZone")]
    pub in_charging_zone: bool,
}

impl StatePayload {
    /// Build a payload, truncating coordinates to 7 decimals and battery
    /// to 1 — the published precision contract.
    pub fn new(
        id: ScooterId,
        lat: f64,
        lng: f64,
        bat: f64,
        st: Status,
        spd: f64,
        in_charging_zone: bool,
    ) -> Self {
        Self {
            id,
            lat: round_dp(lat, 7),
            lng: round_dp(lng, 7),
            bat: round_dp(bat, 1),
            st,
            spd,
            in_charging_zone,
        }
    }
}

/// One breadcrumb of a rental trail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrailPoint {
    pub lat: f64,
    pub lng: f64,
    pub spd: f64,
}

/// The completed-rental event, pushed onto `completed_rentals` and published
/// on `rental:completed`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompletedRental {
    #[serde(rename = "type")]
    pub kind: String,
    pub rental_id: String,
    pub scooter_id: ScooterId,
    pub coords: Vec<TrailPoint>,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub start_zone: String,
    pub end_zone: String,
}

impl CompletedRental {
    pub const KIND: &'static str = "completed_rental";
}
