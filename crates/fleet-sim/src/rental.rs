//! Rental records.

use std::fmt;

use fleet_backend::User;
use fleet_city::Zone;
use rand::rngs::SmallRng;
use rand::Rng;

/// Where a rental ended: a real zone, or the forced label used when an
/// admin override terminated the trip.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EndZone {
    Zone(Zone),
    AdminForced,
}

impl EndZone {
    pub fn as_str(self) -> &'static str {
        match self {
            EndZone::Zone(zone) => zone.as_str(),
            EndZone::AdminForced => "admin_forced",
        }
    }
}

impl fmt::Display for EndZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sim-owned rental.
///
/// `active` is the canonical control flag; `rental_id` is an identifier,
/// not control flow.  The id starts as a locally generated token and is
/// replaced by the server-assigned id when creation succeeds.
#[derive(Clone, Debug)]
pub struct RentalState {
    pub active: bool,
    pub rental_id: Option<String>,
    pub user: Option<User>,
    pub start_zone: Zone,
    pub end_zone: EndZone,
}

impl Default for RentalState {
    fn default() -> Self {
        Self {
            active: false,
            rental_id: None,
            user: None,
            start_zone: Zone::Free,
            end_zone: EndZone::Zone(Zone::Free),
        }
    }
}

impl RentalState {
    /// Clear per-rental state for the next trip.
    pub fn reset(&mut self) {
        *self = RentalState::default();
    }
}

/// A rental opened by the backend/user app.
///
/// While active, the simulator must not start or end rentals for the
/// scooter and must not route-move it; it keeps publishing state and
/// logging coordinates under the external rental id.
#[derive(Clone, Debug, Default)]
pub struct ExternalRental {
    pub active: bool,
    pub rental_id: Option<String>,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
}

impl ExternalRental {
    pub fn reset(&mut self) {
        *self = ExternalRental::default();
    }
}

/// Generate a 10-character lowercase-alphanumeric rental token.
///
/// Placeholder until the server-assigned id arrives; kept so trail logging
/// can begin before the create call returns.
pub fn new_rental_token(rng: &mut SmallRng) -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    (0..10)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}
