//! `fleet-scooter` — the physical scooter entity.
//!
//! A [`Scooter`] holds position, speed, battery, and status, and knows
//! nothing about routes, rentals, zones, or locks — that is all simulator
//! territory.  The simulator drives each scooter exclusively through
//! [`Scooter::tick`] (once per simulation tick) and [`Scooter::end_trip`]
//! (at rental completion).

use fleet_core::{GeoPoint, ScooterId, SimParams, Status};


/// Physical state of one scooter.
#[derive(Clone, Debug)]
pub struct Scooter {
    pub id: ScooterId,
    pub pos: GeoPoint,
    pub speed_kmh: f64,
    /// Battery percent, clamped to `[min_battery, battery_full]`.
    pub battery: f64,
    pub status: Status,
}

impl Scooter {
    /// Create a scooter at a position with a given charge, status `idle`.
    pub fn new(id: ScooterId, pos: GeoPoint, battery: f64) -> Self {
        Self {
            id,
            pos,
            speed_kmh: 0.0,
            battery,
            status: Status::Idle,
        }
    }

    /// Advance the physical state by one tick.
    ///
    /// `activity` is the movement resolver's label for this tick; the final
    /// status is derived from it:
    ///
    /// 1. in a charging zone and not actively ridden → `charging`
    /// 2. battery below the low threshold → `needCharging`
    /// 3. otherwise the activity itself
    ///
    /// Battery integrates against the *derived* status.  Charging scales
    /// with `elapsed_secs`; the idle/active drains are flat per-tick amounts.
    pub fn tick(
        &mut self,
        activity: Status,
        speed_kmh: f64,
        in_charging_zone: bool,
        elapsed_secs: f64,
        params: &SimParams,
    ) {
        self.speed_kmh = speed_kmh;

        self.status = if in_charging_zone && activity != Status::Active {
            Status::Charging
        } else if self.battery < params.low_battery_threshold {
            Status::NeedCharging
        } else {
            activity
        };

        self.update_battery(elapsed_secs, params);
    }

    /// Reset at trip's end: stop, then pick the resting status.
    pub fn end_trip(&mut self, in_charging_zone: bool, params: &SimParams) {
        self.speed_kmh = 0.0;

        self.status = if in_charging_zone {
            Status::Charging
        } else if self.battery < params.low_battery_threshold {
            Status::NeedCharging
        } else {
            Status::Idle
        };
    }

    fn update_battery(&mut self, elapsed_secs: f64, params: &SimParams) {
        match self.status {
            Status::Charging => {
                let per_sec = params.charge_rate_per_min / 60.0;
                self.battery =
                    (self.battery + per_sec * elapsed_secs).min(params.battery_full);
            }
            Status::Idle | Status::NeedCharging => {
                self.battery =
                    (self.battery - params.battery_drain_idle).max(params.min_battery);
            }
            Status::Active => {
                self.battery =
                    (self.battery - params.battery_drain_active).max(params.min_battery);
            }
            // Other statuses (reduced, locked, service…) neither drain nor charge.
            _ => {}
        }
    }
}
