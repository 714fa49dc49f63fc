//! Runtime parameters.
//!
//! Every tunable the simulator reads lives in [`SimParams`].  The defaults
//! are the production values; tests and entry-point binaries override what
//! they need.  Typically deserialized from a TOML/JSON file by the
//! application crate and passed down at build time.

use serde::{Deserialize, Serialize};

/// All simulator runtime knobs.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Seconds of simulated time per tick; also the live-loop sleep.
    pub update_interval_secs: f64,

    /// Cruise speed used by the route integrator, metres per second
    /// (~19.5 km/h).
    pub nominal_max_speed_mps: f64,

    /// Battery floor, percent.  Drain never takes a scooter below this.
    pub min_battery: f64,

    /// Below this percent a scooter is not rentable and gets locked once
    /// idle.  Strict less-than: exactly at the threshold is still rentable.
    pub low_battery_threshold: f64,

    /// Battery ceiling, percent.
    pub battery_full: f64,

    /// Percent drained per tick while idle or waiting for charge.
    /// Applied once per tick, not scaled by elapsed time.
    pub battery_drain_idle: f64,

    /// Percent drained per tick while actively ridden.
    /// Applied once per tick, not scaled by elapsed time.
    pub battery_drain_active: f64,

    /// Percent gained per minute while in a charging zone.
    pub charge_rate_per_min: f64,

    /// Master RNG seed (user-pool draws and rental tokens).  The same seed
    /// always produces identical draws.
    pub seed: u64,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            update_interval_secs:  5.0,
            nominal_max_speed_mps: 5.42,
            min_battery:           5.0,
            low_battery_threshold: 20.0,
            battery_full:          100.0,
            battery_drain_idle:    0.01,
            battery_drain_active:  0.025,
            charge_rate_per_min:   3.0,
            seed:                  42,
        }
    }
}

impl SimParams {
    /// Metres a scooter covers in one tick at nominal cruise speed.
    #[inline]
    pub fn step_m(&self) -> f64 {
        self.nominal_max_speed_mps * self.update_interval_secs
    }
}
