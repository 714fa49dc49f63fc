//! Per-scooter scenario hooks.
//!
//! Hooks inject special storylines into an otherwise uniform fleet: a
//! scooter that retires to a charging zone after its shift, one that breaks
//! down mid-day.  The simulator runs a scooter's hook at the end of its
//! per-tick pipeline, after the rental phase.
//!
//! Each hook only ever touches the scooter it is registered for, so the core
//! pipeline stays clean while scenarios stay arbitrarily varied.

use fleet_backend::Backend;
use fleet_city::{City, Zone};
use fleet_core::{SimParams, Status};
use fleet_scooter::Scooter;
use tracing::{info, warn};

use crate::movement::{hold_position, MovementOverride};

/// What a hook may see and touch.
pub struct HookContext<'a> {
    pub city: &'a City,
    pub backend: &'a dyn Backend,
    pub params: &'a SimParams,
    /// Completed trips for this scooter.
    pub trips: u32,
    /// Simulated seconds since the run started.
    pub elapsed_secs: f64,
    /// The scooter's scenario movement-override slot.  Installing an
    /// override disables route-following until the slot is cleared (admin
    /// `available` clears it).
    pub special: &'a mut Option<Box<dyn MovementOverride>>,
}

/// A per-scooter scenario.  Returns true when the hook engaged this tick.
pub trait ScenarioHook: Send {
    fn run(&mut self, scooter: &mut Scooter, ctx: &mut HookContext<'_>) -> bool;
}

// ── Stock hooks ───────────────────────────────────────────────────────────────

/// After `required_trips` completed trips, park permanently at the centroid
/// of the nearest charging zone.
pub struct ParkInNearestChargingZone {
    pub required_trips: u32,
    parked: bool,
}

impl ParkInNearestChargingZone {
    pub fn new(required_trips: u32) -> Self {
        Self { required_trips, parked: false }
    }
}

impl ScenarioHook for ParkInNearestChargingZone {
    fn run(&mut self, scooter: &mut Scooter, ctx: &mut HookContext<'_>) -> bool {
        if self.parked || ctx.trips < self.required_trips {
            return false;
        }

        let Some(nearest) = ctx.city.nearest_polygon(Zone::Charging, scooter.pos) else {
            warn!(scooter = %scooter.id, "no charging zones loaded, continuing normally");
            return false;
        };

        scooter.pos = nearest.centroid();
        scooter.speed_kmh = 0.0;
        scooter.end_trip(true, ctx.params);
        *ctx.special = Some(hold_position());
        self.parked = true;

        info!(scooter = %scooter.id, pos = %scooter.pos,
            "parked in nearest charging zone");
        true
    }
}

/// After `required_trips` completed trips, park permanently at the centroid
/// of the nearest parking zone.
pub struct ParkInNearestParkingZone {
    pub required_trips: u32,
    parked: bool,
}

impl ParkInNearestParkingZone {
    pub fn new(required_trips: u32) -> Self {
        Self { required_trips, parked: false }
    }
}

impl ScenarioHook for ParkInNearestParkingZone {
    fn run(&mut self, scooter: &mut Scooter, ctx: &mut HookContext<'_>) -> bool {
        if self.parked || ctx.trips < self.required_trips {
            return false;
        }

        let Some(nearest) = ctx.city.nearest_polygon(Zone::Parking, scooter.pos) else {
            warn!(scooter = %scooter.id, "no parking zones loaded, continuing normally");
            return false;
        };

        scooter.pos = nearest.centroid();
        scooter.speed_kmh = 0.0;
        scooter.end_trip(false, ctx.params);
        *ctx.special = Some(hold_position());
        self.parked = true;

        info!(scooter = %scooter.id, pos = %scooter.pos,
            "parked in nearest parking zone");
        true
    }
}

/// Break down (`needService`) once `max_runtime_secs` of simulated time have
/// elapsed.  The scooter stops where it is and will not move again until an
/// admin intervenes.
///
/// The status write retries every tick until the backend accepts it.
pub struct BreakdownAfterRuntime {
    pub max_runtime_secs: f64,
    announced: bool,
}

impl BreakdownAfterRuntime {
    pub fn new(max_runtime_secs: f64) -> Self {
        Self { max_runtime_secs, announced: false }
    }
}

impl ScenarioHook for BreakdownAfterRuntime {
    fn run(&mut self, scooter: &mut Scooter, ctx: &mut HookContext<'_>) -> bool {
        if ctx.elapsed_secs < self.max_runtime_secs {
            return false;
        }

        if scooter.status != Status::NeedService
            && ctx
                .backend
                .update_status_and_position(scooter.id, Status::NeedService, scooter.pos)
        {
            scooter.status = Status::NeedService;
        }

        scooter.speed_kmh = 0.0;
        if ctx.special.is_none() {
            *ctx.special = Some(hold_position());
        }

        if !self.announced {
            warn!(scooter = %scooter.id, after_secs = ctx.elapsed_secs,
                "scooter broke down, needs service");
            self.announced = true;
        }
        true
    }
}
