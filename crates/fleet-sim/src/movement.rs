//! Movement resolution: updates, overrides, and the route integrator.

use fleet_core::{GeoPoint, SimParams, Status};
use fleet_scooter::Scooter;

use crate::routes::DirectedRoute;

/// What a scooter does this tick: where it ends up, how fast it went, and
/// the activity label the entity integrates against.
#[derive(Clone, Debug)]
pub struct MovementUpdate {
    pub pos: GeoPoint,
    pub speed_kmh: f64,
    pub activity: Status,
    pub route_finished: bool,
}

impl MovementUpdate {
    /// Stand still at `pos` with idle activity.
    pub fn hold(pos: GeoPoint) -> Self {
        Self {
            pos,
            speed_kmh: 0.0,
            activity: Status::Idle,
            route_finished: false,
        }
    }
}

/// A per-scooter movement override, consulted before route-following.
///
/// Returning `None` means "no override this tick" and movement falls through
/// to the route integrator (or stand-still).  Scenario hooks install these;
/// lock overrides are derived from the lock state instead and always win.
pub trait MovementOverride: Send {
    fn resolve(&mut self, scooter: &Scooter, elapsed_secs: f64) -> Option<MovementUpdate>;
}

impl<F> MovementOverride for F
where
    F: FnMut(&Scooter, f64) -> Option<MovementUpdate> + Send,
{
    fn resolve(&mut self, scooter: &Scooter, elapsed_secs: f64) -> Option<MovementUpdate> {
        self(scooter, elapsed_secs)
    }
}

/// An override that pins the scooter to wherever it currently is.
pub fn hold_position() -> Box<dyn MovementOverride> {
    Box::new(|scooter: &Scooter, _elapsed: f64| Some(MovementUpdate::hold(scooter.pos)))
}

// ── Route integrator ──────────────────────────────────────────────────────────

/// Cap on the turn-slowdown factor: a U-turn sheds at most 40 % of speed.
const MAX_TURN_SLOWDOWN: f64 = 0.4;

/// Advance one tick along a route.
///
/// Moves toward the waypoint at `*next_waypoint` by at most the nominal
/// per-tick step: close waypoints are snapped to (advancing the index),
/// distant ones are approached by linear lat/lon interpolation.  Speed is
/// derived from the distance actually covered, with a slowdown proportional
/// to the change in travel direction — scooters brake through corners.
///
/// When the last waypoint is reached, `route_finished` is set and the index
/// resets to 0 for the next trip.
pub fn follow_route(
    pos: GeoPoint,
    route: DirectedRoute<'_>,
    next_waypoint: &mut usize,
    last_direction: &mut Option<f64>,
    params: &SimParams,
) -> MovementUpdate {
    let target = route.point(*next_waypoint);
    let distance_to_target = pos.distance_m(target);
    let max_step = params.step_m();

    let (new_pos, route_finished) = if distance_to_target <= max_step {
        *next_waypoint += 1;
        let finished = *next_waypoint >= route.len();
        if finished {
            *next_waypoint = 0;
        }
        (target, finished)
    } else {
        let fraction = max_step / distance_to_target;
        (
            GeoPoint::new(
                pos.lat + (target.lat - pos.lat) * fraction,
                pos.lon + (target.lon - pos.lon) * fraction,
            ),
            false,
        )
    };

    let mut speed_kmh =
        pos.distance_m(new_pos) / params.update_interval_secs * 3.6;

    // Slow down through turns: compare this tick's heading with the last.
    let direction = (new_pos.lon - pos.lon).atan2(new_pos.lat - pos.lat);
    if let Some(prev) = *last_direction {
        let mut delta = (direction - prev).abs();
        delta = delta.min((std::f64::consts::TAU - delta).abs());
        let slowdown = 1.0 - (delta / std::f64::consts::PI).min(MAX_TURN_SLOWDOWN);
        speed_kmh *= slowdown;
    }
    *last_direction = Some(direction);

    let speed_kmh = (speed_kmh * 100.0).round() / 100.0;

    MovementUpdate {
        pos: new_pos,
        speed_kmh,
        activity: if speed_kmh > 0.0 { Status::Active } else { Status::Idle },
        route_finished,
    }
}
