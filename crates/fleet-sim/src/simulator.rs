//! The simulator: per-tick fleet advancement.
//!
//! One instance owns every scooter and is the only writer of their state.
//! External input (admin overrides, external rental events) arrives through
//! the two inboxes and is applied at the top of each tick — admin updates
//! first, then rental events, both last-write-wins per scooter — before any
//! scooter moves.
//!
//! Backend writes are DB-first: the canonical status goes to the backend
//! before the local status changes, so the fleet view and the simulator
//! never diverge silently.  Failures are logged and the tick carries on.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use fleet_backend::{Backend, User};
use fleet_city::{City, Zone};
use fleet_core::{GeoPoint, RouteId, ScooterId, SimParams, Status, TickClock};
use fleet_events::{AdminInbox, RentalEvent, RentalInbox};
use fleet_scooter::Scooter;
use fleet_telemetry::{Broadcaster, Bus, CompletedRental, StatePayload, TrailPoint};
use rand::rngs::SmallRng;
use rand::Rng;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::hooks::{HookContext, ScenarioHook};
use crate::locks::{LockReason, LockState};
use crate::movement::{follow_route, MovementOverride, MovementUpdate};
use crate::rental::{new_rental_token, EndZone, ExternalRental, RentalState};
use crate::routes::RouteTable;

/// Admin statuses that force-complete rentals and lock the scooter in place.
const CRITICAL_STATUSES: [Status; 3] =
    [Status::Deactivated, Status::NeedService, Status::OnService];

/// Fallback speed cap (km/h) for limited zones with no configured limit.
const DEFAULT_ZONE_SPEED_KMH: f64 = 5.0;

// ── Per-scooter simulator state ───────────────────────────────────────────────

/// Everything the simulator tracks about one scooter beyond its physical
/// state: route progress, rental records, locks, and override slots.
pub struct ScooterSimState {
    pub route_id: Option<RouteId>,
    pub next_waypoint: usize,
    /// Completed trips; parity picks the route direction.
    pub trips: u32,
    pub last_pos: GeoPoint,
    /// Travel heading of the previous movement tick, radians.
    pub last_direction: Option<f64>,
    /// Scenario movement override (lock overrides are derived from `locks`).
    pub special: Option<Box<dyn MovementOverride>>,
    pub locks: LockState,
    /// Battery lock deferred until the current rental ends.
    pub pending_battery_lock: bool,
    /// Last charging-class status written to the backend, if any.
    pub charging_memo: Option<Status>,
    pub rental: RentalState,
    pub external: ExternalRental,
}

impl ScooterSimState {
    pub(crate) fn new(route_id: Option<RouteId>, last_pos: GeoPoint) -> Self {
        Self {
            route_id,
            next_waypoint: 0,
            trips: 0,
            last_pos,
            last_direction: None,
            special: None,
            locks: LockState::default(),
            pending_battery_lock: false,
            charging_memo: None,
            rental: RentalState::default(),
            external: ExternalRental::default(),
        }
    }
}

// ── Simulator ─────────────────────────────────────────────────────────────────

/// The tick engine.  Build via [`SimulatorBuilder`][crate::SimulatorBuilder].
pub struct Simulator<A: Backend, B: Bus> {
    pub(crate) params: SimParams,
    pub(crate) clock: TickClock,
    pub(crate) city: City,
    pub(crate) backend: A,
    pub(crate) broadcaster: Broadcaster<B>,
    pub(crate) routes: RouteTable,
    pub(crate) scooters: Vec<Scooter>,
    pub(crate) state: Vec<ScooterSimState>,
    pub(crate) slot_by_id: FxHashMap<ScooterId, usize>,
    pub(crate) hooks: FxHashMap<ScooterId, Box<dyn ScenarioHook>>,
    pub(crate) user_pool: Vec<User>,
    pub(crate) rng: SmallRng,
    pub(crate) admin_inbox: Arc<AdminInbox>,
    pub(crate) rental_inbox: Arc<RentalInbox>,
}

impl<A: Backend, B: Bus> Simulator<A, B> {
    // ── Public API ────────────────────────────────────────────────────────

    /// Advance the whole fleet by one tick.
    pub fn tick(&mut self) {
        self.apply_queued_admin_updates();
        self.apply_queued_rental_events();

        for i in 0..self.scooters.len() {
            self.tick_scooter(i);
        }

        self.clock.advance();
    }

    /// Run exactly `n` ticks back to back (no sleeping).  For tests and
    /// accelerated replays.
    pub fn run_ticks(&mut self, n: u64) {
        for _ in 0..n {
            self.tick();
        }
    }

    /// Run live until `stop` is raised, sleeping `update_interval_secs`
    /// between ticks.  The flag is only observed at the top of the loop;
    /// a tick in flight always completes.
    pub fn run(&mut self, stop: &AtomicBool) {
        let interval = Duration::from_secs_f64(self.params.update_interval_secs);
        info!(scooters = self.scooters.len(), "simulation started");
        while !stop.load(Ordering::Relaxed) {
            self.tick();
            thread::sleep(interval);
        }
        info!(tick = %self.clock.current_tick, "simulation stopped");
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn clock(&self) -> &TickClock {
        &self.clock
    }

    pub fn city(&self) -> &City {
        &self.city
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn scooter(&self, id: ScooterId) -> Option<&Scooter> {
        self.slot_by_id.get(&id).map(|&i| &self.scooters[i])
    }

    pub fn sim_state(&self, id: ScooterId) -> Option<&ScooterSimState> {
        self.slot_by_id.get(&id).map(|&i| &self.state[i])
    }

    pub fn user_pool_len(&self) -> usize {
        self.user_pool.len()
    }

    /// Producer handle for admin status updates.
    pub fn admin_inbox(&self) -> Arc<AdminInbox> {
        Arc::clone(&self.admin_inbox)
    }

    /// Producer handle for external rental events.
    pub fn rental_inbox(&self) -> Arc<RentalInbox> {
        Arc::clone(&self.rental_inbox)
    }

    // ── Phase 1: admin updates ────────────────────────────────────────────

    fn apply_queued_admin_updates(&mut self) {
        let updates = self.admin_inbox.drain_all();
        if updates.is_empty() {
            return;
        }

        for update in last_per_scooter(updates, |u| u.scooter_id) {
            let Some(&i) = self.slot_by_id.get(&update.scooter_id) else {
                warn!(scooter = %update.scooter_id, "admin update for unknown scooter");
                continue;
            };
            self.apply_admin_update(i, update.status);
        }
    }

    fn apply_admin_update(&mut self, i: usize, new_status: Status) {
        let old_status = self.scooters[i].status;
        info!(scooter = %self.scooters[i].id, from = %old_status, to = %new_status,
            "applying admin status update");

        // Guard: never force `available` while any rental is live.  Revert
        // the backend to the old status to keep both sides consistent.
        if new_status == Status::Available
            && (self.state[i].rental.active || self.state[i].external.active)
        {
            warn!(scooter = %self.scooters[i].id,
                sim_rental = self.state[i].rental.active,
                external_rental = self.state[i].external.active,
                "rejecting 'available' while rental is active, reverting backend");
            self.write_status(i, old_status);
            return;
        }

        self.write_status(i, new_status);
        self.scooters[i].status = new_status;

        if CRITICAL_STATUSES.contains(&new_status) {
            if self.state[i].rental.active {
                self.force_complete_rental(i, EndZone::AdminForced);
            }
            self.apply_admin_lock(i);
        } else if new_status == Status::Available {
            // Back to normal flow: clear every lock and override.  Battery
            // and out-of-bounds policy will re-assert themselves if needed.
            let st = &mut self.state[i];
            st.locks.clear();
            st.pending_battery_lock = false;
            st.special = None;
            st.charging_memo = None;
        } else {
            self.state[i].locks.release_admin();
        }
    }

    fn apply_admin_lock(&mut self, i: usize) {
        self.state[i].locks.engage(LockReason::Admin);
    }

    // ── Phase 2: external rental events ───────────────────────────────────

    fn apply_queued_rental_events(&mut self) {
        let events = self.rental_inbox.drain_all();
        if events.is_empty() {
            return;
        }

        for event in last_per_scooter(events, RentalEvent::scooter_id) {
            let Some(&i) = self.slot_by_id.get(&event.scooter_id()) else {
                warn!(scooter = %event.scooter_id(), "rental event for unknown scooter");
                continue;
            };
            match event {
                RentalEvent::RentalStarted { rental_id, user_id, user_name, .. } => {
                    self.apply_external_rental_start(i, rental_id, user_id, user_name);
                }
                RentalEvent::RentalEnded { rental_id, .. } => {
                    self.apply_external_rental_end(i, rental_id);
                }
            }
        }
    }

    fn apply_external_rental_start(
        &mut self,
        i: usize,
        rental_id: String,
        user_id: Option<i64>,
        user_name: Option<String>,
    ) {
        let scooter_id = self.scooters[i].id;

        // At most one of {sim rental, external rental} may ever be active.
        // The backend never opens a rental on an actively rented bike, so a
        // start here means the producers are out of sync.
        if self.state[i].rental.active {
            warn!(scooter = %scooter_id, %rental_id,
                "external rental_started while a sim-owned rental is active, ignoring");
            return;
        }

        info!(scooter = %scooter_id, %rental_id, "external rental started");

        self.state[i].external = ExternalRental {
            active: true,
            rental_id: Some(rental_id.clone()),
            user_id,
            user_name,
        };

        // Reflect `active` locally so the fleet view doesn't show an
        // available bike mid-rental.  The backend owns the DB status here.
        if self.scooters[i].status.is_rentable() && !self.state[i].locks.is_deactivated() {
            self.scooters[i].status = Status::Active;
        }

        // Start a fresh trail for this rental.
        let pos = self.scooters[i].pos;
        self.log_telemetry(self.broadcaster.clear_coords(&rental_id));
        self.log_telemetry(self.broadcaster.log_coord(&rental_id, pos.lat, pos.lon, 0.0));
    }

    fn apply_external_rental_end(&mut self, i: usize, rental_id: String) {
        let scooter_id = self.scooters[i].id;
        let st = &mut self.state[i];

        info!(scooter = %scooter_id, %rental_id, "external rental ended");

        if st.external.active
            && st.external.rental_id.as_deref().is_some_and(|r| r != rental_id)
        {
            warn!(scooter = %scooter_id,
                expected = st.external.rental_id.as_deref().unwrap_or(""),
                got = %rental_id,
                "external rental id mismatch on end");
        }

        st.external.reset();

        // If battery ran low during the rental (or was already pending),
        // lock now that the ride is over.
        if st.pending_battery_lock
            || self.scooters[i].battery < self.params.low_battery_threshold
        {
            self.state[i].pending_battery_lock = false;
            self.apply_battery_lock(i);
            return;
        }

        if !self.state[i].locks.is_deactivated() && self.scooters[i].status.is_rentable() {
            self.scooters[i].status = Status::Available;
        }
    }

    // ── Phase 3: per-scooter pipeline ─────────────────────────────────────

    fn tick_scooter(&mut self, i: usize) {
        let prev_pos = self.state[i].last_pos;

        // Battery lock policy: below the threshold a scooter is immobilised,
        // but never mid-ride — an active rental defers the lock.
        if self.scooters[i].battery < self.params.low_battery_threshold
            && !self.state[i].locks.is_deactivated()
        {
            let riding = self.state[i].rental.active
                || self.state[i].external.active
                || self.scooters[i].status == Status::Active;
            if riding {
                self.state[i].pending_battery_lock = true;
            } else {
                self.apply_battery_lock(i);
            }
        }

        // External rental: the scooter is stationary from the simulator's
        // point of view, but keeps charging-sync, telemetry, and coords.
        if self.state[i].external.active {
            if let Some(rental_id) = self.state[i].external.rental_id.clone() {
                self.tick_external(i, &rental_id);
                return;
            }
        }

        // Movement: lock override > scenario override > route > stand-still.
        // The route is only read while a sim-owned rental is running.
        let route_bound = self.state[i].rental.active && self.state[i].route_id.is_some();
        let mut movement = self.resolve_movement(i, route_bound);

        // New position applies before zone classification so enforcement
        // sees where the scooter *is*, not where it was.
        self.scooters[i].pos = movement.pos;
        let pos = self.scooters[i].pos;
        let zone = self.city.classify_zone(pos.lat, pos.lon);

        if zone == Zone::OutOfBounds {
            self.handle_out_of_bounds(i);
        }

        // A lock installed this very tick (out-of-bounds above) must already
        // pin the scooter, so re-resolve through the lock.
        if self.state[i].locks.is_deactivated() {
            movement = self.lock_output(i);
            self.scooters[i].pos = movement.pos;
        }

        // Zone speed caps and the slow-zone status demotion.
        let mut final_speed = movement.speed_kmh;
        if zone.is_speed_limited() {
            let cap = self
                .city
                .speed_limit(zone)
                .unwrap_or(DEFAULT_ZONE_SPEED_KMH);
            final_speed = final_speed.min(cap);
        }
        let mut activity = movement.activity;
        if zone == Zone::Slow {
            self.scooters[i].status = Status::Reduced;
            activity = Status::Reduced;
        }

        let in_charging_zone = self.in_charging_zone(i);
        self.sync_charging_status(i, in_charging_zone);

        self.scooters[i].tick(
            activity,
            final_speed,
            in_charging_zone,
            self.params.update_interval_secs,
            &self.params,
        );

        self.handle_rental_tick(i, prev_pos, movement.route_finished);

        self.run_hook(i);

        self.state[i].last_pos = self.scooters[i].pos;
        self.publish_state(i, in_charging_zone);
    }

    fn tick_external(&mut self, i: usize, rental_id: &str) {
        let in_charging_zone = self.in_charging_zone(i);
        self.sync_charging_status(i, in_charging_zone);

        self.scooters[i].tick(
            Status::Active,
            0.0,
            in_charging_zone,
            self.params.update_interval_secs,
            &self.params,
        );

        let pos = self.scooters[i].pos;
        self.log_telemetry(self.broadcaster.log_coord(
            rental_id,
            pos.lat,
            pos.lon,
            self.scooters[i].speed_kmh,
        ));

        self.state[i].last_pos = pos;
        self.publish_state(i, in_charging_zone);
    }

    // ── Movement resolution ───────────────────────────────────────────────

    fn resolve_movement(&mut self, i: usize, route_bound: bool) -> MovementUpdate {
        if self.state[i].locks.is_deactivated() {
            return self.lock_output(i);
        }

        // Scenario override, when one is installed and fires.
        let scooter = &self.scooters[i];
        let st = &mut self.state[i];
        if let Some(special) = st.special.as_mut() {
            if let Some(update) = special.resolve(scooter, self.params.update_interval_secs)
            {
                return update;
            }
        }

        if !route_bound {
            return MovementUpdate::hold(scooter.pos);
        }

        let Some(route_id) = st.route_id else {
            return MovementUpdate::hold(scooter.pos);
        };
        let Some(route) = self.routes.directed(route_id, st.trips) else {
            return MovementUpdate::hold(scooter.pos);
        };

        follow_route(
            scooter.pos,
            route,
            &mut st.next_waypoint,
            &mut st.last_direction,
            &self.params,
        )
    }

    /// The movement a locked scooter reports: pinned in place, speed zero,
    /// with the activity label of the owning lock reason.
    fn lock_output(&self, i: usize) -> MovementUpdate {
        let scooter = &self.scooters[i];
        let activity = match self.state[i].locks.owner {
            Some(LockReason::Admin) => scooter.status,
            Some(LockReason::Battery) => Status::NeedCharging,
            Some(LockReason::OutOfBounds) => Status::Deactivated,
            None => Status::Idle,
        };
        MovementUpdate {
            pos: scooter.pos,
            speed_kmh: 0.0,
            activity,
            route_finished: false,
        }
    }

    // ── Out-of-bounds enforcement ─────────────────────────────────────────

    fn handle_out_of_bounds(&mut self, i: usize) {
        self.scooters[i].status = Status::Deactivated;

        // One backend write per excursion, not one per tick out there.
        if !self.state[i].locks.out_of_bounds {
            self.write_status(i, Status::Deactivated);
        }

        if !self.state[i].locks.is_deactivated() {
            self.state[i].locks.engage(LockReason::OutOfBounds);
            warn!(scooter = %self.scooters[i].id, pos = %self.scooters[i].pos,
                "scooter permanently deactivated, out of bounds");

            if self.state[i].rental.active {
                info!(scooter = %self.scooters[i].id,
                    rental_id = self.state[i].rental.rental_id.as_deref().unwrap_or(""),
                    "forcing completion of active rental, out of bounds");
                self.force_complete_rental(i, EndZone::Zone(Zone::OutOfBounds));
            }
        } else {
            // Already locked for another reason: still record this one.
            self.state[i].locks.engage(LockReason::OutOfBounds);
        }
    }

    // ── Battery lock ──────────────────────────────────────────────────────

    fn apply_battery_lock(&mut self, i: usize) {
        if self.state[i].locks.is_deactivated() {
            return;
        }
        self.state[i].locks.engage(LockReason::Battery);
        self.write_status(i, Status::NeedCharging);
        self.scooters[i].status = Status::NeedCharging;
        debug!(scooter = %self.scooters[i].id, battery = self.scooters[i].battery,
            "scooter locked due to low battery");
    }

    // ── Charging status synchronisation ───────────────────────────────────

    /// Keep the backend's charging-class status (`charging`/`chargingLow`)
    /// in sync with the zone and battery — one write per transition, memoised
    /// so 100 ticks on a charger cost one write, not 100.
    fn sync_charging_status(&mut self, i: usize, in_charging_zone: bool) {
        // Never mark charging while actively rented.
        if self.scooters[i].status == Status::Active {
            self.state[i].charging_memo = None;
            return;
        }
        // Admin or out-of-bounds owns the status.
        if self.state[i].locks.admin || self.state[i].locks.out_of_bounds {
            self.state[i].charging_memo = None;
            return;
        }

        if in_charging_zone {
            let next = if self.scooters[i].battery < self.params.low_battery_threshold {
                Status::ChargingLow
            } else {
                Status::Charging
            };
            if self.state[i].charging_memo != Some(next) {
                self.write_status(i, next);
                self.scooters[i].status = next;
                self.state[i].charging_memo = Some(next);
            }
            return;
        }

        // Left the zone after we wrote a charging status: restore.
        if self.state[i]
            .charging_memo
            .is_some_and(Status::is_charging_class)
        {
            let restored = if self.scooters[i].battery < self.params.low_battery_threshold {
                Status::NeedCharging
            } else {
                Status::Available
            };
            self.write_status(i, restored);
            self.scooters[i].status = restored;
            self.state[i].charging_memo = None;
        }
    }

    fn in_charging_zone(&self, i: usize) -> bool {
        if self.scooters[i].status == Status::Active {
            return false;
        }
        let pos = self.scooters[i].pos;
        self.city.is_inside(pos.lat, pos.lon, Zone::Charging)
    }

    // ── Rental lifecycle ──────────────────────────────────────────────────

    fn handle_rental_tick(&mut self, i: usize, prev_pos: GeoPoint, route_finished: bool) {
        // External rentals own the lifecycle; nothing to do here.
        if self.state[i].external.active {
            return;
        }

        if self.can_start_rental(i) {
            self.start_rental(i, prev_pos);
        }

        // Breadcrumbs while the ride is on.
        if self.scooters[i].status == Status::Active && self.state[i].rental.active {
            if let Some(rental_id) = self.state[i].rental.rental_id.clone() {
                let pos = self.scooters[i].pos;
                self.log_telemetry(self.broadcaster.log_coord(
                    &rental_id,
                    pos.lat,
                    pos.lon,
                    self.scooters[i].speed_kmh,
                ));
            }
        }

        if !route_finished
            || !self.state[i].rental.active
            || self.state[i].rental.rental_id.is_none()
        {
            return;
        }

        // Route done: complete the rental where the scooter stands.
        let pos = self.scooters[i].pos;
        let end_zone = EndZone::Zone(self.city.classify_zone(pos.lat, pos.lon));
        self.complete_rental_and_publish(i, end_zone);
        self.return_user_to_pool(i);
        self.finalize_trip(i);
    }

    fn can_start_rental(&self, i: usize) -> bool {
        let st = &self.state[i];
        let scooter = &self.scooters[i];

        !st.external.active
            && !st.rental.active
            && st.route_id.is_some()
            && scooter.battery >= self.params.low_battery_threshold
            && scooter.status.is_rentable()
    }

    fn start_rental(&mut self, i: usize, prev_pos: GeoPoint) {
        let scooter_id = self.scooters[i].id;
        let pos = self.scooters[i].pos;

        let token = new_rental_token(&mut self.rng);
        let start_zone = self.city.classify_zone(prev_pos.lat, prev_pos.lon);
        let user = self.draw_user();

        {
            let rental = &mut self.state[i].rental;
            rental.active = true;
            rental.rental_id = Some(token);
            rental.start_zone = start_zone;
            rental.user = Some(user.clone());
        }

        // The server-assigned id supersedes the local token.
        if let Some(created) =
            self.backend
                .create_rental(user.user_id, scooter_id, pos, start_zone.as_str())
        {
            self.state[i].rental.rental_id = Some(created.rental_id);
        }

        if self.scooters[i].status.is_rentable() {
            self.write_status(i, Status::Active);
        }

        let rental_id = self.state[i].rental.rental_id.clone().unwrap_or_default();
        info!(scooter = %scooter_id, %rental_id, start_zone = %start_zone, "rental started");

        // Fresh trail, opening with a standstill breadcrumb.
        self.log_telemetry(self.broadcaster.clear_coords(&rental_id));
        self.log_telemetry(self.broadcaster.log_coord(&rental_id, pos.lat, pos.lon, 0.0));
    }

    /// Draw a random user from the pool, falling back to the synthetic user
    /// when the pool has run dry.
    fn draw_user(&mut self) -> User {
        if self.user_pool.is_empty() {
            return User {
                user_id: 1,
                user_name: "Simulated User".to_string(),
            };
        }
        let idx = self.rng.gen_range(0..self.user_pool.len());
        self.user_pool.swap_remove(idx)
    }

    fn return_user_to_pool(&mut self, i: usize) {
        if let Some(user) = self.state[i].rental.user.take() {
            self.user_pool.push(user);
        }
    }

    /// Complete the active rental via the backend and publish the summary.
    ///
    /// No-op when no rental is active — this is what makes completion
    /// idempotent when an admin force-complete races a route finish.
    fn complete_rental_and_publish(&mut self, i: usize, end_zone: EndZone) {
        if !self.state[i].rental.active {
            return;
        }
        let Some(rental_id) = self.state[i].rental.rental_id.clone() else {
            return;
        };
        self.state[i].rental.end_zone = end_zone;

        let mut coords: Vec<TrailPoint> = match self.broadcaster.load_coords(&rental_id) {
            Ok(coords) => coords,
            Err(e) => {
                warn!(%rental_id, error = %e, "failed to load rental trail");
                Vec::new()
            }
        };
        // The trip ends at a standstill.
        if let Some(last) = coords.last_mut() {
            last.spd = 0.0;
        }

        let pos = self.scooters[i].pos;
        if !self
            .backend
            .complete_rental(&rental_id, pos, end_zone.as_str(), &coords)
        {
            warn!(%rental_id, "backend did not accept rental completion");
        }

        let rental = &self.state[i].rental;
        let summary = CompletedRental {
            kind: CompletedRental::KIND.to_string(),
            rental_id: rental_id.clone(),
            scooter_id: self.scooters[i].id,
            coords,
            user_id: rental.user.as_ref().map(|u| u.user_id),
            user_name: rental.user.as_ref().map(|u| u.user_name.clone()),
            start_zone: rental.start_zone.as_str().to_string(),
            end_zone: end_zone.as_str().to_string(),
        };
        self.log_telemetry(self.broadcaster.publish_completed(&summary));
        info!(%rental_id, end_zone = %end_zone, "rental completed");
    }

    /// Force-complete any active rental at the current position (admin
    /// override or out-of-bounds).  Does not count as a finished trip.
    fn force_complete_rental(&mut self, i: usize, end_zone: EndZone) {
        if !self.state[i].rental.active {
            return;
        }
        self.complete_rental_and_publish(i, end_zone);
        self.return_user_to_pool(i);
        self.state[i].rental.reset();
    }

    /// Wrap up a route-finished trip: bump the counter, reset the record,
    /// apply any deferred battery lock, rest the scooter.
    fn finalize_trip(&mut self, i: usize) {
        self.state[i].trips += 1;
        self.state[i].rental.reset();

        if self.state[i].pending_battery_lock
            || self.scooters[i].battery < self.params.low_battery_threshold
        {
            self.state[i].pending_battery_lock = false;
            self.apply_battery_lock(i);
        }

        let in_charging = self.in_charging_zone(i);
        self.scooters[i].end_trip(in_charging, &self.params);
    }

    // ── Scenario hooks ────────────────────────────────────────────────────

    fn run_hook(&mut self, i: usize) {
        let id = self.scooters[i].id;
        if let Some(hook) = self.hooks.get_mut(&id) {
            let mut ctx = HookContext {
                city: &self.city,
                backend: &self.backend,
                params: &self.params,
                trips: self.state[i].trips,
                elapsed_secs: self.clock.elapsed_secs(),
                special: &mut self.state[i].special,
            };
            hook.run(&mut self.scooters[i], &mut ctx);
        }
    }

    // ── Backend & telemetry helpers ───────────────────────────────────────

    /// Canonical status + position write, backend-first.  Local state is the
    /// caller's responsibility; a failed write is logged and skipped.
    fn write_status(&self, i: usize, status: Status) {
        let scooter = &self.scooters[i];
        if self
            .backend
            .update_status_and_position(scooter.id, status, scooter.pos)
        {
            debug!(scooter = %scooter.id, %status, pos = %scooter.pos,
                "status and position updated");
        } else {
            warn!(scooter = %scooter.id, %status, "status+position update failed");
        }
    }

    fn publish_state(&self, i: usize, in_charging_zone: bool) {
        let scooter = &self.scooters[i];
        let payload = StatePayload::new(
            scooter.id,
            scooter.pos.lat,
            scooter.pos.lon,
            scooter.battery,
            scooter.status,
            scooter.speed_kmh,
            in_charging_zone,
        );
        self.log_telemetry(self.broadcaster.broadcast_state(&payload));
    }

    /// Telemetry is best-effort: log failures, never abort the tick.
    fn log_telemetry(&self, result: Result<(), fleet_telemetry::BusError>) {
        if let Err(e) = result {
            warn!(error = %e, "telemetry emit failed");
        }
    }
}

// ── Drain helpers ─────────────────────────────────────────────────────────────

/// Collapse a drained batch to the last message per scooter, preserving
/// first-appearance order.
fn last_per_scooter<T>(
    batch: Vec<T>,
    key: impl Fn(&T) -> ScooterId,
) -> Vec<T> {
    let mut slot_by_id: FxHashMap<ScooterId, usize> = FxHashMap::default();
    let mut out: Vec<Option<T>> = Vec::new();
    for msg in batch {
        let id = key(&msg);
        match slot_by_id.get(&id) {
            Some(&slot) => out[slot] = Some(msg),
            None => {
                slot_by_id.insert(id, out.len());
                out.push(Some(msg));
            }
        }
    }
    out.into_iter().flatten().collect()
}
