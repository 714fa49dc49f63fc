//! Integration tests for the simulator: the end-to-end scenarios, the
//! queue-drain contracts, and the movement integrator.

use fleet_backend::{BackendCall, RecordingBackend};
use fleet_city::{City, ZoneSpec};
use fleet_core::{GeoPoint, RouteId, ScooterId, SimParams, Status};
use fleet_events::{AdminStatusUpdate, RentalEvent};
use fleet_scooter::Scooter;
use fleet_telemetry::{Bus, CompletedRental, InMemoryBus, StatePayload};

use crate::builder::SimulatorBuilder;
use crate::movement::follow_route;
use crate::rental::new_rental_token;
use crate::routes::RouteTable;
use crate::simulator::Simulator;
use crate::SimError;

// ── Test fixtures ─────────────────────────────────────────────────────────────

fn square_wkt(lon0: f64, lat0: f64, lon1: f64, lat1: f64) -> String {
    format!(
        "POLYGON (({lon0} {lat0}, {lon1} {lat0}, {lon1} {lat1}, {lon0} {lat1}, {lon0} {lat0}))"
    )
}

fn spec(zone_type: &str, wkt: String) -> ZoneSpec {
    ZoneSpec {
        zone_type: zone_type.to_string(),
        coordinates_wkt: wkt,
        speed_limit: None,
    }
}

/// City square spanning lat 55.5..55.7, lon 12.9..13.1 with a charging
/// square in its north-east corner.
fn test_city() -> City {
    City::new(
        "testville",
        vec![
            spec("city", square_wkt(12.9, 55.5, 13.1, 55.7)),
            spec("charging", square_wkt(13.05, 55.65, 13.09, 55.69)),
        ],
    )
}

/// The simple-trip route: two waypoints ~1.3 km apart, inside the city.
fn trip_route() -> RouteTable {
    let mut routes = RouteTable::new();
    routes
        .insert(
            RouteId(0),
            vec![GeoPoint::new(55.60, 12.99), GeoPoint::new(55.61, 13.00)],
        )
        .unwrap();
    routes
}

struct Harness {
    backend: RecordingBackend,
    bus: InMemoryBus,
    sim: Simulator<RecordingBackend, InMemoryBus>,
}

fn harness_with(
    scooters: Vec<Scooter>,
    routes: RouteTable,
    city: City,
    params: SimParams,
) -> Harness {
    let backend = RecordingBackend::new();
    let bus = InMemoryBus::new();
    let sim = SimulatorBuilder::new(params, city, backend.clone(), bus.clone())
        .scooters(scooters)
        .routes(routes)
        .build()
        .unwrap();
    Harness { backend, bus, sim }
}

/// One scooter on the simple-trip route, full battery.
fn trip_harness() -> Harness {
    harness_with(
        vec![Scooter::new(ScooterId(1), GeoPoint::new(55.60, 12.99), 100.0)],
        trip_route(),
        test_city(),
        SimParams::default(),
    )
}

fn completed_events(bus: &InMemoryBus) -> Vec<CompletedRental> {
    bus.published("rental:completed")
        .iter()
        .map(|raw| serde_json::from_str(raw).unwrap())
        .collect()
}

fn last_state(bus: &InMemoryBus, id: u32) -> StatePayload {
    serde_json::from_str(&bus.get(&format!("scooter:{id}")).expect("state key")).unwrap()
}

const ID1: ScooterId = ScooterId(1);

// ── S1: simple trip ───────────────────────────────────────────────────────────

#[test]
fn s1_rental_starts_and_scooter_moves_at_most_one_step_per_tick() {
    let mut h = trip_harness();
    let step = h.sim.params().step_m();

    h.sim.tick();
    // The rental auto-starts on the first tick and swaps in the server id.
    let st = h.sim.sim_state(ID1).unwrap();
    assert!(st.rental.active);
    assert_eq!(st.rental.rental_id.as_deref(), Some("srv-1"));
    assert_eq!(h.backend.status_writes(ID1), vec![Status::Active]);

    // Per-tick displacement never exceeds the nominal step.
    let mut prev = h.sim.scooter(ID1).unwrap().pos;
    for _ in 0..10 {
        h.sim.tick();
        let pos = h.sim.scooter(ID1).unwrap().pos;
        assert!(prev.distance_m(pos) <= step + 1e-6);
        prev = pos;
    }
    // And it is actually under way toward waypoint 1.
    assert!(h.sim.scooter(ID1).unwrap().status == Status::Active);
}

#[test]
fn s1_route_finish_completes_and_publishes_exactly_once() {
    let mut h = trip_harness();
    h.sim.run_ticks(60);

    let st = h.sim.sim_state(ID1).unwrap();
    assert_eq!(st.trips, 1, "first trip must be finished by tick 60");

    let events = completed_events(&h.bus);
    assert_eq!(events.len(), 1, "exactly one completion per rental");
    let done = &events[0];
    assert_eq!(done.rental_id, "srv-1");
    assert_eq!(done.scooter_id, ID1);
    assert!(done.coords.len() >= 2);
    assert_eq!(done.coords.first().unwrap().spd, 0.0);
    assert_eq!(done.coords.last().unwrap().spd, 0.0);
    assert_eq!(done.start_zone, "free");
    assert_eq!(done.end_zone, "free");

    assert_eq!(h.backend.completions(), vec![("srv-1".to_string(), "free".to_string())]);

    // The follow-up trip runs the route in reverse and is still open.
    let st = h.sim.sim_state(ID1).unwrap();
    assert!(st.rental.active);
    assert_eq!(st.rental.rental_id.as_deref(), Some("srv-2"));
}

#[test]
fn s1_user_is_drawn_for_the_ride_and_returned_after() {
    let mut h = trip_harness();
    assert_eq!(h.sim.user_pool_len(), 20, "fallback pool");

    h.sim.run_ticks(10);
    assert_eq!(h.sim.user_pool_len(), 19, "rider checked out");

    h.sim.run_ticks(50);
    // Trip 1 done (user returned), trip 2 running (next user drawn).
    assert_eq!(h.sim.user_pool_len(), 19);
    assert_eq!(h.sim.sim_state(ID1).unwrap().trips, 1);
}

#[test]
fn state_key_is_overwritten_once_per_tick() {
    let mut h = trip_harness();
    h.sim.run_ticks(7);
    assert_eq!(h.bus.set_count("scooter:1"), 7);
}

#[test]
fn battery_stays_clamped_throughout() {
    let mut h = trip_harness();
    h.sim.run_ticks(100);
    let s = h.sim.scooter(ID1).unwrap();
    let p = h.sim.params();
    assert!(s.battery >= p.min_battery && s.battery <= p.battery_full);
}

// ── S2: admin deactivation mid-rental ─────────────────────────────────────────

#[test]
fn s2_admin_deactivation_force_completes_and_locks() {
    let mut h = trip_harness();
    h.sim.run_ticks(10);
    assert!(h.sim.sim_state(ID1).unwrap().rental.active);

    h.sim
        .admin_inbox()
        .push(AdminStatusUpdate::new(ID1, Status::Deactivated));
    h.sim.tick();

    // Backend got the deactivation, the rental force-completed.
    assert!(h.backend.status_writes(ID1).contains(&Status::Deactivated));
    assert_eq!(
        h.backend.completions(),
        vec![("srv-1".to_string(), "admin_forced".to_string())]
    );
    let events = completed_events(&h.bus);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].end_zone, "admin_forced");

    let st = h.sim.sim_state(ID1).unwrap();
    assert!(st.locks.admin);
    assert!(st.locks.is_deactivated());
    assert!(!st.rental.active);

    // Frozen from here on; no further completions ever appear.
    let pos = h.sim.scooter(ID1).unwrap().pos;
    h.sim.run_ticks(20);
    assert_eq!(h.sim.scooter(ID1).unwrap().pos, pos);
    assert_eq!(h.sim.scooter(ID1).unwrap().status, Status::Deactivated);
    assert_eq!(completed_events(&h.bus).len(), 1);
}

#[test]
fn s2_applying_the_same_admin_update_twice_is_idempotent() {
    let mut h = trip_harness();
    h.sim.run_ticks(5);

    h.sim
        .admin_inbox()
        .push(AdminStatusUpdate::new(ID1, Status::Deactivated));
    h.sim.tick();
    h.sim
        .admin_inbox()
        .push(AdminStatusUpdate::new(ID1, Status::Deactivated));
    h.sim.tick();

    let st = h.sim.sim_state(ID1).unwrap();
    assert!(st.locks.admin && st.locks.is_deactivated());
    assert_eq!(h.sim.scooter(ID1).unwrap().status, Status::Deactivated);
    // The one rental completed exactly once.
    assert_eq!(completed_events(&h.bus).len(), 1);
}

#[test]
fn admin_available_is_rejected_while_rental_is_live() {
    let mut h = trip_harness();
    h.sim.run_ticks(10);
    let before = h.sim.scooter(ID1).unwrap().status;

    h.sim
        .admin_inbox()
        .push(AdminStatusUpdate::new(ID1, Status::Available));
    h.sim.tick();

    // Rejected: the rental stays live and the backend was rolled back to
    // the prior status rather than set available.
    assert!(h.sim.sim_state(ID1).unwrap().rental.active);
    assert!(!h.backend.status_writes(ID1).contains(&Status::Available));
    assert!(h.backend.status_writes(ID1).contains(&before));
}

#[test]
fn only_the_last_queued_admin_update_per_scooter_applies() {
    let mut h = trip_harness();
    let inbox = h.sim.admin_inbox();
    inbox.push(AdminStatusUpdate::new(ID1, Status::Deactivated));
    inbox.push(AdminStatusUpdate::new(ID1, Status::OnService));
    h.sim.tick();

    assert_eq!(h.sim.scooter(ID1).unwrap().status, Status::OnService);
    // Exactly one write: the superseded update never reached the backend.
    assert_eq!(h.backend.status_writes(ID1), vec![Status::OnService]);
}

#[test]
fn admin_update_for_unknown_scooter_is_dropped() {
    let mut h = trip_harness();
    h.sim
        .admin_inbox()
        .push(AdminStatusUpdate::new(ScooterId(99), Status::Deactivated));
    h.sim.tick();
    // Nothing written for anyone but the regular flow.
    assert!(!h.backend.status_writes(ScooterId(99)).contains(&Status::Deactivated));
}

// ── S3: out-of-bounds ─────────────────────────────────────────────────────────

/// A scooter seeded just inside the boundary, on a route that exits the city.
fn oob_harness() -> Harness {
    let city = City::new(
        "smalltown",
        vec![spec("city", square_wkt(13.0, 55.0, 13.1, 55.1))],
    );
    let mut routes = RouteTable::new();
    routes
        .insert(
            RouteId(0),
            vec![GeoPoint::new(55.05, 13.098), GeoPoint::new(55.05, 13.25)],
        )
        .unwrap();
    harness_with(
        vec![Scooter::new(ID1, GeoPoint::new(55.05, 13.098), 100.0)],
        routes,
        city,
        SimParams::default(),
    )
}

#[test]
fn s3_out_of_bounds_deactivates_once_and_freezes() {
    let mut h = oob_harness();
    h.sim.run_ticks(12);

    let st = h.sim.sim_state(ID1).unwrap();
    assert!(st.locks.out_of_bounds, "must be locked out-of-bounds by now");
    assert_eq!(h.sim.scooter(ID1).unwrap().status, Status::Deactivated);

    // The rental that was under way completed with the forced end zone.
    assert_eq!(
        h.backend.completions(),
        vec![("srv-1".to_string(), "outofbounds".to_string())]
    );

    // One deactivation write, not one per tick spent outside.
    let pos = h.sim.scooter(ID1).unwrap().pos;
    h.sim.run_ticks(10);
    assert_eq!(h.sim.scooter(ID1).unwrap().pos, pos);
    let deactivation_writes = h
        .backend
        .status_writes(ID1)
        .iter()
        .filter(|s| **s == Status::Deactivated)
        .count();
    assert_eq!(deactivation_writes, 1);
}

#[test]
fn admin_available_resets_an_out_of_bounds_lock() {
    let mut h = oob_harness();
    h.sim.run_ticks(12);
    assert!(h.sim.sim_state(ID1).unwrap().locks.out_of_bounds);

    h.sim
        .admin_inbox()
        .push(AdminStatusUpdate::new(ID1, Status::Available));
    h.sim.tick();

    // The lock was cleared — and because the scooter still stands outside
    // the boundary, policy re-asserted it within the same tick.
    let writes = h.backend.status_writes(ID1);
    assert!(writes.contains(&Status::Available));
    assert_eq!(*writes.last().unwrap(), Status::Deactivated);
    assert!(h.sim.sim_state(ID1).unwrap().locks.out_of_bounds);
}

// ── S4: external rentals ──────────────────────────────────────────────────────

#[test]
fn s4_external_rental_logs_coords_and_blocks_sim_rentals() {
    // No route bound: the scooter would otherwise just sit idle.
    let mut h = harness_with(
        vec![Scooter::new(ID1, GeoPoint::new(55.60, 12.99), 100.0)],
        RouteTable::new(),
        test_city(),
        SimParams::default(),
    );

    h.sim.rental_inbox().push(RentalEvent::RentalStarted {
        scooter_id: ID1,
        rental_id: "ext-1".to_string(),
        user_id: Some(7),
        user_name: Some("Ada".to_string()),
    });
    h.sim.run_ticks(5);

    let st = h.sim.sim_state(ID1).unwrap();
    assert!(st.external.active);
    assert_eq!(st.external.rental_id.as_deref(), Some("ext-1"));
    assert!(!st.rental.active, "no sim-owned rental may start");
    assert_eq!(h.sim.scooter(ID1).unwrap().status, Status::Active);

    // One opening breadcrumb plus one per tick; state keeps broadcasting.
    let coords = h.bus.range_all("rental:ext-1:coords").unwrap();
    assert_eq!(coords.len(), 6);
    assert_eq!(h.bus.set_count("scooter:1"), 5);

    // No rental was created by the simulator for this ride.
    assert!(!h
        .backend
        .calls()
        .iter()
        .any(|c| matches!(c, BackendCall::CreateRental { .. })));

    h.sim.rental_inbox().push(RentalEvent::RentalEnded {
        scooter_id: ID1,
        rental_id: "ext-1".to_string(),
    });
    h.sim.tick();

    let st = h.sim.sim_state(ID1).unwrap();
    assert!(!st.external.active);
    // The drain restored `available`; the same tick's integration then
    // relaxes an unrented, healthy scooter to plain idle.
    assert_eq!(h.sim.scooter(ID1).unwrap().status, Status::Idle);
}

#[test]
fn s4_external_start_is_refused_while_sim_rental_is_active() {
    let mut h = trip_harness();
    h.sim.run_ticks(10);
    assert!(h.sim.sim_state(ID1).unwrap().rental.active);

    h.sim.rental_inbox().push(RentalEvent::RentalStarted {
        scooter_id: ID1,
        rental_id: "ext-9".to_string(),
        user_id: None,
        user_name: None,
    });
    h.sim.tick();

    let st = h.sim.sim_state(ID1).unwrap();
    assert!(!st.external.active, "sim and external rentals are mutually exclusive");
    assert!(st.rental.active);
}

#[test]
fn external_end_with_mismatched_id_still_ends() {
    let mut h = harness_with(
        vec![Scooter::new(ID1, GeoPoint::new(55.60, 12.99), 100.0)],
        RouteTable::new(),
        test_city(),
        SimParams::default(),
    );

    h.sim.rental_inbox().push(RentalEvent::RentalStarted {
        scooter_id: ID1,
        rental_id: "ext-1".to_string(),
        user_id: None,
        user_name: None,
    });
    h.sim.tick();
    h.sim.rental_inbox().push(RentalEvent::RentalEnded {
        scooter_id: ID1,
        rental_id: "ext-OTHER".to_string(),
    });
    h.sim.tick();

    assert!(!h.sim.sim_state(ID1).unwrap().external.active);
}

// ── S5: low-battery deferral ──────────────────────────────────────────────────

#[test]
fn s5_battery_lock_is_deferred_until_the_rental_ends() {
    let mut h = harness_with(
        vec![Scooter::new(ID1, GeoPoint::new(55.60, 12.99), 20.05)],
        trip_route(),
        test_city(),
        SimParams::default(),
    );

    // Mid-ride: below the threshold, flagged, but still moving.
    h.sim.run_ticks(20);
    let st = h.sim.sim_state(ID1).unwrap();
    assert!(h.sim.scooter(ID1).unwrap().battery < 20.0);
    assert!(st.rental.active);
    assert!(st.pending_battery_lock);
    assert!(!st.locks.is_deactivated(), "the ride may finish first");

    // After the route completes, the deferred lock lands.
    h.sim.run_ticks(40);
    let st = h.sim.sim_state(ID1).unwrap();
    assert_eq!(st.trips, 1);
    assert!(st.locks.battery);
    assert!(!st.pending_battery_lock);
    assert_eq!(h.sim.scooter(ID1).unwrap().status, Status::NeedCharging);

    let frozen = h.sim.scooter(ID1).unwrap().pos;
    h.sim.run_ticks(10);
    assert_eq!(h.sim.scooter(ID1).unwrap().pos, frozen);
}

#[test]
fn battery_exactly_at_threshold_is_still_rentable() {
    // Idle drain zeroed so the seeded 20.0 reaches the rental gate intact
    // (integration runs before the rental phase within a tick).
    let params = SimParams {
        battery_drain_idle: 0.0,
        ..SimParams::default()
    };
    let mut h = harness_with(
        vec![Scooter::new(ID1, GeoPoint::new(55.60, 12.99), 20.0)],
        trip_route(),
        test_city(),
        params,
    );
    h.sim.tick();
    let st = h.sim.sim_state(ID1).unwrap();
    assert!(st.rental.active, "strict less-than: 20.0 is rentable");
    assert!(!st.pending_battery_lock);
    assert!(!st.locks.is_deactivated());
}

#[test]
fn idle_low_battery_locks_immediately() {
    // No rental, no route: nothing defers the lock.
    let mut h = harness_with(
        vec![Scooter::new(ID1, GeoPoint::new(55.60, 12.99), 10.0)],
        RouteTable::new(),
        test_city(),
        SimParams::default(),
    );
    h.sim.tick();
    let st = h.sim.sim_state(ID1).unwrap();
    assert!(st.locks.battery && st.locks.is_deactivated());
    assert_eq!(h.backend.status_writes(ID1), vec![Status::NeedCharging]);
}

// ── S6: charging memoization ──────────────────────────────────────────────────

#[test]
fn s6_charging_status_writes_once_per_transition() {
    // Parked inside the charging square with a low battery: the scooter is
    // battery-locked, then charges through the low threshold.  Expected
    // backend writes across 100 ticks: needCharging (lock), chargingLow,
    // charging — one per transition, nothing per-tick.
    let mut h = harness_with(
        vec![Scooter::new(ID1, GeoPoint::new(55.67, 13.07), 10.0)],
        RouteTable::new(),
        test_city(),
        SimParams::default(),
    );

    h.sim.run_ticks(100);

    assert_eq!(
        h.backend.status_writes(ID1),
        vec![Status::NeedCharging, Status::ChargingLow, Status::Charging]
    );
    assert!(h.sim.scooter(ID1).unwrap().battery > 20.0);

    // The published state reflects the charging zone.
    let state = last_state(&h.bus, 1);
    assert!(state.in_charging_zone);
    assert_eq!(state.st, Status::Charging);
}

#[test]
fn charging_write_is_memoized_across_ticks() {
    // Healthy battery, idling on a charger: a single `charging` write no
    // matter how many ticks pass.
    let mut h = harness_with(
        vec![Scooter::new(ID1, GeoPoint::new(55.67, 13.07), 80.0)],
        RouteTable::new(),
        test_city(),
        SimParams::default(),
    );

    h.sim.run_ticks(10);
    assert_eq!(h.backend.status_writes(ID1), vec![Status::Charging]);
    assert_eq!(h.sim.scooter(ID1).unwrap().status, Status::Charging);
}

// ── Queue-drain contracts ─────────────────────────────────────────────────────

#[test]
fn draining_empty_queues_is_a_no_op() {
    let mut h = harness_with(
        vec![Scooter::new(ID1, GeoPoint::new(55.60, 12.99), 100.0)],
        RouteTable::new(),
        test_city(),
        SimParams::default(),
    );
    h.sim.run_ticks(3);
    // No admin or rental input: the only backend traffic is the user fetch
    // at build time.
    assert_eq!(h.backend.calls(), vec![BackendCall::FetchUsers]);
}

#[test]
fn only_the_last_queued_rental_event_per_scooter_applies() {
    let mut h = harness_with(
        vec![Scooter::new(ID1, GeoPoint::new(55.60, 12.99), 100.0)],
        RouteTable::new(),
        test_city(),
        SimParams::default(),
    );
    let inbox = h.sim.rental_inbox();
    inbox.push(RentalEvent::RentalStarted {
        scooter_id: ID1,
        rental_id: "ext-1".to_string(),
        user_id: None,
        user_name: None,
    });
    inbox.push(RentalEvent::RentalEnded {
        scooter_id: ID1,
        rental_id: "ext-1".to_string(),
    });
    h.sim.tick();

    // Only the end applied; the scooter never entered external mode.
    assert!(!h.sim.sim_state(ID1).unwrap().external.active);
}

// ── Movement integrator ───────────────────────────────────────────────────────

#[test]
fn a_half_turn_sheds_forty_percent_of_speed() {
    // Two waypoints straight back along the approach direction: with a step
    // large enough to snap each tick, tick one heads north, tick two heads
    // south — a π turn, capped at the 0.4 slowdown.
    let params = SimParams {
        nominal_max_speed_mps: 100.0,
        ..SimParams::default()
    };
    let mut routes = RouteTable::new();
    routes
        .insert(
            RouteId(0),
            vec![GeoPoint::new(0.001, 0.0), GeoPoint::new(0.0, 0.0)],
        )
        .unwrap();
    let route = routes.directed(RouteId(0), 0).unwrap();

    let start = GeoPoint::new(0.0, 0.0);
    let mut next_waypoint = 0;
    let mut last_direction = None;

    let first = follow_route(start, route, &mut next_waypoint, &mut last_direction, &params);
    assert!(!first.route_finished);

    let second = follow_route(
        first.pos,
        route,
        &mut next_waypoint,
        &mut last_direction,
        &params,
    );
    assert!(second.route_finished);

    let leg = GeoPoint::new(0.001, 0.0).distance_m(GeoPoint::new(0.0, 0.0));
    let raw_kmh = leg / params.update_interval_secs * 3.6;
    let expected = (raw_kmh * 0.6 * 100.0).round() / 100.0;
    assert!((second.speed_kmh - expected).abs() < 1e-9,
        "got {}, expected {expected}", second.speed_kmh);
}

#[test]
fn single_waypoint_route_finishes_immediately() {
    let mut routes = RouteTable::new();
    routes
        .insert(RouteId(0), vec![GeoPoint::new(55.60, 12.99)])
        .unwrap();
    let mut h = harness_with(
        vec![Scooter::new(ID1, GeoPoint::new(55.60, 12.99), 100.0)],
        routes,
        test_city(),
        SimParams::default(),
    );

    // Tick 1 starts the rental; tick 2's movement snaps and finishes it.
    h.sim.run_ticks(2);
    let st = h.sim.sim_state(ID1).unwrap();
    assert_eq!(st.trips, 1);
    let events = completed_events(&h.bus);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].coords.len(), 1);
    assert_eq!(events[0].coords[0].spd, 0.0);
}

#[test]
fn route_direction_alternates_with_trip_parity() {
    let routes = trip_route();
    let forward = routes.directed(RouteId(0), 0).unwrap();
    let backward = routes.directed(RouteId(0), 1).unwrap();
    assert_eq!(forward.point(0), GeoPoint::new(55.60, 12.99));
    assert_eq!(backward.point(0), GeoPoint::new(55.61, 13.00));
    assert_eq!(backward.point(1), GeoPoint::new(55.60, 12.99));
}

#[test]
fn routes_load_from_csv() {
    let csv = "\
route_id,seq,lat,lon
1,1,55.61,13.00
1,0,55.60,12.99
0,0,55.59,12.98
";
    let table = RouteTable::from_csv_reader(std::io::Cursor::new(csv)).unwrap();
    assert_eq!(table.len(), 2);
    // Rows sort by seq within a route.
    assert_eq!(table.get(RouteId(1)).unwrap()[0], GeoPoint::new(55.60, 12.99));
    assert_eq!(table.ids(), &[RouteId(0), RouteId(1)]);
}

// ── Lock state ────────────────────────────────────────────────────────────────

#[test]
fn first_lock_reason_owns_the_override() {
    use crate::locks::{LockReason, LockState};

    let mut locks = LockState::default();
    assert!(locks.engage(LockReason::Battery), "first engage installs");
    assert!(!locks.engage(LockReason::Admin), "second engage only tags");
    assert_eq!(locks.owner, Some(LockReason::Battery));
    assert!(locks.admin && locks.battery);

    // Dropping the admin tag must not release a battery-owned lock.
    locks.release_admin();
    assert!(locks.is_deactivated());
    assert_eq!(locks.owner, Some(LockReason::Battery));
}

#[test]
fn releasing_the_only_reason_unlocks() {
    use crate::locks::{LockReason, LockState};

    let mut locks = LockState::default();
    locks.engage(LockReason::Admin);
    locks.release_admin();
    assert!(!locks.is_deactivated());
    assert_eq!(locks.owner, None);

    locks.engage(LockReason::OutOfBounds);
    locks.clear();
    assert!(!locks.is_deactivated() && !locks.out_of_bounds);
}

// ── Rental token ──────────────────────────────────────────────────────────────

#[test]
fn rental_tokens_are_ten_lowercase_alphanumerics() {
    use rand::SeedableRng;
    let mut rng = rand::rngs::SmallRng::seed_from_u64(7);
    for _ in 0..50 {
        let token = new_rental_token(&mut rng);
        assert_eq!(token.len(), 10);
        assert!(token.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }
}

// ── Builder validation ────────────────────────────────────────────────────────

#[test]
fn builder_rejects_binding_count_mismatch() {
    let result = SimulatorBuilder::new(
        SimParams::default(),
        test_city(),
        RecordingBackend::new(),
        InMemoryBus::new(),
    )
    .scooters(vec![Scooter::new(ID1, GeoPoint::new(55.6, 13.0), 100.0)])
    .route_bindings(vec![None, None])
    .build();
    assert!(matches!(result, Err(SimError::CountMismatch { .. })));
}

#[test]
fn builder_rejects_unknown_route_binding() {
    let result = SimulatorBuilder::new(
        SimParams::default(),
        test_city(),
        RecordingBackend::new(),
        InMemoryBus::new(),
    )
    .scooters(vec![Scooter::new(ID1, GeoPoint::new(55.6, 13.0), 100.0)])
    .route_bindings(vec![Some(RouteId(9))])
    .build();
    assert!(matches!(result, Err(SimError::UnknownRoute { .. })));
}

#[test]
fn builder_rejects_duplicate_scooter_ids() {
    let result = SimulatorBuilder::new(
        SimParams::default(),
        test_city(),
        RecordingBackend::new(),
        InMemoryBus::new(),
    )
    .scooters(vec![
        Scooter::new(ID1, GeoPoint::new(55.6, 13.0), 100.0),
        Scooter::new(ID1, GeoPoint::new(55.6, 13.0), 100.0),
    ])
    .build();
    assert!(matches!(result, Err(SimError::DuplicateScooter(_))));
}
