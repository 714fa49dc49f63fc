//! Small Malmö fleet demo.
//!
//! Three scooters on fixed routes through central Malmö, wired against the
//! in-process bus and the recording backend so the whole thing runs
//! self-contained.  Scooter 3 retires to the nearest charging zone after two
//! trips.  Run with `RUST_LOG=info` to watch the lifecycle.
//!
//! Usage: `malmo_small [ticks]` (default 240 ticks — 20 simulated minutes).

use std::sync::Arc;

use fleet_backend::RecordingBackend;
use fleet_city::{City, ZoneSpec};
use fleet_core::{GeoPoint, RouteId, ScooterId, SimParams};
use fleet_events::{AdminInbox, AdminStatusListener, RentalEventListener, RentalInbox};
use fleet_scooter::Scooter;
use fleet_sim::{ParkInNearestChargingZone, RouteTable, SimulatorBuilder};
use fleet_telemetry::{Bus, InMemoryBus};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn zone(zone_type: &str, wkt: &str, speed_limit: Option<f64>) -> ZoneSpec {
    ZoneSpec {
        zone_type: zone_type.to_string(),
        coordinates_wkt: wkt.to_string(),
        speed_limit,
    }
}

/// Central Malmö, heavily simplified: the city boundary, a slow zone around
/// Lilla Torg, a parking square at the central station, and a charging
/// square in Västra Hamnen.
fn malmo() -> City {
    City::new(
        "malmo",
        vec![
            zone(
                "city",
                "POLYGON ((12.94 55.56, 13.06 55.56, 13.06 55.63, 12.94 55.63, 12.94 55.56))",
                None,
            ),
            zone(
                "slow",
                "POLYGON ((12.995 55.603, 13.001 55.603, 13.001 55.607, 12.995 55.607, 12.995 55.603))",
                Some(5.0),
            ),
            zone(
                "parking",
                "POLYGON ((12.998 55.608, 13.004 55.608, 13.004 55.612, 12.998 55.612, 12.998 55.608))",
                None,
            ),
            zone(
                "charging",
                "POLYGON ((12.975 55.612, 12.983 55.612, 12.983 55.618, 12.975 55.618, 12.975 55.612))",
                Some(4.0),
            ),
        ],
    )
}

fn routes() -> anyhow::Result<RouteTable> {
    let mut table = RouteTable::new();
    // Station → Turning Torso.
    table
        .insert(
            RouteId(0),
            vec![
                GeoPoint::new(55.6090, 13.0007),
                GeoPoint::new(55.6110, 12.9950),
                GeoPoint::new(55.6133, 12.9883),
            ],
        )?;
    // Lilla Torg loop.
    table
        .insert(
            RouteId(1),
            vec![
                GeoPoint::new(55.6045, 12.9980),
                GeoPoint::new(55.6052, 13.0021),
                GeoPoint::new(55.6070, 13.0040),
            ],
        )?;
    // Harbour run, ending at the charging square.
    table
        .insert(
            RouteId(2),
            vec![
                GeoPoint::new(55.6100, 12.9900),
                GeoPoint::new(55.6140, 12.9820),
                GeoPoint::new(55.6150, 12.9790),
            ],
        )?;
    Ok(table)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let ticks: u64 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(240);

    let bus = InMemoryBus::new();
    let backend = RecordingBackend::new();

    let admin_inbox = Arc::new(AdminInbox::new());
    let rental_inbox = Arc::new(RentalInbox::new());
    let _admin_listener = AdminStatusListener::spawn(&bus, Arc::clone(&admin_inbox))?;
    let _rental_listener = RentalEventListener::spawn(&bus, Arc::clone(&rental_inbox))?;

    let scooters = vec![
        Scooter::new(ScooterId(1), GeoPoint::new(55.6090, 13.0007), 100.0),
        Scooter::new(ScooterId(2), GeoPoint::new(55.6045, 12.9980), 86.0),
        Scooter::new(ScooterId(3), GeoPoint::new(55.6100, 12.9900), 64.0),
    ];

    let routes = routes()?;
    for &id in routes.ids() {
        info!(route = %id, length_m = routes.length_m(id).unwrap_or(0.0), "route loaded");
    }

    let mut sim = SimulatorBuilder::new(SimParams::default(), malmo(), backend.clone(), bus.clone())
        .scooters(scooters)
        .routes(routes)
        .hook(ScooterId(3), Box::new(ParkInNearestChargingZone::new(2)))
        .admin_inbox(admin_inbox)
        .rental_inbox(rental_inbox)
        .build()?;

    info!(ticks, "running demo fleet");
    sim.run_ticks(ticks);

    let completed = bus.range_all("completed_rentals").unwrap_or_default();
    println!("simulated {ticks} ticks");
    println!("completed rentals: {}", completed.len());
    for id in [1u32, 2, 3] {
        if let Some(state) = bus.get(&format!("scooter:{id}")) {
            println!("scooter {id}: {state}");
        }
    }
    println!("backend calls observed: {}", backend.calls().len());
    Ok(())
}
