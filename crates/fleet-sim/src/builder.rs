//! Fluent, validated construction of a [`Simulator`].

use std::sync::Arc;

use fleet_backend::Backend;
use fleet_city::City;
use fleet_core::{RouteId, ScooterId, SimParams, TickClock};
use fleet_events::{AdminInbox, RentalInbox};
use fleet_scooter::Scooter;
use fleet_telemetry::{Broadcaster, Bus};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rustc_hash::FxHashMap;

use crate::error::SimError;
use crate::hooks::ScenarioHook;
use crate::routes::RouteTable;
use crate::simulator::{ScooterSimState, Simulator};

/// Builder for [`Simulator<A, B>`].
///
/// # Required inputs
///
/// - [`SimParams`], a loaded [`City`], a [`Backend`], and a [`Bus`]
/// - the seeded scooters ([`scooters`][Self::scooters])
///
/// # Optional inputs
///
/// | Method              | Default                                         |
/// |---------------------|-------------------------------------------------|
/// | `.routes(t)`        | empty table (scooters stand still)              |
/// | `.route_bindings(v)`| n-th scooter → n-th inserted route              |
/// | `.hook(id, h)`      | no scenario hooks                               |
/// | `.admin_inbox(a)`   | a fresh inbox (get it back via the simulator)   |
/// | `.rental_inbox(a)`  | a fresh inbox                                   |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimulatorBuilder::new(params, city, backend, bus)
///     .scooters(scooters)
///     .routes(routes)
///     .hook(ScooterId(3), Box::new(ParkInNearestChargingZone::new(2)))
///     .build()?;
/// sim.run(&stop);
/// ```
pub struct SimulatorBuilder<A: Backend, B: Bus> {
    params: SimParams,
    city: City,
    backend: A,
    bus: B,
    scooters: Vec<Scooter>,
    routes: RouteTable,
    bindings: Option<Vec<Option<RouteId>>>,
    hooks: FxHashMap<ScooterId, Box<dyn ScenarioHook>>,
    admin_inbox: Option<Arc<AdminInbox>>,
    rental_inbox: Option<Arc<RentalInbox>>,
}

impl<A: Backend, B: Bus> SimulatorBuilder<A, B> {
    pub fn new(params: SimParams, city: City, backend: A, bus: B) -> Self {
        Self {
            params,
            city,
            backend,
            bus,
            scooters: Vec::new(),
            routes: RouteTable::new(),
            bindings: None,
            hooks: FxHashMap::default(),
            admin_inbox: None,
            rental_inbox: None,
        }
    }

    /// The fleet, in registration order.  Tick processing follows this order.
    pub fn scooters(mut self, scooters: Vec<Scooter>) -> Self {
        self.scooters = scooters;
        self
    }

    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    /// Explicit scooter-to-route bindings (one entry per scooter, `None` for
    /// unbound).  Without this, the n-th scooter is bound to the n-th
    /// inserted route; surplus scooters stay unbound.
    pub fn route_bindings(mut self, bindings: Vec<Option<RouteId>>) -> Self {
        self.bindings = Some(bindings);
        self
    }

    /// Register a scenario hook for one scooter.
    pub fn hook(mut self, scooter_id: ScooterId, hook: Box<dyn ScenarioHook>) -> Self {
        self.hooks.insert(scooter_id, hook);
        self
    }

    /// Use an externally shared admin inbox (listeners push into it).
    pub fn admin_inbox(mut self, inbox: Arc<AdminInbox>) -> Self {
        self.admin_inbox = Some(inbox);
        self
    }

    /// Use an externally shared rental-event inbox.
    pub fn rental_inbox(mut self, inbox: Arc<RentalInbox>) -> Self {
        self.rental_inbox = Some(inbox);
        self
    }

    /// Validate bindings, fetch the user pool, and assemble the simulator.
    pub fn build(self) -> Result<Simulator<A, B>, SimError> {
        let scooter_count = self.scooters.len();

        let bindings = match self.bindings {
            Some(b) => {
                if b.len() != scooter_count {
                    return Err(SimError::CountMismatch {
                        expected: scooter_count,
                        got: b.len(),
                        what: "route bindings",
                    });
                }
                b
            }
            None => {
                // Default: zip the fleet with the routes in insertion order.
                let route_ids = self.routes.ids();
                (0..scooter_count)
                    .map(|i| route_ids.get(i).copied())
                    .collect()
            }
        };

        let mut slot_by_id = FxHashMap::default();
        let mut state = Vec::with_capacity(scooter_count);
        for (i, scooter) in self.scooters.iter().enumerate() {
            if slot_by_id.insert(scooter.id, i).is_some() {
                return Err(SimError::DuplicateScooter(scooter.id));
            }
            if let Some(route_id) = bindings[i] {
                if self.routes.get(route_id).is_none() {
                    return Err(SimError::UnknownRoute {
                        scooter: scooter.id,
                        route: route_id,
                    });
                }
            }
            state.push(ScooterSimState::new(bindings[i], scooter.pos));
        }

        // The pool comes from the backend; a failed fetch degrades to the
        // synthetic fallback list inside the backend impl.
        let user_pool = self.backend.fetch_users();

        Ok(Simulator {
            clock: TickClock::new(self.params.update_interval_secs),
            rng: SmallRng::seed_from_u64(self.params.seed),
            params: self.params,
            city: self.city,
            backend: self.backend,
            broadcaster: Broadcaster::new(self.bus),
            routes: self.routes,
            scooters: self.scooters,
            state,
            slot_by_id,
            hooks: self.hooks,
            user_pool,
            admin_inbox: self.admin_inbox.unwrap_or_else(|| Arc::new(AdminInbox::new())),
            rental_inbox: self
                .rental_inbox
                .unwrap_or_else(|| Arc::new(RentalInbox::new())),
        })
    }
}
