//! `fleet-sim` — the tick engine that makes the scooters move.
//!
//! The [`Simulator`] advances the whole fleet one tick at a time:
//!
//! 1. Drain the admin inbox, then the rental-event inbox (last-write-wins
//!    per scooter, admin first).
//! 2. For every scooter, in registration order: battery lock check, movement
//!    resolution, zone classification and enforcement, battery/status
//!    integration, rental lifecycle, scenario hook, state publish.
//! 3. Sleep `update_interval_secs` (live runner only).
//!
//! One thread owns all simulator state; the listener threads of
//! `fleet-events` only ever touch the two inboxes.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                 |
//! |---------------|----------------------------------------------------------|
//! | [`routes`]    | `RouteTable`, alternating-direction views, CSV loading   |
//! | [`movement`]  | movement updates, overrides, the route integrator        |
//! | [`locks`]     | lock reason tags and the derived deactivated state       |
//! | [`rental`]    | sim-owned and external rental records                    |
//! | [`hooks`]     | `ScenarioHook` trait + the stock per-scooter scenarios   |
//! | [`builder`]   | `SimulatorBuilder` — validated construction              |
//! | [`simulator`] | the tick pipeline itself                                 |

pub mod builder;
pub mod error;
pub mod hooks;
pub mod locks;
pub mod movement;
pub mod rental;
pub mod routes;
pub mod simulator;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use builder::SimulatorBuilder;
pub use error::SimError;
pub use hooks::{
    BreakdownAfterRuntime, HookContext, ParkInNearestChargingZone,
    ParkInNearestParkingZone, ScenarioHook,
};
pub use locks::{LockReason, LockState};
pub use movement::{MovementOverride, MovementUpdate};
pub use rental::{EndZone, ExternalRental, RentalState};
pub use routes::{DirectedRoute, RouteError, RouteTable};
pub use simulator::{ScooterSimState, Simulator};
