//! `fleet-telemetry` — the scooter fleet's transmitter side.
//!
//! The simulator never talks to a concrete message broker; it talks to the
//! [`Bus`] port, which models the handful of primitives the fleet needs from
//! one (channel publish, key set, list push/read).  [`InMemoryBus`] is the
//! in-process implementation used by tests, demos, and the listener threads;
//! a networked adapter implements the same trait in the embedding binary.
//!
//! [`Broadcaster`] layers the fleet's domain operations on top of a bus:
//! per-tick state broadcast, per-rental breadcrumb trails, and
//! completed-rental events.
//!
//! | Module        | Contents                                          |
//! |---------------|---------------------------------------------------|
//! | [`bus`]       | `Bus` trait, `BusError`, `InMemoryBus`            |
//! | [`broadcast`] | `Broadcaster` — domain operations over a bus      |
//! | [`payload`]   | wire payload structs                              |

pub mod broadcast;
pub mod bus;
pub mod payload;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use broadcast::Broadcaster;
pub use bus::{Bus, BusError, InMemoryBus};
pub use payload::{CompletedRental, StatePayload, TrailPoint};
