//! `fleet-events` — cross-thread ingress for the simulator.
//!
//! Two kinds of input arrive from outside the simulation thread: admin
//! status overrides and external rental lifecycle events.  Both follow the
//! same pattern — a background listener thread subscribed to a bus channel
//! parses each message and appends it to a mutex-guarded FIFO
//! ([`Inbox`]); the simulator drains both inboxes at the top of every tick
//! and applies last-write-wins per scooter.
//!
//! The inboxes are the **only** cross-thread mutable state in the system.

pub mod inbox;
pub mod listener;
pub mod message;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use inbox::{AdminInbox, Inbox, RentalInbox};
pub use listener::{AdminStatusListener, RentalEventListener, ADMIN_CHANNEL, RENTAL_CHANNEL};
pub use message::{AdminStatusUpdate, RentalEvent};
