//! Background bus subscribers feeding the inboxes.
//!
//! Each listener owns one thread that blocks on its bus subscription,
//! parses incoming JSON, and appends valid messages to the shared inbox.
//! Listeners never touch simulator state directly; the simulation thread
//! applies queued messages at the next tick boundary.
//!
//! A listener thread exits when the bus side of its subscription goes away.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use fleet_telemetry::{Bus, BusError};
use tracing::{debug, info};

use crate::inbox::{AdminInbox, RentalInbox};
use crate::message::{AdminStatusUpdate, RentalEvent};

/// Channel carrying admin status overrides (`{"id": …, "status": …}`).
pub const ADMIN_CHANNEL: &str = "admin:scooter_status_update";

/// Channel carrying external rental lifecycle events.
pub const RENTAL_CHANNEL: &str = "rental:lifecycle";

/// Subscriber thread for admin status updates.
pub struct AdminStatusListener {
    handle: JoinHandle<()>,
}

impl AdminStatusListener {
    /// Subscribe to [`ADMIN_CHANNEL`] and start the listener thread.
    pub fn spawn<B: Bus>(bus: &B, inbox: Arc<AdminInbox>) -> Result<Self, BusError> {
        let rx = bus.subscribe(ADMIN_CHANNEL)?;
        let handle = thread::spawn(move || {
            info!(channel = ADMIN_CHANNEL, "admin listener started");
            for raw in rx.iter() {
                if let Some(update) = AdminStatusUpdate::parse(&raw) {
                    debug!(scooter = %update.scooter_id, status = %update.status,
                        "queued admin status update");
                    inbox.push(update);
                }
            }
            info!("admin listener stopped");
        });
        Ok(Self { handle })
    }

    /// Wait for the listener thread to finish (after the bus shuts down).
    pub fn join(self) {
        let _ = self.handle.join();
    }
}

/// Subscriber thread for external rental lifecycle events.
pub struct RentalEventListener {
    handle: JoinHandle<()>,
}

impl RentalEventListener {
    /// Subscribe to [`RENTAL_CHANNEL`] and start the listener thread.
    pub fn spawn<B: Bus>(bus: &B, inbox: Arc<RentalInbox>) -> Result<Self, BusError> {
        let rx = bus.subscribe(RENTAL_CHANNEL)?;
        let handle = thread::spawn(move || {
            info!(channel = RENTAL_CHANNEL, "rental listener started");
            for raw in rx.iter() {
                if let Some(event) = RentalEvent::parse(&raw) {
                    debug!(scooter = %event.scooter_id(), "queued rental event");
                    inbox.push(event);
                }
            }
            info!("rental listener stopped");
        });
        Ok(Self { handle })
    }

    /// Wait for the listener thread to finish (after the bus shuts down).
    pub fn join(self) {
        let _ = self.handle.join();
    }
}
