//! Queued message types and their wire parsing.

use std::time::SystemTime;

use fleet_core::{ScooterId, Status};
use serde::Deserialize;
use tracing::warn;

// ── Admin status updates ──────────────────────────────────────────────────────

/// One queued admin override: set scooter `scooter_id` to `status`.
#[derive(Clone, Debug)]
pub struct AdminStatusUpdate {
    pub scooter_id: ScooterId,
    pub status: Status,
    /// When the message was received off the bus.  Informational only; the
    /// drain applies queue order.
    pub received_at: SystemTime,
}

#[derive(Deserialize)]
struct AdminWire {
    id: ScooterId,
    status: Status,
}

impl AdminStatusUpdate {
    pub fn new(scooter_id: ScooterId, status: Status) -> Self {
        Self {
            scooter_id,
            status,
            received_at: SystemTime::now(),
        }
    }

    /// Parse an `admin:scooter_status_update` payload: `{"id": …, "status": …}`.
    /// Malformed payloads are dropped with a warning.
    pub fn parse(raw: &str) -> Option<Self> {
        match serde_json::from_str::<AdminWire>(raw) {
            Ok(wire) => Some(Self::new(wire.id, wire.status)),
            Err(e) => {
                warn!(error = %e, payload = raw, "dropping malformed admin update");
                None
            }
        }
    }
}

// ── Rental lifecycle events ───────────────────────────────────────────────────

/// One queued external-rental lifecycle event.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RentalEvent {
    RentalStarted {
        scooter_id: ScooterId,
        rental_id: String,
        #[serde(default)]
        user_id: Option<i64>,
        #[serde(default)]
        user_name: Option<String>,
    },
    RentalEnded {
        scooter_id: ScooterId,
        rental_id: String,
    },
}

impl RentalEvent {
    pub fn scooter_id(&self) -> ScooterId {
        match self {
            RentalEvent::RentalStarted { scooter_id, .. }
            | RentalEvent::RentalEnded { scooter_id, .. } => *scooter_id,
        }
    }

    /// Parse a `rental:lifecycle` payload.
    ///
    /// Unknown event types, and payloads missing `scooter_id`/`rental_id`,
    /// are dropped with a warning — the distinction matters for operators
    /// grepping logs, so the two cases warn differently.
    pub fn parse(raw: &str) -> Option<Self> {
        let value: serde_json::Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, payload = raw, "dropping unparseable rental event");
                return None;
            }
        };

        match value.get("type").and_then(|t| t.as_str()) {
            Some("rental_started" | "rental_ended") => {}
            other => {
                warn!(event_type = ?other, "ignoring unknown rental event type");
                return None;
            }
        }

        match serde_json::from_value::<RentalEvent>(value) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(error = %e, payload = raw,
                    "dropping rental event with missing scooter_id/rental_id");
                None
            }
        }
    }
}
