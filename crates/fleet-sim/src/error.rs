//! Simulator construction errors.

use fleet_core::{RouteId, ScooterId};
use thiserror::Error;

/// Validation failures caught by [`SimulatorBuilder`][crate::SimulatorBuilder].
#[derive(Debug, Error)]
pub enum SimError {
    #[error("expected {expected} {what}, got {got}")]
    CountMismatch {
        expected: usize,
        got: usize,
        what: &'static str,
    },

    #[error("scooter {scooter} is bound to unknown route {route}")]
    UnknownRoute { scooter: ScooterId, route: RouteId },

    #[error("duplicate scooter id {0}")]
    DuplicateScooter(ScooterId),
}
