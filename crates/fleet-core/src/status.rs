//! Operational scooter status.
//!
//! The status is a single string-valued state on the wire (`"chargingLow"`,
//! `"needService"`, …).  It doubles as the *activity* label the movement
//! resolver hands to the scooter entity each tick: the entity derives the
//! final status from the activity, the charging-zone flag, and the battery
//! level.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operational status of a scooter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Status {
    Idle,
    Active,
    Reduced,
    Charging,
    ChargingLow,
    NeedCharging,
    NeedService,
    Deactivated,
    OnService,
    Available,
}

/// Statuses that disqualify a scooter from starting a new rental.
pub const NON_RENTABLE: [Status; 6] = [
    Status::NeedService,
    Status::Deactivated,
    Status::OnService,
    Status::NeedCharging,
    Status::ChargingLow,
    Status::Reduced,
];

impl Status {
    /// The wire representation (camelCase, matching the backend).
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Idle         => "idle",
            Status::Active       => "active",
            Status::Reduced      => "reduced",
            Status::Charging     => "charging",
            Status::ChargingLow  => "chargingLow",
            Status::NeedCharging => "needCharging",
            Status::NeedService  => "needService",
            Status::Deactivated  => "deactivated",
            Status::OnService    => "onService",
            Status::Available    => "available",
        }
    }

    /// True when this status permits starting a new rental.
    #[inline]
    pub fn is_rentable(self) -> bool {
        !NON_RENTABLE.contains(&self)
    }

    /// True for the charging pair written by the charging-status sync
    /// (`charging` / `chargingLow`).
    #[inline]
    pub fn is_charging_class(self) -> bool {
        matches!(self, Status::Charging | Status::ChargingLow)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
