//! Scripted in-memory [`Backend`] for tests and demos.

use std::sync::{Arc, Mutex};

use fleet_city::ZoneSpec;
use fleet_core::{GeoPoint, ScooterId, Status};
use fleet_telemetry::TrailPoint;

use crate::error::BackendError;
use crate::types::{fallback_users, CreatedRental, User};
use crate::Backend;

/// One observed backend call, in invocation order.
#[derive(Clone, Debug, PartialEq)]
pub enum BackendCall {
    FetchUsers,
    FetchZones {
        city: String,
    },
    CreateRental {
        customer_id: i64,
        bike_id: ScooterId,
        start_zone: String,
    },
    CompleteRental {
        rental_id: String,
        end_zone: String,
        route_len: usize,
    },
    UpdateStatus {
        bike_id: ScooterId,
        status: Status,
        pos: GeoPoint,
    },
}

#[derive(Default)]
struct State {
    calls: Vec<BackendCall>,
    users: Vec<User>,
    zones: Option<Vec<ZoneSpec>>,
    next_rental: u32,
    fail_create: bool,
    fail_complete: bool,
}

/// A [`Backend`] that records every call and serves scripted responses.
///
/// Rental creation hands out sequential `srv-N` ids (the "server-assigned
/// id" of the contract) unless failure is scripted.  Clones share state, so
/// a test can keep a handle while the simulator owns another.
#[derive(Clone, Default)]
pub struct RecordingBackend {
    state: Arc<Mutex<State>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Scripting ─────────────────────────────────────────────────────────

    /// Serve these users from `fetch_users` (empty → fallback list).
    pub fn with_users(self, users: Vec<User>) -> Self {
        self.state.lock().unwrap().users = users;
        self
    }

    /// Serve these zone records from `fetch_zones`.
    pub fn with_zones(self, zones: Vec<ZoneSpec>) -> Self {
        self.state.lock().unwrap().zones = Some(zones);
        self
    }

    /// Make `create_rental` fail from now on.
    pub fn fail_create(&self, fail: bool) {
        self.state.lock().unwrap().fail_create = fail;
    }

    /// Make `complete_rental` fail from now on.
    pub fn fail_complete(&self, fail: bool) {
        self.state.lock().unwrap().fail_complete = fail;
    }

    // ── Inspection ────────────────────────────────────────────────────────

    /// Every call seen so far, in order.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// The status values written for one bike, in order.
    pub fn status_writes(&self, bike_id: ScooterId) -> Vec<Status> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter_map(|c| match c {
                BackendCall::UpdateStatus { bike_id: b, status, .. } if *b == bike_id => {
                    Some(*status)
                }
                _ => None,
            })
            .collect()
    }

    /// The rental completions seen so far, in order.
    pub fn completions(&self) -> Vec<(String, String)> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter_map(|c| match c {
                BackendCall::CompleteRental { rental_id, end_zone, .. } => {
                    Some((rental_id.clone(), end_zone.clone()))
                }
                _ => None,
            })
            .collect()
    }
}

impl Backend for RecordingBackend {
    fn fetch_users(&self) -> Vec<User> {
        let mut st = self.state.lock().unwrap();
        st.calls.push(BackendCall::FetchUsers);
        if st.users.is_empty() {
            fallback_users()
        } else {
            st.users.clone()
        }
    }

    fn fetch_zones(&self, city: &str) -> Result<Vec<ZoneSpec>, BackendError> {
        let mut st = self.state.lock().unwrap();
        st.calls.push(BackendCall::FetchZones { city: city.to_string() });
        st.zones
            .clone()
            .ok_or_else(|| BackendError::NotFound(format!("zones for city '{city}'")))
    }

    fn create_rental(
        &self,
        customer_id: i64,
        bike_id: ScooterId,
        _start_point: GeoPoint,
        start_zone: &str,
    ) -> Option<CreatedRental> {
        let mut st = self.state.lock().unwrap();
        st.calls.push(BackendCall::CreateRental {
            customer_id,
            bike_id,
            start_zone: start_zone.to_string(),
        });
        if st.fail_create {
            return None;
        }
        st.next_rental += 1;
        Some(CreatedRental {
            rental_id: format!("srv-{}", st.next_rental),
        })
    }

    fn complete_rental(
        &self,
        rental_id: &str,
        _end_point: GeoPoint,
        end_zone: &str,
        route: &[TrailPoint],
    ) -> bool {
        if route.is_empty() {
            return false;
        }
        let mut st = self.state.lock().unwrap();
        st.calls.push(BackendCall::CompleteRental {
            rental_id: rental_id.to_string(),
            end_zone: end_zone.to_string(),
            route_len: route.len(),
        });
        !st.fail_complete
    }

    fn update_status_and_position(
        &self,
        bike_id: ScooterId,
        status: Status,
        pos: GeoPoint,
    ) -> bool {
        let mut st = self.state.lock().unwrap();
        st.calls.push(BackendCall::UpdateStatus { bike_id, status, pos });
        true
    }
}
