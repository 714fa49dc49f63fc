//! Blocking HTTP implementation of the [`Backend`] port.

use std::time::{Duration, Instant};

use fleet_city::ZoneSpec;
use fleet_core::{GeoPoint, ScooterId, Status};
use fleet_telemetry::TrailPoint;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::BackendError;
use crate::types::{fallback_users, CreatedRental, User};
use crate::Backend;

// Per-endpoint timeouts.  Rental completion carries the full route payload
// and gets the longest budget; everything stays within one tick.
const USERS_TIMEOUT: Duration = Duration::from_secs(5);
const ZONES_TIMEOUT: Duration = Duration::from_secs(10);
const CREATE_TIMEOUT: Duration = Duration::from_secs(10);
const COMPLETE_TIMEOUT: Duration = Duration::from_secs(15);
const STATUS_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for the backend API.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL including the API prefix, e.g. `http://system:3000/api/v1`.
    pub base_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://system:3000/api/v1".to_string(),
        }
    }
}

/// Thin blocking HTTP client for the backend API.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

// ── Wire shapes ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CustomerWire {
    customer_id: i64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Serialize)]
struct PointWire {
    lat: f64,
    lng: f64,
}

impl From<GeoPoint> for PointWire {
    fn from(p: GeoPoint) -> Self {
        Self { lat: p.lat, lng: p.lon }
    }
}

#[derive(Serialize)]
struct CreateRentalWire<'a> {
    customer_id: i64,
    bike_id: ScooterId,
    start_point: PointWire,
    start_zone: &'a str,
}

#[derive(Serialize)]
struct CompleteRentalWire<'a> {
    end_point: PointWire,
    end_zone: &'a str,
    route: &'a [TrailPoint],
}

#[derive(Serialize)]
struct BikeStatusWire {
    status: Status,
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct CreatedRentalWire {
    #[serde(default)]
    rental_id: Option<String>,
}

// ── Implementation ────────────────────────────────────────────────────────────

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Poll `GET /customers` until the backend answers 200, or give up.
    ///
    /// Entry points call this once before seeding the fleet so the first
    /// tick doesn't race the backend's startup.
    pub fn wait_until_ready(
        &self,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<(), BackendError> {
        let started = Instant::now();
        loop {
            let probe = self
                .client
                .get(self.url("customers"))
                .timeout(Duration::from_secs(1))
                .send();
            if matches!(&probe, Ok(resp) if resp.status().as_u16() == 200) {
                info!("backend ready");
                return Ok(());
            }
            if started.elapsed() > timeout {
                return Err(BackendError::NotReady(timeout));
            }
            debug!("waiting for backend…");
            std::thread::sleep(poll_interval);
        }
    }

    fn try_fetch_users(&self) -> Result<Vec<User>, BackendError> {
        let resp = self
            .client
            .get(self.url("customers"))
            .timeout(USERS_TIMEOUT)
            .send()
            .map_err(BackendError::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BackendError::Api {
                status: status.as_u16(),
                body: resp.text().unwrap_or_default(),
            });
        }

        let customers: Vec<CustomerWire> = resp.json().map_err(BackendError::Decode)?;
        Ok(customers
            .into_iter()
            .map(|c| User {
                user_id: c.customer_id,
                // Name, falling back to email; a customer with neither
                // passes through unnamed.
                user_name: c.name.or(c.email).unwrap_or_default(),
            })
            .collect())
    }
}

impl Backend for HttpBackend {
    fn fetch_users(&self) -> Vec<User> {
        match self.try_fetch_users() {
            Ok(users) => {
                info!(count = users.len(), "loaded users from backend");
                users
            }
            Err(e) => {
                warn!(error = %e, "failed to load users, using fallback list");
                fallback_users()
            }
        }
    }

    fn fetch_zones(&self, city: &str) -> Result<Vec<ZoneSpec>, BackendError> {
        let resp = self
            .client
            .get(self.url(&format!("cities/{city}/zones")))
            .timeout(ZONES_TIMEOUT)
            .send()
            .map_err(BackendError::Transport)?;

        let status = resp.status();
        if status.as_u16() == 404 {
            return Err(BackendError::NotFound(format!("zones for city '{city}'")));
        }
        if !status.is_success() {
            return Err(BackendError::Api {
                status: status.as_u16(),
                body: resp.text().unwrap_or_default(),
            });
        }

        let zones: Vec<ZoneSpec> = resp.json().map_err(BackendError::Decode)?;
        info!(city, count = zones.len(), "loaded city zones");
        Ok(zones)
    }

    fn create_rental(
        &self,
        customer_id: i64,
        bike_id: ScooterId,
        start_point: GeoPoint,
        start_zone: &str,
    ) -> Option<CreatedRental> {
        let payload = CreateRentalWire {
            customer_id,
            bike_id,
            start_point: start_point.into(),
            start_zone,
        };

        let resp = self
            .client
            .post(self.url("rentals"))
            .timeout(CREATE_TIMEOUT)
            .json(&payload)
            .send();

        let resp = match resp {
            Ok(r) => r,
            Err(e) => {
                warn!(bike = %bike_id, error = %e, "rental creation request failed");
                return None;
            }
        };

        let status = resp.status().as_u16();
        if status != 201 {
            warn!(bike = %bike_id, status, "rental creation rejected");
            return None;
        }

        match resp.json::<CreatedRentalWire>() {
            Ok(CreatedRentalWire { rental_id: Some(rental_id) }) => {
                debug!(bike = %bike_id, %rental_id, "rental created");
                Some(CreatedRental { rental_id })
            }
            Ok(_) => {
                warn!(bike = %bike_id, "rental created but response carries no rental_id");
                None
            }
            Err(e) => {
                warn!(bike = %bike_id, error = %e, "failed to decode rental creation response");
                None
            }
        }
    }

    fn complete_rental(
        &self,
        rental_id: &str,
        end_point: GeoPoint,
        end_zone: &str,
        route: &[TrailPoint],
    ) -> bool {
        if route.is_empty() {
            warn!(rental_id, "no route coordinates to send, not completing");
            return false;
        }

        let payload = CompleteRentalWire {
            end_point: end_point.into(),
            end_zone,
            route,
        };

        let resp = self
            .client
            .put(self.url(&format!("rentals/{rental_id}")))
            .timeout(COMPLETE_TIMEOUT)
            .json(&payload)
            .send();

        match resp {
            Ok(r) if matches!(r.status().as_u16(), 200 | 204) => {
                debug!(rental_id, points = route.len(), "rental completed");
                true
            }
            Ok(r) => {
                warn!(rental_id, status = r.status().as_u16(), "rental completion rejected");
                false
            }
            Err(e) => {
                warn!(rental_id, error = %e, "rental completion request failed");
                false
            }
        }
    }

    fn update_status_and_position(
        &self,
        bike_id: ScooterId,
        status: Status,
        pos: GeoPoint,
    ) -> bool {
        let payload = BikeStatusWire {
            status,
            lat: pos.lat,
            lng: pos.lon,
        };

        let resp = self
            .client
            .put(self.url(&format!("bikes/{bike_id}")))
            .timeout(STATUS_TIMEOUT)
            .json(&payload)
            .send();

        match resp {
            Ok(r) if r.status().is_success() => true,
            Ok(r) => {
                warn!(bike = %bike_id, %status, code = r.status().as_u16(),
                    "status+position update rejected");
                false
            }
            Err(e) => {
                warn!(bike = %bike_id, %status, error = %e,
                    "status+position update request failed");
                false
            }
        }
    }
}
