//! Backend failure taxonomy.

use std::time::Duration;

use thiserror::Error;

/// Why a backend call failed.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The request never produced an HTTP response (DNS, connect, timeout…).
    #[error("backend transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The backend answered 404 for the requested resource.
    #[error("{0} not found")]
    NotFound(String),

    /// The backend answered with an unexpected status.
    #[error("backend API error: status {status}: {body}")]
    Api { status: u16, body: String },

    /// The response body did not decode as the expected JSON shape.
    #[error("failed to decode backend response: {0}")]
    Decode(#[source] reqwest::Error),

    /// The readiness probe gave up.
    #[error("backend not ready after {0:?}")]
    NotReady(Duration),
}
