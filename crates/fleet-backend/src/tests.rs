//! Unit tests for the backend port.

use fleet_core::{GeoPoint, ScooterId, Status};

use crate::types::fallback_users;
use crate::{Backend, BackendCall, BackendError, RecordingBackend};

// ── Fallback users ────────────────────────────────────────────────────────────

#[test]
fn fallback_list_is_twenty_john_does() {
    let users = fallback_users();
    assert_eq!(users.len(), 20);
    assert_eq!(users[0].user_id, 1);
    assert_eq!(users[0].user_name, "JohnDoe1");
    assert_eq!(users[19].user_name, "JohnDoe20");
}

// ── RecordingBackend contract ─────────────────────────────────────────────────

#[test]
fn create_rental_hands_out_sequential_server_ids() {
    let backend = RecordingBackend::new();
    let p = GeoPoint::new(55.6, 13.0);

    let a = backend.create_rental(1, ScooterId(1), p, "free").unwrap();
    let b = backend.create_rental(2, ScooterId(2), p, "parking").unwrap();
    assert_eq!(a.rental_id, "srv-1");
    assert_eq!(b.rental_id, "srv-2");

    backend.fail_create(true);
    assert!(backend.create_rental(3, ScooterId(3), p, "free").is_none());
}

#[test]
fn complete_rental_rejects_empty_route() {
    let backend = RecordingBackend::new();
    let p = GeoPoint::new(55.6, 13.0);
    assert!(!backend.complete_rental("srv-1", p, "free", &[]));
    // The early-out never reaches the call log.
    assert!(backend.completions().is_empty());
}

#[test]
fn calls_are_recorded_in_order() {
    let backend = RecordingBackend::new();
    let p = GeoPoint::new(55.6, 13.0);

    backend.update_status_and_position(ScooterId(4), Status::Active, p);
    backend.update_status_and_position(ScooterId(4), Status::Available, p);
    backend.update_status_and_position(ScooterId(5), Status::Deactivated, p);

    assert_eq!(
        backend.status_writes(ScooterId(4)),
        vec![Status::Active, Status::Available]
    );
    assert_eq!(backend.calls().len(), 3);
    assert!(matches!(
        backend.calls()[2],
        BackendCall::UpdateStatus { bike_id: ScooterId(5), status: Status::Deactivated, .. }
    ));
}

#[test]
fn fetch_zones_without_script_is_not_found() {
    let backend = RecordingBackend::new();
    match backend.fetch_zones("atlantis") {
        Err(BackendError::NotFound(what)) => assert!(what.contains("atlantis")),
        other => panic!("expected NotFound, got {other:?}"),
    }
}
