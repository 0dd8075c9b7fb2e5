//! Ownership checks the handlers run for requests the gate lets through:
//! creation under a kid or drawing box, and the target box of a move.

mod common;

use axum::http::StatusCode;
use common::{Directory, Unresponsive};
use journal_service::authz::{FamilyId, ResourceKind, ResourceReference};
use journal_service::handlers::ensure_family_owns;
use std::time::{Duration, Instant};

const TIMEOUT: Duration = Duration::from_secs(1);

fn kid(id: i64) -> ResourceReference {
    ResourceReference::new(ResourceKind::Kid, id)
}

fn drawing_box(id: i64) -> ResourceReference {
    ResourceReference::new(ResourceKind::DrawingBox, id)
}

#[tokio::test]
async fn creating_a_box_under_a_foreign_kid_is_forbidden() {
    let directory = Directory::two_families();

    let err = ensure_family_owns(&directory, TIMEOUT, FamilyId(1), kid(11))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn creating_a_drawing_in_a_missing_box_is_not_found() {
    let directory = Directory::two_families();

    let err = ensure_family_owns(&directory, TIMEOUT, FamilyId(1), drawing_box(999))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn moving_into_another_familys_box_is_forbidden() {
    let directory = Directory::two_families();

    let err = ensure_family_owns(&directory, TIMEOUT, FamilyId(1), drawing_box(21))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn same_family_targets_are_allowed() {
    let directory = Directory::two_families();

    ensure_family_owns(&directory, TIMEOUT, FamilyId(1), drawing_box(20))
        .await
        .unwrap();
    ensure_family_owns(&directory, TIMEOUT, FamilyId(1), kid(10))
        .await
        .unwrap();
    ensure_family_owns(&directory, TIMEOUT, FamilyId(2), drawing_box(21))
        .await
        .unwrap();
}

#[tokio::test]
async fn unresponsive_store_fails_closed_within_the_lookup_timeout() {
    let started = Instant::now();

    let err = ensure_family_owns(
        &Unresponsive,
        Duration::from_millis(50),
        FamilyId(1),
        drawing_box(20),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(started.elapsed() < Duration::from_secs(2));
}
