// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

//! Tests for the authoritative store: version assignment, snapshot
//! baselines, and lookup failures.

use crate::{PersistenceError, Store};
use lastmile_domain::{Route, RouteId, Stop, StopId, StopSequence, StopStatus};
use lastmile_sync::{SubjectId, Version};

fn seeded_store() -> Store {
    let mut store = Store::new();
    let route = Route::new(RouteId::new(10), String::from("Downtown AM"));
    store.insert_route(route).expect("insert route");
    let sequence = StopSequence::new(1).expect("positive sequence");
    let stop = Stop::new(StopId::new(1), RouteId::new(10), sequence);
    store.insert_stop(stop).expect("insert stop");
    store
}

#[test]
fn test_insert_assigns_version_one() {
    let mut store = Store::new();
    let route = Route::new(RouteId::new(10), String::from("Downtown AM"));

    let (_, version) = store.insert_route(route).expect("insert");

    assert_eq!(version, Version::new(1));
}

#[test]
fn test_writes_assign_strictly_increasing_versions() {
    let mut store = seeded_store();
    let (stop, v1) = store.read_stop(StopId::new(1)).expect("read");

    let mut next = stop.clone();
    next.status = StopStatus::OnTheWay;
    let (_, v2) = store.write_stop(next).expect("write");

    let mut third = stop;
    third.status = StopStatus::Arrived;
    let (_, v3) = store.write_stop(third).expect("write");

    assert!(v1 < v2);
    assert!(v2 < v3);
}

#[test]
fn test_snapshot_version_matches_last_write() {
    let mut store = seeded_store();
    let (stop, _) = store.read_stop(StopId::new(1)).expect("read");

    let mut next = stop;
    next.driver_notes = Some(String::from("buzz unit 4"));
    let (_, write_version) = store.write_stop(next).expect("write");

    let (snapshot, snapshot_version) = store.read_stop(StopId::new(1)).expect("read");
    assert_eq!(snapshot_version, write_version);
    assert_eq!(snapshot.driver_notes, Some(String::from("buzz unit 4")));
}

#[test]
fn test_stop_and_route_clocks_are_independent() {
    let mut store = seeded_store();
    let (stop, _) = store.read_stop(StopId::new(1)).expect("read");
    store.write_stop(stop).expect("write");

    // Route version is untouched by stop writes.
    assert_eq!(
        store.current_version(SubjectId::Route(RouteId::new(10))),
        Some(Version::new(1))
    );
    assert_eq!(
        store.current_version(SubjectId::Stop(StopId::new(1))),
        Some(Version::new(2))
    );
}

#[test]
fn test_failed_write_assigns_no_version() {
    let mut store = seeded_store();
    let sequence = StopSequence::new(9).expect("seq");
    let unknown = Stop::new(StopId::new(99), RouteId::new(10), sequence);

    let result = store.write_stop(unknown);

    assert!(matches!(
        result,
        Err(PersistenceError::StopNotFound(_))
    ));
    assert_eq!(store.current_version(SubjectId::Stop(StopId::new(99))), None);
}

#[test]
fn test_insert_stop_requires_existing_route() {
    let mut store = Store::new();
    let sequence = StopSequence::new(1).expect("seq");
    let stop = Stop::new(StopId::new(1), RouteId::new(44), sequence);

    let result = store.insert_stop(stop);

    assert!(matches!(
        result,
        Err(PersistenceError::RouteNotFound(_))
    ));
}

#[test]
fn test_duplicate_inserts_are_refused() {
    let mut store = seeded_store();

    let route = Route::new(RouteId::new(10), String::from("again"));
    assert!(matches!(
        store.insert_route(route),
        Err(PersistenceError::DuplicateRoute(_))
    ));

    let sequence = StopSequence::new(2).expect("seq");
    let stop = Stop::new(StopId::new(1), RouteId::new(10), sequence);
    assert!(matches!(
        store.insert_stop(stop),
        Err(PersistenceError::DuplicateStop(_))
    ));
}

#[test]
fn test_route_stops_returns_members_in_route_order() {
    let mut store = seeded_store();
    let sequence = StopSequence::new(2).expect("seq");
    let second = Stop::new(StopId::new(2), RouteId::new(10), sequence);
    store.insert_stop(second).expect("insert");

    let stops = store.route_stops(RouteId::new(10)).expect("stops");

    assert_eq!(stops.len(), 2);
    assert_eq!(stops[0].id, StopId::new(1));
    assert_eq!(stops[1].id, StopId::new(2));
}
