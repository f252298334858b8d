// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]


use crate::auth::AuthenticatedActor;
use lastmile_domain::{DriverId, Route, RouteId, Stop, StopId, StopSequence};
use lastmile_persistence::Store;

/// The admin actor used throughout the API tests.
pub(crate) fn admin() -> AuthenticatedActor {
    AuthenticatedActor::admin(String::from("dispatch-1"))
}

/// The driver actor assigned to the seeded stop.
pub(crate) fn assigned_driver() -> AuthenticatedActor {
    AuthenticatedActor::driver(String::from("driver-7"), DriverId::new(7))
}

/// A driver actor with no claim on the seeded stop.
pub(crate) fn other_driver() -> AuthenticatedActor {
    AuthenticatedActor::driver(String::from("driver-8"), DriverId::new(8))
}

/// A store holding route 10 with stop 1 (sequence 1) assigned to driver 7.
pub(crate) fn seeded_store() -> Store {
    let mut store = Store::new();
    let route = Route::new(RouteId::new(10), String::from("Downtown AM"));
    store.insert_route(route).expect("insert route");

    let sequence = StopSequence::new(1).expect("positive sequence");
    let mut stop = Stop::new(StopId::new(1), RouteId::new(10), sequence);
    stop.driver_id = Some(DriverId::new(7));
    store.insert_stop(stop).expect("insert stop");

    store
}
