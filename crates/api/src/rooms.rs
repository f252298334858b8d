// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Room names: the logical fan-out channels of the event bus.
//!
//! A stop belongs to its route's room and its driver's room for the
//! duration of the assignment; the `admin` room sees every mutation.
//! Room membership authorization lives in [`crate::AuthorizationService`];
//! the bus itself trusts the authorized join.

use lastmile_domain::{DriverId, RouteId, Stop};
use serde::{Deserialize, Serialize};

/// A logical fan-out channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "snake_case")]
pub enum Room {
    /// All administrators.
    Admin,
    /// Observers of one route.
    Route(RouteId),
    /// One driver's device(s).
    Driver(DriverId),
}

impl std::fmt::Display for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Route(id) => write!(f, "route:{id}"),
            Self::Driver(id) => write!(f, "driver:{id}"),
        }
    }
}

/// Returns the rooms a stop's envelopes fan out to.
#[must_use]
pub fn rooms_for_stop(stop: &Stop) -> Vec<Room> {
    let mut rooms: Vec<Room> = vec![Room::Admin, Room::Route(stop.route_id)];
    if let Some(driver_id) = stop.driver_id {
        rooms.push(Room::Driver(driver_id));
    }
    rooms
}
