// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::types::{DriverId, RouteId, StopId};
use serde::{Deserialize, Serialize};

/// A delivery route: an ordered collection of stops assigned to a driver.
///
/// Routes are soft-deleted. A route with completed stops refuses deletion
/// unless explicitly forced; that guard lives in the transition engine, not
/// here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// The route's immutable identity.
    pub id: RouteId,
    /// Human-readable route name.
    pub name: String,
    /// Stop ids in delivery order.
    pub stop_ids: Vec<StopId>,
    /// The driver assigned to the route, if any.
    pub driver_id: Option<DriverId>,
    /// Soft-delete flag. Deleted routes are hidden, never purged, so stops
    /// with recorded deliveries keep a resolvable parent.
    pub deleted: bool,
}

impl Route {
    /// Creates a new empty route.
    #[must_use]
    pub const fn new(id: RouteId, name: String) -> Self {
        Self {
            id,
            name,
            stop_ids: Vec::new(),
            driver_id: None,
            deleted: false,
        }
    }
}
