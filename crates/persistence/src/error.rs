// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use lastmile_domain::{RouteId, StopId};

/// Errors from the authoritative store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// No stop with the given id exists.
    StopNotFound(StopId),
    /// No route with the given id exists.
    RouteNotFound(RouteId),
    /// The route exists but has been deleted.
    RouteDeleted(RouteId),
    /// A stop with the given id already exists.
    DuplicateStop(StopId),
    /// A route with the given id already exists.
    DuplicateRoute(RouteId),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StopNotFound(id) => write!(f, "Stop {id} not found"),
            Self::RouteNotFound(id) => write!(f, "Route {id} not found"),
            Self::RouteDeleted(id) => write!(f, "Route {id} has been deleted"),
            Self::DuplicateStop(id) => write!(f, "Stop {id} already exists"),
            Self::DuplicateRoute(id) => write!(f, "Route {id} already exists"),
        }
    }
}

impl std::error::Error for PersistenceError {}
