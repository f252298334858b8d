// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The authoritative state store.
//!
//! Writes are serialized per store: callers hold exclusive access for the
//! duration of a write, and the version clock is advanced inside that same
//! critical section. This is the property the ordering protocol depends on;
//! two concurrent writers can never be assigned the same version for one
//! subject, and an envelope's version always matches the committed state it
//! describes.
//!
//! Envelope publication is the caller's job, after the write returns. A
//! write that fails assigns no version and produces no envelope.

use crate::error::PersistenceError;
use lastmile_domain::{Route, RouteId, Stop, StopId};
use lastmile_sync::{SubjectId, Version, VersionClock};
use std::collections::HashMap;
use tracing::debug;

/// In-memory authoritative store for stops and routes.
///
/// Methods take `&mut self`; the server wraps the store in a mutex, which
/// provides the write serialization the version contract requires.
#[derive(Debug, Default)]
pub struct Store {
    stops: HashMap<StopId, Stop>,
    routes: HashMap<RouteId, Route>,
    clock: VersionClock,
}

impl Store {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stops: HashMap::new(),
            routes: HashMap::new(),
            clock: VersionClock::new(),
        }
    }

    /// Inserts a new route and assigns its first version.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateRoute` if the id is taken.
    pub fn insert_route(&mut self, route: Route) -> Result<(Route, Version), PersistenceError> {
        if self.routes.contains_key(&route.id) {
            return Err(PersistenceError::DuplicateRoute(route.id));
        }
        let version: Version = self.clock.next(SubjectId::Route(route.id));
        debug!(route_id = %route.id, %version, "Inserted route");
        self.routes.insert(route.id, route.clone());
        Ok((route, version))
    }

    /// Inserts a new stop and assigns its first version.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateStop` if the id is taken, or `RouteNotFound` if the
    /// stop references a route the store does not hold.
    pub fn insert_stop(&mut self, stop: Stop) -> Result<(Stop, Version), PersistenceError> {
        if self.stops.contains_key(&stop.id) {
            return Err(PersistenceError::DuplicateStop(stop.id));
        }
        let route = self
            .routes
            .get_mut(&stop.route_id)
            .ok_or(PersistenceError::RouteNotFound(stop.route_id))?;
        if !route.stop_ids.contains(&stop.id) {
            route.stop_ids.push(stop.id);
        }
        let version: Version = self.clock.next(SubjectId::Stop(stop.id));
        debug!(stop_id = %stop.id, %version, "Inserted stop");
        self.stops.insert(stop.id, stop.clone());
        Ok((stop, version))
    }

    /// Reads a stop snapshot with its current version.
    ///
    /// The version is the reconnect baseline: an observer seeding from this
    /// snapshot discards any envelope at or below it.
    ///
    /// # Errors
    ///
    /// Returns `StopNotFound` if the stop does not exist.
    pub fn read_stop(&self, id: StopId) -> Result<(Stop, Version), PersistenceError> {
        let stop = self
            .stops
            .get(&id)
            .cloned()
            .ok_or(PersistenceError::StopNotFound(id))?;
        let version: Version = self
            .clock
            .last_issued(SubjectId::Stop(id))
            .unwrap_or(Version::INITIAL);
        Ok((stop, version))
    }

    /// Reads a route snapshot with its current version.
    ///
    /// # Errors
    ///
    /// Returns `RouteNotFound` if the route does not exist.
    pub fn read_route(&self, id: RouteId) -> Result<(Route, Version), PersistenceError> {
        let route = self
            .routes
            .get(&id)
            .cloned()
            .ok_or(PersistenceError::RouteNotFound(id))?;
        let version: Version = self
            .clock
            .last_issued(SubjectId::Route(id))
            .unwrap_or(Version::INITIAL);
        Ok((route, version))
    }

    /// Commits a new stop state, assigning the next version atomically with
    /// the write.
    ///
    /// # Errors
    ///
    /// Returns `StopNotFound` if the stop was never inserted.
    pub fn write_stop(&mut self, new_stop: Stop) -> Result<(Stop, Version), PersistenceError> {
        if !self.stops.contains_key(&new_stop.id) {
            return Err(PersistenceError::StopNotFound(new_stop.id));
        }
        let version: Version = self.clock.next(SubjectId::Stop(new_stop.id));
        debug!(stop_id = %new_stop.id, %version, status = %new_stop.status, "Committed stop write");
        self.stops.insert(new_stop.id, new_stop.clone());
        Ok((new_stop, version))
    }

    /// Commits a new route state, assigning the next version atomically
    /// with the write.
    ///
    /// # Errors
    ///
    /// Returns `RouteNotFound` if the route was never inserted.
    pub fn write_route(&mut self, new_route: Route) -> Result<(Route, Version), PersistenceError> {
        if !self.routes.contains_key(&new_route.id) {
            return Err(PersistenceError::RouteNotFound(new_route.id));
        }
        let version: Version = self.clock.next(SubjectId::Route(new_route.id));
        debug!(route_id = %new_route.id, %version, "Committed route write");
        self.routes.insert(new_route.id, new_route.clone());
        Ok((new_route, version))
    }

    /// Returns all stops belonging to a route.
    ///
    /// # Errors
    ///
    /// Returns `RouteNotFound` if the route does not exist.
    pub fn route_stops(&self, id: RouteId) -> Result<Vec<Stop>, PersistenceError> {
        let route = self
            .routes
            .get(&id)
            .ok_or(PersistenceError::RouteNotFound(id))?;
        Ok(route
            .stop_ids
            .iter()
            .filter_map(|stop_id| self.stops.get(stop_id).cloned())
            .collect())
    }

    /// Returns the last version issued for a subject, if any write occurred.
    #[must_use]
    pub fn current_version(&self, subject: SubjectId) -> Option<Version> {
        self.clock.last_issued(subject)
    }
}
