// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Route-level operations and the deletion guard.

use crate::error::CoreError;
use lastmile_domain::{Route, Stop, StopSequence, StopStatus};
use lastmile_sync::RoutePatch;

/// Route-level context a stop command needs for cross-stop validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouteContext {
    /// Sequence positions used by the route's other stops.
    pub taken_sequences: Vec<StopSequence>,
}

impl RouteContext {
    /// Builds the context for one stop from its route's full stop list.
    ///
    /// The stop's own position is excluded so resequencing to the current
    /// position is not a self-conflict.
    #[must_use]
    pub fn for_stop(stop: &Stop, route_stops: &[Stop]) -> Self {
        let taken_sequences: Vec<StopSequence> = route_stops
            .iter()
            .filter(|s| s.id != stop.id)
            .map(|s| s.sequence)
            .collect();
        Self { taken_sequences }
    }
}

/// A planned route deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDeletion {
    /// The patch to persist and fan out: the soft-delete flag.
    pub patch: RoutePatch,
    /// How many completed stops the route holds (informational).
    pub completed_count: usize,
}

/// Plans a route deletion, enforcing the completed-deliveries guard.
///
/// A route with completed stops carries delivery records; deleting it is
/// refused with the count so the caller can surface "this route has N
/// completed deliveries" and require an explicit force. This is a local
/// business rule, not a concurrency conflict.
///
/// # Errors
///
/// Returns `CoreError::CompletedStopsPresent` if the route has completed
/// stops and `force` is false.
pub fn plan_route_deletion(
    route: &Route,
    stops: &[Stop],
    force: bool,
) -> Result<RouteDeletion, CoreError> {
    let completed_count: usize = stops
        .iter()
        .filter(|s| s.route_id == route.id && s.status == StopStatus::Completed)
        .count();

    if completed_count > 0 && !force {
        return Err(CoreError::CompletedStopsPresent {
            route_id: route.id,
            count: completed_count,
        });
    }

    Ok(RouteDeletion {
        patch: RoutePatch {
            deleted: Some(true),
            ..RoutePatch::default()
        },
        completed_count,
    })
}
