// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use lastmile_domain::{DomainError, RouteId, TransitionError};

/// Errors that can occur while applying a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A domain rule was violated.
    DomainViolation(DomainError),
    /// The state machine refused the requested transition.
    TransitionRefused(TransitionError),
    /// Route deletion refused: completed deliveries are recorded on it.
    ///
    /// The caller must retry with an explicit force flag to proceed.
    CompletedStopsPresent {
        /// The route whose deletion was refused.
        route_id: RouteId,
        /// How many completed stops the route holds.
        count: usize,
    },
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainViolation(err) => write!(f, "Domain violation: {err}"),
            Self::TransitionRefused(err) => write!(f, "Transition refused: {err}"),
            Self::CompletedStopsPresent { route_id, count } => {
                write!(
                    f,
                    "Route {route_id} has {count} completed stop(s); deletion requires an explicit force"
                )
            }
        }
    }
}

impl std::error::Error for CoreError {}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::DomainViolation(err)
    }
}

impl From<TransitionError> for CoreError {
    fn from(err: TransitionError) -> Self {
        Self::TransitionRefused(err)
    }
}
