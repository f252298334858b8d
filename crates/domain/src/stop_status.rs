// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Stop status states and the allowed-edge table.
//!
//! Status transitions are actor-initiated only; the system never advances a
//! stop based on time alone. The full transition rules, including the
//! side-effect gates, live in [`crate::attempt_transition`]; this module
//! defines the states and the raw edge table.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lifecycle status of a delivery stop.
///
/// The forward path is Pending → `OnTheWay` → Arrived → Completed.
/// `Failed` and `Cancelled` are terminal abort states reachable from any
/// non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopStatus {
    /// Created but not yet started.
    Pending,
    /// Driver is en route to the stop.
    OnTheWay,
    /// Driver has arrived at the stop.
    Arrived,
    /// Delivery completed with proof recorded.
    Completed,
    /// Delivery could not be completed.
    Failed,
    /// Delivery was called off.
    Cancelled,
}

impl StopStatus {
    /// Returns the string representation of the status.
    ///
    /// This is used for persistence and API serialization.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::OnTheWay => "on_the_way",
            Self::Arrived => "arrived",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from its string representation.
    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(Self::Pending),
            "on_the_way" => Ok(Self::OnTheWay),
            "arrived" => Ok(Self::Arrived),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(DomainError::InvalidStopStatus {
                status: s.to_string(),
            }),
        }
    }

    /// Returns true if this status is terminal (no further transitions).
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Returns this status's position in the forward order.
    ///
    /// The forward statuses are strictly ordered; observed status sequences
    /// must be non-decreasing in this rank. Terminal abort states share the
    /// highest rank since nothing follows them.
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::OnTheWay => 1,
            Self::Arrived => 2,
            Self::Completed | Self::Failed | Self::Cancelled => 3,
        }
    }

    /// Returns true if the edge from this status to `target` is in the
    /// allowed table.
    ///
    /// This is the raw edge table only. It does not evaluate side-effect
    /// gates (delivery proof for `Completed`); those are enforced by
    /// [`crate::attempt_transition`].
    #[must_use]
    pub const fn edge_allowed(&self, target: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, target),
            (Self::Pending, Self::OnTheWay)
                | (Self::OnTheWay, Self::Arrived)
                | (Self::Arrived, Self::Completed)
                | (
                    Self::Pending | Self::OnTheWay | Self::Arrived,
                    Self::Failed | Self::Cancelled
                )
        )
    }
}

impl FromStr for StopStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for StopStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_string_round_trip() {
        let statuses = vec![
            StopStatus::Pending,
            StopStatus::OnTheWay,
            StopStatus::Arrived,
            StopStatus::Completed,
            StopStatus::Failed,
            StopStatus::Cancelled,
        ];

        for status in statuses {
            let s = status.as_str();
            match StopStatus::parse_str(s) {
                Ok(parsed) => assert_eq!(status, parsed),
                Err(e) => panic!("Failed to parse status string: {s}: {e}"),
            }
        }
    }

    #[test]
    fn test_invalid_status_string() {
        let result = StopStatus::parse_str("in_transit");
        assert!(result.is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!StopStatus::Pending.is_terminal());
        assert!(!StopStatus::OnTheWay.is_terminal());
        assert!(!StopStatus::Arrived.is_terminal());
        assert!(StopStatus::Completed.is_terminal());
        assert!(StopStatus::Failed.is_terminal());
        assert!(StopStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_forward_rank_is_monotone() {
        assert!(StopStatus::Pending.rank() < StopStatus::OnTheWay.rank());
        assert!(StopStatus::OnTheWay.rank() < StopStatus::Arrived.rank());
        assert!(StopStatus::Arrived.rank() < StopStatus::Completed.rank());
    }

    #[test]
    fn test_forward_edges_allowed() {
        assert!(StopStatus::Pending.edge_allowed(StopStatus::OnTheWay));
        assert!(StopStatus::OnTheWay.edge_allowed(StopStatus::Arrived));
        assert!(StopStatus::Arrived.edge_allowed(StopStatus::Completed));
    }

    #[test]
    fn test_skipping_edges_rejected() {
        assert!(!StopStatus::Pending.edge_allowed(StopStatus::Arrived));
        assert!(!StopStatus::Pending.edge_allowed(StopStatus::Completed));
        assert!(!StopStatus::OnTheWay.edge_allowed(StopStatus::Completed));
    }

    #[test]
    fn test_backward_edges_rejected() {
        assert!(!StopStatus::OnTheWay.edge_allowed(StopStatus::Pending));
        assert!(!StopStatus::Arrived.edge_allowed(StopStatus::OnTheWay));
        assert!(!StopStatus::Arrived.edge_allowed(StopStatus::Pending));
    }

    #[test]
    fn test_abort_edges_from_every_non_terminal() {
        for status in [StopStatus::Pending, StopStatus::OnTheWay, StopStatus::Arrived] {
            assert!(status.edge_allowed(StopStatus::Failed));
            assert!(status.edge_allowed(StopStatus::Cancelled));
        }
    }

    #[test]
    fn test_no_edges_from_terminal_states() {
        for terminal in [
            StopStatus::Completed,
            StopStatus::Failed,
            StopStatus::Cancelled,
        ] {
            for target in [
                StopStatus::Pending,
                StopStatus::OnTheWay,
                StopStatus::Arrived,
                StopStatus::Completed,
                StopStatus::Failed,
                StopStatus::Cancelled,
            ] {
                assert!(!terminal.edge_allowed(target));
            }
        }
    }
}
