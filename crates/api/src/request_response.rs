// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Request and response types for the API layer.
//!
//! Requests use raw values (strings, integers) validated at the boundary;
//! responses carry domain snapshots paired with the version that makes them
//! a merge baseline.

use lastmile_domain::{
    CompletionStep, DriverId, GateSet, PaymentMethod, Route, Stop, StopId, StopStatus,
};
use lastmile_sync::Version;
use serde::{Deserialize, Serialize};

/// Request to create a new route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRouteRequest {
    /// The route identifier.
    pub route_id: i64,
    /// Human-readable route name.
    pub name: String,
}

/// Request to create a stop on an existing route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStopRequest {
    /// The stop identifier.
    pub stop_id: i64,
    /// The route the stop belongs to.
    pub route_id: i64,
    /// Position within the route. Must be positive and unused.
    pub sequence: u32,
    /// Driver assigned at creation, if any.
    pub driver_id: Option<i64>,
}

/// Request to delete a route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRouteRequest {
    /// Proceed even if the route has completed stops.
    #[serde(default)]
    pub force: bool,
}

/// Response to a route deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRouteResponse {
    /// The soft-deleted route snapshot.
    pub route: Route,
    /// The version assigned to the deletion write.
    pub version: Version,
    /// How many completed stops the route held.
    pub completed_count: usize,
}

/// Request to move a stop through the driver-facing state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopTransitionRequest {
    /// The requested status, as its wire string.
    pub target: String,
    /// Reason, required when the target is terminal.
    pub reason: Option<String>,
}

/// Request to force a stop's status outside the state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideStatusRequest {
    /// The requested status, as its wire string.
    pub target: String,
    /// Reason, required when the target is terminal.
    pub reason: Option<String>,
}

/// Request to attach a signed delivery document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadDocumentRequest {
    /// URL of the stored document.
    pub url: String,
}

/// Request to attach a captured image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachImageRequest {
    /// URL of the stored image.
    pub url: String,
}

/// Request to record a payment collected at the stop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPaymentRequest {
    /// Amount in cents.
    pub amount_cents: i64,
    /// How the payment was made.
    pub method: PaymentMethod,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Request to set or clear the driver's notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetDriverNotesRequest {
    /// The new notes; `null` clears them.
    pub notes: Option<String>,
}

/// Request to add an admin note to a stop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddAdminNoteRequest {
    /// The note text.
    pub body: String,
}

/// Request to mark an admin note read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkAdminNoteReadRequest {
    /// Index of the note in the stop's note list.
    pub index: usize,
}

/// Request to reassign a stop's driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReassignDriverRequest {
    /// The new driver; `null` unassigns.
    pub driver_id: Option<i64>,
    /// Display-name override for the new driver.
    pub name_override: Option<String>,
}

/// Request to move a stop to a new sequence position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResequenceStopRequest {
    /// The new position. Must be positive and unused within the route.
    pub sequence: u32,
}

/// A stop snapshot with its version baseline.
///
/// The version is what makes the snapshot usable for reconciliation: an
/// observer seeding from it discards envelopes at or below the version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopSnapshotResponse {
    /// The stop state.
    pub stop: Stop,
    /// The version of the last write this snapshot reflects.
    pub version: Version,
}

/// A route snapshot with its version baseline and member stops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSnapshotResponse {
    /// The route state.
    pub route: Route,
    /// The version of the last write this snapshot reflects.
    pub version: Version,
    /// The route's stops with their own version baselines.
    pub stops: Vec<StopSnapshotResponse>,
}

/// The completion workflow state derived from a stop's artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStatusResponse {
    /// The stop this workflow describes.
    pub stop_id: StopId,
    /// Current lifecycle status.
    pub status: StopStatus,
    /// Gate satisfaction, recomputed from artifacts.
    pub gates: GateSet,
    /// The first unsatisfied step, or `None` when all gates are satisfied.
    pub next_step: Option<CompletionStep>,
}

impl StopTransitionRequest {
    /// Parses the target status string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string names no known status.
    pub fn parse_target(&self) -> Result<StopStatus, lastmile_domain::DomainError> {
        self.target.parse()
    }
}

impl ReassignDriverRequest {
    /// Returns the requested driver identity, if any.
    #[must_use]
    pub fn driver(&self) -> Option<DriverId> {
        self.driver_id.map(DriverId::new)
    }
}
