// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The merge rule: last-writer-wins by version, never by arrival time.
//!
//! Network delivery order is not guaranteed to match commit order, so an
//! observer must never apply an envelope whose version is at or below the
//! version of its local view. Discarding a stale envelope is not an error;
//! it is the protocol working as designed, and is logged at debug level
//! only.

use crate::envelope::{EnvelopePayload, RoutePatch, StopPatch, SubjectId, UpdateEnvelope};
use crate::error::ReconcileError;
use crate::version::Version;
use lastmile_domain::{Route, Stop};
use tracing::debug;

/// The result of offering an envelope to a local view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The envelope superseded the local view and was applied.
    Applied,
    /// The envelope's version was at or below the local view; discarded.
    Stale,
}

/// A stop as one observer sees it, with the version of the last applied
/// envelope (or the seeding snapshot).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopView {
    /// The locally held stop state.
    pub stop: Stop,
    /// The version this state reflects.
    pub version: Version,
}

impl StopView {
    /// Seeds a view from a snapshot and its version.
    #[must_use]
    pub const fn new(stop: Stop, version: Version) -> Self {
        Self { stop, version }
    }

    /// Offers an envelope to this view.
    ///
    /// Field-wise: only fields present in the payload are applied, so a
    /// status change and a concurrent note addition cannot clobber each
    /// other regardless of delivery order.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::SubjectMismatch` if the envelope describes a
    /// different stop, and `ReconcileError::PayloadKindMismatch` if a route
    /// payload is offered to a stop view.
    pub fn merge(&mut self, envelope: &UpdateEnvelope) -> Result<MergeOutcome, ReconcileError> {
        let expected = SubjectId::Stop(self.stop.id);
        if envelope.subject != expected {
            return Err(ReconcileError::SubjectMismatch {
                expected,
                got: envelope.subject,
            });
        }
        let EnvelopePayload::Stop(patch) = &envelope.payload else {
            return Err(ReconcileError::PayloadKindMismatch { subject: expected });
        };

        if envelope.version <= self.version {
            debug!(
                subject = %envelope.subject,
                envelope_version = %envelope.version,
                local_version = %self.version,
                "Discarding stale envelope"
            );
            return Ok(MergeOutcome::Stale);
        }

        apply_stop_patch(&mut self.stop, patch);
        self.version = envelope.version;
        Ok(MergeOutcome::Applied)
    }
}

/// A route as one observer sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteView {
    /// The locally held route state.
    pub route: Route,
    /// The version this state reflects.
    pub version: Version,
}

impl RouteView {
    /// Seeds a view from a snapshot and its version.
    #[must_use]
    pub const fn new(route: Route, version: Version) -> Self {
        Self { route, version }
    }

    /// Offers an envelope to this view. Same ordering rule as stop views.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::SubjectMismatch` if the envelope describes a
    /// different route, and `ReconcileError::PayloadKindMismatch` for a stop
    /// payload.
    pub fn merge(&mut self, envelope: &UpdateEnvelope) -> Result<MergeOutcome, ReconcileError> {
        let expected = SubjectId::Route(self.route.id);
        if envelope.subject != expected {
            return Err(ReconcileError::SubjectMismatch {
                expected,
                got: envelope.subject,
            });
        }
        let EnvelopePayload::Route(patch) = &envelope.payload else {
            return Err(ReconcileError::PayloadKindMismatch { subject: expected });
        };

        if envelope.version <= self.version {
            debug!(
                subject = %envelope.subject,
                envelope_version = %envelope.version,
                local_version = %self.version,
                "Discarding stale envelope"
            );
            return Ok(MergeOutcome::Stale);
        }

        apply_route_patch(&mut self.route, patch);
        self.version = envelope.version;
        Ok(MergeOutcome::Applied)
    }
}

/// Applies the present fields of a patch onto a stop.
///
/// Absent fields are untouched. Timestamps follow the set-once rule: a
/// patch never clears them, and an already set timestamp is not overwritten.
pub fn apply_stop_patch(stop: &mut Stop, patch: &StopPatch) {
    if let Some(status) = patch.status {
        stop.status = status;
    }
    if let Some(sequence) = patch.sequence {
        stop.sequence = sequence;
    }
    if let Some(t) = patch.on_the_way_time
        && stop.on_the_way_time.is_none()
    {
        stop.on_the_way_time = Some(t);
    }
    if let Some(t) = patch.arrival_time
        && stop.arrival_time.is_none()
    {
        stop.arrival_time = Some(t);
    }
    if let Some(t) = patch.completion_time
        && stop.completion_time.is_none()
    {
        stop.completion_time = Some(t);
    }
    if let Some(driver_id) = patch.driver_id {
        stop.driver_id = driver_id;
    }
    if let Some(name) = &patch.driver_name_override {
        stop.driver_name_override = name.clone();
    }
    if let Some(url) = &patch.signed_document_url {
        stop.signed_document_url = url.clone();
    }
    if let Some(urls) = &patch.uploaded_image_urls {
        stop.uploaded_image_urls = urls.clone();
    }
    if let Some(records) = &patch.payment_records {
        stop.payment_records = records.clone();
    }
    if let Some(notes) = &patch.driver_notes {
        stop.driver_notes = notes.clone();
    }
    if let Some(notes) = &patch.admin_notes {
        stop.admin_notes = notes.clone();
    }
    if let Some(acknowledged) = patch.returns_acknowledged {
        stop.returns_acknowledged = acknowledged;
    }
    if let Some(reason) = &patch.terminal_reason {
        stop.terminal_reason = Some(reason.clone());
    }
}

/// Applies the present fields of a patch onto a route.
pub fn apply_route_patch(route: &mut Route, patch: &RoutePatch) {
    if let Some(name) = &patch.name {
        route.name = name.clone();
    }
    if let Some(stop_ids) = &patch.stop_ids {
        route.stop_ids = stop_ids.clone();
    }
    if let Some(driver_id) = patch.driver_id {
        route.driver_id = driver_id;
    }
    if let Some(deleted) = patch.deleted {
        route.deleted = deleted;
    }
}
