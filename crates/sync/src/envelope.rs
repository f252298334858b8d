// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Update envelopes: versioned, field-wise mutation records.
//!
//! An envelope wraps one persisted mutation. Its payload carries only the
//! fields that changed, never a whole snapshot, so an unrelated concurrent
//! edit cannot be clobbered by a field the mutation did not touch. Every
//! copy fanned out for one mutation shares the version assigned at the
//! persistence boundary.

use crate::version::Version;
use lastmile_domain::{
    AdminNote, DriverId, PaymentRecord, RouteId, StopId, StopSequence, StopStatus,
};
use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

/// Identifies the record an envelope describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum SubjectId {
    /// A delivery stop.
    Stop(StopId),
    /// A delivery route.
    Route(RouteId),
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stop(id) => write!(f, "stop:{id}"),
            Self::Route(id) => write!(f, "route:{id}"),
        }
    }
}

/// Deserializes `Option<Option<T>>` so an explicit `null` means "clear the
/// field" while an absent field means "unchanged".
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Field-wise changes to a stop.
///
/// `None` means the field did not change. For clearable fields the payload
/// distinguishes "unchanged" (absent) from "cleared" (explicit null).
/// Lists are carried whole when they change; their internal order matters
/// and element-level diffs are not worth the ambiguity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StopPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StopStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<StopSequence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_the_way_time: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_time: Option<OffsetDateTime>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub driver_id: Option<Option<DriverId>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub driver_name_override: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub signed_document_url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_image_urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_records: Option<Vec<PaymentRecord>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub driver_notes: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<Vec<AdminNote>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns_acknowledged: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_reason: Option<String>,
}

impl StopPatch {
    /// Returns true if the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.sequence.is_none()
            && self.on_the_way_time.is_none()
            && self.arrival_time.is_none()
            && self.completion_time.is_none()
            && self.driver_id.is_none()
            && self.driver_name_override.is_none()
            && self.signed_document_url.is_none()
            && self.uploaded_image_urls.is_none()
            && self.payment_records.is_none()
            && self.driver_notes.is_none()
            && self.admin_notes.is_none()
            && self.returns_acknowledged.is_none()
            && self.terminal_reason.is_none()
    }
}

/// Field-wise changes to a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RoutePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_ids: Option<Vec<StopId>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub driver_id: Option<Option<DriverId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
}

/// The payload of an update envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnvelopePayload {
    /// Changed stop fields.
    Stop(StopPatch),
    /// Changed route fields.
    Route(RoutePatch),
}

/// A versioned mutation record broadcast to observers.
///
/// Envelopes are transient: they are never persisted and never replayed
/// after a reconnect (a reconnecting observer refetches a snapshot instead).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEnvelope {
    /// The record this envelope describes.
    pub subject: SubjectId,
    /// The version assigned at the persistence boundary. Shared by every
    /// copy of this envelope fanned out for the mutation.
    pub version: Version,
    /// The changed fields.
    pub payload: EnvelopePayload,
}

impl UpdateEnvelope {
    /// Creates a stop envelope.
    #[must_use]
    pub const fn for_stop(id: StopId, version: Version, patch: StopPatch) -> Self {
        Self {
            subject: SubjectId::Stop(id),
            version,
            payload: EnvelopePayload::Stop(patch),
        }
    }

    /// Creates a route envelope.
    #[must_use]
    pub const fn for_route(id: RouteId, version: Version, patch: RoutePatch) -> Self {
        Self {
            subject: SubjectId::Route(id),
            version,
            payload: EnvelopePayload::Route(patch),
        }
    }
}
