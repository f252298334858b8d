// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::stop_status::StopStatus;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Opaque identifier for a delivery stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StopId(i64);

impl StopId {
    /// Creates a new stop identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for StopId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier for a delivery route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteId(i64);

impl RouteId {
    /// Creates a new route identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for RouteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier for a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DriverId(i64);

impl DriverId {
    /// Creates a new driver identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for DriverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stop's position within its route.
///
/// Sequences are positive and unique per route. They are mutable only
/// through explicit resequencing, never as a side effect of status changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StopSequence(u32);

impl StopSequence {
    /// Creates a new sequence position.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidSequence` if the position is zero.
    pub const fn new(position: u32) -> Result<Self, DomainError> {
        if position == 0 {
            return Err(DomainError::InvalidSequence { position });
        }
        Ok(Self(position))
    }

    /// Returns the raw position value.
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }
}

/// How a payment collected at a stop was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Check,
    Card,
    Account,
}

impl PaymentMethod {
    /// Returns the string representation used for persistence and the API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Check => "check",
            Self::Card => "card",
            Self::Account => "account",
        }
    }
}

/// A payment collected by the driver at a stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Amount in cents. Integer cents avoid float rounding in totals.
    pub amount_cents: i64,
    /// How the payment was made.
    pub method: PaymentMethod,
    /// Free-form notes from the driver.
    pub notes: Option<String>,
    /// When the payment was recorded.
    pub recorded_at: OffsetDateTime,
}

/// A note left by an administrator on a stop.
///
/// Notes carry a read flag so the driver UI can surface unread notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminNote {
    /// The note text.
    pub body: String,
    /// Whether the driver has acknowledged the note.
    pub read: bool,
    /// When the note was created.
    pub created_at: OffsetDateTime,
}

impl AdminNote {
    /// Creates a new unread note.
    #[must_use]
    pub const fn new(body: String, created_at: OffsetDateTime) -> Self {
        Self {
            body,
            read: false,
            created_at,
        }
    }
}

/// A single delivery obligation on a route.
///
/// The stop is the unit of the delivery lifecycle: it is created when a
/// route is built, advanced by driver status actions, edited by admins, and
/// frozen once it reaches a terminal status. All lifecycle rules live in
/// [`crate::attempt_transition`]; this struct is data only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stop {
    /// The stop's immutable identity.
    pub id: StopId,
    /// The route this stop belongs to.
    pub route_id: RouteId,
    /// Position within the route.
    pub sequence: StopSequence,
    /// Current lifecycle status.
    pub status: StopStatus,
    /// Set once, by the transition into `OnTheWay`.
    pub on_the_way_time: Option<OffsetDateTime>,
    /// Set once, by the transition into `Arrived`.
    pub arrival_time: Option<OffsetDateTime>,
    /// Set once, by the transition into `Completed`.
    pub completion_time: Option<OffsetDateTime>,
    /// The driver currently assigned to this stop.
    pub driver_id: Option<DriverId>,
    /// Display-name override for the assigned driver.
    pub driver_name_override: Option<String>,
    /// URL of the signed delivery document. Presence of this artifact is
    /// the delivery proof required by the `Completed` transition.
    pub signed_document_url: Option<String>,
    /// URLs of images captured at the stop, in upload order.
    pub uploaded_image_urls: Vec<String>,
    /// Payments collected at this stop.
    pub payment_records: Vec<PaymentRecord>,
    /// Free-form notes from the driver.
    pub driver_notes: Option<String>,
    /// Notes from administrators, each with a read flag.
    pub admin_notes: Vec<AdminNote>,
    /// Whether the driver has acknowledged the returns step.
    pub returns_acknowledged: bool,
    /// Reason recorded when the stop entered `Failed` or `Cancelled`.
    pub terminal_reason: Option<String>,
}

impl Stop {
    /// Creates a new `Pending` stop with no recorded artifacts.
    #[must_use]
    pub const fn new(id: StopId, route_id: RouteId, sequence: StopSequence) -> Self {
        Self {
            id,
            route_id,
            sequence,
            status: StopStatus::Pending,
            on_the_way_time: None,
            arrival_time: None,
            completion_time: None,
            driver_id: None,
            driver_name_override: None,
            signed_document_url: None,
            uploaded_image_urls: Vec::new(),
            payment_records: Vec::new(),
            driver_notes: None,
            admin_notes: Vec::new(),
            returns_acknowledged: false,
            terminal_reason: None,
        }
    }

    /// Returns true if the stop has a signed delivery document.
    #[must_use]
    pub const fn has_delivery_proof(&self) -> bool {
        self.signed_document_url.is_some()
    }
}
