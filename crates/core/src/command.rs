// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use lastmile_domain::{DriverId, PaymentMethod, StopSequence, StopStatus};

/// A command represents actor intent as data only.
///
/// Commands are the only way to request a stop mutation. Each successful
/// command produces exactly one field-wise patch, which becomes the payload
/// of the update envelope fanned out to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Move the stop through the driver-facing state machine.
    SetStopStatus {
        /// The requested status.
        target: StopStatus,
        /// Reason, required for terminal statuses.
        reason: Option<String>,
    },
    /// Force a status, bypassing the driver-facing machine. Privileged.
    OverrideStatus {
        /// The forced status.
        target: StopStatus,
        /// Reason, required for terminal statuses other than completed.
        reason: Option<String>,
    },
    /// Attach the signed delivery document.
    UploadSignedDocument {
        /// Location of the stored document.
        url: String,
    },
    /// Append a captured image.
    AttachImage {
        /// Location of the stored image.
        url: String,
    },
    /// Record a payment collected at the stop.
    RecordPayment {
        /// Amount in cents.
        amount_cents: i64,
        /// How the payment was made.
        method: PaymentMethod,
        /// Free-form notes.
        notes: Option<String>,
    },
    /// Mark the returns step of the completion workflow acknowledged.
    AcknowledgeReturns,
    /// Replace the driver's notes.
    SetDriverNotes {
        /// The new notes, or `None` to clear them.
        notes: Option<String>,
    },
    /// Append an admin note, unread.
    AddAdminNote {
        /// The note text.
        body: String,
    },
    /// Mark an admin note as read by the driver.
    MarkAdminNoteRead {
        /// Index of the note in creation order.
        index: usize,
    },
    /// Reassign the stop to a different driver (or unassign it).
    ReassignDriver {
        /// The new driver, or `None` to unassign.
        driver_id: Option<DriverId>,
        /// Display-name override for the new driver.
        name_override: Option<String>,
    },
    /// Move the stop to a different position within its route.
    ResequenceStop {
        /// The new position.
        sequence: StopSequence,
    },
}
