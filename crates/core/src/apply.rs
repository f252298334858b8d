// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::command::Command;
use crate::error::CoreError;
use crate::routes::RouteContext;
use lastmile_domain::{
    AdminNote, PaymentRecord, Stop, TransitionContext, admin_override_status, attempt_transition,
    validate_driver_reassignment, validate_sequence, validate_stop_editable,
};
use lastmile_sync::StopPatch;
use time::OffsetDateTime;

/// The result of a successfully applied command.
///
/// Transitions are atomic: they either succeed completely or fail without
/// side effects. The patch carries exactly the fields the command changed;
/// it is the envelope payload after the caller persists `new_stop`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    /// The stop after the command.
    pub new_stop: Stop,
    /// The changed fields, for fan-out.
    pub patch: StopPatch,
    /// Short action name for logging.
    pub action: &'static str,
}

/// Applies a command to a stop, producing the new stop and its patch.
///
/// This function performs no I/O. The caller persists `new_stop` (which
/// assigns the envelope version) and then publishes the patch; no envelope
/// exists for a command that fails here or fails to persist.
///
/// # Arguments
///
/// * `context` - Route-level context for cross-stop validation
/// * `stop` - The current stop (immutable)
/// * `command` - The command to apply
/// * `now` - The time to stamp on any status or artifact change
///
/// # Errors
///
/// Returns an error if:
/// - The state machine refuses the requested transition
/// - The stop is frozen in a terminal status
/// - The command violates a domain rule (duplicate sequence, missing note)
pub fn apply(
    context: &RouteContext,
    stop: &Stop,
    command: Command,
    now: OffsetDateTime,
) -> Result<TransitionOutcome, CoreError> {
    match command {
        Command::SetStopStatus { target, reason } => {
            let transition_context: TransitionContext = TransitionContext {
                now,
                reason,
            };
            let new_stop: Stop = attempt_transition(stop, target, &transition_context)?;
            let patch: StopPatch = diff_stops(stop, &new_stop);
            Ok(TransitionOutcome {
                new_stop,
                patch,
                action: "SetStopStatus",
            })
        }
        Command::OverrideStatus { target, reason } => {
            let transition_context: TransitionContext = TransitionContext {
                now,
                reason,
            };
            let new_stop: Stop = admin_override_status(stop, target, &transition_context)?;
            let patch: StopPatch = diff_stops(stop, &new_stop);
            Ok(TransitionOutcome {
                new_stop,
                patch,
                action: "OverrideStatus",
            })
        }
        Command::UploadSignedDocument { url } => {
            validate_stop_editable(stop)?;
            let mut new_stop: Stop = stop.clone();
            new_stop.signed_document_url = Some(url);
            let patch: StopPatch = diff_stops(stop, &new_stop);
            Ok(TransitionOutcome {
                new_stop,
                patch,
                action: "UploadSignedDocument",
            })
        }
        Command::AttachImage { url } => {
            validate_stop_editable(stop)?;
            let mut new_stop: Stop = stop.clone();
            new_stop.uploaded_image_urls.push(url);
            let patch: StopPatch = diff_stops(stop, &new_stop);
            Ok(TransitionOutcome {
                new_stop,
                patch,
                action: "AttachImage",
            })
        }
        Command::RecordPayment {
            amount_cents,
            method,
            notes,
        } => {
            validate_stop_editable(stop)?;
            let mut new_stop: Stop = stop.clone();
            new_stop.payment_records.push(PaymentRecord {
                amount_cents,
                method,
                notes,
                recorded_at: now,
            });
            let patch: StopPatch = diff_stops(stop, &new_stop);
            Ok(TransitionOutcome {
                new_stop,
                patch,
                action: "RecordPayment",
            })
        }
        Command::AcknowledgeReturns => {
            validate_stop_editable(stop)?;
            let mut new_stop: Stop = stop.clone();
            new_stop.returns_acknowledged = true;
            let patch: StopPatch = diff_stops(stop, &new_stop);
            Ok(TransitionOutcome {
                new_stop,
                patch,
                action: "AcknowledgeReturns",
            })
        }
        Command::SetDriverNotes { notes } => {
            validate_stop_editable(stop)?;
            let mut new_stop: Stop = stop.clone();
            new_stop.driver_notes = notes;
            let patch: StopPatch = diff_stops(stop, &new_stop);
            Ok(TransitionOutcome {
                new_stop,
                patch,
                action: "SetDriverNotes",
            })
        }
        Command::AddAdminNote { body } => {
            validate_stop_editable(stop)?;
            let mut new_stop: Stop = stop.clone();
            new_stop.admin_notes.push(AdminNote::new(body, now));
            let patch: StopPatch = diff_stops(stop, &new_stop);
            Ok(TransitionOutcome {
                new_stop,
                patch,
                action: "AddAdminNote",
            })
        }
        Command::MarkAdminNoteRead { index } => {
            validate_stop_editable(stop)?;
            let mut new_stop: Stop = stop.clone();
            let Some(note) = new_stop.admin_notes.get_mut(index) else {
                return Err(CoreError::DomainViolation(
                    lastmile_domain::DomainError::AdminNoteNotFound { index },
                ));
            };
            note.read = true;
            let patch: StopPatch = diff_stops(stop, &new_stop);
            Ok(TransitionOutcome {
                new_stop,
                patch,
                action: "MarkAdminNoteRead",
            })
        }
        Command::ReassignDriver {
            driver_id,
            name_override,
        } => {
            validate_driver_reassignment(stop)?;
            let mut new_stop: Stop = stop.clone();
            new_stop.driver_id = driver_id;
            new_stop.driver_name_override = name_override;
            let patch: StopPatch = diff_stops(stop, &new_stop);
            Ok(TransitionOutcome {
                new_stop,
                patch,
                action: "ReassignDriver",
            })
        }
        Command::ResequenceStop { sequence } => {
            validate_stop_editable(stop)?;
            validate_sequence(sequence, &context.taken_sequences)?;
            let mut new_stop: Stop = stop.clone();
            new_stop.sequence = sequence;
            let patch: StopPatch = diff_stops(stop, &new_stop);
            Ok(TransitionOutcome {
                new_stop,
                patch,
                action: "ResequenceStop",
            })
        }
    }
}

/// Computes the field-wise difference between two versions of a stop.
///
/// The result carries only fields that differ, which is what keeps merge
/// application on observers from clobbering concurrent unrelated edits.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn diff_stops(old: &Stop, new: &Stop) -> StopPatch {
    let mut patch: StopPatch = StopPatch::default();
    if new.status != old.status {
        patch.status = Some(new.status);
    }
    if new.sequence != old.sequence {
        patch.sequence = Some(new.sequence);
    }
    if new.on_the_way_time != old.on_the_way_time {
        patch.on_the_way_time = new.on_the_way_time;
    }
    if new.arrival_time != old.arrival_time {
        patch.arrival_time = new.arrival_time;
    }
    if new.completion_time != old.completion_time {
        patch.completion_time = new.completion_time;
    }
    if new.driver_id != old.driver_id {
        patch.driver_id = Some(new.driver_id);
    }
    if new.driver_name_override != old.driver_name_override {
        patch.driver_name_override = Some(new.driver_name_override.clone());
    }
    if new.signed_document_url != old.signed_document_url {
        patch.signed_document_url = Some(new.signed_document_url.clone());
    }
    if new.uploaded_image_urls != old.uploaded_image_urls {
        patch.uploaded_image_urls = Some(new.uploaded_image_urls.clone());
    }
    if new.payment_records != old.payment_records {
        patch.payment_records = Some(new.payment_records.clone());
    }
    if new.driver_notes != old.driver_notes {
        patch.driver_notes = Some(new.driver_notes.clone());
    }
    if new.admin_notes != old.admin_notes {
        patch.admin_notes = Some(new.admin_notes.clone());
    }
    if new.returns_acknowledged != old.returns_acknowledged {
        patch.returns_acknowledged = Some(new.returns_acknowledged);
    }
    if new.terminal_reason != old.terminal_reason {
        patch.terminal_reason = new.terminal_reason.clone();
    }
    patch
}
