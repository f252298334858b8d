// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The stop state machine.
//!
//! [`attempt_transition`] is the only driver-facing path to a status change.
//! It is pure: it validates the requested edge against the current stop,
//! evaluates side-effect gates, and returns a new stop. Callers persist the
//! returned stop and then emit an update envelope; no envelope exists for a
//! transition that did not persist.

use crate::error::TransitionError;
use crate::stop_status::StopStatus;
use crate::types::Stop;
use time::OffsetDateTime;

/// Inputs a transition needs beyond the stop itself.
///
/// The machine does not read clocks; the caller supplies the time so the
/// machine stays pure and testable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionContext {
    /// The time to stamp on the status being entered.
    pub now: OffsetDateTime,
    /// Reason for a terminal transition. Required for `Failed`/`Cancelled`,
    /// ignored otherwise.
    pub reason: Option<String>,
}

impl TransitionContext {
    /// Creates a context with no terminal reason.
    #[must_use]
    pub const fn new(now: OffsetDateTime) -> Self {
        Self { now, reason: None }
    }

    /// Creates a context carrying a terminal reason.
    #[must_use]
    pub const fn with_reason(now: OffsetDateTime, reason: String) -> Self {
        Self {
            now,
            reason: Some(reason),
        }
    }
}

/// Attempts to move a stop to `target` status.
///
/// # Arguments
///
/// * `stop` - The current stop (immutable)
/// * `target` - The requested status
/// * `context` - The caller-supplied time and optional terminal reason
///
/// # Returns
///
/// * `Ok(Stop)` - the stop after the transition; the caller owns persistence
/// * `Err(TransitionError)` - the transition was refused and nothing changed
///
/// # Errors
///
/// Returns an error if:
/// - The edge is not in the allowed table (`InvalidTransition`)
/// - `Arrived` is requested while the stop is not `OnTheWay` (`OutOfOrder`)
/// - `Completed` is requested without a signed document (`GateNotSatisfied`)
/// - `Failed`/`Cancelled` is requested without a reason (`MissingTerminalReason`)
pub fn attempt_transition(
    stop: &Stop,
    target: StopStatus,
    context: &TransitionContext,
) -> Result<Stop, TransitionError> {
    // Arrived has a dedicated precondition error so the actor sees which
    // status must come first, not just "invalid edge".
    if target == StopStatus::Arrived && stop.status != StopStatus::OnTheWay {
        return Err(TransitionError::OutOfOrder {
            to: target.as_str().to_string(),
            required: StopStatus::OnTheWay.as_str().to_string(),
        });
    }

    if !stop.status.edge_allowed(target) {
        return Err(TransitionError::InvalidTransition {
            from: stop.status.as_str().to_string(),
            to: target.as_str().to_string(),
        });
    }

    match target {
        StopStatus::OnTheWay => {
            let mut new_stop: Stop = stop.clone();
            new_stop.status = StopStatus::OnTheWay;
            // Idempotent: re-entering never overwrites the first timestamp.
            if new_stop.on_the_way_time.is_none() {
                new_stop.on_the_way_time = Some(context.now);
            }
            Ok(new_stop)
        }
        StopStatus::Arrived => {
            let mut new_stop: Stop = stop.clone();
            new_stop.status = StopStatus::Arrived;
            if new_stop.arrival_time.is_none() {
                new_stop.arrival_time = Some(context.now);
            }
            Ok(new_stop)
        }
        StopStatus::Completed => {
            // The delivery proof is the one gate the machine itself enforces.
            if !stop.has_delivery_proof() {
                return Err(TransitionError::GateNotSatisfied {
                    gate: String::from("documents"),
                });
            }
            let mut new_stop: Stop = stop.clone();
            new_stop.status = StopStatus::Completed;
            if new_stop.completion_time.is_none() {
                new_stop.completion_time = Some(context.now);
            }
            Ok(new_stop)
        }
        StopStatus::Failed | StopStatus::Cancelled => {
            let Some(reason) = context.reason.clone() else {
                return Err(TransitionError::MissingTerminalReason {
                    to: target.as_str().to_string(),
                });
            };
            let mut new_stop: Stop = stop.clone();
            new_stop.status = target;
            new_stop.terminal_reason = Some(reason);
            Ok(new_stop)
        }
        StopStatus::Pending => {
            // No edge enters Pending; edge_allowed already rejected this.
            Err(TransitionError::InvalidTransition {
                from: stop.status.as_str().to_string(),
                to: target.as_str().to_string(),
            })
        }
    }
}

/// Admin override: forces a stop to an arbitrary status.
///
/// This is a privileged operation outside the driver-facing machine. It may
/// move status backward. Timestamps already set are never cleared, and no
/// new timestamps are stamped; the override corrects the status field only.
///
/// # Errors
///
/// Returns `MissingTerminalReason` if a terminal status is forced without a
/// reason.
pub fn admin_override_status(
    stop: &Stop,
    target: StopStatus,
    context: &TransitionContext,
) -> Result<Stop, TransitionError> {
    let mut new_stop: Stop = stop.clone();
    if target.is_terminal() && target != StopStatus::Completed {
        let Some(reason) = context.reason.clone() else {
            return Err(TransitionError::MissingTerminalReason {
                to: target.as_str().to_string(),
            });
        };
        new_stop.terminal_reason = Some(reason);
    }
    new_stop.status = target;
    Ok(new_stop)
}
