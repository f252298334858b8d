// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tests for the stop state machine.
//!
//! These cover the allowed-edge table, timestamp stamping, the delivery
//! proof gate, terminal freezing, and the admin override path.

use crate::{
    RouteId, Stop, StopId, StopSequence, StopStatus, TransitionContext, TransitionError,
    admin_override_status, attempt_transition,
};
use time::OffsetDateTime;
use time::macros::datetime;

fn pending_stop() -> Stop {
    #[allow(clippy::unwrap_used)]
    let sequence = StopSequence::new(1).unwrap();
    Stop::new(StopId::new(1), RouteId::new(10), sequence)
}

fn ctx(now: OffsetDateTime) -> TransitionContext {
    TransitionContext::new(now)
}

fn arrived_stop_with_proof() -> Stop {
    let stop = pending_stop();
    let stop = attempt_transition(&stop, StopStatus::OnTheWay, &ctx(datetime!(2026-03-01 08:00 UTC)))
        .expect("pending -> on_the_way");
    let mut stop =
        attempt_transition(&stop, StopStatus::Arrived, &ctx(datetime!(2026-03-01 08:30 UTC)))
            .expect("on_the_way -> arrived");
    stop.signed_document_url = Some(String::from("https://docs/proof.pdf"));
    stop
}

// ============================================================================
// Forward path
// ============================================================================

#[test]
fn test_pending_to_on_the_way_sets_timestamp() {
    let stop = pending_stop();
    let now = datetime!(2026-03-01 08:00 UTC);

    let result = attempt_transition(&stop, StopStatus::OnTheWay, &ctx(now)).expect("transition");

    assert_eq!(result.status, StopStatus::OnTheWay);
    assert_eq!(result.on_the_way_time, Some(now));
    assert_eq!(result.arrival_time, None);
    assert_eq!(result.completion_time, None);
}

#[test]
fn test_on_the_way_timestamp_is_set_exactly_once() {
    let stop = pending_stop();
    let first = datetime!(2026-03-01 08:00 UTC);

    let mut result = attempt_transition(&stop, StopStatus::OnTheWay, &ctx(first)).expect("first");
    // Simulate an admin override back to pending followed by a re-entry.
    result.status = StopStatus::Pending;
    let again = attempt_transition(
        &result,
        StopStatus::OnTheWay,
        &ctx(datetime!(2026-03-01 09:00 UTC)),
    )
    .expect("second");

    assert_eq!(again.on_the_way_time, Some(first));
}

#[test]
fn test_on_the_way_to_arrived_sets_arrival_time() {
    let stop = pending_stop();
    let stop = attempt_transition(&stop, StopStatus::OnTheWay, &ctx(datetime!(2026-03-01 08:00 UTC)))
        .expect("on_the_way");
    let arrival = datetime!(2026-03-01 08:30 UTC);

    let result = attempt_transition(&stop, StopStatus::Arrived, &ctx(arrival)).expect("arrived");

    assert_eq!(result.status, StopStatus::Arrived);
    assert_eq!(result.arrival_time, Some(arrival));
}

#[test]
fn test_completed_with_proof_sets_completion_time() {
    let stop = arrived_stop_with_proof();
    let completion = datetime!(2026-03-01 09:00 UTC);

    let result =
        attempt_transition(&stop, StopStatus::Completed, &ctx(completion)).expect("completed");

    assert_eq!(result.status, StopStatus::Completed);
    assert_eq!(result.completion_time, Some(completion));
    // All three timestamps present and ordered.
    let on_the_way = result.on_the_way_time.expect("on_the_way_time");
    let arrival = result.arrival_time.expect("arrival_time");
    assert!(on_the_way <= arrival);
    assert!(arrival <= completion);
}

// ============================================================================
// Refused edges
// ============================================================================

#[test]
fn test_arrived_without_on_the_way_is_out_of_order() {
    let stop = pending_stop();

    let result = attempt_transition(
        &stop,
        StopStatus::Arrived,
        &ctx(datetime!(2026-03-01 08:00 UTC)),
    );

    assert!(matches!(
        result,
        Err(TransitionError::OutOfOrder { .. })
    ));
}

#[test]
fn test_completed_from_pending_is_invalid() {
    let mut stop = pending_stop();
    stop.signed_document_url = Some(String::from("https://docs/proof.pdf"));

    let result = attempt_transition(
        &stop,
        StopStatus::Completed,
        &ctx(datetime!(2026-03-01 08:00 UTC)),
    );

    assert!(matches!(
        result,
        Err(TransitionError::InvalidTransition { .. })
    ));
}

#[test]
fn test_completed_without_document_fails_gate() {
    let mut stop = arrived_stop_with_proof();
    stop.signed_document_url = None;

    let result = attempt_transition(
        &stop,
        StopStatus::Completed,
        &ctx(datetime!(2026-03-01 09:00 UTC)),
    );

    match result {
        Err(TransitionError::GateNotSatisfied { gate }) => assert_eq!(gate, "documents"),
        other => panic!("Expected GateNotSatisfied, got {other:?}"),
    }
}

#[test]
fn test_gate_failure_leaves_stop_unchanged() {
    let mut stop = arrived_stop_with_proof();
    stop.signed_document_url = None;
    let before = stop.clone();

    let _ = attempt_transition(
        &stop,
        StopStatus::Completed,
        &ctx(datetime!(2026-03-01 09:00 UTC)),
    );

    assert_eq!(stop, before);
}

#[test]
fn test_backward_transition_is_invalid() {
    let stop = pending_stop();
    let stop = attempt_transition(&stop, StopStatus::OnTheWay, &ctx(datetime!(2026-03-01 08:00 UTC)))
        .expect("on_the_way");

    let result = attempt_transition(
        &stop,
        StopStatus::Pending,
        &ctx(datetime!(2026-03-01 08:05 UTC)),
    );

    assert!(matches!(
        result,
        Err(TransitionError::InvalidTransition { .. })
    ));
}

#[test]
fn test_no_transitions_from_terminal_states() {
    let mut failed = pending_stop();
    failed.status = StopStatus::Failed;

    for target in [
        StopStatus::Pending,
        StopStatus::OnTheWay,
        StopStatus::Arrived,
        StopStatus::Completed,
        StopStatus::Cancelled,
    ] {
        let result = attempt_transition(&failed, target, &ctx(datetime!(2026-03-01 10:00 UTC)));
        assert!(result.is_err(), "transition to {target} should be refused");
    }
}

// ============================================================================
// Terminal transitions
// ============================================================================

#[test]
fn test_failed_records_reason_from_any_non_terminal_state() {
    for setup in [StopStatus::Pending, StopStatus::OnTheWay, StopStatus::Arrived] {
        let mut stop = pending_stop();
        stop.status = setup;

        let context = TransitionContext::with_reason(
            datetime!(2026-03-01 10:00 UTC),
            String::from("recipient unavailable"),
        );
        let result = attempt_transition(&stop, StopStatus::Failed, &context).expect("failed");

        assert_eq!(result.status, StopStatus::Failed);
        assert_eq!(
            result.terminal_reason,
            Some(String::from("recipient unavailable"))
        );
    }
}

#[test]
fn test_cancelled_requires_reason() {
    let stop = pending_stop();

    let result = attempt_transition(
        &stop,
        StopStatus::Cancelled,
        &ctx(datetime!(2026-03-01 10:00 UTC)),
    );

    assert!(matches!(
        result,
        Err(TransitionError::MissingTerminalReason { .. })
    ));
}

#[test]
fn test_terminal_transition_freezes_other_fields() {
    let stop = arrived_stop_with_proof();
    let context = TransitionContext::with_reason(
        datetime!(2026-03-01 10:00 UTC),
        String::from("order cancelled by customer"),
    );

    let result = attempt_transition(&stop, StopStatus::Cancelled, &context).expect("cancelled");

    // Everything except status and reason is untouched.
    assert_eq!(result.on_the_way_time, stop.on_the_way_time);
    assert_eq!(result.arrival_time, stop.arrival_time);
    assert_eq!(result.signed_document_url, stop.signed_document_url);
    assert_eq!(result.driver_id, stop.driver_id);
}

// ============================================================================
// Admin override
// ============================================================================

#[test]
fn test_admin_override_may_move_status_backward() {
    let mut stop = pending_stop();
    stop.status = StopStatus::Arrived;
    stop.on_the_way_time = Some(datetime!(2026-03-01 08:00 UTC));
    stop.arrival_time = Some(datetime!(2026-03-01 08:30 UTC));

    let result =
        admin_override_status(&stop, StopStatus::OnTheWay, &ctx(datetime!(2026-03-01 09:00 UTC)))
            .expect("override");

    assert_eq!(result.status, StopStatus::OnTheWay);
    // Timestamps already set are never cleared by an override.
    assert_eq!(result.on_the_way_time, stop.on_the_way_time);
    assert_eq!(result.arrival_time, stop.arrival_time);
}

#[test]
fn test_admin_override_to_failed_requires_reason() {
    let stop = pending_stop();

    let result = admin_override_status(
        &stop,
        StopStatus::Failed,
        &ctx(datetime!(2026-03-01 09:00 UTC)),
    );

    assert!(matches!(
        result,
        Err(TransitionError::MissingTerminalReason { .. })
    ));
}
