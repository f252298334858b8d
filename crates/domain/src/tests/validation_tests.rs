// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tests for cross-field stop validation rules.

use crate::{
    DomainError, RouteId, Stop, StopId, StopSequence, StopStatus, validate_driver_reassignment,
    validate_sequence, validate_stop_editable,
};

fn stop_with_status(status: StopStatus) -> Stop {
    let sequence = StopSequence::new(1).expect("positive sequence");
    let mut stop = Stop::new(StopId::new(1), RouteId::new(10), sequence);
    stop.status = status;
    stop
}

#[test]
fn test_sequence_must_be_positive() {
    let result = StopSequence::new(0);

    assert!(matches!(
        result,
        Err(DomainError::InvalidSequence { position: 0 })
    ));
}

#[test]
fn test_sequence_unique_within_route() {
    let taken = vec![
        StopSequence::new(1).expect("seq"),
        StopSequence::new(2).expect("seq"),
    ];

    let free = StopSequence::new(3).expect("seq");
    assert!(validate_sequence(free, &taken).is_ok());

    let contested = StopSequence::new(2).expect("seq");
    assert!(matches!(
        validate_sequence(contested, &taken),
        Err(DomainError::DuplicateSequence { position: 2 })
    ));
}

#[test]
fn test_terminal_stops_are_frozen_to_edits() {
    for status in [
        StopStatus::Completed,
        StopStatus::Failed,
        StopStatus::Cancelled,
    ] {
        let stop = stop_with_status(status);
        assert!(matches!(
            validate_stop_editable(&stop),
            Err(DomainError::StopFrozen { .. })
        ));
    }
}

#[test]
fn test_active_stops_are_editable() {
    for status in [StopStatus::Pending, StopStatus::OnTheWay, StopStatus::Arrived] {
        let stop = stop_with_status(status);
        assert!(validate_stop_editable(&stop).is_ok());
    }
}

#[test]
fn test_reassignment_allowed_while_not_completed() {
    for status in [
        StopStatus::Pending,
        StopStatus::OnTheWay,
        StopStatus::Arrived,
        StopStatus::Failed,
        StopStatus::Cancelled,
    ] {
        let stop = stop_with_status(status);
        assert!(validate_driver_reassignment(&stop).is_ok());
    }
}

#[test]
fn test_reassignment_refused_for_completed_stop() {
    let stop = stop_with_status(StopStatus::Completed);

    assert!(matches!(
        validate_driver_reassignment(&stop),
        Err(DomainError::StopFrozen { .. })
    ));
}
