// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Cross-field validation rules for stops.

use crate::error::DomainError;
use crate::types::{Stop, StopSequence};
use crate::stop_status::StopStatus;

/// Validates that a sequence position is free within a route.
///
/// # Arguments
///
/// * `position` - The requested position
/// * `taken` - Sequence positions already used by other stops on the route
///
/// # Errors
///
/// Returns `DomainError::DuplicateSequence` if the position is taken.
pub fn validate_sequence(
    position: StopSequence,
    taken: &[StopSequence],
) -> Result<(), DomainError> {
    if taken.contains(&position) {
        return Err(DomainError::DuplicateSequence {
            position: position.value(),
        });
    }
    Ok(())
}

/// Validates that a stop may still be edited.
///
/// Terminal stops are frozen: artifact and field edits are refused.
///
/// # Errors
///
/// Returns `DomainError::StopFrozen` if the stop is in a terminal status.
pub fn validate_stop_editable(stop: &Stop) -> Result<(), DomainError> {
    if stop.status.is_terminal() {
        return Err(DomainError::StopFrozen {
            status: stop.status.as_str().to_string(),
        });
    }
    Ok(())
}

/// Validates that a stop may be reassigned to a different driver.
///
/// Reassignment is allowed while the stop has not completed. Failed and
/// cancelled stops may be reassigned so the delivery can be retried under a
/// new route build.
///
/// # Errors
///
/// Returns `DomainError::StopFrozen` if the stop is completed.
pub fn validate_driver_reassignment(stop: &Stop) -> Result<(), DomainError> {
    if stop.status == StopStatus::Completed {
        return Err(DomainError::StopFrozen {
            status: stop.status.as_str().to_string(),
        });
    }
    Ok(())
}
