// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A stop status string could not be parsed.
    InvalidStopStatus {
        /// The unrecognized status string.
        status: String,
    },
    /// A stop sequence position is not positive.
    InvalidSequence {
        /// The invalid position value.
        position: u32,
    },
    /// A sequence position is already taken within the route.
    DuplicateSequence {
        /// The contested position.
        position: u32,
    },
    /// A payment method string could not be parsed.
    InvalidPaymentMethod {
        /// The unrecognized method string.
        method: String,
    },
    /// A completed stop cannot be edited or reassigned.
    StopFrozen {
        /// The status that froze the stop.
        status: String,
    },
    /// An admin note index does not exist on the stop.
    AdminNoteNotFound {
        /// The requested index.
        index: usize,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidStopStatus { status } => {
                write!(f, "Invalid stop status: '{status}'")
            }
            Self::InvalidSequence { position } => {
                write!(f, "Invalid sequence position: {position}. Must be positive")
            }
            Self::DuplicateSequence { position } => {
                write!(f, "Sequence position {position} is already taken in this route")
            }
            Self::InvalidPaymentMethod { method } => {
                write!(f, "Invalid payment method: '{method}'")
            }
            Self::StopFrozen { status } => {
                write!(f, "Stop is frozen in terminal status '{status}'")
            }
            Self::AdminNoteNotFound { index } => {
                write!(f, "No admin note at index {index}")
            }
        }
    }
}

impl std::error::Error for DomainError {}

/// Errors that can occur when a status transition is attempted.
///
/// These map directly to the ways a transition request can be refused.
/// They are recovered locally: the action does not apply and the actor is
/// informed. They are never silently ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The requested edge is not in the allowed transition table.
    InvalidTransition {
        /// The current status.
        from: String,
        /// The requested status.
        to: String,
    },
    /// The edge exists but its precondition is unmet.
    OutOfOrder {
        /// The requested status.
        to: String,
        /// The status the stop must be in first.
        required: String,
    },
    /// A side-effect gate blocks the transition.
    GateNotSatisfied {
        /// The name of the unsatisfied gate.
        gate: String,
    },
    /// A terminal transition was requested without a reason.
    MissingTerminalReason {
        /// The requested terminal status.
        to: String,
    },
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTransition { from, to } => {
                write!(f, "Invalid transition from '{from}' to '{to}'")
            }
            Self::OutOfOrder { to, required } => {
                write!(
                    f,
                    "Cannot enter '{to}': stop must be '{required}' first"
                )
            }
            Self::GateNotSatisfied { gate } => {
                write!(f, "Cannot complete stop: '{gate}' gate is not satisfied")
            }
            Self::MissingTerminalReason { to } => {
                write!(f, "A reason is required to mark a stop '{to}'")
            }
        }
    }
}

impl std::error::Error for TransitionError {}
