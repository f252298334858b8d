// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use lastmile::CoreError;
use lastmile_domain::{DomainError, TransitionError};
use lastmile_persistence::PersistenceError;

/// Authentication and authorization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed - the actor does not have permission.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
    /// A domain rule was violated.
    DomainRuleViolation {
        /// The rule that was violated.
        rule: String,
        /// A human-readable description of the violation.
        message: String,
    },
    /// The state machine refused a status transition.
    TransitionRefused {
        /// The kind of refusal (invalid edge, ordering, gate, reason).
        kind: String,
        /// A human-readable description of the refusal.
        message: String,
    },
    /// Route deletion refused: completed deliveries are recorded on it.
    DeletionRefused {
        /// How many completed stops block the deletion.
        completed_count: usize,
        /// A human-readable description of the refusal.
        message: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
            Self::DomainRuleViolation { rule, message } => {
                write!(f, "Domain rule violation ({rule}): {message}")
            }
            Self::TransitionRefused { kind, message } => {
                write!(f, "Transition refused ({kind}): {message}")
            }
            Self::DeletionRefused {
                completed_count,
                message,
            } => {
                write!(f, "Deletion refused ({completed_count} completed): {message}")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationFailed { reason } => Self::AuthenticationFailed { reason },
            AuthError::Unauthorized {
                action,
                required_role,
            } => Self::Unauthorized {
                action,
                required_role,
            },
        }
    }
}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::InvalidStopStatus { status } => ApiError::InvalidInput {
            field: String::from("status"),
            message: format!("Invalid stop status: '{status}'"),
        },
        DomainError::InvalidSequence { position } => ApiError::InvalidInput {
            field: String::from("sequence"),
            message: format!("Invalid sequence position: {position}. Must be positive"),
        },
        DomainError::DuplicateSequence { position } => ApiError::DomainRuleViolation {
            rule: String::from("unique_sequence"),
            message: format!("Sequence position {position} is already taken in this route"),
        },
        DomainError::InvalidPaymentMethod { method } => ApiError::InvalidInput {
            field: String::from("payment_method"),
            message: format!("Invalid payment method: '{method}'"),
        },
        DomainError::StopFrozen { status } => ApiError::DomainRuleViolation {
            rule: String::from("terminal_stop_frozen"),
            message: format!("Stop is frozen in terminal status '{status}'"),
        },
        DomainError::AdminNoteNotFound { index } => ApiError::ResourceNotFound {
            resource_type: String::from("Admin note"),
            message: format!("No admin note at index {index}"),
        },
    }
}

/// Translates a transition error into an API error.
///
/// Every refusal kind is surfaced to the actor; none is silently dropped.
#[must_use]
pub fn translate_transition_error(err: TransitionError) -> ApiError {
    match err {
        TransitionError::InvalidTransition { from, to } => ApiError::TransitionRefused {
            kind: String::from("invalid_transition"),
            message: format!("Invalid transition from '{from}' to '{to}'"),
        },
        TransitionError::OutOfOrder { to, required } => ApiError::TransitionRefused {
            kind: String::from("out_of_order"),
            message: format!("Cannot enter '{to}': stop must be '{required}' first"),
        },
        TransitionError::GateNotSatisfied { gate } => ApiError::TransitionRefused {
            kind: String::from("gate_not_satisfied"),
            message: format!("Cannot complete stop: '{gate}' gate is not satisfied"),
        },
        TransitionError::MissingTerminalReason { to } => ApiError::TransitionRefused {
            kind: String::from("missing_terminal_reason"),
            message: format!("A reason is required to mark a stop '{to}'"),
        },
    }
}

/// Translates a core error into an API error.
///
/// This translation is explicit and ensures core errors are not leaked directly.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        CoreError::TransitionRefused(transition_err) => {
            translate_transition_error(transition_err)
        }
        CoreError::CompletedStopsPresent { route_id, count } => ApiError::DeletionRefused {
            completed_count: count,
            message: format!(
                "Route {route_id} has {count} completed stop(s); pass force to delete anyway"
            ),
        },
    }
}

/// Translates a persistence error into an API error.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::StopNotFound(id) => ApiError::ResourceNotFound {
            resource_type: String::from("Stop"),
            message: format!("Stop {id} does not exist"),
        },
        PersistenceError::RouteNotFound(id) => ApiError::ResourceNotFound {
            resource_type: String::from("Route"),
            message: format!("Route {id} does not exist"),
        },
        PersistenceError::RouteDeleted(id) => ApiError::ResourceNotFound {
            resource_type: String::from("Route"),
            message: format!("Route {id} has been deleted"),
        },
        PersistenceError::DuplicateStop(id) => ApiError::DomainRuleViolation {
            rule: String::from("unique_stop_id"),
            message: format!("Stop {id} already exists"),
        },
        PersistenceError::DuplicateRoute(id) => ApiError::DomainRuleViolation {
            rule: String::from("unique_route_id"),
            message: format!("Route {id} already exists"),
        },
    }
}
