// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod error;
mod route;
mod stop_status;
mod transition;
mod types;
mod validation;
mod workflow;

#[cfg(test)]
mod tests;

pub use error::{DomainError, TransitionError};
pub use route::Route;
pub use stop_status::StopStatus;
pub use transition::{TransitionContext, admin_override_status, attempt_transition};
pub use types::{
    AdminNote, DriverId, PaymentMethod, PaymentRecord, RouteId, Stop, StopId, StopSequence,
};
pub use validation::{validate_driver_reassignment, validate_sequence, validate_stop_editable};
pub use workflow::{CompletionStep, GateSet, auto_advance, can_advance, gate_status};
