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

mod envelope;
mod error;
mod merge;
mod reconcile;
mod version;

#[cfg(test)]
mod tests;

pub use envelope::{EnvelopePayload, RoutePatch, StopPatch, SubjectId, UpdateEnvelope};
pub use error::ReconcileError;
pub use merge::{MergeOutcome, RouteView, StopView, apply_route_patch, apply_stop_patch};
pub use reconcile::{ConnectionHealth, ReconnectPolicy, StopObserver};
pub use version::{Version, VersionClock};
