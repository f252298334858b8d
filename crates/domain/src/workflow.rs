// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The multi-step completion workflow.
//!
//! Gates are pure functions of the stop's artifacts, recomputed on every
//! artifact change. They are never persisted as independent booleans, so a
//! stored flag can never drift from the artifacts it describes.
//!
//! Only the `documents` gate blocks the `Completed` transition in the state
//! machine. The remaining gates sequence the driver's completion flow for
//! operator clarity; they do not gate the transition itself.

use crate::types::Stop;
use serde::{Deserialize, Serialize};

/// Per-stop gate satisfaction, derived from artifact presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateSet {
    /// A signed delivery document exists.
    pub documents: bool,
    /// The driver acknowledged the returns step.
    pub returns: bool,
    /// At least one payment record exists.
    pub payment: bool,
    /// Driver notes are present.
    pub notes: bool,
    /// At least one image was captured.
    pub images: bool,
}

/// Ordered steps of the completion workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStep {
    Documents,
    Returns,
    Payment,
    Notes,
    Images,
}

impl CompletionStep {
    /// Returns the step after this one, or `None` at the end.
    #[must_use]
    pub const fn next(&self) -> Option<Self> {
        match self {
            Self::Documents => Some(Self::Returns),
            Self::Returns => Some(Self::Payment),
            Self::Payment => Some(Self::Notes),
            Self::Notes => Some(Self::Images),
            Self::Images => None,
        }
    }
}

/// Computes the gate set for a stop from its current artifacts.
#[must_use]
pub fn gate_status(stop: &Stop) -> GateSet {
    GateSet {
        documents: stop.signed_document_url.is_some(),
        returns: stop.returns_acknowledged,
        payment: !stop.payment_records.is_empty(),
        notes: stop.driver_notes.is_some(),
        images: !stop.uploaded_image_urls.is_empty(),
    }
}

/// Returns true if the workflow may advance past `current`.
#[must_use]
pub const fn can_advance(gates: &GateSet, current: CompletionStep) -> bool {
    match current {
        CompletionStep::Documents => gates.documents,
        CompletionStep::Returns => gates.returns,
        CompletionStep::Payment => gates.payment,
        CompletionStep::Notes => gates.notes,
        CompletionStep::Images => gates.images,
    }
}

/// Advances the workflow by at most one step.
///
/// Called after a gate change. If the current step's gate is satisfied the
/// workflow moves exactly one step forward; it never skips steps and never
/// moves backward, even if a later gate flipped false.
#[must_use]
pub const fn auto_advance(gates: &GateSet, current: CompletionStep) -> CompletionStep {
    if can_advance(gates, current) {
        match current.next() {
            Some(next) => next,
            None => current,
        }
    } else {
        current
    }
}
