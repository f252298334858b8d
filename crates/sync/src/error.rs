// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::envelope::SubjectId;
use thiserror::Error;

/// Errors from offering an envelope to the wrong local view.
///
/// These indicate a routing bug in the caller, not a protocol condition;
/// stale envelopes are a normal [`crate::MergeOutcome::Stale`], never an
/// error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// The envelope describes a different subject than this view holds.
    #[error("envelope for {got} offered to view of {expected}")]
    SubjectMismatch {
        /// The subject the view holds.
        expected: SubjectId,
        /// The subject the envelope describes.
        got: SubjectId,
    },
    /// The envelope's payload kind does not match its subject kind.
    #[error("payload kind does not match subject {subject}")]
    PayloadKindMismatch {
        /// The subject of the view.
        subject: SubjectId,
    },
}
