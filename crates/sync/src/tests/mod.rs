// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod envelope_tests;

use lastmile_domain::{RouteId, Stop, StopId, StopSequence};

/// A fresh pending stop for merge and reconcile tests.
pub(crate) fn test_stop() -> Stop {
    let sequence = StopSequence::new(1).expect("positive sequence");
    Stop::new(StopId::new(1), RouteId::new(10), sequence)
}
