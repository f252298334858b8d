// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use lastmile_domain::{RouteId, Stop, StopId, StopSequence, StopStatus};
use time::OffsetDateTime;
use time::macros::datetime;

/// A fixed time for deterministic tests.
pub fn test_now() -> OffsetDateTime {
    datetime!(2026-03-01 08:00 UTC)
}

/// A fresh pending stop.
pub fn pending_stop() -> Stop {
    let sequence = StopSequence::new(1).expect("positive sequence");
    Stop::new(StopId::new(1), RouteId::new(10), sequence)
}

/// A stop in `Arrived` status with a signed document attached.
pub fn arrived_stop_with_proof() -> Stop {
    let mut stop = pending_stop();
    stop.status = StopStatus::Arrived;
    stop.on_the_way_time = Some(datetime!(2026-03-01 07:00 UTC));
    stop.arrival_time = Some(datetime!(2026-03-01 07:30 UTC));
    stop.signed_document_url = Some(String::from("https://docs/proof.pdf"));
    stop
}
