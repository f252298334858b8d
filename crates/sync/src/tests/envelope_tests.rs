// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Wire-format tests for envelopes and patches.

use crate::{EnvelopePayload, StopPatch, SubjectId, UpdateEnvelope, Version};
use lastmile_domain::{DriverId, StopId, StopStatus};

#[test]
fn test_envelope_round_trips_through_json() {
    let envelope = UpdateEnvelope::for_stop(
        StopId::new(42),
        Version::new(7),
        StopPatch {
            status: Some(StopStatus::Arrived),
            ..StopPatch::default()
        },
    );

    let json = serde_json::to_string(&envelope).expect("serialize");
    let parsed: UpdateEnvelope = serde_json::from_str(&json).expect("deserialize");

    assert_eq!(parsed, envelope);
    assert_eq!(parsed.subject, SubjectId::Stop(StopId::new(42)));
}

#[test]
fn test_unchanged_fields_are_absent_from_the_wire() {
    let patch = StopPatch {
        status: Some(StopStatus::OnTheWay),
        ..StopPatch::default()
    };

    let json = serde_json::to_string(&patch).expect("serialize");

    assert!(json.contains("status"));
    assert!(!json.contains("driver_id"));
    assert!(!json.contains("signed_document_url"));
    assert!(!json.contains("payment_records"));
}

#[test]
fn test_absent_field_deserializes_as_unchanged() {
    let patch: StopPatch = serde_json::from_str(r#"{"status":"arrived"}"#).expect("parse");

    assert_eq!(patch.status, Some(StopStatus::Arrived));
    assert_eq!(patch.driver_id, None);
    assert_eq!(patch.driver_notes, None);
}

#[test]
fn test_explicit_null_deserializes_as_clear() {
    let patch: StopPatch =
        serde_json::from_str(r#"{"driver_id":null,"driver_notes":null}"#).expect("parse");

    assert_eq!(patch.driver_id, Some(None));
    assert_eq!(patch.driver_notes, Some(None));
}

#[test]
fn test_set_driver_round_trips() {
    let patch = StopPatch {
        driver_id: Some(Some(DriverId::new(9))),
        ..StopPatch::default()
    };

    let json = serde_json::to_string(&patch).expect("serialize");
    let parsed: StopPatch = serde_json::from_str(&json).expect("deserialize");

    assert_eq!(parsed.driver_id, Some(Some(DriverId::new(9))));
}

#[test]
fn test_payload_kind_tags_are_distinct() {
    let stop_env = UpdateEnvelope::for_stop(StopId::new(1), Version::new(1), StopPatch::default());
    let json = serde_json::to_string(&stop_env).expect("serialize");

    assert!(json.contains(r#""kind":"stop""#));
    match serde_json::from_str::<UpdateEnvelope>(&json).expect("parse").payload {
        EnvelopePayload::Stop(_) => {}
        EnvelopePayload::Route(_) => panic!("wrong payload kind"),
    }
}
