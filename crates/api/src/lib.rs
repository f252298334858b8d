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

mod auth;
mod error;
mod handlers;
mod request_response;
mod rooms;
mod session;

#[cfg(test)]
mod tests;

pub use auth::{AuthenticatedActor, AuthorizationService, Role};
pub use error::{
    ApiError, AuthError, translate_core_error, translate_domain_error,
    translate_persistence_error, translate_transition_error,
};
pub use handlers::{
    MutationResult, Publication, acknowledge_returns, add_admin_note, attach_image,
    attempt_stop_transition, create_route, create_stop, delete_route, get_route, get_stop,
    get_workflow_status, mark_admin_note_read, override_stop_status, reassign_driver,
    record_payment, resequence_stop, set_driver_notes, upload_signed_document,
};
pub use request_response::{
    AddAdminNoteRequest, AttachImageRequest, CreateRouteRequest, CreateStopRequest,
    DeleteRouteRequest, DeleteRouteResponse, MarkAdminNoteReadRequest, OverrideStatusRequest,
    ReassignDriverRequest, RecordPaymentRequest, ResequenceStopRequest, RouteSnapshotResponse,
    SetDriverNotesRequest, StopSnapshotResponse, StopTransitionRequest, UploadDocumentRequest,
    WorkflowStatusResponse,
};
pub use rooms::{Room, rooms_for_stop};
pub use session::{SESSION_TTL, SessionService};
