// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API operation handlers.
//!
//! Every mutation follows the same shape: authorize, read the current
//! state, apply the command as a pure function, persist the result (which
//! assigns the envelope version), and hand back the envelope with its
//! target rooms. Publication happens after this function returns, so a
//! failed mutation can never produce an envelope.

use crate::auth::{AuthenticatedActor, AuthorizationService, Role};
use crate::error::{ApiError, translate_core_error, translate_domain_error,
    translate_persistence_error};
use crate::request_response::{
    AddAdminNoteRequest, AttachImageRequest, CreateRouteRequest, CreateStopRequest,
    DeleteRouteRequest, DeleteRouteResponse, MarkAdminNoteReadRequest, OverrideStatusRequest,
    ReassignDriverRequest, RecordPaymentRequest, ResequenceStopRequest, RouteSnapshotResponse,
    SetDriverNotesRequest, StopSnapshotResponse, StopTransitionRequest, UploadDocumentRequest,
    WorkflowStatusResponse,
};
use crate::rooms::{Room, rooms_for_stop};
use lastmile::{Command, RouteContext, RouteDeletion, apply, plan_route_deletion};
use lastmile_domain::{
    CompletionStep, DriverId, GateSet, Route, RouteId, Stop, StopId, StopSequence, StopStatus,
    can_advance, gate_status,
};
use lastmile_persistence::Store;
use lastmile_sync::{RoutePatch, StopPatch, UpdateEnvelope, Version};
use time::OffsetDateTime;
use tracing::{info, warn};

/// An envelope paired with the rooms it fans out to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    /// The versioned mutation record.
    pub envelope: UpdateEnvelope,
    /// The rooms the envelope targets.
    pub rooms: Vec<Room>,
}

/// A successful mutation: the response body plus the publication the
/// caller broadcasts after returning it.
#[derive(Debug, Clone)]
pub struct MutationResult<T> {
    /// The response returned to the requesting actor.
    pub response: T,
    /// What to broadcast, and where.
    pub publication: Publication,
}

/// Creates a new route.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the route id is taken.
pub fn create_route(
    actor: &AuthenticatedActor,
    store: &mut Store,
    request: CreateRouteRequest,
) -> Result<MutationResult<RouteSnapshotResponse>, ApiError> {
    AuthorizationService::authorize_manage_routes(actor)?;

    let route: Route = Route::new(RouteId::new(request.route_id), request.name);
    let (route, version): (Route, Version) = store
        .insert_route(route)
        .map_err(translate_persistence_error)?;

    info!(actor_id = %actor.id, route_id = %route.id, %version, "Created route");

    let patch: RoutePatch = RoutePatch {
        name: Some(route.name.clone()),
        stop_ids: Some(route.stop_ids.clone()),
        driver_id: Some(route.driver_id),
        deleted: Some(false),
    };
    let envelope: UpdateEnvelope = UpdateEnvelope::for_route(route.id, version, patch);
    let rooms: Vec<Room> = vec![Room::Admin, Room::Route(route.id)];

    Ok(MutationResult {
        response: RouteSnapshotResponse {
            route,
            version,
            stops: Vec::new(),
        },
        publication: Publication { envelope, rooms },
    })
}

/// Creates a stop on an existing route.
///
/// # Errors
///
/// Returns an error if the actor is not an admin, the route is missing or
/// deleted, the sequence is invalid or taken, or the stop id is taken.
pub fn create_stop(
    actor: &AuthenticatedActor,
    store: &mut Store,
    request: CreateStopRequest,
) -> Result<MutationResult<StopSnapshotResponse>, ApiError> {
    AuthorizationService::authorize_manage_routes(actor)?;

    let sequence: StopSequence =
        StopSequence::new(request.sequence).map_err(translate_domain_error)?;
    let route_id: RouteId = RouteId::new(request.route_id);
    let (route, _) = store.read_route(route_id).map_err(translate_persistence_error)?;
    if route.deleted {
        return Err(ApiError::ResourceNotFound {
            resource_type: String::from("Route"),
            message: format!("Route {route_id} has been deleted"),
        });
    }
    let siblings: Vec<Stop> = store
        .route_stops(route_id)
        .map_err(translate_persistence_error)?;
    if siblings.iter().any(|s| s.sequence == sequence) {
        return Err(translate_domain_error(
            lastmile_domain::DomainError::DuplicateSequence {
                position: sequence.value(),
            },
        ));
    }

    let mut stop: Stop = Stop::new(StopId::new(request.stop_id), route_id, sequence);
    stop.driver_id = request.driver_id.map(DriverId::new);

    let (stop, version): (Stop, Version) = store
        .insert_stop(stop)
        .map_err(translate_persistence_error)?;

    info!(actor_id = %actor.id, stop_id = %stop.id, %version, "Created stop");

    let patch: StopPatch = StopPatch {
        status: Some(stop.status),
        sequence: Some(stop.sequence),
        driver_id: Some(stop.driver_id),
        ..StopPatch::default()
    };
    let envelope: UpdateEnvelope = UpdateEnvelope::for_stop(stop.id, version, patch);
    let rooms: Vec<Room> = rooms_for_stop(&stop);

    Ok(MutationResult {
        response: StopSnapshotResponse { stop, version },
        publication: Publication { envelope, rooms },
    })
}

/// Soft-deletes a route.
///
/// A route with completed stops is refused unless `force` is set; the
/// refusal carries the completed count for the confirmation prompt.
///
/// # Errors
///
/// Returns an error if the actor is not an admin, the route is missing,
/// or completed stops block an unforced deletion.
pub fn delete_route(
    actor: &AuthenticatedActor,
    store: &mut Store,
    route_id: RouteId,
    request: &DeleteRouteRequest,
) -> Result<MutationResult<DeleteRouteResponse>, ApiError> {
    AuthorizationService::authorize_delete_route(actor)?;

    let (route, _) = store.read_route(route_id).map_err(translate_persistence_error)?;
    let stops: Vec<Stop> = store
        .route_stops(route_id)
        .map_err(translate_persistence_error)?;
    let deletion: RouteDeletion =
        plan_route_deletion(&route, &stops, request.force).map_err(translate_core_error)?;

    let mut deleted_route: Route = route;
    deleted_route.deleted = true;
    let (deleted_route, version): (Route, Version) = store
        .write_route(deleted_route)
        .map_err(translate_persistence_error)?;

    info!(
        actor_id = %actor.id,
        route_id = %deleted_route.id,
        %version,
        completed = deletion.completed_count,
        forced = request.force,
        "Deleted route"
    );

    let envelope: UpdateEnvelope =
        UpdateEnvelope::for_route(deleted_route.id, version, deletion.patch);
    let rooms: Vec<Room> = vec![Room::Admin, Room::Route(deleted_route.id)];

    Ok(MutationResult {
        response: DeleteRouteResponse {
            route: deleted_route,
            version,
            completed_count: deletion.completed_count,
        },
        publication: Publication { envelope, rooms },
    })
}

/// Reads a stop snapshot with its version baseline.
///
/// # Errors
///
/// Returns an error if the stop is missing or a driver reads a stop
/// assigned elsewhere.
pub fn get_stop(
    actor: &AuthenticatedActor,
    store: &Store,
    stop_id: StopId,
) -> Result<StopSnapshotResponse, ApiError> {
    let (stop, version) = store.read_stop(stop_id).map_err(translate_persistence_error)?;
    AuthorizationService::authorize_stop_action(actor, &stop, "get_stop")?;
    Ok(StopSnapshotResponse { stop, version })
}

/// Reads a route snapshot with per-stop version baselines.
///
/// Drivers may read a route only if one of its stops is assigned to them.
///
/// # Errors
///
/// Returns an error if the route is missing or deleted, or the actor may
/// not observe it.
pub fn get_route(
    actor: &AuthenticatedActor,
    store: &Store,
    route_id: RouteId,
) -> Result<RouteSnapshotResponse, ApiError> {
    let (route, version) = store.read_route(route_id).map_err(translate_persistence_error)?;
    if route.deleted {
        return Err(ApiError::ResourceNotFound {
            resource_type: String::from("Route"),
            message: format!("Route {route_id} has been deleted"),
        });
    }
    let member_stops: Vec<Stop> = store
        .route_stops(route_id)
        .map_err(translate_persistence_error)?;

    if actor.role == Role::Driver {
        let assigned: bool = member_stops
            .iter()
            .any(|s| s.driver_id.is_some() && s.driver_id == actor.driver_id);
        if !assigned {
            return Err(ApiError::Unauthorized {
                action: String::from("get_route"),
                required_role: String::from("assigned Driver or Admin"),
            });
        }
    }

    // A stop missing from the store would get a version-0 baseline that
    // accepts any stale envelope; leave it out of the snapshot instead.
    let stops: Vec<StopSnapshotResponse> = member_stops
        .into_iter()
        .filter_map(|stop| match store.read_stop(stop.id) {
            Ok((_, stop_version)) => Some(StopSnapshotResponse {
                stop,
                version: stop_version,
            }),
            Err(e) => {
                warn!(stop_id = %stop.id, error = %e, "Skipping unreadable stop in route snapshot");
                None
            }
        })
        .collect();

    Ok(RouteSnapshotResponse {
        route,
        version,
        stops,
    })
}

/// Reads the completion workflow state for a stop.
///
/// Gates are recomputed from artifacts on every read; nothing is cached.
///
/// # Errors
///
/// Returns an error if the stop is missing or a driver reads a stop
/// assigned elsewhere.
pub fn get_workflow_status(
    actor: &AuthenticatedActor,
    store: &Store,
    stop_id: StopId,
) -> Result<WorkflowStatusResponse, ApiError> {
    let (stop, _) = store.read_stop(stop_id).map_err(translate_persistence_error)?;
    AuthorizationService::authorize_stop_action(actor, &stop, "get_workflow_status")?;

    let gates: GateSet = gate_status(&stop);
    let next_step: Option<CompletionStep> = [
        CompletionStep::Documents,
        CompletionStep::Returns,
        CompletionStep::Payment,
        CompletionStep::Notes,
        CompletionStep::Images,
    ]
    .into_iter()
    .find(|step| !can_advance(&gates, *step));

    Ok(WorkflowStatusResponse {
        stop_id: stop.id,
        status: stop.status,
        gates,
        next_step,
    })
}

/// Moves a stop through the driver-facing state machine.
///
/// # Errors
///
/// Returns an error if the actor may not act on the stop or the state
/// machine refuses the transition.
pub fn attempt_stop_transition(
    actor: &AuthenticatedActor,
    store: &mut Store,
    stop_id: StopId,
    request: StopTransitionRequest,
) -> Result<MutationResult<StopSnapshotResponse>, ApiError> {
    let target: StopStatus = request.parse_target().map_err(translate_domain_error)?;
    let command: Command = Command::SetStopStatus {
        target,
        reason: request.reason,
    };
    mutate_stop(actor, store, stop_id, command, "attempt_stop_transition")
}

/// Forces a stop's status outside the state machine.
///
/// Admin only. The override may move backward but never erases recorded
/// timestamps.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the override is
/// refused (terminal target without a reason).
pub fn override_stop_status(
    actor: &AuthenticatedActor,
    store: &mut Store,
    stop_id: StopId,
    request: OverrideStatusRequest,
) -> Result<MutationResult<StopSnapshotResponse>, ApiError> {
    AuthorizationService::authorize_override_status(actor)?;
    let target: StopStatus = request
        .target
        .parse()
        .map_err(translate_domain_error)?;
    let command: Command = Command::OverrideStatus {
        target,
        reason: request.reason,
    };
    mutate_stop(actor, store, stop_id, command, "override_stop_status")
}

/// Attaches a signed delivery document to a stop.
///
/// # Errors
///
/// Returns an error if the actor may not act on the stop or the stop is
/// frozen.
pub fn upload_signed_document(
    actor: &AuthenticatedActor,
    store: &mut Store,
    stop_id: StopId,
    request: UploadDocumentRequest,
) -> Result<MutationResult<StopSnapshotResponse>, ApiError> {
    let command: Command = Command::UploadSignedDocument { url: request.url };
    mutate_stop(actor, store, stop_id, command, "upload_signed_document")
}

/// Attaches a captured image to a stop.
///
/// # Errors
///
/// Returns an error if the actor may not act on the stop or the stop is
/// frozen.
pub fn attach_image(
    actor: &AuthenticatedActor,
    store: &mut Store,
    stop_id: StopId,
    request: AttachImageRequest,
) -> Result<MutationResult<StopSnapshotResponse>, ApiError> {
    let command: Command = Command::AttachImage { url: request.url };
    mutate_stop(actor, store, stop_id, command, "attach_image")
}

/// Records a payment collected at a stop.
///
/// # Errors
///
/// Returns an error if the actor may not act on the stop or the stop is
/// frozen.
pub fn record_payment(
    actor: &AuthenticatedActor,
    store: &mut Store,
    stop_id: StopId,
    request: RecordPaymentRequest,
) -> Result<MutationResult<StopSnapshotResponse>, ApiError> {
    let command: Command = Command::RecordPayment {
        amount_cents: request.amount_cents,
        method: request.method,
        notes: request.notes,
    };
    mutate_stop(actor, store, stop_id, command, "record_payment")
}

/// Acknowledges the returns step of the completion workflow.
///
/// # Errors
///
/// Returns an error if the actor may not act on the stop or the stop is
/// frozen.
pub fn acknowledge_returns(
    actor: &AuthenticatedActor,
    store: &mut Store,
    stop_id: StopId,
) -> Result<MutationResult<StopSnapshotResponse>, ApiError> {
    mutate_stop(
        actor,
        store,
        stop_id,
        Command::AcknowledgeReturns,
        "acknowledge_returns",
    )
}

/// Sets or clears a stop's driver notes.
///
/// # Errors
///
/// Returns an error if the actor may not act on the stop or the stop is
/// frozen.
pub fn set_driver_notes(
    actor: &AuthenticatedActor,
    store: &mut Store,
    stop_id: StopId,
    request: SetDriverNotesRequest,
) -> Result<MutationResult<StopSnapshotResponse>, ApiError> {
    let command: Command = Command::SetDriverNotes {
        notes: request.notes,
    };
    mutate_stop(actor, store, stop_id, command, "set_driver_notes")
}

/// Adds an admin note to a stop.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the stop is frozen.
pub fn add_admin_note(
    actor: &AuthenticatedActor,
    store: &mut Store,
    stop_id: StopId,
    request: AddAdminNoteRequest,
) -> Result<MutationResult<StopSnapshotResponse>, ApiError> {
    AuthorizationService::authorize_add_admin_note(actor)?;
    let command: Command = Command::AddAdminNote { body: request.body };
    mutate_stop(actor, store, stop_id, command, "add_admin_note")
}

/// Marks an admin note read.
///
/// # Errors
///
/// Returns an error if the actor may not act on the stop or the note
/// index does not exist.
pub fn mark_admin_note_read(
    actor: &AuthenticatedActor,
    store: &mut Store,
    stop_id: StopId,
    request: MarkAdminNoteReadRequest,
) -> Result<MutationResult<StopSnapshotResponse>, ApiError> {
    let command: Command = Command::MarkAdminNoteRead {
        index: request.index,
    };
    mutate_stop(actor, store, stop_id, command, "mark_admin_note_read")
}

/// Reassigns a stop's driver.
///
/// The publication targets the union of old and new rooms so the previous
/// driver's device learns the stop left their set.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the stop is completed.
pub fn reassign_driver(
    actor: &AuthenticatedActor,
    store: &mut Store,
    stop_id: StopId,
    request: ReassignDriverRequest,
) -> Result<MutationResult<StopSnapshotResponse>, ApiError> {
    AuthorizationService::authorize_manage_routes(actor)?;

    let (stop, _) = store.read_stop(stop_id).map_err(translate_persistence_error)?;
    let old_rooms: Vec<Room> = rooms_for_stop(&stop);

    let siblings: Vec<Stop> = store
        .route_stops(stop.route_id)
        .map_err(translate_persistence_error)?;
    let context: RouteContext = RouteContext::for_stop(&stop, &siblings);
    let command: Command = Command::ReassignDriver {
        driver_id: request.driver(),
        name_override: request.name_override,
    };
    let outcome = apply(&context, &stop, command, OffsetDateTime::now_utc())
        .map_err(translate_core_error)?;

    let (persisted, version): (Stop, Version) = store
        .write_stop(outcome.new_stop)
        .map_err(translate_persistence_error)?;

    info!(actor_id = %actor.id, stop_id = %persisted.id, %version, "Reassigned driver");

    let mut rooms: Vec<Room> = rooms_for_stop(&persisted);
    for room in old_rooms {
        if !rooms.contains(&room) {
            rooms.push(room);
        }
    }
    let envelope: UpdateEnvelope = UpdateEnvelope::for_stop(persisted.id, version, outcome.patch);

    Ok(MutationResult {
        response: StopSnapshotResponse {
            stop: persisted,
            version,
        },
        publication: Publication { envelope, rooms },
    })
}

/// Moves a stop to a new sequence position within its route.
///
/// # Errors
///
/// Returns an error if the actor is not an admin, the position is invalid
/// or taken, or the stop is frozen.
pub fn resequence_stop(
    actor: &AuthenticatedActor,
    store: &mut Store,
    stop_id: StopId,
    request: ResequenceStopRequest,
) -> Result<MutationResult<StopSnapshotResponse>, ApiError> {
    AuthorizationService::authorize_manage_routes(actor)?;
    let sequence: StopSequence =
        StopSequence::new(request.sequence).map_err(translate_domain_error)?;
    let command: Command = Command::ResequenceStop { sequence };
    mutate_stop(actor, store, stop_id, command, "resequence_stop")
}

/// The shared read-apply-persist path for stop commands.
///
/// The version is assigned by the store inside the write; the envelope
/// built here carries that exact version, so observers can order it
/// against any snapshot they hold.
fn mutate_stop(
    actor: &AuthenticatedActor,
    store: &mut Store,
    stop_id: StopId,
    command: Command,
    action: &str,
) -> Result<MutationResult<StopSnapshotResponse>, ApiError> {
    let (stop, _) = store.read_stop(stop_id).map_err(translate_persistence_error)?;
    AuthorizationService::authorize_stop_action(actor, &stop, action)?;

    let siblings: Vec<Stop> = store
        .route_stops(stop.route_id)
        .map_err(translate_persistence_error)?;
    let context: RouteContext = RouteContext::for_stop(&stop, &siblings);
    let outcome = apply(&context, &stop, command, OffsetDateTime::now_utc())
        .map_err(translate_core_error)?;

    let (persisted, version): (Stop, Version) = store
        .write_stop(outcome.new_stop)
        .map_err(translate_persistence_error)?;

    info!(
        actor_id = %actor.id,
        stop_id = %persisted.id,
        %version,
        action = outcome.action,
        status = %persisted.status,
        "Applied stop command"
    );

    let envelope: UpdateEnvelope = UpdateEnvelope::for_stop(persisted.id, version, outcome.patch);
    let rooms: Vec<Room> = rooms_for_stop(&persisted);

    Ok(MutationResult {
        response: StopSnapshotResponse {
            stop: persisted,
            version,
        },
        publication: Publication { envelope, rooms },
    })
}
