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
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

mod rooms;
mod session;
mod ws;

use axum::{
    Json, Router,
    extract::{Path, State as AxumState},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use lastmile_api::{
    AddAdminNoteRequest, ApiError, AttachImageRequest, CreateRouteRequest, CreateStopRequest,
    DeleteRouteRequest, DeleteRouteResponse, MarkAdminNoteReadRequest, MutationResult,
    OverrideStatusRequest, ReassignDriverRequest, RecordPaymentRequest, ResequenceStopRequest,
    RouteSnapshotResponse, SessionService, SetDriverNotesRequest, StopSnapshotResponse,
    StopTransitionRequest, UploadDocumentRequest, WorkflowStatusResponse, acknowledge_returns,
    add_admin_note, attach_image, attempt_stop_transition, create_route, create_stop,
    delete_route, get_route, get_stop, get_workflow_status, mark_admin_note_read,
    override_stop_status, reassign_driver, record_payment, resequence_stop, set_driver_notes,
    upload_signed_document,
};
use lastmile_domain::{DriverId, RouteId, StopId};
use lastmile_persistence::Store;
use rooms::RoomBus;
use serde::{Deserialize, Serialize};
use session::SessionActor;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use ws::live_stream_handler;

/// LastMile Server - HTTP and WebSocket server for delivery operations
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Seed a demo route with a few stops at startup
    #[arg(long, default_value_t = false)]
    seed: bool,
}

/// Seeds one demo route with three pending stops.
fn seed_demo_data(store: &mut Store) -> Result<(), Box<dyn std::error::Error>> {
    let route_id: RouteId = RouteId::new(1);
    let route = lastmile_domain::Route::new(route_id, String::from("Demo loop"));
    store.insert_route(route)?;

    for position in 1..=3u32 {
        let sequence = lastmile_domain::StopSequence::new(position)
            .map_err(|e| format!("demo sequence: {e}"))?;
        let mut stop =
            lastmile_domain::Stop::new(StopId::new(i64::from(position)), route_id, sequence);
        stop.driver_id = Some(DriverId::new(1));
        store.insert_stop(stop)?;
    }
    info!("Seeded demo route 1 with 3 stops");
    Ok(())
}

/// Application state shared across handlers.
///
/// The store and session service are behind mutexes; holding the store
/// lock across a read-apply-write is what keeps version assignment atomic
/// with the committed write.
#[derive(Clone)]
struct AppState {
    /// The authoritative state store.
    store: Arc<Mutex<Store>>,
    /// Session tokens for admins and drivers.
    sessions: Arc<Mutex<SessionService>>,
    /// The room-scoped event bus.
    bus: Arc<RoomBus>,
}

/// API request for opening a session.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct LoginRequest {
    /// The actor's identifier.
    actor_id: String,
    /// The actor's role ("admin" or "driver").
    role: String,
    /// The driver identity, required for driver logins.
    driver_id: Option<i64>,
}

/// API response for opening a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoginResponse {
    /// The session token for subsequent requests.
    token: String,
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Error message.
    message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The error message.
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match err {
            ApiError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            ApiError::DomainRuleViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::TransitionRefused { .. } | ApiError::DeletionRefused { .. } => {
                StatusCode::CONFLICT
            }
            ApiError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ApiError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

/// Publishes a mutation's envelope and returns its response body.
///
/// Callers invoke this while still holding the store lock: the envelope
/// enters the bus in the order its version was assigned, so observers
/// never see a newer version before an older one for the same subject.
async fn publish_and_respond<T>(
    app_state: &AppState,
    result: MutationResult<T>,
) -> Json<T> {
    app_state
        .bus
        .publish(&result.publication.rooms, &result.publication.envelope)
        .await;
    Json(result.response)
}

/// Handler for POST `/login` endpoint.
///
/// Opens a session for an admin or driver actor.
async fn handle_login(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, HttpError> {
    info!(actor_id = %req.actor_id, role = %req.role, "Handling login request");

    let mut sessions = app_state.sessions.lock().await;
    let token: String = match req.role.to_lowercase().as_str() {
        "admin" => sessions.login_admin(req.actor_id),
        "driver" => {
            let Some(driver_id) = req.driver_id else {
                return Err(HttpError {
                    status: StatusCode::BAD_REQUEST,
                    message: String::from("Driver login requires a driver_id"),
                });
            };
            sessions.login_driver(req.actor_id, DriverId::new(driver_id))
        }
        other => {
            return Err(HttpError {
                status: StatusCode::BAD_REQUEST,
                message: format!("Invalid role: '{other}'. Must be 'admin' or 'driver'"),
            });
        }
    };
    drop(sessions);

    Ok(Json(LoginResponse { token }))
}

/// Handler for POST `/logout` endpoint.
///
/// Revokes the bearer session. Revoking an unknown token succeeds.
async fn handle_logout(
    AxumState(app_state): AxumState<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, HttpError> {
    let token: &str = headers
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(HttpError {
            status: StatusCode::UNAUTHORIZED,
            message: String::from("Missing bearer token"),
        })?;

    let mut sessions = app_state.sessions.lock().await;
    sessions.revoke(token);
    drop(sessions);

    Ok(StatusCode::NO_CONTENT)
}

/// Handler for POST `/routes` endpoint.
async fn handle_create_route(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor): SessionActor,
    Json(req): Json<CreateRouteRequest>,
) -> Result<Json<RouteSnapshotResponse>, HttpError> {
    info!(actor_id = %actor.id, route_id = req.route_id, "Handling create_route request");

    let mut store = app_state.store.lock().await;
    let result = create_route(&actor, &mut store, req)?;
    let response = publish_and_respond(&app_state, result).await;
    drop(store);

    Ok(response)
}

/// Handler for GET `/routes/{route_id}` endpoint.
async fn handle_get_route(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor): SessionActor,
    Path(route_id): Path<i64>,
) -> Result<Json<RouteSnapshotResponse>, HttpError> {
    let store = app_state.store.lock().await;
    let response: RouteSnapshotResponse = get_route(&actor, &store, RouteId::new(route_id))?;
    drop(store);

    Ok(Json(response))
}

/// Handler for POST `/routes/{route_id}/delete` endpoint.
///
/// A route holding completed deliveries is refused with 409 unless the
/// request carries `force`.
async fn handle_delete_route(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor): SessionActor,
    Path(route_id): Path<i64>,
    Json(req): Json<DeleteRouteRequest>,
) -> Result<Json<DeleteRouteResponse>, HttpError> {
    info!(actor_id = %actor.id, route_id, force = req.force, "Handling delete_route request");

    let mut store = app_state.store.lock().await;
    let result = delete_route(&actor, &mut store, RouteId::new(route_id), &req)?;
    let response = publish_and_respond(&app_state, result).await;
    drop(store);

    Ok(response)
}

/// Handler for POST `/stops` endpoint.
async fn handle_create_stop(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor): SessionActor,
    Json(req): Json<CreateStopRequest>,
) -> Result<Json<StopSnapshotResponse>, HttpError> {
    info!(actor_id = %actor.id, stop_id = req.stop_id, "Handling create_stop request");

    let mut store = app_state.store.lock().await;
    let result = create_stop(&actor, &mut store, req)?;
    let response = publish_and_respond(&app_state, result).await;
    drop(store);

    Ok(response)
}

/// Handler for GET `/stops/{stop_id}` endpoint.
///
/// Returns the snapshot with the version baseline reconnecting observers
/// rebase on.
async fn handle_get_stop(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor): SessionActor,
    Path(stop_id): Path<i64>,
) -> Result<Json<StopSnapshotResponse>, HttpError> {
    let store = app_state.store.lock().await;
    let response: StopSnapshotResponse = get_stop(&actor, &store, StopId::new(stop_id))?;
    drop(store);

    Ok(Json(response))
}

/// Handler for GET `/stops/{stop_id}/workflow` endpoint.
async fn handle_get_workflow_status(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor): SessionActor,
    Path(stop_id): Path<i64>,
) -> Result<Json<WorkflowStatusResponse>, HttpError> {
    let store = app_state.store.lock().await;
    let response: WorkflowStatusResponse =
        get_workflow_status(&actor, &store, StopId::new(stop_id))?;
    drop(store);

    Ok(Json(response))
}

/// Handler for POST `/stops/{stop_id}/transition` endpoint.
async fn handle_stop_transition(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor): SessionActor,
    Path(stop_id): Path<i64>,
    Json(req): Json<StopTransitionRequest>,
) -> Result<Json<StopSnapshotResponse>, HttpError> {
    info!(actor_id = %actor.id, stop_id, target = %req.target, "Handling transition request");

    let mut store = app_state.store.lock().await;
    let result = attempt_stop_transition(&actor, &mut store, StopId::new(stop_id), req)?;
    let response = publish_and_respond(&app_state, result).await;
    drop(store);

    Ok(response)
}

/// Handler for POST `/stops/{stop_id}/override` endpoint.
async fn handle_override_status(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor): SessionActor,
    Path(stop_id): Path<i64>,
    Json(req): Json<OverrideStatusRequest>,
) -> Result<Json<StopSnapshotResponse>, HttpError> {
    info!(actor_id = %actor.id, stop_id, target = %req.target, "Handling override request");

    let mut store = app_state.store.lock().await;
    let result = override_stop_status(&actor, &mut store, StopId::new(stop_id), req)?;
    let response = publish_and_respond(&app_state, result).await;
    drop(store);

    Ok(response)
}

/// Handler for POST `/stops/{stop_id}/document` endpoint.
async fn handle_upload_document(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor): SessionActor,
    Path(stop_id): Path<i64>,
    Json(req): Json<UploadDocumentRequest>,
) -> Result<Json<StopSnapshotResponse>, HttpError> {
    info!(actor_id = %actor.id, stop_id, "Handling document upload request");

    let mut store = app_state.store.lock().await;
    let result = upload_signed_document(&actor, &mut store, StopId::new(stop_id), req)?;
    let response = publish_and_respond(&app_state, result).await;
    drop(store);

    Ok(response)
}

/// Handler for POST `/stops/{stop_id}/images` endpoint.
async fn handle_attach_image(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor): SessionActor,
    Path(stop_id): Path<i64>,
    Json(req): Json<AttachImageRequest>,
) -> Result<Json<StopSnapshotResponse>, HttpError> {
    info!(actor_id = %actor.id, stop_id, "Handling image attach request");

    let mut store = app_state.store.lock().await;
    let result = attach_image(&actor, &mut store, StopId::new(stop_id), req)?;
    let response = publish_and_respond(&app_state, result).await;
    drop(store);

    Ok(response)
}

/// Handler for POST `/stops/{stop_id}/payments` endpoint.
async fn handle_record_payment(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor): SessionActor,
    Path(stop_id): Path<i64>,
    Json(req): Json<RecordPaymentRequest>,
) -> Result<Json<StopSnapshotResponse>, HttpError> {
    info!(actor_id = %actor.id, stop_id, amount_cents = req.amount_cents, "Handling payment request");

    let mut store = app_state.store.lock().await;
    let result = record_payment(&actor, &mut store, StopId::new(stop_id), req)?;
    let response = publish_and_respond(&app_state, result).await;
    drop(store);

    Ok(response)
}

/// Handler for POST `/stops/{stop_id}/returns` endpoint.
async fn handle_acknowledge_returns(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor): SessionActor,
    Path(stop_id): Path<i64>,
) -> Result<Json<StopSnapshotResponse>, HttpError> {
    info!(actor_id = %actor.id, stop_id, "Handling returns acknowledgement");

    let mut store = app_state.store.lock().await;
    let result = acknowledge_returns(&actor, &mut store, StopId::new(stop_id))?;
    let response = publish_and_respond(&app_state, result).await;
    drop(store);

    Ok(response)
}

/// Handler for POST `/stops/{stop_id}/driver_notes` endpoint.
async fn handle_set_driver_notes(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor): SessionActor,
    Path(stop_id): Path<i64>,
    Json(req): Json<SetDriverNotesRequest>,
) -> Result<Json<StopSnapshotResponse>, HttpError> {
    info!(actor_id = %actor.id, stop_id, "Handling driver notes request");

    let mut store = app_state.store.lock().await;
    let result = set_driver_notes(&actor, &mut store, StopId::new(stop_id), req)?;
    let response = publish_and_respond(&app_state, result).await;
    drop(store);

    Ok(response)
}

/// Handler for POST `/stops/{stop_id}/admin_notes` endpoint.
async fn handle_add_admin_note(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor): SessionActor,
    Path(stop_id): Path<i64>,
    Json(req): Json<AddAdminNoteRequest>,
) -> Result<Json<StopSnapshotResponse>, HttpError> {
    info!(actor_id = %actor.id, stop_id, "Handling admin note request");

    let mut store = app_state.store.lock().await;
    let result = add_admin_note(&actor, &mut store, StopId::new(stop_id), req)?;
    let response = publish_and_respond(&app_state, result).await;
    drop(store);

    Ok(response)
}

/// Handler for POST `/stops/{stop_id}/admin_notes/read` endpoint.
async fn handle_mark_admin_note_read(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor): SessionActor,
    Path(stop_id): Path<i64>,
    Json(req): Json<MarkAdminNoteReadRequest>,
) -> Result<Json<StopSnapshotResponse>, HttpError> {
    info!(actor_id = %actor.id, stop_id, index = req.index, "Handling note read request");

    let mut store = app_state.store.lock().await;
    let result = mark_admin_note_read(&actor, &mut store, StopId::new(stop_id), req)?;
    let response = publish_and_respond(&app_state, result).await;
    drop(store);

    Ok(response)
}

/// Handler for POST `/stops/{stop_id}/reassign` endpoint.
async fn handle_reassign_driver(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor): SessionActor,
    Path(stop_id): Path<i64>,
    Json(req): Json<ReassignDriverRequest>,
) -> Result<Json<StopSnapshotResponse>, HttpError> {
    info!(actor_id = %actor.id, stop_id, "Handling reassign request");

    let mut store = app_state.store.lock().await;
    let result = reassign_driver(&actor, &mut store, StopId::new(stop_id), req)?;
    let response = publish_and_respond(&app_state, result).await;
    drop(store);

    Ok(response)
}

/// Handler for POST `/stops/{stop_id}/resequence` endpoint.
async fn handle_resequence_stop(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor): SessionActor,
    Path(stop_id): Path<i64>,
    Json(req): Json<ResequenceStopRequest>,
) -> Result<Json<StopSnapshotResponse>, HttpError> {
    info!(actor_id = %actor.id, stop_id, sequence = req.sequence, "Handling resequence request");

    let mut store = app_state.store.lock().await;
    let result = resequence_stop(&actor, &mut store, StopId::new(stop_id), req)?;
    let response = publish_and_respond(&app_state, result).await;
    drop(store);

    Ok(response)
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/login", post(handle_login))
        .route("/logout", post(handle_logout))
        .route("/routes", post(handle_create_route))
        .route("/routes/{route_id}", get(handle_get_route))
        .route("/routes/{route_id}/delete", post(handle_delete_route))
        .route("/stops", post(handle_create_stop))
        .route("/stops/{stop_id}", get(handle_get_stop))
        .route("/stops/{stop_id}/workflow", get(handle_get_workflow_status))
        .route("/stops/{stop_id}/transition", post(handle_stop_transition))
        .route("/stops/{stop_id}/override", post(handle_override_status))
        .route("/stops/{stop_id}/document", post(handle_upload_document))
        .route("/stops/{stop_id}/images", post(handle_attach_image))
        .route("/stops/{stop_id}/payments", post(handle_record_payment))
        .route("/stops/{stop_id}/returns", post(handle_acknowledge_returns))
        .route(
            "/stops/{stop_id}/driver_notes",
            post(handle_set_driver_notes),
        )
        .route("/stops/{stop_id}/admin_notes", post(handle_add_admin_note))
        .route(
            "/stops/{stop_id}/admin_notes/read",
            post(handle_mark_admin_note_read),
        )
        .route("/stops/{stop_id}/reassign", post(handle_reassign_driver))
        .route("/stops/{stop_id}/resequence", post(handle_resequence_stop))
        .route("/live", get(live_stream_handler))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing LastMile Server");

    let mut store: Store = Store::new();
    if args.seed {
        seed_demo_data(&mut store)?;
    }

    let app_state: AppState = AppState {
        store: Arc::new(Mutex::new(store)),
        sessions: Arc::new(Mutex::new(SessionService::new())),
        bus: Arc::new(RoomBus::new()),
    };

    // Build router
    let app: Router = build_router(app_state);

    // Bind to address
    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", args.port).parse()?;
    info!("Server listening on {}", addr);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode as HttpStatusCode},
    };
    use tower::ServiceExt;

    /// Helper to create test app state with an empty store.
    fn create_test_app_state() -> AppState {
        AppState {
            store: Arc::new(Mutex::new(Store::new())),
            sessions: Arc::new(Mutex::new(SessionService::new())),
            bus: Arc::new(RoomBus::new()),
        }
    }

    async fn login(app: &Router, role: &str, actor_id: &str, driver_id: Option<i64>) -> String {
        let req_body: LoginRequest = LoginRequest {
            actor_id: actor_id.to_string(),
            role: role.to_string(),
            driver_id,
        };

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/login")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_string(&req_body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatusCode::OK);

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let login_response: LoginResponse = serde_json::from_slice(&body_bytes).unwrap();
        login_response.token
    }

    async fn post_json<B: Serialize>(
        app: &Router,
        uri: &str,
        token: &str,
        body: &B,
    ) -> axum::response::Response {
        app.clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .header("Authorization", format!("Bearer {token}"))
                    .body(Body::from(serde_json::to_string(body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    /// Seeds route 10 with stop 1 (driver 7) through the HTTP surface.
    async fn seed_route_and_stop(app: &Router, admin_token: &str) {
        let response = post_json(
            app,
            "/routes",
            admin_token,
            &CreateRouteRequest {
                route_id: 10,
                name: String::from("Downtown AM"),
            },
        )
        .await;
        assert_eq!(response.status(), HttpStatusCode::OK);

        let response = post_json(
            app,
            "/stops",
            admin_token,
            &CreateStopRequest {
                stop_id: 1,
                route_id: 10,
                sequence: 1,
                driver_id: Some(7),
            },
        )
        .await;
        assert_eq!(response.status(), HttpStatusCode::OK);
    }

    #[tokio::test]
    async fn test_request_without_token_is_unauthorized() {
        let app: Router = build_router(create_test_app_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/routes")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::to_string(&CreateRouteRequest {
                            route_id: 10,
                            name: String::from("Downtown AM"),
                        })
                        .unwrap(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), HttpStatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_driver_cannot_create_route() {
        let app: Router = build_router(create_test_app_state());
        let token: String = login(&app, "driver", "driver-7", Some(7)).await;

        let response = post_json(
            &app,
            "/routes",
            &token,
            &CreateRouteRequest {
                route_id: 10,
                name: String::from("Downtown AM"),
            },
        )
        .await;

        assert_eq!(response.status(), HttpStatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_creates_route_and_stop() {
        let app: Router = build_router(create_test_app_state());
        let token: String = login(&app, "admin", "dispatch-1", None).await;

        seed_route_and_stop(&app, &token).await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/stops/1")
                    .header("Authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatusCode::OK);

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let snapshot: StopSnapshotResponse = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(snapshot.stop.id, StopId::new(1));
        assert_eq!(snapshot.stop.driver_id, Some(DriverId::new(7)));
    }

    #[tokio::test]
    async fn test_gated_completion_returns_conflict() {
        let app: Router = build_router(create_test_app_state());
        let admin_token: String = login(&app, "admin", "dispatch-1", None).await;
        seed_route_and_stop(&app, &admin_token).await;
        let driver_token: String = login(&app, "driver", "driver-7", Some(7)).await;

        for target in ["on_the_way", "arrived"] {
            let response = post_json(
                &app,
                "/stops/1/transition",
                &driver_token,
                &StopTransitionRequest {
                    target: String::from(target),
                    reason: None,
                },
            )
            .await;
            assert_eq!(response.status(), HttpStatusCode::OK);
        }

        // Completion without the signed document is refused.
        let response = post_json(
            &app,
            "/stops/1/transition",
            &driver_token,
            &StopTransitionRequest {
                target: String::from("completed"),
                reason: None,
            },
        )
        .await;
        assert_eq!(response.status(), HttpStatusCode::CONFLICT);

        let response = post_json(
            &app,
            "/stops/1/document",
            &driver_token,
            &UploadDocumentRequest {
                url: String::from("https://docs/pod-1.pdf"),
            },
        )
        .await;
        assert_eq!(response.status(), HttpStatusCode::OK);

        let response = post_json(
            &app,
            "/stops/1/transition",
            &driver_token,
            &StopTransitionRequest {
                target: String::from("completed"),
                reason: None,
            },
        )
        .await;
        assert_eq!(response.status(), HttpStatusCode::OK);
    }

    #[tokio::test]
    async fn test_guarded_route_deletion_returns_conflict() {
        let app: Router = build_router(create_test_app_state());
        let admin_token: String = login(&app, "admin", "dispatch-1", None).await;
        seed_route_and_stop(&app, &admin_token).await;
        let driver_token: String = login(&app, "driver", "driver-7", Some(7)).await;

        for target in ["on_the_way", "arrived"] {
            let response = post_json(
                &app,
                "/stops/1/transition",
                &driver_token,
                &StopTransitionRequest {
                    target: String::from(target),
                    reason: None,
                },
            )
            .await;
            assert_eq!(response.status(), HttpStatusCode::OK);
        }
        post_json(
            &app,
            "/stops/1/document",
            &driver_token,
            &UploadDocumentRequest {
                url: String::from("https://docs/pod-1.pdf"),
            },
        )
        .await;
        post_json(
            &app,
            "/stops/1/transition",
            &driver_token,
            &StopTransitionRequest {
                target: String::from("completed"),
                reason: None,
            },
        )
        .await;

        let response = post_json(
            &app,
            "/routes/10/delete",
            &admin_token,
            &DeleteRouteRequest { force: false },
        )
        .await;
        assert_eq!(response.status(), HttpStatusCode::CONFLICT);

        let response = post_json(
            &app,
            "/routes/10/delete",
            &admin_token,
            &DeleteRouteRequest { force: true },
        )
        .await;
        assert_eq!(response.status(), HttpStatusCode::OK);
    }

    #[tokio::test]
    async fn test_logout_revokes_session() {
        let app: Router = build_router(create_test_app_state());
        let token: String = login(&app, "admin", "dispatch-1", None).await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/logout")
                    .header("Authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatusCode::NO_CONTENT);

        let response = post_json(
            &app,
            "/routes",
            &token,
            &CreateRouteRequest {
                route_id: 10,
                name: String::from("Downtown AM"),
            },
        )
        .await;
        assert_eq!(response.status(), HttpStatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_stop_is_not_found() {
        let app: Router = build_router(create_test_app_state());
        let token: String = login(&app, "admin", "dispatch-1", None).await;

        let response = post_json(
            &app,
            "/stops/99/transition",
            &token,
            &StopTransitionRequest {
                target: String::from("on_the_way"),
                reason: None,
            },
        )
        .await;

        assert_eq!(response.status(), HttpStatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_concurrent_mutations_publish_in_version_order() {
        let app_state: AppState = create_test_app_state();
        let app: Router = build_router(app_state.clone());
        let token: String = login(&app, "admin", "dispatch-1", None).await;
        seed_route_and_stop(&app, &token).await;

        // Joining after the seed means only the envelopes below arrive.
        let (connection, mut envelope_rx) = app_state.bus.connect().await;
        app_state.bus.join(connection, lastmile_api::Room::Admin).await;

        let mut tasks = Vec::new();
        for pass in 0..8 {
            let app = app.clone();
            let token = token.clone();
            tasks.push(tokio::spawn(async move {
                let response = post_json(
                    &app,
                    "/stops/1/driver_notes",
                    &token,
                    &SetDriverNotesRequest {
                        notes: Some(format!("pass {pass}")),
                    },
                )
                .await;
                assert_eq!(response.status(), HttpStatusCode::OK);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        // Envelopes must arrive in the order their versions were assigned;
        // a connected observer discards anything at or below its version,
        // so an inversion here would lose the lower-versioned fields.
        let mut last: lastmile_sync::Version = lastmile_sync::Version::INITIAL;
        let mut delivered: usize = 0;
        while let Ok(envelope) = envelope_rx.try_recv() {
            assert!(
                envelope.version > last,
                "envelope {} arrived after {}",
                envelope.version,
                last
            );
            last = envelope.version;
            delivered += 1;
        }
        assert_eq!(delivered, 8);
    }
}
