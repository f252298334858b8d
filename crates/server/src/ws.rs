// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! WebSocket endpoint for live envelope streaming.
//!
//! Connections authenticate with their first frame, then join and leave
//! rooms explicitly. The server pushes committed envelopes for joined
//! rooms; it accepts no commands over the socket, so the WebSocket can
//! never bypass the HTTP mutation path.

use crate::AppState;
use crate::rooms::ConnectionId;
use axum::{
    extract::{
        State as AxumState, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, stream::StreamExt};
use lastmile_api::{AuthenticatedActor, AuthorizationService, Room, SessionService};
use lastmile_sync::UpdateEnvelope;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

/// Frames a client may send.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum ClientFrame {
    /// Must be the first frame on the socket.
    Authenticate {
        /// A session token from the login endpoint.
        token: String,
    },
    /// Join a room. Requires room authorization.
    Join {
        /// The room to join.
        room: Room,
    },
    /// Leave a room.
    Leave {
        /// The room to leave.
        room: Room,
    },
}

/// Frames the server sends.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerFrame {
    /// Sent once after successful authentication.
    Connected {
        /// Server timestamp (ISO 8601).
        timestamp: String,
    },
    /// Acknowledges a join.
    Joined {
        /// The room that was joined.
        room: Room,
    },
    /// Acknowledges a leave.
    Left {
        /// The room that was left.
        room: Room,
    },
    /// A committed mutation in one of the connection's rooms.
    Update {
        /// The versioned mutation record.
        envelope: UpdateEnvelope,
    },
    /// A refused or malformed frame. The connection stays open.
    Error {
        /// What went wrong.
        message: String,
    },
}

/// Handles WebSocket upgrade requests for the live stream.
pub async fn live_stream_handler(
    ws: WebSocketUpgrade,
    AxumState(app_state): AxumState<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

/// Drives one live connection from authentication to disconnect.
async fn handle_socket(socket: WebSocket, app_state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // The first frame must authenticate; anything else closes the socket.
    let Some((actor, token)) = authenticate_first_frame(&mut receiver, &app_state).await else {
        let frame = ServerFrame::Error {
            message: String::from("Authentication required"),
        };
        if let Ok(json) = serde_json::to_string(&frame) {
            let _ = sender.send(Message::Text(json.into())).await;
        }
        return;
    };

    info!(actor_id = %actor.id, "Client connected to live stream");

    let (connection, mut envelope_rx) = app_state.bus.connect().await;
    let (ack_tx, mut ack_rx) = mpsc::unbounded_channel::<ServerFrame>();

    let connected = ServerFrame::Connected {
        timestamp: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Iso8601::DEFAULT)
            .unwrap_or_else(|_| String::from("unknown")),
    };
    if let Ok(json) = serde_json::to_string(&connected)
        && sender.send(Message::Text(json.into())).await.is_err()
    {
        warn!("Failed to send connection confirmation");
        app_state.bus.disconnect(connection).await;
        return;
    }

    // Task for pushing envelopes and acks to the client.
    let mut send_task = tokio::spawn(async move {
        loop {
            let frame: Option<ServerFrame> = tokio::select! {
                envelope = envelope_rx.recv() => envelope.map(|envelope| ServerFrame::Update { envelope }),
                ack = ack_rx.recv() => ack,
            };
            let Some(frame) = frame else {
                break;
            };
            let Ok(json) = serde_json::to_string(&frame) else {
                continue;
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                // Client disconnected.
                break;
            }
        }
    });

    // Task for room membership frames from the client.
    let bus = app_state.bus.clone();
    let sessions = app_state.sessions.clone();
    let recv_actor = actor.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    let control = handle_client_frame(
                        &bus,
                        &sessions,
                        connection,
                        &recv_actor,
                        &token,
                        text.as_str(),
                        &ack_tx,
                    )
                    .await;
                    if control == FrameControl::Disconnect {
                        info!(actor_id = %recv_actor.id, "Session no longer valid, dropping live connection");
                        break;
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("Client sent close frame");
                    break;
                }
                Ok(Message::Binary(_)) => {
                    warn!("Received unexpected binary frame, ignoring");
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {
                    // Handled automatically by Axum.
                }
                Err(e) => {
                    debug!(?e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    app_state.bus.disconnect(connection).await;
    info!(actor_id = %actor.id, "Client disconnected from live stream");
}

/// What to do with the connection after one client frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameControl {
    /// Keep serving the connection.
    Continue,
    /// The session behind the connection is gone; drop it.
    Disconnect,
}

/// Reads frames until an authenticate frame arrives or the socket fails.
///
/// Returns the actor and the token it validated; the token is re-checked
/// on later frames so revoked sessions lose the connection. Returns
/// `None` if the socket closed, the frame was malformed, or the token
/// failed validation.
async fn authenticate_first_frame(
    receiver: &mut futures::stream::SplitStream<WebSocket>,
    app_state: &AppState,
) -> Option<(AuthenticatedActor, String)> {
    loop {
        let msg = receiver.next().await?;
        match msg {
            Ok(Message::Text(text)) => {
                let Ok(ClientFrame::Authenticate { token }) =
                    serde_json::from_str::<ClientFrame>(text.as_str())
                else {
                    warn!("First frame was not an authenticate frame");
                    return None;
                };
                let mut sessions = app_state.sessions.lock().await;
                return match sessions.validate(&token) {
                    Ok(actor) => Some((actor, token)),
                    Err(e) => {
                        warn!(error = %e, "Live stream authentication failed");
                        None
                    }
                };
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => {}
            Ok(Message::Close(_) | Message::Binary(_)) | Err(_) => return None,
        }
    }
}

/// Applies one join/leave frame, pushing the ack or refusal.
///
/// The session token is validated again on every frame. An expired or
/// revoked session returns [`FrameControl::Disconnect`] so the caller
/// tears the connection down and clears its room memberships.
async fn handle_client_frame(
    bus: &crate::rooms::RoomBus,
    sessions: &Mutex<SessionService>,
    connection: ConnectionId,
    actor: &AuthenticatedActor,
    token: &str,
    text: &str,
    ack_tx: &mpsc::UnboundedSender<ServerFrame>,
) -> FrameControl {
    let mut session_guard = sessions.lock().await;
    let session_live: bool = session_guard.validate(token).is_ok();
    drop(session_guard);
    if !session_live {
        let _ = ack_tx.send(ServerFrame::Error {
            message: String::from("Session expired"),
        });
        return FrameControl::Disconnect;
    }

    let frame: ClientFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            let _ = ack_tx.send(ServerFrame::Error {
                message: format!("Malformed frame: {e}"),
            });
            return FrameControl::Continue;
        }
    };

    match frame {
        ClientFrame::Authenticate { .. } => {
            let _ = ack_tx.send(ServerFrame::Error {
                message: String::from("Already authenticated"),
            });
        }
        ClientFrame::Join { room } => {
            match AuthorizationService::authorize_join_room(actor, room) {
                Ok(()) => {
                    bus.join(connection, room).await;
                    let _ = ack_tx.send(ServerFrame::Joined { room });
                }
                Err(e) => {
                    warn!(actor_id = %actor.id, %room, "Room join refused");
                    let _ = ack_tx.send(ServerFrame::Error {
                        message: e.to_string(),
                    });
                }
            }
        }
        ClientFrame::Leave { room } => {
            bus.leave(connection, room).await;
            let _ = ack_tx.send(ServerFrame::Left { room });
        }
    }
    FrameControl::Continue
}
