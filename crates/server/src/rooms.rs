// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The room-scoped event bus.
//!
//! Envelopes fan out to rooms; a connection hears an envelope once even
//! when several of its rooms are targeted. Each connection has a single
//! FIFO channel, so envelopes for one subject arrive in the order their
//! versions were assigned. Publishing to an empty room is a no-op, never
//! an error.
//!
//! The bus carries facts about committed writes only. It executes no
//! commands and retains no history; a reconnecting client refetches
//! snapshots instead of replaying missed envelopes.

use lastmile_api::Room;
use lastmile_sync::UpdateEnvelope;
use std::collections::{HashMap, HashSet};
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

/// Opaque identity of one bus connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct BusInner {
    next_id: u64,
    members: HashMap<Room, HashSet<ConnectionId>>,
    senders: HashMap<ConnectionId, mpsc::UnboundedSender<UpdateEnvelope>>,
}

/// Room membership and fan-out for live connections.
pub struct RoomBus {
    inner: Mutex<BusInner>,
}

impl RoomBus {
    /// Creates a bus with no rooms and no connections.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BusInner {
                next_id: 0,
                members: HashMap::new(),
                senders: HashMap::new(),
            }),
        }
    }

    /// Registers a connection and returns its envelope channel.
    ///
    /// The connection starts in no rooms.
    pub async fn connect(&self) -> (ConnectionId, mpsc::UnboundedReceiver<UpdateEnvelope>) {
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let id: ConnectionId = ConnectionId(inner.next_id);
        let (tx, rx) = mpsc::unbounded_channel();
        inner.senders.insert(id, tx);
        debug!(connection = %id, "Connection registered on bus");
        (id, rx)
    }

    /// Adds a connection to a room. Joining twice is a no-op.
    pub async fn join(&self, connection: ConnectionId, room: Room) {
        let mut inner = self.inner.lock().await;
        if !inner.senders.contains_key(&connection) {
            return;
        }
        let added: bool = inner.members.entry(room).or_default().insert(connection);
        if added {
            debug!(connection = %connection, %room, "Joined room");
        }
    }

    /// Removes a connection from a room. Leaving a room the connection is
    /// not in is a no-op.
    pub async fn leave(&self, connection: ConnectionId, room: Room) {
        let mut inner = self.inner.lock().await;
        if let Some(members) = inner.members.get_mut(&room) {
            if members.remove(&connection) {
                debug!(connection = %connection, %room, "Left room");
            }
            if members.is_empty() {
                inner.members.remove(&room);
            }
        }
    }

    /// Fans an envelope out to every connection in the target rooms.
    ///
    /// A connection in several target rooms receives one copy. Closed
    /// connections discovered during the send are dropped from the bus.
    pub async fn publish(&self, rooms: &[Room], envelope: &UpdateEnvelope) {
        let mut inner = self.inner.lock().await;

        let mut targets: HashSet<ConnectionId> = HashSet::new();
        for room in rooms {
            if let Some(members) = inner.members.get(room) {
                targets.extend(members.iter().copied());
            }
        }

        if targets.is_empty() {
            debug!(subject = %envelope.subject, version = %envelope.version, "No receivers for envelope");
            return;
        }

        let mut closed: Vec<ConnectionId> = Vec::new();
        for connection in &targets {
            let open: bool = inner
                .senders
                .get(connection)
                .is_some_and(|tx| tx.send(envelope.clone()).is_ok());
            if !open {
                closed.push(*connection);
            }
        }
        debug!(
            subject = %envelope.subject,
            version = %envelope.version,
            receivers = targets.len() - closed.len(),
            "Published envelope"
        );

        for connection in closed {
            Self::remove_connection(&mut inner, connection);
        }
    }

    /// Drops a connection and clears all of its room memberships.
    pub async fn disconnect(&self, connection: ConnectionId) {
        let mut inner = self.inner.lock().await;
        Self::remove_connection(&mut inner, connection);
        debug!(connection = %connection, "Connection dropped from bus");
    }

    /// Returns how many connections a room currently has.
    pub async fn room_size(&self, room: Room) -> usize {
        let inner = self.inner.lock().await;
        inner.members.get(&room).map_or(0, HashSet::len)
    }

    fn remove_connection(inner: &mut BusInner, connection: ConnectionId) {
        inner.senders.remove(&connection);
        inner.members.retain(|_, members| {
            members.remove(&connection);
            !members.is_empty()
        });
    }
}

impl Default for RoomBus {
    fn default() -> Self {
        Self::new()
    }
}
