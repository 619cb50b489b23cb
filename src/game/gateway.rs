//! Connection gateway: binds connections to room slots and relays their events

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Notify;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ws::protocol::ServerMsg;

use super::registry::RoomRegistry;
use super::state::{PlayerInput, Slot};

/// Transient identity of one client connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Set once a connection falls behind; its session closes on notify
#[derive(Debug, Default)]
struct LagSignal {
    lagged: AtomicBool,
    notify: Notify,
}

/// Outbound side of a connection
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    outbox: mpsc::Sender<ServerMsg>,
    lag: Arc<LagSignal>,
}

impl ConnectionHandle {
    pub fn new(outbox: mpsc::Sender<ServerMsg>) -> Self {
        Self {
            id: ConnectionId::new(),
            outbox,
            lag: Arc::new(LagSignal::default()),
        }
    }

    /// Handle plus the receiving end the transport drains
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ServerMsg>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Deliver a message to this connection without blocking.
    ///
    /// Updates are deltas against the previous one, so a connection that
    /// misses a message can never catch up. A full outbox marks the
    /// connection lagged: nothing more is delivered and its session is told
    /// to close. Returns false if the message was not queued.
    pub fn send(&self, msg: ServerMsg) -> bool {
        if self.is_lagged() {
            return false;
        }

        match self.outbox.try_send(msg) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(conn_id = %self.id, "Client lagged, closing connection");
                self.lag.lagged.store(true, Ordering::Release);
                self.lag.notify.notify_one();
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(conn_id = %self.id, "Outbound channel closed");
                false
            }
        }
    }

    pub fn is_lagged(&self) -> bool {
        self.lag.lagged.load(Ordering::Acquire)
    }

    /// Resolves once the outbox has overflowed
    pub async fn lagged(&self) {
        if self.is_lagged() {
            return;
        }
        self.lag.notify.notified().await;
    }
}

/// Gateway errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("Room {0} is full")]
    RoomFull(String),

    #[error("Unknown room {0}")]
    UnknownRoom(String),

    #[error("Connection holds no slot in room {0}")]
    UnboundSlot(String),

    #[error("Connection already joined room {0}")]
    AlreadyJoined(String),
}

/// Relays join, input and disconnect events into the room registry
#[derive(Clone)]
pub struct Gateway {
    registry: Arc<RoomRegistry>,
}

impl Gateway {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    /// Seat a connection in a room, creating the room on first join.
    ///
    /// The caller receives `init` with its slot and the full state. When the
    /// second slot fills, both occupants receive `startGame`. A full room
    /// answers with `roomFull` only.
    pub fn join(&self, conn: &ConnectionHandle, room_id: &str) -> Result<Slot, GatewayError> {
        if let Some((joined, slot)) = self.registry.find_seat(conn.id) {
            if joined != room_id {
                return Err(GatewayError::AlreadyJoined(joined));
            }
            if let Some(room) = self.registry.get_mut(room_id) {
                conn.send(ServerMsg::Init {
                    player_index: slot,
                    state: room.state.clone(),
                });
            }
            return Ok(slot);
        }

        let mut room = self.registry.get_or_create(room_id);

        let Some(slot) = room.seat(conn.clone()) else {
            conn.send(ServerMsg::RoomFull);
            return Err(GatewayError::RoomFull(room_id.to_string()));
        };

        conn.send(ServerMsg::Init {
            player_index: slot,
            state: room.state.clone(),
        });

        info!(
            room_id = %room_id,
            conn_id = %conn.id,
            slot,
            occupants = room.occupant_count(),
            "Player joined room"
        );

        if room.is_full() {
            room.broadcast(&ServerMsg::StartGame {
                state: room.state.clone(),
            });
            info!(room_id = %room_id, "Room full, match started");
        }

        Ok(slot)
    }

    /// Overwrite the connection's player input in the given room
    pub fn submit_input(
        &self,
        conn_id: ConnectionId,
        room_id: &str,
        input: PlayerInput,
    ) -> Result<Slot, GatewayError> {
        let mut room = self
            .registry
            .get_mut(room_id)
            .ok_or_else(|| GatewayError::UnknownRoom(room_id.to_string()))?;

        let slot = room
            .slot_of(conn_id)
            .ok_or_else(|| GatewayError::UnboundSlot(room_id.to_string()))?;

        room.set_input(slot, input);
        Ok(slot)
    }

    /// Remove a connection from every room it occupies.
    /// Remaining occupants get `playerLeft`; emptied rooms are removed.
    /// Returns the ids of the rooms the connection left.
    pub fn disconnect(&self, conn_id: ConnectionId) -> Vec<String> {
        let mut left = Vec::new();

        self.registry.for_each_mut(|room| {
            if let Some(slot) = room.unseat(conn_id) {
                room.broadcast(&ServerMsg::PlayerLeft);
                info!(room_id = %room.id, conn_id = %conn_id, slot, "Player left room");
                left.push(room.id.clone());
            }
        });

        for room_id in &left {
            self.registry.remove_if_empty(room_id);
        }

        left
    }

    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }
}
