//! Room state: occupants, authoritative game state and per-tick distribution

use tracing::{debug, info};

use crate::util::time::unix_millis;
use crate::ws::protocol::ServerMsg;

use super::gateway::{ConnectionHandle, ConnectionId};
use super::simulation::{self, TickEvent};
use super::snapshot::SnapshotBuilder;
use super::state::{GameState, PlayerInput, Slot, SLOT_COUNT};

/// One isolated two-player match
pub struct Room {
    pub id: String,
    /// Indexed by slot; a seated connection never changes slot
    occupants: [Option<ConnectionHandle>; SLOT_COUNT],
    pub state: GameState,
    snapshot_builder: SnapshotBuilder,
    pub tick: u64,
}

impl Room {
    pub fn new(id: impl Into<String>) -> Self {
        let state = GameState::new();
        Self {
            id: id.into(),
            occupants: [None, None],
            snapshot_builder: SnapshotBuilder::new(&state),
            state,
            tick: 0,
        }
    }

    pub fn occupant_count(&self) -> usize {
        self.occupants.iter().flatten().count()
    }

    pub fn is_full(&self) -> bool {
        self.occupant_count() == SLOT_COUNT
    }

    pub fn is_empty(&self) -> bool {
        self.occupant_count() == 0
    }

    /// Slot held by a connection, if any
    pub fn slot_of(&self, conn_id: ConnectionId) -> Option<Slot> {
        self.occupants
            .iter()
            .position(|o| o.as_ref().is_some_and(|c| c.id == conn_id))
    }

    /// Seat a connection in the lowest free slot. Returns `None` when full.
    pub fn seat(&mut self, conn: ConnectionHandle) -> Option<Slot> {
        let slot = self.occupants.iter().position(Option::is_none)?;
        self.occupants[slot] = Some(conn);
        Some(slot)
    }

    /// Free the slot held by a connection
    pub fn unseat(&mut self, conn_id: ConnectionId) -> Option<Slot> {
        let slot = self.slot_of(conn_id)?;
        self.occupants[slot] = None;
        Some(slot)
    }

    /// Overwrite a player's stored input in full
    pub fn set_input(&mut self, slot: Slot, input: PlayerInput) {
        self.state.players[slot].input = input;
    }

    /// Deliver a message to every occupant
    pub fn broadcast(&self, msg: &ServerMsg) {
        for conn in self.occupants.iter().flatten() {
            conn.send(msg.clone());
        }
    }

    /// Simulate one tick, then push game-over notices and the state delta to occupants
    pub fn run_tick(&mut self) -> Vec<TickEvent> {
        self.tick += 1;
        let events = simulation::step(&mut self.state);

        for event in &events {
            match *event {
                TickEvent::GameOver { winner } => {
                    info!(room_id = %self.id, tick = self.tick, winner, "Game over");
                    self.broadcast(&ServerMsg::GameOver { winner });
                }
            }
        }

        if let Some(delta) = self.snapshot_builder.build_delta(&self.state) {
            self.broadcast(&ServerMsg::Update {
                timestamp: unix_millis(),
                delta,
            });
        } else {
            debug!(room_id = %self.id, tick = self.tick, "No state change, update skipped");
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn drain(rx: &mut mpsc::Receiver<ServerMsg>) -> Vec<ServerMsg> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    #[test]
    fn seats_fill_lowest_free_slot() {
        let mut room = Room::new("r");
        let (a, _rx_a) = ConnectionHandle::channel(8);
        let (b, _rx_b) = ConnectionHandle::channel(8);
        let (c, _rx_c) = ConnectionHandle::channel(8);

        assert_eq!(room.seat(a.clone()), Some(0));
        assert_eq!(room.seat(b.clone()), Some(1));
        assert_eq!(room.seat(c.clone()), None);
        assert!(room.is_full());

        assert_eq!(room.unseat(a.id), Some(0));
        assert_eq!(room.slot_of(b.id), Some(1));
        assert_eq!(room.seat(c.clone()), Some(0));
        assert_eq!(room.slot_of(c.id), Some(0));
    }

    #[test]
    fn idle_tick_sends_nothing() {
        let mut room = Room::new("r");
        let (a, mut rx) = ConnectionHandle::channel(8);
        room.seat(a);

        room.run_tick();
        assert!(drain(&mut rx).is_empty());
        assert_eq!(room.tick, 1);
    }

    #[test]
    fn moving_player_broadcasts_update_to_all() {
        let mut room = Room::new("r");
        let (a, mut rx_a) = ConnectionHandle::channel(8);
        let (b, mut rx_b) = ConnectionHandle::channel(8);
        room.seat(a);
        room.seat(b);
        room.set_input(
            0,
            PlayerInput {
                down: true,
                ..Default::default()
            },
        );

        room.run_tick();

        for rx in [&mut rx_a, &mut rx_b] {
            match drain(rx).as_slice() {
                [ServerMsg::Update { delta, timestamp }] => {
                    assert!(*timestamp > 0);
                    assert_eq!(delta.players[0].y, Some(157.0));
                    assert!(delta.players[1].is_empty());
                }
                other => panic!("Unexpected messages: {:?}", other),
            }
        }
    }

    #[test]
    fn game_over_precedes_final_update() {
        let mut room = Room::new("r");
        let (a, mut rx) = ConnectionHandle::channel(8);
        room.seat(a);
        room.state.players[1].hp = 10;
        room.state.players[1].x = 170.0;
        room.set_input(
            0,
            PlayerInput {
                fire: true,
                ..Default::default()
            },
        );

        let events = room.run_tick();

        assert_eq!(events, vec![TickEvent::GameOver { winner: 0 }]);
        let messages = drain(&mut rx);
        assert_eq!(messages[0], ServerMsg::GameOver { winner: 0 });
        match &messages[1] {
            ServerMsg::Update { delta, .. } => assert_eq!(delta.players[1].hp, Some(0)),
            other => panic!("Unexpected message: {:?}", other),
        }
    }
}
