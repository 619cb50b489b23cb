//! Room registry and the fixed-rate tick driver

use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use crate::util::time::{tick_duration, SIMULATION_TPS};

use super::gateway::ConnectionId;
use super::room::Room;
use super::state::Slot;

/// Registry of all active rooms.
///
/// Each room is only ever touched through the map's per-entry guard, which
/// serializes joins, inputs, disconnects and ticks on that room. Callers must
/// not hold a guard across an await point or while calling back into the registry.
pub struct RoomRegistry {
    rooms: DashMap<String, Room>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Existing room, or a fresh one visible to the very next tick
    pub fn get_or_create(&self, room_id: &str) -> RefMut<'_, String, Room> {
        self.rooms
            .entry(room_id.to_string())
            .or_insert_with(|| {
                info!(room_id = %room_id, "Room created");
                Room::new(room_id)
            })
    }

    pub fn get_mut(&self, room_id: &str) -> Option<RefMut<'_, String, Room>> {
        self.rooms.get_mut(room_id)
    }

    /// Delete a room; no-op when absent
    pub fn remove(&self, room_id: &str) {
        if self.rooms.remove(room_id).is_some() {
            info!(room_id = %room_id, "Room removed");
        }
    }

    /// Delete a room only if nobody is seated in it
    pub fn remove_if_empty(&self, room_id: &str) -> bool {
        let removed = self
            .rooms
            .remove_if(room_id, |_, room| room.is_empty())
            .is_some();
        if removed {
            info!(room_id = %room_id, "Room removed");
        }
        removed
    }

    pub fn contains(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// Room and slot held by a connection, if any
    pub fn find_seat(&self, conn_id: ConnectionId) -> Option<(String, Slot)> {
        self.rooms.iter().find_map(|entry| {
            entry
                .value()
                .slot_of(conn_id)
                .map(|slot| (entry.key().clone(), slot))
        })
    }

    /// Visit every room mutably
    pub fn for_each_mut(&self, mut f: impl FnMut(&mut Room)) {
        for mut entry in self.rooms.iter_mut() {
            f(entry.value_mut());
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn occupant_count(&self) -> usize {
        self.rooms
            .iter()
            .map(|entry| entry.value().occupant_count())
            .sum()
    }

    /// Run one tick (simulation then distribution) for every room
    pub fn tick_all(&self) {
        self.for_each_mut(|room| {
            room.run_tick();
        });
    }

    /// Run the fixed-rate tick driver forever
    pub async fn run(self: Arc<Self>) {
        info!(tps = SIMULATION_TPS, "Tick driver started");

        let mut tick_interval = interval(tick_duration());
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tick_interval.tick().await;
            self.tick_all();
        }
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
