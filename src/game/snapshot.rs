//! Delta compression of room state for network transmission

use serde::{Deserialize, Serialize};

use super::combat::Missile;
use super::state::{GameState, Player, SLOT_COUNT};

/// Changed fields of one player since the last broadcast
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hp: Option<i32>,
    #[serde(rename = "basicCD", skip_serializing_if = "Option::is_none")]
    pub basic_cd: Option<f32>,
    #[serde(rename = "fastCD", skip_serializing_if = "Option::is_none")]
    pub fast_cd: Option<f32>,
}

impl PlayerDelta {
    fn between(prev: &Player, curr: &Player) -> Self {
        fn changed<T: PartialEq + Copy>(prev: T, curr: T) -> Option<T> {
            (prev != curr).then_some(curr)
        }

        Self {
            x: changed(prev.x, curr.x),
            y: changed(prev.y, curr.y),
            hp: changed(prev.hp, curr.hp),
            basic_cd: changed(prev.basic_cd, curr.basic_cd),
            fast_cd: changed(prev.fast_cd, curr.fast_cd),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_none()
            && self.y.is_none()
            && self.hp.is_none()
            && self.basic_cd.is_none()
            && self.fast_cd.is_none()
    }

    fn apply(&self, player: &mut Player) {
        if let Some(x) = self.x {
            player.x = x;
        }
        if let Some(y) = self.y {
            player.y = y;
        }
        if let Some(hp) = self.hp {
            player.hp = hp;
        }
        if let Some(basic_cd) = self.basic_cd {
            player.basic_cd = basic_cd;
        }
        if let Some(fast_cd) = self.fast_cd {
            player.fast_cd = fast_cd;
        }
    }
}

/// Sparse state update over a fixed schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDelta {
    /// Indexed by slot; unchanged players serialize as `{}`
    pub players: [PlayerDelta; SLOT_COUNT],
    /// Whole missile list, present only when it changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missiles: Option<Vec<Missile>>,
}

impl StateDelta {
    /// Compare two states field by field
    pub fn between(prev: &GameState, curr: &GameState) -> Self {
        Self {
            players: [
                PlayerDelta::between(&prev.players[0], &curr.players[0]),
                PlayerDelta::between(&prev.players[1], &curr.players[1]),
            ],
            missiles: (prev.missiles != curr.missiles).then(|| curr.missiles.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.players.iter().all(PlayerDelta::is_empty) && self.missiles.is_none()
    }

    /// Apply onto a previously reconstructed state, the way clients do
    pub fn apply(&self, state: &mut GameState) {
        for (delta, player) in self.players.iter().zip(state.players.iter_mut()) {
            delta.apply(player);
        }
        if let Some(missiles) = &self.missiles {
            state.missiles = missiles.clone();
        }
    }
}

/// Tracks the last broadcast state of a room and builds deltas against it
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    last_sent: GameState,
}

impl SnapshotBuilder {
    pub fn new(initial: &GameState) -> Self {
        Self {
            last_sent: initial.clone(),
        }
    }

    /// Diff `current` against the retained snapshot, then retain a copy of `current`.
    /// Returns `None` when no tracked field changed.
    pub fn build_delta(&mut self, current: &GameState) -> Option<StateDelta> {
        let delta = StateDelta::between(&self.last_sent, current);
        self.last_sent.clone_from(current);

        (!delta.is_empty()).then_some(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::simulation::step;
    use crate::game::state::PlayerInput;

    /// Fields a client can see
    fn assert_synced(client: &GameState, server: &GameState) {
        for (c, s) in client.players.iter().zip(server.players.iter()) {
            assert_eq!((c.x, c.y, c.hp), (s.x, s.y, s.hp));
            assert_eq!((c.basic_cd, c.fast_cd), (s.basic_cd, s.fast_cd));
        }
        assert_eq!(client.missiles, server.missiles);
    }

    #[test]
    fn unchanged_state_produces_no_delta() {
        let state = GameState::new();
        let mut builder = SnapshotBuilder::new(&state);
        assert!(builder.build_delta(&state).is_none());
    }

    #[test]
    fn only_changed_fields_are_emitted() {
        let state = GameState::new();
        let mut builder = SnapshotBuilder::new(&state);

        let mut next = state.clone();
        next.players[1].x -= 7.0;
        let delta = builder.build_delta(&next).unwrap();

        assert!(delta.players[0].is_empty());
        assert_eq!(delta.players[1].x, Some(613.0));
        assert_eq!(delta.players[1].y, None);
        assert!(delta.missiles.is_none());

        let json = serde_json::to_value(&delta).unwrap();
        assert_eq!(json, serde_json::json!({ "players": [{}, { "x": 613.0 }] }));

        let decoded: StateDelta = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, delta);
    }

    #[test]
    fn input_changes_alone_are_not_tracked() {
        let state = GameState::new();
        let mut builder = SnapshotBuilder::new(&state);
        let mut next = state.clone();
        next.players[0].input.up = true;
        assert!(builder.build_delta(&next).is_none());
    }

    #[test]
    fn snapshot_is_replaced_even_without_message() {
        let state = GameState::new();
        let mut builder = SnapshotBuilder::new(&state);

        let mut moved = state.clone();
        moved.players[0].y = 10.0;
        assert!(builder.build_delta(&moved).is_some());
        assert!(builder.build_delta(&moved).is_none());

        // Moving back is a change against the replaced snapshot
        let back = builder.build_delta(&state).unwrap();
        assert_eq!(back.players[0].y, Some(state.players[0].y));
    }

    #[test]
    fn missile_list_is_sent_whole_when_changed() {
        let mut state = GameState::new();
        state.players[0].input = PlayerInput {
            fire: true,
            ..Default::default()
        };
        let mut builder = SnapshotBuilder::new(&state);

        step(&mut state);
        let delta = builder.build_delta(&state).unwrap();
        assert_eq!(delta.missiles.as_deref(), Some(state.missiles.as_slice()));
        assert_eq!(delta.players[0].basic_cd, Some(0.5));
    }

    #[test]
    fn applying_deltas_reproduces_server_state() {
        let mut server = GameState::new();
        server.players[1].x = 400.0;
        let mut builder = SnapshotBuilder::new(&server);
        let mut client = server.clone();

        for tick in 0u32..600 {
            server.players[0].input = PlayerInput {
                down: tick % 90 < 45,
                up: tick % 90 >= 45,
                right: tick % 200 < 20,
                fire: true,
                fast_fire: tick % 400 == 0,
                ..Default::default()
            };
            server.players[1].input = PlayerInput {
                left: tick % 3 == 0,
                fire: tick % 50 < 10,
                ..Default::default()
            };

            step(&mut server);
            if let Some(delta) = builder.build_delta(&server) {
                delta.apply(&mut client);
                assert_synced(&client, &server);
            }
        }
    }
}
