//! Authoritative entity model: players, missiles and per-room game state

use serde::{Deserialize, Serialize};

use super::combat::Missile;
use super::physics::GAME_WIDTH;

/// Player hitbox size
pub const PLAYER_WIDTH: f32 = 60.0;
pub const PLAYER_HEIGHT: f32 = 60.0;

/// Starting (and maximum) hit points
pub const MAX_HP: i32 = 50;

/// Number of player slots in a room
pub const SLOT_COUNT: usize = 2;

/// Slot index identifying which side of the match a connection controls
pub type Slot = usize;

/// Latest intent snapshot received from a client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub fire: bool,
    pub fast_fire: bool,
}

/// Player state in a room (authoritative)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Display only
    pub color: String,
    pub hp: i32,
    #[serde(rename = "basicCD")]
    pub basic_cd: f32,
    #[serde(rename = "fastCD")]
    pub fast_cd: f32,

    /// Server-side only, never sent to clients
    #[serde(skip)]
    pub input: PlayerInput,
}

impl Player {
    pub fn new(x: f32, y: f32, color: &str) -> Self {
        Self {
            x,
            y,
            width: PLAYER_WIDTH,
            height: PLAYER_HEIGHT,
            color: color.to_string(),
            hp: MAX_HP,
            basic_cd: 0.0,
            fast_cd: 0.0,
            input: PlayerInput::default(),
        }
    }

    /// Spawn a player for the given slot
    pub fn spawn(slot: Slot) -> Self {
        match slot {
            0 => Self::new(100.0, 150.0, "#00ffff"),
            _ => Self::new(GAME_WIDTH - 160.0, 150.0, "#ff9933"),
        }
    }
}

/// Full game state of one room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Fixed slots 0 and 1
    pub players: [Player; SLOT_COUNT],
    /// Live missiles, in creation order
    pub missiles: Vec<Missile>,
}

impl GameState {
    /// Fresh state: both players at spawn, full hp, no missiles
    pub fn new() -> Self {
        Self {
            players: [Player::spawn(0), Player::spawn(1)],
            missiles: Vec::new(),
        }
    }

    /// Slot of the player opposing `slot`
    pub fn opponent_of(slot: Slot) -> Slot {
        1 - slot
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
