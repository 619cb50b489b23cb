//! Player movement and arena bounds

use super::state::{Player, PlayerInput};

/// Arena size
pub const GAME_WIDTH: f32 = 780.0;
pub const GAME_HEIGHT: f32 = 300.0;

/// Movement per tick per active direction
pub const PLAYER_SPEED: f32 = 7.0;

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Strict overlap; touching edges do not count
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }
}

/// Physics system for updating player positions
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Move a player by its directional flags and clamp into the arena.
    /// Diagonal movement is full speed on both axes.
    pub fn move_player(player: &mut Player, input: &PlayerInput) {
        if input.up {
            player.y -= PLAYER_SPEED;
        }
        if input.down {
            player.y += PLAYER_SPEED;
        }
        if input.left {
            player.x -= PLAYER_SPEED;
        }
        if input.right {
            player.x += PLAYER_SPEED;
        }

        let (x, y) = Self::clamp_to_arena(player.x, player.y, player.width, player.height);
        player.x = x;
        player.y = y;
    }

    /// Clamp a top-left position so the box stays inside the arena
    pub fn clamp_to_arena(x: f32, y: f32, width: f32, height: f32) -> (f32, f32) {
        (
            x.clamp(0.0, GAME_WIDTH - width),
            y.clamp(0.0, GAME_HEIGHT - height),
        )
    }

    /// Whether a missile x coordinate has left the arena horizontally
    pub fn is_out_of_bounds(x: f32) -> bool {
        !(0.0..=GAME_WIDTH).contains(&x)
    }

    pub fn player_rect(player: &Player) -> Rect {
        Rect::new(player.x, player.y, player.width, player.height)
    }
}
