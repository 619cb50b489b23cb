//! Combat system - weapons, missiles, damage, hit detection

use serde::{Deserialize, Serialize};

use crate::util::time::tick_delta;

use super::physics::{PhysicsSystem, Rect};
use super::state::{Player, Slot};

/// Damage dealt by any missile hit
pub const MISSILE_DAMAGE: i32 = 10;

/// Weapon tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeaponTier {
    /// Small, slow, short cooldown
    Basic,
    /// Large, fast, long cooldown
    Fast,
}

/// Weapon stats per tier
#[derive(Debug, Clone, Copy)]
pub struct WeaponStats {
    /// Horizontal speed magnitude (units per tick)
    pub missile_speed: f32,
    /// Cooldown between shots (seconds)
    pub cooldown: f32,
    /// Missile hitbox
    pub missile_width: f32,
    pub missile_height: f32,
    /// Vertical offset from the shooter's top edge
    pub y_offset: f32,
}

impl WeaponStats {
    pub fn for_tier(tier: WeaponTier) -> Self {
        match tier {
            WeaponTier::Basic => Self {
                missile_speed: 15.0,
                cooldown: 0.5,
                missile_width: 12.0,
                missile_height: 30.0,
                y_offset: 15.0,
            },
            WeaponTier::Fast => Self {
                missile_speed: 25.0,
                cooldown: 6.0,
                missile_width: 40.0,
                missile_height: 40.0,
                y_offset: 10.0,
            },
        }
    }
}

/// Live missile in a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Missile {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    /// Signed horizontal speed; the sign encodes direction
    pub speed: f32,
    /// Originating slot
    pub from: Slot,
}

impl Missile {
    /// Spawn a missile at the shooter's leading edge.
    /// Slot 0 fires rightwards from its right edge, slot 1 leftwards from its left edge.
    pub fn spawn(shooter: &Player, from: Slot, stats: &WeaponStats) -> Self {
        let (x, speed) = if from == 0 {
            (shooter.x + shooter.width, stats.missile_speed)
        } else {
            (shooter.x - stats.missile_width, -stats.missile_speed)
        };

        Self {
            x,
            y: shooter.y + stats.y_offset,
            w: stats.missile_width,
            h: stats.missile_height,
            speed,
            from,
        }
    }

    /// Advance one tick
    pub fn advance(&mut self) {
        self.x += self.speed;
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }

    /// Check collision with a target player
    pub fn hits(&self, target: &Player) -> bool {
        self.rect().overlaps(&PhysicsSystem::player_rect(target))
    }
}

/// Combat system for managing weapons and damage
pub struct CombatSystem;

impl CombatSystem {
    /// Check if a weapon can fire (cooldown check)
    pub fn can_fire(cooldown: f32) -> bool {
        cooldown <= 0.0
    }

    /// Decay a cooldown by one tick, never below zero
    pub fn update_cooldown(cooldown: f32) -> f32 {
        (cooldown - tick_delta()).max(0.0)
    }

    /// Apply damage to hp, returns (new_hp, eliminated_by_this_hit)
    pub fn apply_damage(current_hp: i32, damage: i32) -> (i32, bool) {
        let new_hp = (current_hp - damage).max(0);
        (new_hp, current_hp > 0 && new_hp == 0)
    }
}

/// Hit result from combat resolution
#[derive(Debug, Clone, PartialEq)]
pub struct HitResult {
    pub shooter: Slot,
    pub target: Slot,
    pub damage: i32,
    pub target_eliminated: bool,
}
