//! Simulation engine: advances one room's game state by one fixed tick
//!
//! A tick depends only on the state entering it and the inputs stored on each
//! player. Players are processed in slot order (movement, cooldown decay,
//! weapon fire), then every missile is advanced, culled at the arena edge and
//! tested against the opposing player.

use super::combat::{CombatSystem, HitResult, Missile, WeaponStats, WeaponTier, MISSILE_DAMAGE};
use super::physics::PhysicsSystem;
use super::state::{GameState, Player, Slot, SLOT_COUNT};

/// Notable outcome of a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEvent {
    /// A hit brought the target to 0 hp
    GameOver { winner: Slot },
}

/// Run a single simulation tick
pub fn step(state: &mut GameState) -> Vec<TickEvent> {
    update_players(state);
    update_missiles(state)
}

/// Movement, cooldowns and weapon fire for each slot in order
fn update_players(state: &mut GameState) {
    for slot in 0..SLOT_COUNT {
        let player = &mut state.players[slot];
        let input = player.input;

        PhysicsSystem::move_player(player, &input);

        player.basic_cd = CombatSystem::update_cooldown(player.basic_cd);
        player.fast_cd = CombatSystem::update_cooldown(player.fast_cd);

        if input.fire {
            try_fire(player, slot, WeaponTier::Basic, &mut state.missiles);
        }
        if input.fast_fire {
            try_fire(player, slot, WeaponTier::Fast, &mut state.missiles);
        }
    }
}

/// Spawn a missile if the tier's cooldown is ready, then reset that cooldown
fn try_fire(player: &mut Player, slot: Slot, tier: WeaponTier, missiles: &mut Vec<Missile>) {
    let cooldown = match tier {
        WeaponTier::Basic => &mut player.basic_cd,
        WeaponTier::Fast => &mut player.fast_cd,
    };
    if !CombatSystem::can_fire(*cooldown) {
        return;
    }

    let stats = WeaponStats::for_tier(tier);
    *cooldown = stats.cooldown;
    missiles.push(Missile::spawn(player, slot, &stats));
}

/// Advance missiles, drop the ones leaving the arena and resolve hits
fn update_missiles(state: &mut GameState) -> Vec<TickEvent> {
    let mut hits: Vec<HitResult> = Vec::new();
    let players = &state.players;

    state.missiles.retain_mut(|missile| {
        missile.advance();

        if PhysicsSystem::is_out_of_bounds(missile.x) {
            return false;
        }

        let target = GameState::opponent_of(missile.from);
        if missile.hits(&players[target]) {
            hits.push(HitResult {
                shooter: missile.from,
                target,
                damage: MISSILE_DAMAGE,
                target_eliminated: false,
            });
            // A missile is consumed by its first hit
            return false;
        }

        true
    });

    let mut events = Vec::new();
    for mut hit in hits {
        let target = &mut state.players[hit.target];
        let (new_hp, eliminated) = CombatSystem::apply_damage(target.hp, hit.damage);
        target.hp = new_hp;
        hit.target_eliminated = eliminated;

        if hit.target_eliminated {
            events.push(TickEvent::GameOver {
                winner: hit.shooter,
            });
        }
    }

    events
}
