//! Frame tick
//!
//! Advances a level by one rendered frame: entity timers and decisions first,
//! then fixed physics steps with contact resolution after each, then a sweep
//! that drops everything marked for removal.

use glam::Vec2;

use super::ai::{AiContext, update_enemy};
use super::explosion::apply_blast;
use super::grid::GridObject;
use super::physics::{BodyTag, ContactEvent};
use super::state::{GameEvent, GamePhase, GameState, LossCause};
use crate::consts::*;

/// Input commands for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Movement direction, normalized if longer than 1
    pub direction: Vec2,
    /// Drop a bomb on the player's tile
    pub place_bomb: bool,
    /// Fire an arrow the way the player faces
    pub shoot_arrow: bool,
}

/// Apply one frame of input, then advance the level
pub fn tick(state: &mut GameState, input: &TickInput, frame_time: f32) {
    if state.phase.is_over() {
        return;
    }
    state.update_direction(input.direction.x, input.direction.y);
    if input.place_bomb {
        state.place_bomb();
    }
    if input.shoot_arrow {
        state.shoot_arrow();
    }
    advance(state, frame_time);
}

impl GameState {
    /// Advance by `frame_time` seconds keeping the current input
    pub fn tick(&mut self, frame_time: f32) {
        advance(self, frame_time);
    }

    pub fn tick_with_input(&mut self, input: &TickInput, frame_time: f32) {
        tick(self, input, frame_time);
    }
}

fn advance(state: &mut GameState, frame_time: f32) {
    if state.phase.is_over() {
        return;
    }
    // NaN or infinite host time counts as no time at all
    let dt = if frame_time.is_finite() {
        frame_time.clamp(0.0, MAX_FRAME_TIME)
    } else {
        0.0
    };
    state.elapsed += dt;

    // === Level timer ===
    state.time_remaining -= dt;
    if state.time_remaining <= 0.0 {
        state.time_remaining = 0.0;
        log::info!("Level timer ran out");
        state.events.push(GameEvent::TimeUp);
        state.lose(LossCause::TimeUp);
        return;
    }

    // === Entity updates ===
    if let Some(player) = &mut state.player {
        player.update(&mut state.world, &state.tuning);
    }

    let ctx = AiContext {
        grid: &state.grid,
        player: state.player_position(),
        tuning: &state.tuning,
        dt,
    };
    for enemy in state.enemies.iter_mut().filter(|e| e.is_alive()) {
        update_enemy(enemy, &mut state.world, &ctx, &mut state.rng);
    }

    let mut detonations = Vec::new();
    for bomb in &mut state.bombs {
        if let Some(center) = bomb.tick(&mut state.world, dt) {
            detonations.push((center, bomb.radius));
        }
    }
    for (center, radius) in detonations {
        apply_blast(state, center, radius);
    }

    for arrow in &mut state.arrows {
        arrow.update(&mut state.world, dt, &state.tuning);
    }
    for tile in &mut state.explosions {
        tile.update(dt);
    }

    // === Physics ===
    state.accumulator += dt;
    let mut substeps = 0;
    while state.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS && !state.phase.is_over() {
        state.world.step(SIM_DT);
        state.accumulator -= SIM_DT;
        substeps += 1;
        resolve_contacts(state);
    }
    if substeps == MAX_SUBSTEPS {
        state.accumulator = 0.0;
    }

    cleanup(state);
}

/// Turn physics contacts into gameplay outcomes
fn resolve_contacts(state: &mut GameState) {
    for contact in state.world.drain_contacts() {
        match contact {
            ContactEvent::Began { a, b } => {
                if !resolve_pair(state, a, b) {
                    resolve_pair(state, b, a);
                }
            }
            ContactEvent::Blocked {
                body: BodyTag::Arrow(id),
                ..
            } => {
                if let Some(arrow) = state.arrows.iter_mut().find(|a| a.id == id) {
                    arrow.spend(&mut state.world);
                }
            }
            ContactEvent::Blocked {
                body: BodyTag::Enemy(id),
                ..
            } => {
                if let Some(enemy) = state.enemies.iter_mut().find(|e| e.id == id) {
                    enemy.ai.reroll = true;
                }
            }
            ContactEvent::Blocked { .. } => {}
        }
    }

    check_exit(state);
}

/// Handle a contact with the tags in this order. False if the pair means nothing.
fn resolve_pair(state: &mut GameState, a: BodyTag, b: BodyTag) -> bool {
    match (a, b) {
        (BodyTag::Player, BodyTag::PowerUp(id)) => {
            state.collect_power_up(id);
            true
        }
        (BodyTag::Player, BodyTag::Enemy(id)) => {
            let live = state.enemies.iter().any(|e| e.id == id && e.is_alive());
            if live && state.tuning.enemy_contact_kills {
                state.kill_player(LossCause::EnemyContact);
            }
            true
        }
        (BodyTag::Arrow(arrow_id), BodyTag::Enemy(enemy_id)) => {
            let Some(arrow) = state
                .arrows
                .iter_mut()
                .find(|a| a.id == arrow_id && !a.spent)
            else {
                return true;
            };
            arrow.spend(&mut state.world);
            state.defeat_enemy(enemy_id);
            true
        }
        _ => false,
    }
}

/// Win when the player overlaps the exit after it has activated
fn check_exit(state: &mut GameState) {
    if !state.exit_active || state.phase.is_over() {
        return;
    }
    let Some(player_body) = state.player.as_ref().and_then(|p| p.life.body()) else {
        return;
    };
    let exit_body = state
        .exit_tile()
        .and_then(|tile| match state.grid.get_object_at(tile) {
            Some(GridObject::Exit(exit)) => exit.life.body(),
            _ => None,
        });
    let Some(exit_body) = exit_body else {
        return;
    };

    if state.world.is_touching(player_body, exit_body) {
        log::info!("Level complete, score {}", state.score);
        state.phase = GamePhase::Won;
        state.events.push(GameEvent::LevelComplete);
    }
}

/// Sweep everything marked for removal
fn cleanup(state: &mut GameState) {
    state.bombs.retain(|b| !b.is_explosion_finished());
    state.explosions.retain(|e| !e.is_expired());
    state.power_ups.retain(|p| !p.collected);

    for arrow in state.arrows.iter_mut().filter(|a| a.is_expired()) {
        arrow.life.release(&mut state.world);
    }
    state.arrows.retain(|a| !a.is_expired());

    state.enemies.retain(|e| e.is_alive());
}
