//! Bombs and blasts
//!
//! A bomb is armed when placed, explodes when its fuse runs out, and is
//! finished once its explosion animation has played. The blast walks out from
//! the bomb's tile along the four cardinal directions. Only indestructible
//! walls (and the map edge) stop a ray; destructible walls are destroyed and
//! the blast carries on past them.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::entity::{Direction, Lifecycle, PowerUp};
use super::grid::{Concealed, Exit, Grid, GridObject};
use super::physics::{BodyDef, BodyTag, PhysicsWorld};
use super::state::{GameEvent, GameState, LossCause};
use crate::tuning::Tuning;
use crate::{tile_center, tile_of};

/// Bomb lifecycle, only ever moves forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BombPhase {
    Armed,
    Exploded,
    Finished,
}

#[derive(Debug, Clone)]
pub struct Bomb {
    pub id: u32,
    /// Sensor body while armed
    pub life: Lifecycle,
    pub phase: BombPhase,
    /// Seconds until explosion
    pub fuse: f32,
    /// Seconds of explosion animation left once exploded
    pub visual_timer: f32,
    pub radius: u32,
}

impl Bomb {
    pub fn new(world: &mut PhysicsWorld, id: u32, tile: IVec2, radius: u32, tuning: &Tuning) -> Self {
        let body = world.insert(BodyDef::sensor(
            BodyTag::Bomb(id),
            tile_center(tile),
            crate::consts::WALL_HALF_EXTENT,
        ));
        Self {
            id,
            life: Lifecycle::Alive(body),
            phase: BombPhase::Armed,
            fuse: tuning.bomb_fuse,
            visual_timer: tuning.bomb_visual_lifetime,
            radius,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.phase == BombPhase::Armed
    }

    pub fn is_explosion_finished(&self) -> bool {
        self.phase == BombPhase::Finished
    }

    pub fn tile(&self, world: &PhysicsWorld) -> IVec2 {
        tile_of(self.life.position(world))
    }

    /// Advance timers. Returns the blast center on the tick the bomb explodes.
    pub fn tick(&mut self, world: &mut PhysicsWorld, dt: f32) -> Option<IVec2> {
        match self.phase {
            BombPhase::Armed => {
                self.fuse -= dt;
                if self.fuse <= 0.0 {
                    return self.explode(world);
                }
                None
            }
            BombPhase::Exploded => {
                self.visual_timer -= dt;
                if self.visual_timer <= 0.0 {
                    self.phase = BombPhase::Finished;
                }
                None
            }
            BombPhase::Finished => None,
        }
    }

    /// Explode now. Only the first call does anything; it releases the body and
    /// returns the tile the blast is centered on.
    pub fn explode(&mut self, world: &mut PhysicsWorld) -> Option<IVec2> {
        if self.phase != BombPhase::Armed {
            return None;
        }
        let center = self.tile(world);
        self.life.release(world);
        self.fuse = 0.0;
        self.phase = BombPhase::Exploded;
        Some(center)
    }
}

/// Sprite variant for one cell of a blast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExplosionPiece {
    Center,
    Middle { horizontal: bool },
    End(Direction),
}

/// One cell of a blast, purely visual
#[derive(Debug, Clone)]
pub struct ExplosionTile {
    pub tile: IVec2,
    pub piece: ExplosionPiece,
    /// Seconds left
    pub lifetime: f32,
}

impl ExplosionTile {
    pub fn update(&mut self, dt: f32) {
        self.lifetime -= dt;
    }

    pub fn is_expired(&self) -> bool {
        self.lifetime <= 0.0
    }
}

/// A tile reached by a blast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlastCell {
    pub tile: IVec2,
    /// Steps from the center (0 for the center)
    pub distance: u32,
    /// Ray direction, None for the center
    pub direction: Option<Direction>,
}

impl BlastCell {
    pub fn piece(&self, radius: u32) -> ExplosionPiece {
        match self.direction {
            None => ExplosionPiece::Center,
            Some(dir) if self.distance == radius => ExplosionPiece::End(dir),
            Some(dir) => ExplosionPiece::Middle {
                horizontal: dir.is_horizontal(),
            },
        }
    }
}

/// Tiles a blast reaches: the center, then each ray in increasing distance.
///
/// A ray stops before an indestructible wall or the map edge.
pub fn blast_cells(grid: &Grid, center: IVec2, radius: u32) -> Vec<BlastCell> {
    let mut cells = vec![BlastCell {
        tile: center,
        distance: 0,
        direction: None,
    }];

    for dir in Direction::ALL {
        for distance in 1..=radius {
            let tile = center + dir.offset() * distance as i32;
            if !grid.in_bounds(tile) || grid.blocks_blast(tile) {
                break;
            }
            cells.push(BlastCell {
                tile,
                distance,
                direction: Some(dir),
            });
        }
    }

    cells
}

/// Apply a bomb's blast to the game: walls, player, enemies, other bombs
pub(crate) fn apply_blast(state: &mut GameState, center: IVec2, radius: u32) {
    let cells = blast_cells(&state.grid, center, radius);
    log::debug!(
        "Bomb exploded at ({}, {}) radius {}, {} cells",
        center.x,
        center.y,
        radius,
        cells.len()
    );
    state.events.push(GameEvent::BombExploded { tile: center });

    for cell in &cells {
        apply_effects(state, cell.tile);
        state.explosions.push(ExplosionTile {
            tile: cell.tile,
            piece: cell.piece(radius),
            lifetime: state.tuning.explosion_tile_lifetime,
        });
    }
}

fn apply_effects(state: &mut GameState, tile: IVec2) {
    if matches!(
        state.grid.get_object_at(tile),
        Some(GridObject::DestructibleWall { .. })
    ) {
        destroy_wall(state, tile);
    }

    let player_hit = state
        .player
        .as_ref()
        .is_some_and(|p| p.life.is_alive() && p.tile(&state.world) == tile);
    if player_hit {
        state.kill_player(LossCause::Explosion);
    }

    let hit: Vec<u32> = state
        .enemies
        .iter()
        .filter(|e| e.is_alive() && e.tile(&state.world) == tile)
        .map(|e| e.id)
        .collect();
    for id in hit {
        state.defeat_enemy(id);
    }

    if state.tuning.chain_reaction {
        for bomb in state.bombs.iter_mut().filter(|b| b.is_armed()) {
            if bomb.tile(&state.world) == tile {
                bomb.fuse = 0.0;
            }
        }
    }
}

/// Remove a destructible wall and reveal what it hid
fn destroy_wall(state: &mut GameState, tile: IVec2) {
    let Some(GridObject::DestructibleWall { mut life, concealed }) = state.grid.remove(tile) else {
        return;
    };
    life.release(&mut state.world);

    let points = state.tuning.score.wall_destroyed;
    state.score += points;
    state.events.push(GameEvent::WallDestroyed { tile, points });

    match concealed {
        Some(Concealed::Exit) => {
            let body = state.world.insert(BodyDef::sensor(
                BodyTag::Exit(tile),
                tile_center(tile),
                0.3,
            ));
            state.exit = Some(tile);
            state.grid.insert(
                tile,
                GridObject::Exit(Exit {
                    tile,
                    life: Lifecycle::Alive(body),
                    active: state.exit_active,
                }),
            );
            log::info!("Exit revealed at ({}, {})", tile.x, tile.y);
            state.events.push(GameEvent::ExitRevealed { tile });
        }
        Some(Concealed::PowerUp(kind)) => {
            let id = state.next_entity_id();
            state
                .power_ups
                .push(PowerUp::spawn(&mut state.world, id, tile, kind));
            state.events.push(GameEvent::PowerUpRevealed { tile, kind });
        }
        None => {}
    }
}
