//! What each entity looks like
//!
//! The renderer asks for [`render_objects`] between ticks and gets back plain
//! values: where to draw, which sprite sheet, which frame. Animation frames are
//! derived from simulated time so the core stays free of rendering state.

use glam::Vec2;

use super::ai::AiMode;
use super::entity::{Direction, PowerUpKind};
use super::explosion::{BombPhase, ExplosionPiece};
use super::grid::GridObject;
use super::state::GameState;
use crate::tile_center;

/// Walk cycle frames per second
const WALK_FPS: f32 = 8.0;
const WALK_FRAMES: u32 = 4;
const BOMB_FPS: f32 = 4.0;
const BOMB_FRAMES: u32 = 3;
const EXPLOSION_FPS: f32 = 10.0;
const EXPLOSION_FRAMES: u32 = 4;

/// Render-relevant view of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    IndestructibleWall,
    DestructibleWall,
    Entrance,
    Exit { active: bool },
    Player { facing: Direction, moving: bool, alive: bool },
    Enemy { facing: Direction, mode: AiMode },
    Bomb { phase: BombPhase },
    PowerUp(PowerUpKind),
    Arrow { direction: Direction },
    Explosion(ExplosionPiece),
}

/// Sprite lookup key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sprite {
    pub sheet: &'static str,
    /// Directional variant of the sheet
    pub facing: Option<Direction>,
    pub frame: u32,
}

impl Sprite {
    fn still(sheet: &'static str) -> Self {
        Self {
            sheet,
            facing: None,
            frame: 0,
        }
    }

    /// Atlas key, e.g. `player_walk_left`
    pub fn key(&self) -> String {
        match self.facing {
            Some(dir) => format!("{}_{}", self.sheet, direction_name(dir)),
            None => self.sheet.to_string(),
        }
    }
}

/// Something to draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderObject {
    pub kind: EntityKind,
    pub position: Vec2,
    pub sprite: Sprite,
}

fn direction_name(dir: Direction) -> &'static str {
    match dir {
        Direction::Up => "up",
        Direction::Down => "down",
        Direction::Left => "left",
        Direction::Right => "right",
    }
}

fn frame(elapsed: f32, fps: f32, frames: u32) -> u32 {
    (elapsed.max(0.0) * fps) as u32 % frames
}

/// Sprite for an entity at a point in simulated time
pub fn appearance_of(kind: &EntityKind, elapsed: f32) -> Sprite {
    match *kind {
        EntityKind::IndestructibleWall => Sprite::still("wall_solid"),
        EntityKind::DestructibleWall => Sprite::still("wall_brick"),
        EntityKind::Entrance => Sprite::still("entrance"),
        EntityKind::Exit { active: true } => Sprite::still("exit_open"),
        EntityKind::Exit { active: false } => Sprite::still("exit_closed"),
        EntityKind::Player { alive: false, .. } => Sprite::still("player_dead"),
        EntityKind::Player { facing, moving, .. } => Sprite {
            sheet: "player_walk",
            facing: Some(facing),
            frame: if moving {
                frame(elapsed, WALK_FPS, WALK_FRAMES)
            } else {
                0
            },
        },
        EntityKind::Enemy { facing, mode } => Sprite {
            sheet: match mode {
                AiMode::Wander => "enemy_walk",
                AiMode::Chase => "enemy_chase",
            },
            facing: Some(facing),
            frame: frame(elapsed, WALK_FPS, WALK_FRAMES),
        },
        EntityKind::Bomb {
            phase: BombPhase::Armed,
        } => Sprite {
            sheet: "bomb",
            facing: None,
            frame: frame(elapsed, BOMB_FPS, BOMB_FRAMES),
        },
        EntityKind::Bomb { .. } => Sprite::still("bomb_spent"),
        EntityKind::PowerUp(kind) => Sprite {
            sheet: match kind {
                PowerUpKind::BombCapacity => "power_up_bomb",
                PowerUpKind::BlastRadius => "power_up_blast",
                PowerUpKind::Speed => "power_up_speed",
                PowerUpKind::Arrow => "power_up_arrow",
            },
            facing: None,
            frame: frame(elapsed, 2.0, 2),
        },
        EntityKind::Arrow { direction } => Sprite {
            sheet: "arrow",
            facing: Some(direction),
            frame: 0,
        },
        EntityKind::Explosion(piece) => {
            let (sheet, facing) = match piece {
                ExplosionPiece::Center => ("explosion_center", None),
                ExplosionPiece::Middle { horizontal: true } => ("explosion_middle_h", None),
                ExplosionPiece::Middle { horizontal: false } => ("explosion_middle_v", None),
                ExplosionPiece::End(dir) => ("explosion_end", Some(dir)),
            };
            Sprite {
                sheet,
                facing,
                frame: frame(elapsed, EXPLOSION_FPS, EXPLOSION_FRAMES),
            }
        }
    }
}

/// Everything to draw, back to front
pub fn render_objects(state: &GameState) -> Vec<RenderObject> {
    let world = &state.world;
    let mut objects: Vec<(EntityKind, Vec2)> = Vec::new();

    for (tile, object) in state.grid.iter() {
        let kind = match object {
            GridObject::IndestructibleWall { .. } => EntityKind::IndestructibleWall,
            GridObject::DestructibleWall { .. } => EntityKind::DestructibleWall,
            GridObject::Entrance => EntityKind::Entrance,
            GridObject::Exit(exit) => EntityKind::Exit {
                active: exit.active,
            },
        };
        objects.push((kind, tile_center(tile)));
    }

    for power_up in state.power_ups.iter().filter(|p| !p.collected) {
        objects.push((EntityKind::PowerUp(power_up.kind), tile_center(power_up.tile)));
    }

    for bomb in &state.bombs {
        objects.push((
            EntityKind::Bomb { phase: bomb.phase },
            bomb.life.position(world),
        ));
    }

    for tile in &state.explosions {
        objects.push((EntityKind::Explosion(tile.piece), tile_center(tile.tile)));
    }

    for enemy in state.enemies.iter().filter(|e| e.is_alive()) {
        objects.push((
            EntityKind::Enemy {
                facing: enemy.facing,
                mode: enemy.ai.mode,
            },
            enemy.position(world),
        ));
    }

    for arrow in state.arrows.iter().filter(|a| !a.is_expired()) {
        objects.push((
            EntityKind::Arrow {
                direction: arrow.direction,
            },
            arrow.life.position(world),
        ));
    }

    if let Some(player) = &state.player {
        objects.push((
            EntityKind::Player {
                facing: player.facing,
                moving: player.is_moving(),
                alive: player.life.is_alive(),
            },
            player.position(world),
        ));
    }

    objects
        .into_iter()
        .map(|(kind, position)| RenderObject {
            kind,
            position,
            sprite: appearance_of(&kind, state.elapsed),
        })
        .collect()
}

impl GameState {
    pub fn render_objects(&self) -> Vec<RenderObject> {
        render_objects(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::TileCode;
    use crate::tuning::Tuning;

    #[test]
    fn test_walk_cycle_only_when_moving() {
        let idle = EntityKind::Player {
            facing: Direction::Left,
            moving: false,
            alive: true,
        };
        let walking = EntityKind::Player {
            facing: Direction::Left,
            moving: true,
            alive: true,
        };
        assert_eq!(appearance_of(&idle, 0.3).frame, 0);
        assert_eq!(appearance_of(&walking, 0.3).frame, 2);
        assert_eq!(appearance_of(&walking, 0.3).key(), "player_walk_left");
    }

    #[test]
    fn test_keys() {
        let end = EntityKind::Explosion(ExplosionPiece::End(Direction::Up));
        assert_eq!(appearance_of(&end, 0.0).key(), "explosion_end_up");
        let exit = EntityKind::Exit { active: true };
        assert_eq!(appearance_of(&exit, 5.0).key(), "exit_open");
        let spent = EntityKind::Bomb {
            phase: BombPhase::Exploded,
        };
        assert_eq!(appearance_of(&spent, 1.0).key(), "bomb_spent");
    }

    #[test]
    fn test_render_objects_lists_grid_and_actors() {
        let mut state = GameState::new(4, 4, Tuning::default(), 1);
        state.create_object(0, 0, TileCode::IndestructibleWall);
        state.create_object(1, 0, TileCode::DestructibleWall);
        state.create_object(2, 2, TileCode::Entrance);
        state.create_object(3, 3, TileCode::EnemySpawn);

        let objects = render_objects(&state);
        // wall, wall, entrance, enemy, player
        assert_eq!(objects.len(), 5);
        assert!(matches!(objects.last().unwrap().kind, EntityKind::Player { .. }));
        assert_eq!(objects[0].position, Vec2::new(0.5, 0.5));
        assert_eq!(objects[0].sprite.sheet, "wall_solid");
    }
}
