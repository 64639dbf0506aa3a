//! Enemy behaviour
//!
//! Enemies wander in a random cardinal direction until the player comes within
//! the chase radius and a path exists, then they follow the path. The path is
//! cached and only recomputed when the enemy or the player changes tile.

use glam::{IVec2, Vec2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::{Direction, Enemy};
use super::grid::Walkable;
use super::pathfinding::find_path;
use super::physics::PhysicsWorld;
use crate::tuning::Tuning;
use crate::{tile_center, tile_of};

/// Current behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AiMode {
    #[default]
    Wander,
    Chase,
}

#[derive(Debug, Clone)]
struct CachedPath {
    from: IVec2,
    to: IVec2,
    path: Vec<IVec2>,
}

/// Per-enemy decision state
#[derive(Debug, Clone, Default)]
pub struct AiState {
    pub mode: AiMode,
    pub wander_direction: Direction,
    /// Seconds before the wander direction is rolled again
    pub wander_timer: f32,
    /// Roll a new wander direction on the next decision
    pub reroll: bool,
    cached: Option<CachedPath>,
}

/// World information an enemy decides from
pub struct AiContext<'a, G: Walkable> {
    pub grid: &'a G,
    /// Player position, None when there is no live player
    pub player: Option<Vec2>,
    pub tuning: &'a Tuning,
    pub dt: f32,
}

impl AiState {
    /// Pick this tick's velocity for an enemy at `position`
    pub fn decide<G: Walkable>(
        &mut self,
        position: Vec2,
        ctx: &AiContext<'_, G>,
        rng: &mut impl Rng,
    ) -> Vec2 {
        let Some(player) = ctx.player else {
            return Vec2::ZERO;
        };
        let speed = ctx.tuning.enemy_speed;

        if position.distance(player) <= ctx.tuning.chase_radius {
            let waypoint = self
                .path_to(ctx.grid, tile_of(position), tile_of(player))
                .get(1)
                .copied();
            if let Some(next) = waypoint {
                if self.mode != AiMode::Chase {
                    log::debug!("Enemy at {position} starts chasing");
                }
                self.mode = AiMode::Chase;
                return (tile_center(next) - position).normalize_or_zero() * speed;
            }
        }

        if self.mode == AiMode::Chase || self.reroll || self.wander_timer <= 0.0 {
            self.wander_direction = Direction::ALL[rng.random_range(0..Direction::ALL.len())];
            self.wander_timer = ctx.tuning.wander_duration;
            self.reroll = false;
        }
        self.mode = AiMode::Wander;
        self.wander_timer -= ctx.dt;
        self.wander_direction.to_vec2() * speed
    }

    /// Path from `from` to `to`, reusing the last search when both ends match
    fn path_to<G: Walkable>(&mut self, grid: &G, from: IVec2, to: IVec2) -> &[IVec2] {
        let stale = !matches!(&self.cached, Some(c) if c.from == from && c.to == to);
        if stale {
            self.cached = Some(CachedPath {
                from,
                to,
                path: find_path(grid, from, to),
            });
        }
        self.cached.as_ref().map(|c| c.path.as_slice()).unwrap_or(&[])
    }
}

/// Run one decision for an enemy and hand the velocity to its body
pub fn update_enemy<G: Walkable>(
    enemy: &mut Enemy,
    world: &mut PhysicsWorld,
    ctx: &AiContext<'_, G>,
    rng: &mut impl Rng,
) {
    let Some(body) = enemy.life.body() else {
        return;
    };
    let position = enemy.position(world);
    let velocity = enemy.ai.decide(position, ctx, rng);
    world.set_velocity(body, velocity);
    if let Some(dir) = Direction::from_velocity(velocity) {
        enemy.facing = dir;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::Grid;
    use crate::sim::physics::PhysicsWorld;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn ctx<'a>(grid: &'a Grid, player: Option<Vec2>, tuning: &'a Tuning) -> AiContext<'a, Grid> {
        AiContext {
            grid,
            player,
            tuning,
            dt: crate::consts::SIM_DT,
        }
    }

    #[test]
    fn test_no_player_means_idle() {
        let grid = Grid::new(10, 10);
        let tuning = Tuning::default();
        let mut ai = AiState::default();
        let vel = ai.decide(Vec2::new(0.5, 0.5), &ctx(&grid, None, &tuning), &mut Pcg32::seed_from_u64(1));
        assert_eq!(vel, Vec2::ZERO);
    }

    #[test]
    fn test_chases_toward_second_waypoint() {
        let grid = Grid::new(10, 1);
        let tuning = Tuning::default();
        let mut ai = AiState::default();
        let player = tile_center(IVec2::new(5, 0));

        let vel = ai.decide(
            tile_center(IVec2::ZERO),
            &ctx(&grid, Some(player), &tuning),
            &mut Pcg32::seed_from_u64(1),
        );
        assert_eq!(ai.mode, AiMode::Chase);
        assert!((vel - Vec2::new(tuning.enemy_speed, 0.0)).length() < 1e-5);
        assert_eq!(ai.cached.as_ref().unwrap().path.len(), 6);
    }

    #[test]
    fn test_wanders_outside_chase_radius() {
        let grid = Grid::new(20, 1);
        let tuning = Tuning::default();
        let mut ai = AiState::default();
        let mut rng = Pcg32::seed_from_u64(5);
        let player = tile_center(IVec2::new(15, 0));

        let vel = ai.decide(tile_center(IVec2::ZERO), &ctx(&grid, Some(player), &tuning), &mut rng);
        assert_eq!(ai.mode, AiMode::Wander);
        assert!((vel.length() - tuning.enemy_speed).abs() < 1e-5);
        assert_eq!(Direction::from_velocity(vel), Some(ai.wander_direction));
    }

    #[test]
    fn test_wander_direction_held_for_duration() {
        let grid = Grid::new(20, 20);
        let tuning = Tuning::default();
        let mut ai = AiState::default();
        let mut rng = Pcg32::seed_from_u64(11);
        let context = ctx(&grid, Some(Vec2::new(19.5, 19.5)), &tuning);

        ai.decide(Vec2::new(0.5, 0.5), &context, &mut rng);
        let held = ai.wander_direction;
        let steps = (tuning.wander_duration / context.dt) as usize - 2;
        for _ in 0..steps {
            ai.decide(Vec2::new(0.5, 0.5), &context, &mut rng);
            assert_eq!(ai.wander_direction, held);
        }
        assert!(ai.wander_timer > 0.0);
    }

    #[test]
    fn test_unreachable_player_falls_back_to_wander() {
        let mut grid = Grid::new(5, 5);
        let player_tile = IVec2::new(2, 2);
        for offset in [IVec2::X, IVec2::NEG_X, IVec2::Y, IVec2::NEG_Y] {
            grid.insert(
                player_tile + offset,
                crate::sim::grid::GridObject::IndestructibleWall {
                    life: crate::sim::entity::Lifecycle::Destroyed {
                        last_position: Vec2::ZERO,
                    },
                },
            );
        }
        let tuning = Tuning::default();
        let mut ai = AiState::default();
        ai.decide(
            tile_center(IVec2::ZERO),
            &ctx(&grid, Some(tile_center(player_tile)), &tuning),
            &mut Pcg32::seed_from_u64(2),
        );
        assert_eq!(ai.mode, AiMode::Wander);
    }

    #[test]
    fn test_update_enemy_sets_velocity_and_facing() {
        let mut world = PhysicsWorld::new();
        let grid = Grid::new(10, 10);
        let tuning = Tuning::default();
        let mut enemy = Enemy::spawn(&mut world, 1, IVec2::new(3, 3), &tuning);
        let player = tile_center(IVec2::new(3, 6));

        update_enemy(
            &mut enemy,
            &mut world,
            &ctx(&grid, Some(player), &tuning),
            &mut Pcg32::seed_from_u64(3),
        );

        assert_eq!(enemy.facing, Direction::Down);
        let body = enemy.life.body().unwrap();
        assert!(world.velocity(body).unwrap().y > 0.0);
    }
}
