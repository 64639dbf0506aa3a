//! Game entities and their body lifecycle

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use super::ai::AiState;
use super::physics::{BodyDef, BodyHandle, BodyTag, PhysicsWorld};
use crate::tuning::Tuning;
use crate::{tile_center, tile_of};

/// Cardinal direction. Tile rows grow downward, so `Up` is -y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit tile offset
    pub fn offset(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::new(0, -1),
            Direction::Down => IVec2::new(0, 1),
            Direction::Left => IVec2::new(-1, 0),
            Direction::Right => IVec2::new(1, 0),
        }
    }

    pub fn to_vec2(self) -> Vec2 {
        self.offset().as_vec2()
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Direction of the dominant velocity axis (None when not moving)
    pub fn from_velocity(vel: Vec2) -> Option<Self> {
        if vel == Vec2::ZERO {
            None
        } else if vel.x.abs() > vel.y.abs() {
            Some(if vel.x > 0.0 { Direction::Right } else { Direction::Left })
        } else {
            Some(if vel.y > 0.0 { Direction::Down } else { Direction::Up })
        }
    }
}

/// Whether an entity still owns a physics body.
///
/// A destroyed entity can linger for its animation; it keeps the position it
/// had when its body was released.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lifecycle {
    Alive(BodyHandle),
    Destroyed { last_position: Vec2 },
}

impl Lifecycle {
    pub fn is_alive(&self) -> bool {
        matches!(self, Lifecycle::Alive(_))
    }

    pub fn body(&self) -> Option<BodyHandle> {
        match *self {
            Lifecycle::Alive(handle) => Some(handle),
            Lifecycle::Destroyed { .. } => None,
        }
    }

    /// Current position, or the last known one after destruction
    pub fn position(&self, world: &PhysicsWorld) -> Vec2 {
        match *self {
            Lifecycle::Alive(handle) => match world.position(handle) {
                Some(pos) => pos,
                None => {
                    debug_assert!(false, "live entity refers to a released body");
                    Vec2::ZERO
                }
            },
            Lifecycle::Destroyed { last_position } => last_position,
        }
    }

    /// Release the body. Only the first call has any effect.
    pub fn release(&mut self, world: &mut PhysicsWorld) -> bool {
        let Lifecycle::Alive(handle) = *self else {
            return false;
        };
        let last_position = world.position(handle).unwrap_or_default();
        world.remove(handle);
        *self = Lifecycle::Destroyed { last_position };
        true
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// One more bomb on the field at a time
    BombCapacity,
    /// Blast reaches one tile further
    BlastRadius,
    Speed,
    /// Grants arrows for `shoot_arrow`
    Arrow,
}

/// The player
#[derive(Debug, Clone)]
pub struct Player {
    pub life: Lifecycle,
    /// Movement input, length at most 1
    pub intent: Vec2,
    pub facing: Direction,
    pub speed_boosts: u32,
    pub bomb_capacity: u32,
    pub blast_radius: u32,
    pub arrows: u32,
}

impl Player {
    pub fn spawn(world: &mut PhysicsWorld, tile: IVec2, tuning: &Tuning) -> Self {
        let body = world.insert(BodyDef::dynamic(
            BodyTag::Player,
            tile_center(tile),
            tuning.actor_half_extent,
        ));
        Self {
            life: Lifecycle::Alive(body),
            intent: Vec2::ZERO,
            facing: Direction::Down,
            speed_boosts: 0,
            bomb_capacity: tuning.start_bomb_capacity,
            blast_radius: tuning.start_blast_radius,
            arrows: 0,
        }
    }

    /// Record the movement input; longer vectors are normalized.
    ///
    /// Facing follows any non-zero input right away so an arrow shot on the
    /// same frame flies the new way.
    pub fn update_direction(&mut self, vx: f32, vy: f32) {
        let intent = Vec2::new(vx, vy);
        self.intent = if intent.length_squared() > 1.0 {
            intent.normalize()
        } else {
            intent
        };
        if let Some(dir) = Direction::from_velocity(self.intent) {
            self.facing = dir;
        }
    }

    pub fn speed(&self, tuning: &Tuning) -> f32 {
        tuning.boosted_speed(self.speed_boosts)
    }

    pub fn is_moving(&self) -> bool {
        self.life.is_alive() && self.intent != Vec2::ZERO
    }

    /// Push the movement intent into the body for the next physics steps
    pub fn update(&mut self, world: &mut PhysicsWorld, tuning: &Tuning) {
        let Some(body) = self.life.body() else {
            return;
        };
        world.set_velocity(body, self.intent * self.speed(tuning));
    }

    pub fn position(&self, world: &PhysicsWorld) -> Vec2 {
        self.life.position(world)
    }

    pub fn tile(&self, world: &PhysicsWorld) -> IVec2 {
        tile_of(self.position(world))
    }

    pub fn apply_power_up(&mut self, kind: PowerUpKind, tuning: &Tuning) {
        match kind {
            PowerUpKind::BombCapacity => {
                self.bomb_capacity = (self.bomb_capacity + 1).min(tuning.max_bomb_capacity);
            }
            PowerUpKind::BlastRadius => {
                self.blast_radius = (self.blast_radius + 1).min(tuning.max_blast_radius);
            }
            PowerUpKind::Speed => self.speed_boosts += 1,
            PowerUpKind::Arrow => self.arrows += tuning.arrows_per_power_up,
        }
    }
}

/// Wandering or chasing enemy
#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: u32,
    pub life: Lifecycle,
    pub facing: Direction,
    pub ai: AiState,
}

impl Enemy {
    pub fn spawn(world: &mut PhysicsWorld, id: u32, tile: IVec2, tuning: &Tuning) -> Self {
        let body = world.insert(BodyDef::dynamic(
            BodyTag::Enemy(id),
            tile_center(tile),
            tuning.actor_half_extent,
        ));
        Self {
            id,
            life: Lifecycle::Alive(body),
            facing: Direction::Down,
            ai: AiState::default(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.life.is_alive()
    }

    pub fn position(&self, world: &PhysicsWorld) -> Vec2 {
        self.life.position(world)
    }

    pub fn tile(&self, world: &PhysicsWorld) -> IVec2 {
        tile_of(self.position(world))
    }
}

/// A revealed power-up waiting to be picked up
#[derive(Debug, Clone)]
pub struct PowerUp {
    pub id: u32,
    pub tile: IVec2,
    pub kind: PowerUpKind,
    pub life: Lifecycle,
    /// Picked up; removed in the next cleanup pass
    pub collected: bool,
}

impl PowerUp {
    const HALF_EXTENT: f32 = 0.3;

    pub fn spawn(world: &mut PhysicsWorld, id: u32, tile: IVec2, kind: PowerUpKind) -> Self {
        let body = world.insert(BodyDef::sensor(
            BodyTag::PowerUp(id),
            tile_center(tile),
            Self::HALF_EXTENT,
        ));
        Self {
            id,
            tile,
            kind,
            life: Lifecycle::Alive(body),
            collected: false,
        }
    }

    /// Mark as collected. Returns false if it was already taken.
    pub fn collect(&mut self, world: &mut PhysicsWorld) -> bool {
        if self.collected {
            return false;
        }
        self.collected = true;
        self.life.release(world);
        true
    }
}

/// Ranged projectile
#[derive(Debug, Clone)]
pub struct Arrow {
    pub id: u32,
    pub life: Lifecycle,
    pub direction: Direction,
    /// Seconds left before it expires
    pub ttl: f32,
    /// Hit something; removed in the next cleanup pass
    pub spent: bool,
}

impl Arrow {
    const HALF_EXTENT: f32 = 0.15;

    pub fn spawn(
        world: &mut PhysicsWorld,
        id: u32,
        position: Vec2,
        direction: Direction,
        tuning: &Tuning,
    ) -> Self {
        let body = world.insert(BodyDef::dynamic(BodyTag::Arrow(id), position, Self::HALF_EXTENT));
        world.set_velocity(body, direction.to_vec2() * tuning.arrow_speed);
        Self {
            id,
            life: Lifecycle::Alive(body),
            direction,
            ttl: tuning.arrow_lifetime,
            spent: false,
        }
    }

    /// Count down the lifetime and keep the velocity fixed
    pub fn update(&mut self, world: &mut PhysicsWorld, dt: f32, tuning: &Tuning) {
        self.ttl -= dt;
        if let Some(body) = self.life.body() {
            world.set_velocity(body, self.direction.to_vec2() * tuning.arrow_speed);
        }
    }

    pub fn spend(&mut self, world: &mut PhysicsWorld) {
        self.spent = true;
        self.life.release(world);
    }

    pub fn is_expired(&self) -> bool {
        self.spent || self.ttl <= 0.0
    }
}
