//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep physics only
//! - Seeded RNG only, owned by the level state
//! - Stable iteration order (tiles row-major, entities by id)
//! - No rendering or platform dependencies

pub mod ai;
pub mod appearance;
pub mod entity;
pub mod explosion;
pub mod grid;
pub mod pathfinding;
pub mod physics;
pub mod state;
pub mod tick;

pub use ai::{AiContext, AiMode, AiState, update_enemy};
pub use appearance::{EntityKind, RenderObject, Sprite, appearance_of, render_objects};
pub use entity::{Arrow, Direction, Enemy, Lifecycle, Player, PowerUp, PowerUpKind};
pub use explosion::{BlastCell, Bomb, BombPhase, ExplosionPiece, ExplosionTile, blast_cells};
pub use grid::{Concealed, Exit, Grid, GridObject, Walkable};
pub use pathfinding::find_path;
pub use physics::{BodyDef, BodyHandle, BodyKind, BodyTag, ContactEvent, PhysicsWorld};
pub use state::{GameEvent, GamePhase, GameState, LossCause};
pub use tick::{TickInput, tick};
