//! Blast Grid - A tile-grid bomb arcade game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (grid, physics, AI, explosions, game state)
//! - `map`: Text map format and hidden exit/power-up seeding
//! - `tuning`: Data-driven game balance

pub mod map;
pub mod sim;
pub mod tuning;

pub use map::{MapError, MapTable, TileCode, parse_map};
pub use tuning::Tuning;

use glam::{IVec2, Vec2};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Largest frame delta accepted by a tick, prevents spiral of death
    pub const MAX_FRAME_TIME: f32 = 0.25;
    /// Maximum physics substeps per frame (MAX_FRAME_TIME / SIM_DT, rounded up)
    pub const MAX_SUBSTEPS: u32 = 16;

    /// Tile edge length in world units
    pub const TILE_SIZE: f32 = 1.0;
    /// Half extent of a wall body (walls fill their tile)
    pub const WALL_HALF_EXTENT: f32 = TILE_SIZE / 2.0;
}

/// Tile containing a world position (floors both axes)
#[inline]
pub fn tile_of(pos: Vec2) -> IVec2 {
    pos.floor().as_ivec2()
}

/// World position of a tile's center
#[inline]
pub fn tile_center(tile: IVec2) -> Vec2 {
    tile.as_vec2() + Vec2::splat(consts::TILE_SIZE / 2.0)
}

/// Manhattan distance between two tiles
#[inline]
pub fn manhattan(a: IVec2, b: IVec2) -> i32 {
    let d = (a - b).abs();
    d.x + d.y
}
