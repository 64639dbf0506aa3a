//! Game balance values
//!
//! Loaded from JSON so levels can be rebalanced without recompiling. Every field
//! has a default, so a tuning file only needs the values it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to load a tuning file
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid tuning JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Points awarded per scoring event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreTable {
    pub wall_destroyed: u64,
    pub enemy_defeated: u64,
    pub power_up_collected: u64,
}

impl Default for ScoreTable {
    fn default() -> Self {
        Self {
            wall_destroyed: 10,
            enemy_defeated: 100,
            power_up_collected: 50,
        }
    }
}

/// Data-driven game balance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Bombs ===
    /// Seconds from placement to explosion
    pub bomb_fuse: f32,
    /// Seconds the exploded bomb stays around for its animation
    pub bomb_visual_lifetime: f32,
    /// Lifetime of each explosion tile (seconds)
    pub explosion_tile_lifetime: f32,
    /// Explosions detonate armed bombs they reach
    pub chain_reaction: bool,

    // === Player ===
    /// Movement speed (tiles/second)
    pub player_speed: f32,
    /// Speed added per speed power-up
    pub speed_boost: f32,
    /// Upper bound on player speed
    pub max_player_speed: f32,
    pub start_bomb_capacity: u32,
    pub max_bomb_capacity: u32,
    pub start_blast_radius: u32,
    pub max_blast_radius: u32,
    /// Arrows granted per arrow power-up
    pub arrows_per_power_up: u32,
    /// Half extent of the player/enemy box (tiles)
    pub actor_half_extent: f32,

    // === Arrows ===
    pub arrow_speed: f32,
    /// Seconds before an arrow expires
    pub arrow_lifetime: f32,

    // === Enemies ===
    /// Movement speed (tiles/second)
    pub enemy_speed: f32,
    /// Euclidean distance (tiles) under which enemies pursue the player
    pub chase_radius: f32,
    /// Seconds a wandering enemy keeps its direction
    pub wander_duration: f32,
    /// Touching an enemy kills the player
    pub enemy_contact_kills: bool,

    // === Level ===
    /// Countdown before the level is lost (seconds)
    pub level_time: f32,
    /// Speed power-ups seeded under walls when a map declares none
    pub speed_power_ups: usize,

    pub score: ScoreTable,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            bomb_fuse: 3.0,
            bomb_visual_lifetime: 0.4,
            explosion_tile_lifetime: 0.4,
            chain_reaction: true,

            player_speed: 3.0,
            speed_boost: 0.75,
            max_player_speed: 6.0,
            start_bomb_capacity: 1,
            max_bomb_capacity: 8,
            start_blast_radius: 1,
            max_blast_radius: 8,
            arrows_per_power_up: 3,
            actor_half_extent: 0.4,

            arrow_speed: 8.0,
            arrow_lifetime: 1.5,

            enemy_speed: 2.0,
            chase_radius: 6.0,
            wander_duration: 2.0,
            enemy_contact_kills: true,

            level_time: 200.0,
            speed_power_ups: 2,

            score: ScoreTable::default(),
        }
    }
}

impl Tuning {
    /// Parse tuning from a JSON string (missing fields keep their defaults)
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Player speed after `boosts` speed power-ups (clamped)
    pub fn boosted_speed(&self, boosts: u32) -> f32 {
        (self.player_speed + self.speed_boost * boosts as f32).min(self.max_player_speed)
    }
}
