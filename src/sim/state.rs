//! Game state and core simulation types
//!
//! Everything one level needs lives in [`GameState`]: the grid, the physics
//! world, the live entity collections and the seeded RNG. Nothing here is
//! global, so two states built from the same map, tuning and seed and fed the
//! same inputs stay identical.

use glam::{IVec2, Vec2};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{Arrow, Enemy, Lifecycle, Player, PowerUp, PowerUpKind};
use super::explosion::{Bomb, ExplosionTile};
use super::grid::{Concealed, Exit, Grid, GridObject};
use super::physics::{BodyDef, BodyTag, PhysicsWorld};
use crate::consts::WALL_HALF_EXTENT;
use crate::map::{MapTable, TileCode};
use crate::tile_center;
use crate::tuning::Tuning;

/// Why the level was lost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossCause {
    Explosion,
    EnemyContact,
    TimeUp,
}

/// Current phase of the level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Player reached the active exit
    Won,
    Lost(LossCause),
}

impl GamePhase {
    pub fn is_over(&self) -> bool {
        !matches!(self, GamePhase::Playing)
    }
}

/// Things that happened during a tick, for the UI/audio layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    BombPlaced { tile: IVec2 },
    BombExploded { tile: IVec2 },
    WallDestroyed { tile: IVec2, points: u64 },
    PowerUpRevealed { tile: IVec2, kind: PowerUpKind },
    PowerUpCollected { kind: PowerUpKind, points: u64 },
    ExitRevealed { tile: IVec2 },
    ExitActivated,
    EnemyDefeated { id: u32, points: u64 },
    ArrowShot { id: u32 },
    PlayerKilled { cause: LossCause },
    TimeUp,
    LevelComplete,
}

/// Complete level state
#[derive(Debug, Clone)]
pub struct GameState {
    pub tuning: Tuning,
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub world: PhysicsWorld,
    pub grid: Grid,
    pub player: Option<Player>,
    /// Enemies (sorted by id, dead ones swept each tick)
    pub enemies: Vec<Enemy>,
    pub bombs: Vec<Bomb>,
    pub explosions: Vec<ExplosionTile>,
    pub arrows: Vec<Arrow>,
    pub power_ups: Vec<PowerUp>,
    pub score: u64,
    pub phase: GamePhase,
    /// Level countdown (seconds)
    pub time_remaining: f32,
    /// Total simulated time (seconds)
    pub elapsed: f32,
    /// Frame time not yet consumed by physics steps
    pub accumulator: f32,
    /// Latched once every enemy is gone
    pub exit_active: bool,
    /// Revealed exit tile
    pub exit: Option<IVec2>,
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Create an empty level of the given size
    pub fn new(width: i32, height: i32, tuning: Tuning, seed: u64) -> Self {
        // Maps need not be walled in; the world edge holds movers
        let mut world = PhysicsWorld::new();
        world.set_bounds(Vec2::ZERO, Vec2::new(width as f32, height as f32));
        Self {
            time_remaining: tuning.level_time,
            tuning,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            world,
            grid: Grid::new(width, height),
            player: None,
            enemies: Vec::new(),
            bombs: Vec::new(),
            explosions: Vec::new(),
            arrows: Vec::new(),
            power_ups: Vec::new(),
            score: 0,
            phase: GamePhase::Playing,
            elapsed: 0.0,
            accumulator: 0.0,
            exit_active: false,
            exit: None,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Build a level from a parsed map.
    ///
    /// The exit and speed power-ups are hidden first if the map declares none,
    /// using the state's seeded RNG.
    pub fn from_map(map: &MapTable, tuning: Tuning, seed: u64) -> Self {
        let mut state = Self::new(map.width(), map.height(), tuning, seed);
        let mut map = map.clone();
        map.seed_hidden_features(&mut state.rng, state.tuning.speed_power_ups);

        for (tile, code) in map.iter() {
            state.create_object(tile.x, tile.y, code);
        }
        if state.player.is_none() {
            log::warn!("Map has no entrance, player not spawned");
        }
        state.refresh_exit();

        log::info!(
            "Level loaded: {}x{}, {} enemies, seed {}",
            state.grid.width(),
            state.grid.height(),
            state.enemies.len(),
            seed
        );
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Place the object for `code` at a tile, replacing what was there
    pub fn create_object(&mut self, x: i32, y: i32, code: TileCode) {
        let tile = IVec2::new(x, y);
        if self.exit == Some(tile) {
            self.exit = None;
        }
        if let Some(mut previous) = self.grid.remove(tile) {
            if let Some(life) = previous.life_mut() {
                life.release(&mut self.world);
            }
        }

        match code {
            TileCode::Empty => {}
            TileCode::IndestructibleWall => {
                let life = self.wall_body(tile);
                self.grid
                    .insert(tile, GridObject::IndestructibleWall { life });
            }
            TileCode::DestructibleWall => self.insert_destructible(tile, None),
            TileCode::ExitWall => self.insert_destructible(tile, Some(Concealed::Exit)),
            TileCode::BombPowerUpWall => self.insert_destructible(
                tile,
                Some(Concealed::PowerUp(PowerUpKind::BombCapacity)),
            ),
            TileCode::BlastPowerUpWall => self.insert_destructible(
                tile,
                Some(Concealed::PowerUp(PowerUpKind::BlastRadius)),
            ),
            TileCode::SpeedPowerUpWall => {
                self.insert_destructible(tile, Some(Concealed::PowerUp(PowerUpKind::Speed)))
            }
            TileCode::ArrowPowerUpWall => {
                self.insert_destructible(tile, Some(Concealed::PowerUp(PowerUpKind::Arrow)))
            }
            TileCode::Entrance => {
                self.grid.insert(tile, GridObject::Entrance);
                if self.player.is_none() {
                    self.player = Some(Player::spawn(&mut self.world, tile, &self.tuning));
                }
            }
            TileCode::EnemySpawn => {
                let id = self.next_entity_id();
                self.enemies
                    .push(Enemy::spawn(&mut self.world, id, tile, &self.tuning));
            }
        }
    }

    fn wall_body(&mut self, tile: IVec2) -> Lifecycle {
        let body = self.world.insert(BodyDef::solid(
            BodyTag::Wall(tile),
            tile_center(tile),
            WALL_HALF_EXTENT,
        ));
        Lifecycle::Alive(body)
    }

    fn insert_destructible(&mut self, tile: IVec2, concealed: Option<Concealed>) {
        let life = self.wall_body(tile);
        self.grid
            .insert(tile, GridObject::DestructibleWall { life, concealed });
    }

    pub fn get_object_at(&self, x: i32, y: i32) -> Option<&GridObject> {
        self.grid.get_object_at(IVec2::new(x, y))
    }

    // === Commands ===

    /// Set the player's movement input
    pub fn update_direction(&mut self, vx: f32, vy: f32) {
        if let Some(player) = &mut self.player {
            player.update_direction(vx, vy);
        }
    }

    /// Add an already constructed bomb
    pub fn add_bomb(&mut self, bomb: Bomb) {
        let tile = bomb.tile(&self.world);
        self.events.push(GameEvent::BombPlaced { tile });
        self.bombs.push(bomb);
    }

    /// Drop a bomb on the player's tile.
    ///
    /// Fails when the player is dead, has as many armed bombs out as its
    /// capacity, or an armed bomb already sits on that tile.
    pub fn place_bomb(&mut self) -> bool {
        if self.phase.is_over() {
            return false;
        }
        let Some(player) = self.player.as_ref().filter(|p| p.life.is_alive()) else {
            return false;
        };
        let tile = player.tile(&self.world);
        let radius = player.blast_radius;
        let capacity = player.bomb_capacity;

        let armed: Vec<&Bomb> = self.bombs.iter().filter(|b| b.is_armed()).collect();
        if armed.len() as u32 >= capacity || armed.iter().any(|b| b.tile(&self.world) == tile) {
            return false;
        }

        let id = self.next_entity_id();
        let bomb = Bomb::new(&mut self.world, id, tile, radius, &self.tuning);
        self.add_bomb(bomb);
        true
    }

    /// Fire an arrow in the player's facing direction, if any are left
    pub fn shoot_arrow(&mut self) -> bool {
        if self.phase.is_over() {
            return false;
        }
        let Some(player) = self.player.as_mut().filter(|p| p.life.is_alive()) else {
            return false;
        };
        if player.arrows == 0 {
            return false;
        }
        player.arrows -= 1;
        let position = player.position(&self.world);
        let direction = player.facing;

        let id = self.next_entity_id();
        self.arrows.push(Arrow::spawn(
            &mut self.world,
            id,
            position,
            direction,
            &self.tuning,
        ));
        self.events.push(GameEvent::ArrowShot { id });
        true
    }

    // === Outcomes ===

    /// Kill the player and end the level
    pub fn kill_player(&mut self, cause: LossCause) {
        let Some(player) = &mut self.player else {
            return;
        };
        if !player.life.release(&mut self.world) {
            return;
        }
        log::info!("Player killed: {cause:?}");
        self.events.push(GameEvent::PlayerKilled { cause });
        self.lose(cause);
    }

    pub(crate) fn lose(&mut self, cause: LossCause) {
        if self.phase == GamePhase::Playing {
            self.phase = GamePhase::Lost(cause);
        }
    }

    /// Destroy an enemy. Returns false if it was already dead.
    pub fn defeat_enemy(&mut self, id: u32) -> bool {
        let Some(enemy) = self.enemies.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        if !enemy.life.release(&mut self.world) {
            return false;
        }
        let points = self.tuning.score.enemy_defeated;
        self.score += points;
        self.events.push(GameEvent::EnemyDefeated { id, points });
        log::debug!("Enemy {id} defeated, {} left", self.remaining_enemies());
        self.refresh_exit();
        true
    }

    /// Activate the exit once no enemy is left
    pub(crate) fn refresh_exit(&mut self) {
        if self.exit_active || self.remaining_enemies() > 0 {
            return;
        }
        self.exit_active = true;
        if let Some(exit) = self.exit_mut() {
            exit.active = true;
        }
        log::info!("All enemies cleared, exit active");
        self.events.push(GameEvent::ExitActivated);
    }

    /// Pick up a power-up by id
    pub fn collect_power_up(&mut self, id: u32) -> bool {
        if self.phase.is_over() || !self.player.as_ref().is_some_and(|p| p.life.is_alive()) {
            return false;
        }
        let Some(power_up) = self.power_ups.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        if !power_up.collect(&mut self.world) {
            return false;
        }
        let kind = power_up.kind;
        if let Some(player) = &mut self.player {
            player.apply_power_up(kind, &self.tuning);
        }
        let points = self.tuning.score.power_up_collected;
        self.score += points;
        self.events.push(GameEvent::PowerUpCollected { kind, points });
        true
    }

    fn exit_mut(&mut self) -> Option<&mut Exit> {
        let tile = self.exit_tile()?;
        match self.grid.get_object_at_mut(tile) {
            Some(GridObject::Exit(exit)) => Some(exit),
            _ => None,
        }
    }

    // === Queries ===

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn time_remaining(&self) -> f32 {
        self.time_remaining
    }

    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    /// Live player position
    pub fn player_position(&self) -> Option<Vec2> {
        self.player
            .as_ref()
            .filter(|p| p.life.is_alive())
            .map(|p| p.position(&self.world))
    }

    pub fn blast_radius(&self) -> u32 {
        self.player
            .as_ref()
            .map_or(self.tuning.start_blast_radius, |p| p.blast_radius)
    }

    pub fn bomb_capacity(&self) -> u32 {
        self.player
            .as_ref()
            .map_or(self.tuning.start_bomb_capacity, |p| p.bomb_capacity)
    }

    pub fn remaining_enemies(&self) -> usize {
        self.enemies.iter().filter(|e| e.is_alive()).count()
    }

    pub fn exit_active(&self) -> bool {
        self.exit_active
    }

    /// Tile of the revealed exit
    pub fn exit_tile(&self) -> Option<IVec2> {
        self.exit
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn bombs(&self) -> &[Bomb] {
        &self.bombs
    }

    pub fn explosion_tiles(&self) -> &[ExplosionTile] {
        &self.explosions
    }

    pub fn arrows(&self) -> &[Arrow] {
        &self.arrows
    }

    pub fn power_ups(&self) -> &[PowerUp] {
        &self.power_ups
    }

    /// Take the events raised since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
