//! Map file parsing
//!
//! A map file is a list of `x,y=code` lines. Blank lines and `#` comments are
//! skipped. Parsing produces a [`MapTable`], a coordinate to [`TileCode`]
//! table that the simulation loads through `GameState::create_object`.

use std::collections::BTreeMap;
use std::path::Path;

use glam::IVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for map parsing operations.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("line {line}: expected `x,y=code`, found {content:?}")]
    MalformedLine { line: usize, content: String },
    #[error("line {line}: invalid coordinate {value:?}")]
    BadCoordinate { line: usize, value: String },
    #[error("line {line}: unknown tile code {code:?}")]
    UnknownCode { line: usize, code: String },
    #[error("failed to read map file: {0}")]
    Io(#[from] std::io::Error),
}

/// Tile type codes used by map files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TileCode {
    Empty = 0,
    IndestructibleWall = 1,
    DestructibleWall = 2,
    Entrance = 3,
    /// Destructible wall hiding the exit
    ExitWall = 4,
    /// Destructible wall hiding an extra-bomb power-up
    BombPowerUpWall = 5,
    /// Destructible wall hiding a blast-radius power-up
    BlastPowerUpWall = 6,
    /// Destructible wall hiding a speed power-up
    SpeedPowerUpWall = 7,
    /// Destructible wall hiding an arrow power-up
    ArrowPowerUpWall = 8,
    EnemySpawn = 9,
}

impl TileCode {
    pub const ALL: [TileCode; 10] = [
        TileCode::Empty,
        TileCode::IndestructibleWall,
        TileCode::DestructibleWall,
        TileCode::Entrance,
        TileCode::ExitWall,
        TileCode::BombPowerUpWall,
        TileCode::BlastPowerUpWall,
        TileCode::SpeedPowerUpWall,
        TileCode::ArrowPowerUpWall,
        TileCode::EnemySpawn,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Parsed map: tile coordinates to type codes, plus bounds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapTable {
    cells: BTreeMap<(i32, i32), TileCode>,
}

impl MapTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the code at a tile (later lines overwrite earlier ones)
    pub fn insert(&mut self, tile: IVec2, code: TileCode) {
        self.cells.insert((tile.x, tile.y), code);
    }

    pub fn get(&self, tile: IVec2) -> Option<TileCode> {
        self.cells.get(&(tile.x, tile.y)).copied()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells in row-major order (stable across runs)
    pub fn iter(&self) -> impl Iterator<Item = (IVec2, TileCode)> + '_ {
        let mut cells: Vec<_> = self
            .cells
            .iter()
            .map(|(&(x, y), &code)| (IVec2::new(x, y), code))
            .collect();
        cells.sort_by_key(|(tile, _)| (tile.y, tile.x));
        cells.into_iter()
    }

    /// Map width: one past the largest x coordinate
    pub fn width(&self) -> i32 {
        self.cells.keys().map(|&(x, _)| x + 1).max().unwrap_or(0)
    }

    /// Map height: one past the largest y coordinate
    pub fn height(&self) -> i32 {
        self.cells.keys().map(|&(_, y)| y + 1).max().unwrap_or(0)
    }

    pub fn count(&self, code: TileCode) -> usize {
        self.cells.values().filter(|&&c| c == code).count()
    }

    /// Hide the exit and speed power-ups under walls if the map declares none.
    ///
    /// With no `ExitWall` line, one plain destructible wall is picked to hold
    /// the exit. With no `SpeedPowerUpWall` line, up to `speed_power_ups` of the
    /// remaining plain walls get a speed power-up. The same RNG state always
    /// picks the same walls.
    pub fn seed_hidden_features(&mut self, rng: &mut impl Rng, speed_power_ups: usize) {
        if self.count(TileCode::ExitWall) == 0 {
            let walls = self.tiles_with(TileCode::DestructibleWall);
            if walls.is_empty() {
                log::warn!("Map has no destructible walls to hide the exit under");
            } else {
                let tile = walls[rng.random_range(0..walls.len())];
                log::debug!("Exit hidden at ({}, {})", tile.x, tile.y);
                self.insert(tile, TileCode::ExitWall);
            }
        }

        if self.count(TileCode::SpeedPowerUpWall) == 0 {
            let mut walls = self.tiles_with(TileCode::DestructibleWall);
            for _ in 0..speed_power_ups.min(walls.len()) {
                let tile = walls.swap_remove(rng.random_range(0..walls.len()));
                log::debug!("Speed power-up hidden at ({}, {})", tile.x, tile.y);
                self.insert(tile, TileCode::SpeedPowerUpWall);
            }
        }
    }

    fn tiles_with(&self, code: TileCode) -> Vec<IVec2> {
        self.iter()
            .filter(|&(_, c)| c == code)
            .map(|(tile, _)| tile)
            .collect()
    }
}

/// Parse map text into a table
pub fn parse_map(text: &str) -> Result<MapTable, MapError> {
    let mut table = MapTable::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let malformed = || MapError::MalformedLine {
            line,
            content: trimmed.to_string(),
        };
        let (coords, code) = trimmed.split_once('=').ok_or_else(malformed)?;
        let (x, y) = coords.split_once(',').ok_or_else(malformed)?;

        let x = parse_coordinate(x, line)?;
        let y = parse_coordinate(y, line)?;
        let code = code.trim();
        let tile_code = code
            .parse::<u8>()
            .ok()
            .and_then(TileCode::from_code)
            .ok_or_else(|| MapError::UnknownCode {
                line,
                code: code.to_string(),
            })?;

        table.insert(IVec2::new(x, y), tile_code);
    }

    Ok(table)
}

/// Read and parse a map file
pub fn load_map(path: impl AsRef<Path>) -> Result<MapTable, MapError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let table = parse_map(&text)?;
    log::info!(
        "Loaded map {} ({}x{}, {} cells)",
        path.display(),
        table.width(),
        table.height(),
        table.len()
    );
    Ok(table)
}

fn parse_coordinate(value: &str, line: usize) -> Result<i32, MapError> {
    value.trim().parse().map_err(|_| MapError::BadCoordinate {
        line,
        value: value.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let text = "# level 1\n\n0,0=1\n 1 , 0 = 2 \n# trailing\n2,0=3\n";
        let table = parse_map(text).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(IVec2::new(0, 0)), Some(TileCode::IndestructibleWall));
        assert_eq!(table.get(IVec2::new(1, 0)), Some(TileCode::DestructibleWall));
        assert_eq!(table.get(IVec2::new(2, 0)), Some(TileCode::Entrance));
        assert_eq!(table.width(), 3);
        assert_eq!(table.height(), 1);
    }

    #[test]
    fn test_later_lines_overwrite() {
        let table = parse_map("1,1=2\n1,1=0").unwrap();
        assert_eq!(table.get(IVec2::new(1, 1)), Some(TileCode::Empty));
    }

    #[test]
    fn test_parse_errors_carry_line_numbers() {
        assert!(matches!(
            parse_map("0,0=1\nnonsense"),
            Err(MapError::MalformedLine { line: 2, .. })
        ));
        assert!(matches!(
            parse_map("a,0=1"),
            Err(MapError::BadCoordinate { line: 1, .. })
        ));
        assert!(matches!(
            parse_map("0,0=42"),
            Err(MapError::UnknownCode { line: 1, .. })
        ));
    }

    #[test]
    fn test_tile_codes_roundtrip() {
        for code in TileCode::ALL {
            assert_eq!(TileCode::from_code(code.code()), Some(code));
        }
        assert_eq!(TileCode::from_code(10), None);
    }

    fn walls_only() -> MapTable {
        let mut table = MapTable::new();
        for x in 0..6 {
            table.insert(IVec2::new(x, 0), TileCode::DestructibleWall);
        }
        table
    }

    #[test]
    fn test_seeding_places_exit_and_speed_power_ups() {
        let mut table = walls_only();
        let mut rng = Pcg32::seed_from_u64(7);
        table.seed_hidden_features(&mut rng, 2);

        assert_eq!(table.count(TileCode::ExitWall), 1);
        assert_eq!(table.count(TileCode::SpeedPowerUpWall), 2);
        assert_eq!(table.count(TileCode::DestructibleWall), 3);
    }

    #[test]
    fn test_seeding_is_deterministic() {
        let mut a = walls_only();
        let mut b = walls_only();
        a.seed_hidden_features(&mut Pcg32::seed_from_u64(99), 2);
        b.seed_hidden_features(&mut Pcg32::seed_from_u64(99), 2);
        assert_eq!(a, b);
    }

    #[test]
    fn test_seeding_respects_declared_features() {
        let mut table = walls_only();
        table.insert(IVec2::new(0, 0), TileCode::ExitWall);
        table.insert(IVec2::new(1, 0), TileCode::SpeedPowerUpWall);
        let before = table.clone();
        table.seed_hidden_features(&mut Pcg32::seed_from_u64(1), 2);
        assert_eq!(table, before);
    }

    #[test]
    fn test_seeding_with_few_walls() {
        let mut table = MapTable::new();
        table.insert(IVec2::new(3, 3), TileCode::DestructibleWall);
        table.seed_hidden_features(&mut Pcg32::seed_from_u64(3), 5);
        assert_eq!(table.count(TileCode::ExitWall), 1);
        assert_eq!(table.count(TileCode::SpeedPowerUpWall), 0);
    }
}
