//! Static tile map
//!
//! Holds walls, the entrance and the exit keyed by integer tile coordinate.
//! A tile with no entry is open floor.

use std::collections::HashMap;

use glam::IVec2;

use super::entity::{Lifecycle, PowerUpKind};

/// What a destructible wall hides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Concealed {
    Exit,
    PowerUp(PowerUpKind),
}

/// The level exit, revealed from under a wall
#[derive(Debug, Clone)]
pub struct Exit {
    pub tile: IVec2,
    /// Sensor body
    pub life: Lifecycle,
    /// Usable once every enemy is gone
    pub active: bool,
}

/// Object stored in a grid cell
#[derive(Debug, Clone)]
pub enum GridObject {
    IndestructibleWall {
        life: Lifecycle,
    },
    DestructibleWall {
        life: Lifecycle,
        concealed: Option<Concealed>,
    },
    Entrance,
    Exit(Exit),
}

impl GridObject {
    pub fn is_wall(&self) -> bool {
        matches!(
            self,
            GridObject::IndestructibleWall { .. } | GridObject::DestructibleWall { .. }
        )
    }

    /// Body owned by this object, if any
    pub fn life(&self) -> Option<&Lifecycle> {
        match self {
            GridObject::IndestructibleWall { life }
            | GridObject::DestructibleWall { life, .. }
            | GridObject::Exit(Exit { life, .. }) => Some(life),
            GridObject::Entrance => None,
        }
    }

    pub fn life_mut(&mut self) -> Option<&mut Lifecycle> {
        match self {
            GridObject::IndestructibleWall { life }
            | GridObject::DestructibleWall { life, .. }
            | GridObject::Exit(Exit { life, .. }) => Some(life),
            GridObject::Entrance => None,
        }
    }
}

/// Tile walkability, as seen by pathfinding
pub trait Walkable {
    fn is_tile_walkable(&self, tile: IVec2) -> bool;
}

/// The tile map
#[derive(Debug, Clone, Default)]
pub struct Grid {
    objects: HashMap<IVec2, GridObject>,
    width: i32,
    height: i32,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            objects: HashMap::new(),
            width,
            height,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, tile: IVec2) -> bool {
        tile.x >= 0 && tile.y >= 0 && tile.x < self.width && tile.y < self.height
    }

    /// Put an object at a tile, returning whatever was there
    pub fn insert(&mut self, tile: IVec2, object: GridObject) -> Option<GridObject> {
        self.objects.insert(tile, object)
    }

    pub fn remove(&mut self, tile: IVec2) -> Option<GridObject> {
        self.objects.remove(&tile)
    }

    pub fn get_object_at(&self, tile: IVec2) -> Option<&GridObject> {
        self.objects.get(&tile)
    }

    pub fn get_object_at_mut(&mut self, tile: IVec2) -> Option<&mut GridObject> {
        self.objects.get_mut(&tile)
    }

    /// Indestructible walls stop explosions
    pub fn blocks_blast(&self, tile: IVec2) -> bool {
        matches!(
            self.objects.get(&tile),
            Some(GridObject::IndestructibleWall { .. })
        )
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Occupied cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (IVec2, &GridObject)> {
        let mut cells: Vec<_> = self.objects.iter().map(|(&tile, obj)| (tile, obj)).collect();
        cells.sort_by_key(|(tile, _)| (tile.y, tile.x));
        cells.into_iter()
    }
}

impl Walkable for Grid {
    fn is_tile_walkable(&self, tile: IVec2) -> bool {
        self.in_bounds(tile)
            && !self
                .objects
                .get(&tile)
                .is_some_and(GridObject::is_wall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::{BodyDef, BodyTag, PhysicsWorld};
    use glam::Vec2;

    fn dead() -> Lifecycle {
        Lifecycle::Destroyed {
            last_position: Vec2::ZERO,
        }
    }

    #[test]
    fn test_walkability() {
        let mut grid = Grid::new(4, 4);
        grid.insert(IVec2::new(1, 0), GridObject::IndestructibleWall { life: dead() });
        grid.insert(
            IVec2::new(2, 0),
            GridObject::DestructibleWall {
                life: dead(),
                concealed: Some(Concealed::Exit),
            },
        );
        grid.insert(IVec2::new(3, 0), GridObject::Entrance);
        grid.insert(
            IVec2::new(0, 1),
            GridObject::Exit(Exit {
                tile: IVec2::new(0, 1),
                life: dead(),
                active: false,
            }),
        );

        assert!(!grid.is_tile_walkable(IVec2::new(1, 0)));
        assert!(!grid.is_tile_walkable(IVec2::new(2, 0)));
        assert!(grid.is_tile_walkable(IVec2::new(3, 0)));
        assert!(grid.is_tile_walkable(IVec2::new(0, 1)));
        assert!(grid.is_tile_walkable(IVec2::new(3, 3)));
        assert!(!grid.is_tile_walkable(IVec2::new(-1, 0)));
        assert!(!grid.is_tile_walkable(IVec2::new(0, 4)));
    }

    #[test]
    fn test_insert_overwrites_and_returns_previous() {
        let mut world = PhysicsWorld::new();
        let tile = IVec2::new(2, 2);
        let body = world.insert(BodyDef::solid(BodyTag::Wall(tile), crate::tile_center(tile), 0.5));
        let mut grid = Grid::new(5, 5);
        grid.insert(tile, GridObject::IndestructibleWall { life: Lifecycle::Alive(body) });

        let previous = grid.insert(tile, GridObject::Entrance);
        assert!(matches!(previous, Some(GridObject::IndestructibleWall { .. })));
        assert!(matches!(grid.get_object_at(tile), Some(GridObject::Entrance)));
        assert!(!grid.blocks_blast(tile));
    }

    #[test]
    fn test_iter_is_row_major() {
        let mut grid = Grid::new(3, 3);
        grid.insert(IVec2::new(2, 1), GridObject::Entrance);
        grid.insert(IVec2::new(0, 2), GridObject::Entrance);
        grid.insert(IVec2::new(1, 0), GridObject::Entrance);
        let order: Vec<_> = grid.iter().map(|(tile, _)| tile).collect();
        assert_eq!(
            order,
            vec![IVec2::new(1, 0), IVec2::new(2, 1), IVec2::new(0, 2)]
        );
    }
}
