//! Grid A* search
//!
//! 4-connected, every step costs 1, Manhattan heuristic. The heuristic is
//! admissible on this grid so returned paths are shortest paths. Among open
//! nodes with equal `f`, the one pushed first is expanded first.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use glam::IVec2;

use super::grid::Walkable;
use crate::manhattan;

const NEIGHBORS: [IVec2; 4] = [
    IVec2::new(1, 0),
    IVec2::new(-1, 0),
    IVec2::new(0, 1),
    IVec2::new(0, -1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    f: i32,
    seq: u64,
    tile: IVec2,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: lowest f first, then earliest push
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Shortest path from `start` to `goal`, both included.
///
/// Empty when either end is not walkable or no route exists.
pub fn find_path(grid: &impl Walkable, start: IVec2, goal: IVec2) -> Vec<IVec2> {
    if !grid.is_tile_walkable(start) || !grid.is_tile_walkable(goal) {
        return Vec::new();
    }

    let mut open = BinaryHeap::new();
    let mut seq = 0u64;
    let mut g_score: HashMap<IVec2, i32> = HashMap::new();
    let mut came_from: HashMap<IVec2, IVec2> = HashMap::new();
    let mut closed: HashSet<IVec2> = HashSet::new();

    g_score.insert(start, 0);
    open.push(OpenNode {
        f: manhattan(start, goal),
        seq,
        tile: start,
    });

    while let Some(OpenNode { tile: current, .. }) = open.pop() {
        if current == goal {
            return reconstruct(&came_from, start, goal);
        }
        if !closed.insert(current) {
            continue;
        }

        let current_g = g_score[&current];
        for offset in NEIGHBORS {
            let next = current + offset;
            if closed.contains(&next) || !grid.is_tile_walkable(next) {
                continue;
            }
            let tentative = current_g + 1;
            if g_score.get(&next).is_some_and(|&g| g <= tentative) {
                continue;
            }
            g_score.insert(next, tentative);
            came_from.insert(next, current);
            seq += 1;
            open.push(OpenNode {
                f: tentative + manhattan(next, goal),
                seq,
                tile: next,
            });
        }
    }

    Vec::new()
}

fn reconstruct(came_from: &HashMap<IVec2, IVec2>, start: IVec2, goal: IVec2) -> Vec<IVec2> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        current = came_from[&current];
        path.push(current);
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Open field with a set of blocked tiles
    struct TestGrid {
        size: IVec2,
        blocked: HashSet<IVec2>,
    }

    impl TestGrid {
        fn new(w: i32, h: i32, blocked: &[(i32, i32)]) -> Self {
            Self {
                size: IVec2::new(w, h),
                blocked: blocked.iter().map(|&(x, y)| IVec2::new(x, y)).collect(),
            }
        }
    }

    impl Walkable for TestGrid {
        fn is_tile_walkable(&self, tile: IVec2) -> bool {
            tile.x >= 0
                && tile.y >= 0
                && tile.x < self.size.x
                && tile.y < self.size.y
                && !self.blocked.contains(&tile)
        }
    }

    #[test]
    fn test_straight_corridor() {
        let grid = TestGrid::new(8, 1, &[]);
        let goal = IVec2::new(5, 0);
        let path = find_path(&grid, IVec2::ZERO, goal);

        assert_eq!(path.len(), 6);
        assert_eq!(path[0], IVec2::ZERO);
        assert_eq!(*path.last().unwrap(), goal);
        for pair in path.windows(2) {
            assert!(manhattan(pair[1], goal) < manhattan(pair[0], goal));
        }
    }

    #[test]
    fn test_start_equals_goal() {
        let grid = TestGrid::new(3, 3, &[]);
        assert_eq!(find_path(&grid, IVec2::ONE, IVec2::ONE), vec![IVec2::ONE]);
    }

    #[test]
    fn test_unwalkable_ends_give_empty_path() {
        let grid = TestGrid::new(5, 5, &[(0, 0), (4, 4)]);
        assert!(find_path(&grid, IVec2::ZERO, IVec2::new(2, 2)).is_empty());
        assert!(find_path(&grid, IVec2::new(2, 2), IVec2::new(4, 4)).is_empty());
        assert!(find_path(&grid, IVec2::new(2, 2), IVec2::new(9, 9)).is_empty());
    }

    #[test]
    fn test_enclosed_goal_gives_empty_path() {
        let grid = TestGrid::new(7, 7, &[(3, 2), (3, 4), (2, 3), (4, 3)]);
        assert!(find_path(&grid, IVec2::ZERO, IVec2::new(3, 3)).is_empty());
    }

    #[test]
    fn test_detour_is_shortest() {
        // Wall across x=2 except at y=4
        let grid = TestGrid::new(5, 5, &[(2, 0), (2, 1), (2, 2), (2, 3)]);
        let path = find_path(&grid, IVec2::new(0, 0), IVec2::new(4, 0));

        // 4 across + 4 down + 4 up
        assert_eq!(path.len(), 13);
        assert!(path.contains(&IVec2::new(2, 4)));
        for pair in path.windows(2) {
            assert_eq!(manhattan(pair[0], pair[1]), 1);
            assert!(grid.is_tile_walkable(pair[1]));
        }
    }
}
