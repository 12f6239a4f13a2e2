//! Search traits and the tile-map pather used for unit movement.

use skirmish_core::{GridModel, MoverClass, Occupancy, Point, Tile, TileMap};

use crate::distance::{manhattan, octile};

/// Cost of one orthogonal step on floor.
pub const STEP_COST: i32 = 10;
/// Cost of one diagonal step on floor (≈ 10·√2).
pub const DIAGONAL_COST: i32 = 14;

/// Minimal search interface: neighbour enumeration.
pub trait Pather {
    /// Append the tiles reachable in one step from `p` into `buf`, in a
    /// stable order. The caller clears `buf` before calling.
    fn neighbors(&self, p: Point, buf: &mut Vec<Point>);
}

/// Pather with weighted (positive-cost) steps.
pub trait WeightedPather: Pather {
    /// Cost of stepping from `from` to adjacent `to`. Must be > 0.
    fn cost(&self, from: Point, to: Point) -> i32;
}

/// Pather with an admissible heuristic, usable by A*.
pub trait AstarPather: WeightedPather {
    /// Estimated cost from `from` to `to`. Must never overestimate.
    fn estimate(&self, from: Point, to: Point) -> i32;
}

/// Search settings shared by every query of a [`Pathfinder`](crate::Pathfinder).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchConfig {
    /// 8-way adjacency when `true`, 4-way otherwise.
    pub diagonal: bool,
    /// Keep the list of expanded tiles after each search.
    pub record_explored: bool,
    /// Whether other units block the search.
    pub occupancy: Occupancy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            diagonal: true,
            record_explored: false,
            occupancy: Occupancy::Blocking,
        }
    }
}

impl SearchConfig {
    #[inline]
    pub const fn with_diagonal(mut self, diagonal: bool) -> Self {
        self.diagonal = diagonal;
        self
    }

    #[inline]
    pub const fn with_record_explored(mut self, record: bool) -> Self {
        self.record_explored = record;
        self
    }

    #[inline]
    pub const fn with_occupancy(mut self, occupancy: Occupancy) -> Self {
        self.occupancy = occupancy;
        self
    }
}

/// [`AstarPather`] over a [`TileMap`] for one mover class.
///
/// A diagonal step is only offered when neither orthogonal tile it squeezes
/// between is a wall.
#[derive(Debug, Clone, Copy)]
pub struct TilePather<'a> {
    grid: GridModel<'a>,
    class: MoverClass,
    diagonal: bool,
}

impl<'a> TilePather<'a> {
    pub fn new(map: &'a TileMap, class: MoverClass, config: SearchConfig) -> Self {
        Self {
            grid: GridModel::new(map, config.occupancy),
            class,
            diagonal: config.diagonal,
        }
    }

    /// Whether the mover may stand on `p`.
    pub fn passable(&self, p: Point) -> bool {
        self.grid.is_walkable(p)
            && self
                .grid
                .tile(p)
                .is_some_and(|t| self.class.terrain_cost(t).is_some())
    }

    fn open(&self, p: Point) -> bool {
        matches!(self.grid.tile(p), Some(t) if t != Tile::Wall)
    }
}

impl Pather for TilePather<'_> {
    fn neighbors(&self, p: Point, buf: &mut Vec<Point>) {
        if self.diagonal {
            for n in p.neighbors_8() {
                let d = n - p;
                let corner = d.x != 0 && d.y != 0;
                if corner && !(self.open(p.shift(d.x, 0)) && self.open(p.shift(0, d.y))) {
                    continue;
                }
                if self.passable(n) {
                    buf.push(n);
                }
            }
        } else {
            buf.extend(p.neighbors_4().into_iter().filter(|&n| self.passable(n)));
        }
    }
}

impl WeightedPather for TilePather<'_> {
    fn cost(&self, from: Point, to: Point) -> i32 {
        let base = if from.x != to.x && from.y != to.y {
            DIAGONAL_COST
        } else {
            STEP_COST
        };
        let pct = self
            .grid
            .tile(to)
            .and_then(|t| self.class.terrain_cost(t))
            .unwrap_or(100);
        base * pct / 100
    }
}

impl AstarPather for TilePather<'_> {
    fn estimate(&self, from: Point, to: Point) -> i32 {
        if self.diagonal {
            octile(from, to)
        } else {
            manhattan(from, to) * STEP_COST
        }
    }
}
