//! The occupancy map and its read-only walkability view.
//!
//! [`TileMap`] is the simulation-owned 2D array of [`Tile`] codes. The core
//! never writes to it: whoever moves units around (the simulation) marks and
//! clears [`Tile::Occupied`] entries. [`GridModel`] answers the bounds and
//! walkability questions pathfinding asks, under a chosen [`Occupancy`]
//! policy.

use std::fmt;

use thiserror::Error;

use crate::geom::{Point, Range};
use crate::unit::UnitId;

/// A single tile code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Tile {
    /// Open ground.
    #[default]
    Floor,
    /// Walkable but slow ground; cost depends on the mover class.
    Rough,
    /// Never walkable.
    Wall,
    /// Standing tile of a unit.
    Occupied(UnitId),
}

impl Tile {
    /// ASCII glyph used by [`TileMap::from_ascii`] and the `Display` impl.
    ///
    /// Units are drawn with the last digit of their id.
    pub fn glyph(self) -> char {
        match self {
            Tile::Floor => '.',
            Tile::Rough => '~',
            Tile::Wall => '#',
            Tile::Occupied(id) => char::from_digit(id.0 % 10, 10).unwrap_or('@'),
        }
    }

    fn from_glyph(ch: char) -> Option<Tile> {
        match ch {
            '.' => Some(Tile::Floor),
            '~' => Some(Tile::Rough),
            '#' => Some(Tile::Wall),
            d => d.to_digit(10).map(|n| Tile::Occupied(UnitId(n))),
        }
    }
}

/// Errors from building a [`TileMap`] out of ASCII rows.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("map has no rows")]
    Empty,

    #[error("row {row} has width {found}, expected {expected}")]
    Ragged {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("unknown tile glyph {glyph:?} at {at}")]
    UnknownGlyph { glyph: char, at: Point },
}

/// A rectangular grid of [`Tile`] codes, origin at (0, 0).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileMap {
    tiles: Vec<Tile>,
    width: i32,
    height: i32,
}

impl TileMap {
    /// Create a new map filled with [`Tile::Floor`].
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            tiles: vec![Tile::Floor; (width * height) as usize],
            width,
            height,
        }
    }

    /// Build a map from ASCII rows: `.` floor, `~` rough, `#` wall and a
    /// digit `n` for a tile occupied by `UnitId(n)`.
    pub fn from_ascii(rows: &[&str]) -> Result<Self, MapError> {
        let expected = rows.first().ok_or(MapError::Empty)?.chars().count();
        let mut tiles = Vec::with_capacity(expected * rows.len());
        for (y, row) in rows.iter().enumerate() {
            let found = row.chars().count();
            if found != expected {
                return Err(MapError::Ragged {
                    row: y,
                    found,
                    expected,
                });
            }
            for (x, glyph) in row.chars().enumerate() {
                let at = Point::new(x as i32, y as i32);
                let Some(tile) = Tile::from_glyph(glyph) else {
                    return Err(MapError::UnknownGlyph { glyph, at });
                };
                tiles.push(tile);
            }
        }
        Ok(Self {
            tiles,
            width: expected as i32,
            height: rows.len() as i32,
        })
    }

    /// The bounding range of the map.
    pub fn bounds(&self) -> Range {
        Range::new(0, 0, self.width, self.height)
    }

    /// Width in tiles.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Height in tiles.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Whether `p` lies inside the map.
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= 0 && p.x < self.width && p.y >= 0 && p.y < self.height
    }

    #[inline]
    fn index(&self, p: Point) -> usize {
        (p.y * self.width + p.x) as usize
    }

    /// Tile at `p`, or `None` when out of bounds.
    #[inline]
    pub fn at(&self, p: Point) -> Option<Tile> {
        if !self.contains(p) {
            return None;
        }
        Some(self.tiles[self.index(p)])
    }

    /// Set the tile at `p`. Does nothing if out of bounds.
    pub fn set(&mut self, p: Point, tile: Tile) {
        if self.contains(p) {
            let idx = self.index(p);
            self.tiles[idx] = tile;
        }
    }

    /// The unit standing on `p`, if any.
    pub fn occupant(&self, p: Point) -> Option<UnitId> {
        match self.at(p)? {
            Tile::Occupied(id) => Some(id),
            _ => None,
        }
    }

    /// Count tiles satisfying a predicate.
    pub fn count(&self, mut f: impl FnMut(Tile) -> bool) -> usize {
        self.tiles.iter().filter(|&&t| f(t)).count()
    }

    /// Iterate over `(Point, Tile)` pairs in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Point, Tile)> + '_ {
        self.bounds().iter().zip(self.tiles.iter().copied())
    }
}

impl fmt::Display for TileMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                let glyph = self.at(Point::new(x, y)).map_or(' ', Tile::glyph);
                write!(f, "{glyph}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GridModel
// ---------------------------------------------------------------------------

/// Whether units block each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Occupancy {
    /// A tile occupied by another unit is not walkable.
    #[default]
    Blocking,
    /// Units walk through each other; only walls block.
    Passable,
}

/// Read-only walkability view over a [`TileMap`].
///
/// Out-of-bounds coordinates are never walkable.
#[derive(Debug, Clone, Copy)]
pub struct GridModel<'a> {
    map: &'a TileMap,
    occupancy: Occupancy,
    unit: Option<UnitId>,
}

impl<'a> GridModel<'a> {
    /// A view over `map` under the given occupancy policy.
    pub fn new(map: &'a TileMap, occupancy: Occupancy) -> Self {
        Self {
            map,
            occupancy,
            unit: None,
        }
    }

    /// The same view, seen by `unit`: its own tile never blocks it.
    pub fn for_unit(self, unit: UnitId) -> Self {
        Self {
            unit: Some(unit),
            ..self
        }
    }

    /// The underlying map.
    pub fn map(&self) -> &'a TileMap {
        self.map
    }

    /// Whether `p` lies inside the map.
    #[inline]
    pub fn in_bounds(&self, p: Point) -> bool {
        self.map.contains(p)
    }

    /// Tile at `p`, or `None` when out of bounds.
    #[inline]
    pub fn tile(&self, p: Point) -> Option<Tile> {
        self.map.at(p)
    }

    /// Whether a unit may stand on `p`.
    pub fn is_walkable(&self, p: Point) -> bool {
        match self.map.at(p) {
            None | Some(Tile::Wall) => false,
            Some(Tile::Floor | Tile::Rough) => true,
            Some(Tile::Occupied(id)) => {
                self.occupancy == Occupancy::Passable || self.unit == Some(id)
            }
        }
    }
}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn tile_map_round_trip() {
        let m = TileMap::from_ascii(&[".#", "~4"]).unwrap();
        let json = serde_json::to_string(&m).unwrap();
        let back: TileMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
        assert_eq!(back.occupant(Point::new(1, 1)), Some(UnitId(4)));
    }
}
