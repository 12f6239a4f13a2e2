//! **skirmish-core**: shared types for tile-grid unit movement.
//!
//! This crate provides the foundational types used across the *skirmish*
//! workspace: tile geometry, continuous positions, the occupancy map and its
//! walkability view, unit ids and mover classes.

pub mod geom;
pub mod grid;
pub mod unit;

pub use geom::{Point, Position, Range, RangeIter};
pub use grid::{GridModel, MapError, Occupancy, Tile, TileMap};
pub use unit::{MoverClass, UnitId};
