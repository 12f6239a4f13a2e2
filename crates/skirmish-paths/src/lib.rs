//! Grid pathfinding for tile-based unit movement.
//!
//! - **A\*** shortest-path search ([`Pathfinder::find_path`], or
//!   [`Pathfinder::astar`] with any [`AstarPather`])
//! - a cross-unit route cache with LRU eviction ([`PathCache`])
//!
//! [`Pathfinder`] owns and reuses its node arena so that repeated queries
//! incur no allocations beyond the returned [`Path`]. Ties between equally
//! promising nodes are broken in discovery order, so a search is fully
//! reproducible.
//!
//! # Trait hierarchy
//!
//! | Trait | Provides |
//! |---|---|
//! | [`Pather`] | neighbour enumeration |
//! | [`WeightedPather`] : [`Pather`] | step costs |
//! | [`AstarPather`] : [`WeightedPather`] | admissible heuristic |
//!
//! [`TilePather`] implements all three over a
//! [`TileMap`](skirmish_core::TileMap) for one
//! [`MoverClass`](skirmish_core::MoverClass).

mod cache;
mod distance;
mod error;
mod path;
mod pather;
mod pathfinder;

pub use cache::{CacheStats, DEFAULT_CACHE_CAPACITY, PathCache, PathKey};
pub use distance::{chebyshev, manhattan, octile};
pub use error::{PathError, PathResult};
pub use path::Path;
pub use pather::{
    AstarPather, DIAGONAL_COST, Pather, STEP_COST, SearchConfig, TilePather, WeightedPather,
};
pub use pathfinder::{Pathfinder, UNREACHABLE};
