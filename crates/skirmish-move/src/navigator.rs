//! Shared route service: one [`Pathfinder`] plus one [`PathCache`] for every
//! unit in a simulation.

use skirmish_core::{MoverClass, Point, Range, TileMap};
use skirmish_paths::{Path, PathCache, PathResult, Pathfinder};

use crate::config::NavConfig;

/// Where a route handed out by [`Navigator::find_path_cached`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteSource {
    /// Start and goal coincide; nothing was looked up.
    Trivial,
    /// Served from the cache.
    Cache,
    /// Computed by a fresh search and stored.
    Search,
}

/// A route together with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: Path,
    pub source: RouteSource,
}

/// Owns the search scratch space and the route cache.
///
/// The navigator is the single writer of the cache. Controllers borrow it
/// mutably for the duration of one `coordinate` call.
#[derive(Debug)]
pub struct Navigator {
    pathfinder: Pathfinder,
    cache: PathCache,
    config: NavConfig,
}

impl Navigator {
    pub fn new(bounds: Range, config: NavConfig) -> Self {
        Self {
            pathfinder: Pathfinder::new(bounds, config.search),
            cache: PathCache::new(config.cache_capacity),
            config,
        }
    }

    /// A navigator sized for `map`.
    pub fn for_map(map: &TileMap, config: NavConfig) -> Self {
        Self::new(map.bounds(), config)
    }

    #[inline]
    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    #[inline]
    pub fn pathfinder(&self) -> &Pathfinder {
        &self.pathfinder
    }

    #[inline]
    pub fn cache(&self) -> &PathCache {
        &self.cache
    }

    #[inline]
    pub fn cache_mut(&mut self) -> &mut PathCache {
        &mut self.cache
    }

    /// Drop cached routes that start on or pass through `tiles`.
    pub fn invalidate<I>(&mut self, tiles: I) -> usize
    where
        I: IntoIterator<Item = Point>,
    {
        self.cache.invalidate(tiles)
    }

    /// Route from `start` to `goal`, consulting the cache first.
    ///
    /// Fresh results are cached; failures never are.
    pub fn find_path_cached(
        &mut self,
        map: &TileMap,
        start: Point,
        goal: Point,
        class: MoverClass,
    ) -> PathResult<Route> {
        if start == goal && map.contains(start) {
            return Ok(Route {
                path: Path::empty(),
                source: RouteSource::Trivial,
            });
        }
        if let Some(path) = self.cache.get(start, goal, class) {
            return Ok(Route {
                path,
                source: RouteSource::Cache,
            });
        }
        let path = self.pathfinder.find_path(map, start, goal, class)?;
        self.cache.put(start, goal, class, path.clone());
        Ok(Route {
            path,
            source: RouteSource::Search,
        })
    }
}
