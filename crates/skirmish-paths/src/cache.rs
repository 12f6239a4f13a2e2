//! Cross-unit route cache with least-recently-used eviction.
//!
//! The cache knows nothing about the map. Whoever changes walkability (a
//! wall destroyed, a blocking unit dying or moving) must call
//! [`PathCache::invalidate`] with the changed tiles, otherwise stale routes
//! keep being served.

use std::collections::{BTreeMap, HashMap, HashSet};

use skirmish_core::{MoverClass, Point};

use crate::path::Path;

/// Capacity used by [`PathCache::default`].
pub const DEFAULT_CACHE_CAPACITY: usize = 512;

/// Cache key: one route request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathKey {
    pub start: Point,
    pub goal: Point,
    pub class: MoverClass,
}

impl PathKey {
    pub const fn new(start: Point, goal: Point, class: MoverClass) -> Self {
        Self { start, goal, class }
    }
}

/// Running counters, for debug overlays and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub invalidated: u64,
}

#[derive(Debug)]
struct Entry {
    path: Path,
    created: u64,
    last_used: u64,
}

/// Bounded map from [`PathKey`] to [`Path`].
///
/// Stamps come from an internal clock that advances on every `get` hit and
/// `put`; `recency` orders keys by their last-use stamp so the oldest one is
/// evicted first.
#[derive(Debug)]
pub struct PathCache {
    capacity: usize,
    entries: HashMap<PathKey, Entry>,
    recency: BTreeMap<u64, PathKey>,
    clock: u64,
    stats: CacheStats,
}

impl Default for PathCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl PathCache {
    /// Create a cache holding at most `capacity` routes. A capacity of zero
    /// disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity.min(DEFAULT_CACHE_CAPACITY)),
            recency: BTreeMap::new(),
            clock: 0,
            stats: CacheStats::default(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Cached route for the request, marking it most recently used.
    pub fn get(&mut self, start: Point, goal: Point, class: MoverClass) -> Option<Path> {
        let key = PathKey::new(start, goal, class);
        self.clock += 1;
        let now = self.clock;
        let Some(entry) = self.entries.get_mut(&key) else {
            self.stats.misses += 1;
            return None;
        };
        self.recency.remove(&entry.last_used);
        entry.last_used = now;
        self.recency.insert(now, key);
        self.stats.hits += 1;
        Some(entry.path.clone())
    }

    /// Cached route without touching recency or counters.
    pub fn peek(&self, start: Point, goal: Point, class: MoverClass) -> Option<&Path> {
        self.entries
            .get(&PathKey::new(start, goal, class))
            .map(|e| &e.path)
    }

    /// Store a route, evicting least-recently-used entries beyond capacity.
    pub fn put(&mut self, start: Point, goal: Point, class: MoverClass, path: Path) {
        if self.capacity == 0 {
            return;
        }
        let key = PathKey::new(start, goal, class);
        self.clock += 1;
        let now = self.clock;
        let created = match self.entries.remove(&key) {
            Some(old) => {
                self.recency.remove(&old.last_used);
                old.created
            }
            None => now,
        };
        self.entries.insert(
            key,
            Entry {
                path,
                created,
                last_used: now,
            },
        );
        self.recency.insert(now, key);

        while self.entries.len() > self.capacity {
            let Some((_, oldest)) = self.recency.pop_first() else {
                break;
            };
            if let Some(e) = self.entries.remove(&oldest) {
                log::debug!(
                    "evicting route {} -> {} ({}), stored at stamp {}",
                    oldest.start,
                    oldest.goal,
                    oldest.class,
                    e.created
                );
                self.stats.evictions += 1;
            }
        }
    }

    /// Drop every route that starts on or passes through any of `tiles`.
    /// Returns how many routes were dropped.
    pub fn invalidate<I>(&mut self, tiles: I) -> usize
    where
        I: IntoIterator<Item = Point>,
    {
        let tiles: HashSet<Point> = tiles.into_iter().collect();
        if tiles.is_empty() || self.entries.is_empty() {
            return 0;
        }
        let stale: Vec<PathKey> = self
            .entries
            .iter()
            .filter(|(k, e)| tiles.contains(&k.start) || e.path.traverses(&tiles))
            .map(|(k, _)| *k)
            .collect();
        for key in &stale {
            if let Some(e) = self.entries.remove(key) {
                self.recency.remove(&e.last_used);
            }
        }
        if !stale.is_empty() {
            log::debug!("invalidated {} cached routes", stale.len());
        }
        self.stats.invalidated += stale.len() as u64;
        stale.len()
    }

    /// Drop every route.
    pub fn clear(&mut self) {
        self.stats.invalidated += self.entries.len() as u64;
        self.entries.clear();
        self.recency.clear();
    }
}
