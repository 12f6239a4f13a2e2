//! Movement and navigation settings.

use skirmish_paths::{DEFAULT_CACHE_CAPACITY, SearchConfig};

/// Per-unit movement settings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoveConfig {
    /// Edge length of one tile, in pixels.
    pub tile_size: f32,
    /// Distance travelled per tick, in pixels.
    pub speed: f32,
    /// How many ticks a failed request stays visible before the controller
    /// returns to idle.
    pub failure_ticks: u32,
}

impl Default for MoveConfig {
    fn default() -> Self {
        Self {
            tile_size: 32.0,
            speed: 4.0,
            failure_ticks: 30,
        }
    }
}

impl MoveConfig {
    #[inline]
    pub const fn with_tile_size(mut self, tile_size: f32) -> Self {
        self.tile_size = tile_size;
        self
    }

    #[inline]
    pub const fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    #[inline]
    pub const fn with_failure_ticks(mut self, ticks: u32) -> Self {
        self.failure_ticks = ticks;
        self
    }
}

/// Settings for a whole simulation's [`Navigator`](crate::Navigator).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NavConfig {
    pub search: SearchConfig,
    /// Maximum number of cached routes.
    pub cache_capacity: usize,
    /// Default settings for controllers created through the navigator.
    pub movement: MoveConfig,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            movement: MoveConfig::default(),
        }
    }
}

impl NavConfig {
    #[inline]
    pub const fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    #[inline]
    pub const fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    #[inline]
    pub const fn with_movement(mut self, movement: MoveConfig) -> Self {
        self.movement = movement;
        self
    }
}
