//! Tick-driven unit movement on top of [`skirmish_paths`].
//!
//! One [`Navigator`] per simulation owns the search scratch space and the
//! shared route cache. Each unit owns a [`MoveController`] and calls
//! [`MoveController::coordinate`] once per tick:
//!
//! ```text
//! Idle -> PathRequested -> Moving -> Idle
//!              |             |
//!              v             v
//!           Failed      BlockedRetry -> PathRequested
//! ```
//!
//! The caller owns the map. Whoever changes walkability (occupancy markers
//! included) is expected to call [`Navigator::invalidate`] for the changed
//! tiles.

mod config;
mod controller;
mod navigator;

pub use config::{MoveConfig, NavConfig};
pub use controller::{MoveController, MoveState};
pub use navigator::{Navigator, Route, RouteSource};
