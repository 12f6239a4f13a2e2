//! Search failure type.

use skirmish_core::Point;
use thiserror::Error;

/// Why no path was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PathError {
    /// The open set emptied without reaching the goal.
    #[error("no path from {from} to {to}")]
    NotFound { from: Point, to: Point },

    /// Start or goal lies outside the map.
    #[error("{0} is out of bounds")]
    OutOfBounds(Point),

    /// The goal tile cannot be stood on, and no alternative was found.
    #[error("goal {0} is blocked")]
    GoalBlocked(Point),
}

pub type PathResult<T> = Result<T, PathError>;
