use skirmish_core::Point;

use crate::pather::{DIAGONAL_COST, STEP_COST};

/// Manhattan (L1) distance between two points.
#[inline]
pub fn manhattan(a: Point, b: Point) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

/// Chebyshev (L∞) distance between two points.
#[inline]
pub fn chebyshev(a: Point, b: Point) -> i32 {
    (a.x - b.x).abs().max((a.y - b.y).abs())
}

/// Octile distance in step-cost units: the cheapest 8-way walk between two
/// points on open floor.
#[inline]
pub fn octile(a: Point, b: Point) -> i32 {
    let dx = (a.x - b.x).abs();
    let dy = (a.y - b.y).abs();
    STEP_COST * (dx + dy) + (DIAGONAL_COST - 2 * STEP_COST) * dx.min(dy)
}
