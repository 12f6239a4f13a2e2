use std::collections::HashSet;
use std::ops::Deref;
use std::sync::Arc;

use skirmish_core::Point;

/// An immutable route: the tiles to walk through, in order, from the tile
/// after the start up to and including the goal.
///
/// An empty path means the start already is the goal. Clones share storage,
/// so a path handed out by the cache can be held by many units at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Arc<[Point]>);

impl Path {
    /// The path of a unit that is already at its goal.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The waypoints as a slice.
    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Final waypoint, if any.
    #[inline]
    pub fn goal(&self) -> Option<Point> {
        self.0.last().copied()
    }

    /// Whether any waypoint is in `tiles`.
    pub fn traverses(&self, tiles: &HashSet<Point>) -> bool {
        self.0.iter().any(|p| tiles.contains(p))
    }

    /// Whether both paths share the same storage.
    #[inline]
    pub fn ptr_eq(a: &Path, b: &Path) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl Deref for Path {
    type Target = [Point];

    #[inline]
    fn deref(&self) -> &[Point] {
        &self.0
    }
}

impl From<Vec<Point>> for Path {
    fn from(points: Vec<Point>) -> Self {
        Self(points.into())
    }
}

impl FromIterator<Point> for Path {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Path {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.points().serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Path {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let points = Vec::<Point>::deserialize(deserializer)?;
        Ok(Path::from(points))
    }
}
