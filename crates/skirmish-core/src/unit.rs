//! Unit identity and mover classes.

use std::fmt;

use crate::grid::Tile;

/// Identifier of a unit, as stored in [`Tile::Occupied`] markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

/// Movement category of a unit. Decides how expensive each terrain is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MoverClass {
    Light,
    #[default]
    Medium,
    Heavy,
}

impl MoverClass {
    /// All classes, lightest first.
    pub const ALL: [MoverClass; 3] = [MoverClass::Light, MoverClass::Medium, MoverClass::Heavy];

    /// Cost of entering `tile`, in percent of a plain floor step, or `None`
    /// when this class cannot enter it at all.
    ///
    /// Floor is always 100: search heuristics rely on it being the minimum.
    pub fn terrain_cost(self, tile: Tile) -> Option<i32> {
        match (self, tile) {
            (_, Tile::Wall) => None,
            (_, Tile::Floor | Tile::Occupied(_)) => Some(100),
            (MoverClass::Light, Tile::Rough) => Some(125),
            (MoverClass::Medium, Tile::Rough) => Some(200),
            (MoverClass::Heavy, Tile::Rough) => Some(300),
        }
    }
}

impl fmt::Display for MoverClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MoverClass::Light => "light",
            MoverClass::Medium => "medium",
            MoverClass::Heavy => "heavy",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_is_the_cheapest_terrain() {
        for class in MoverClass::ALL {
            let floor = class.terrain_cost(Tile::Floor).unwrap();
            assert_eq!(floor, 100);
            assert!(class.terrain_cost(Tile::Rough).unwrap() >= floor);
            assert_eq!(class.terrain_cost(Tile::Wall), None);
        }
    }

    #[test]
    fn heavier_classes_pay_more_on_rough() {
        let rough = |c: MoverClass| c.terrain_cost(Tile::Rough).unwrap();
        assert!(rough(MoverClass::Light) < rough(MoverClass::Medium));
        assert!(rough(MoverClass::Medium) < rough(MoverClass::Heavy));
    }
}
