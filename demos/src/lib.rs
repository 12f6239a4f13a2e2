//! Headless skirmish used by the `skirmish` binary.
//!
//! Demonstrates: terrain generation, occupancy markers, cached A* routes
//! shared between units, blocked-route fallbacks and failure timers.
//!
//! The [`Skirmish`] world plays the part the movement library leaves to its
//! host: it marks which tile each unit stands on, invalidates cached routes
//! whenever that changes, and adopts alternative destinations proposed by
//! the controllers.

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use skirmish_core::{MoverClass, Point, Tile, TileMap, UnitId};
use skirmish_move::{MoveController, MoveState, NavConfig, Navigator};

pub const WIDTH: i32 = 40;
pub const HEIGHT: i32 = 16;
pub const UNITS: u32 = 6;

// ---------------------------------------------------------------------------
// Unit
// ---------------------------------------------------------------------------

/// A unit on the field: its controller plus the order it was given.
#[derive(Debug, Clone)]
pub struct Unit {
    pub class: MoverClass,
    pub controller: MoveController,
    /// Tile the unit was ordered to. Replaced when the controller proposes
    /// an alternative.
    pub order: Point,
}

impl Unit {
    #[inline]
    pub fn id(&self) -> UnitId {
        self.controller.unit()
    }

    #[inline]
    pub fn tile(&self) -> Point {
        self.controller.tile()
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// The simulation: terrain, live occupancy map, navigator and units.
pub struct Skirmish {
    // Terrain without units, used to restore a tile a unit leaves.
    terrain: TileMap,
    map: TileMap,
    nav: Navigator,
    units: Vec<Unit>,
    rng: StdRng,
    ticks: u32,
    messages: Vec<String>,
}

impl Skirmish {
    /// A random field with [`UNITS`] units, reproducible from `seed`.
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let terrain = generate_terrain(&mut rng, WIDTH, HEIGHT);
        let mut world = Self::with_terrain(terrain, NavConfig::default(), rng);

        let mut attempts = 0;
        while world.units.len() < UNITS as usize && attempts < 500 {
            attempts += 1;
            let p = world.random_floor();
            let class = MoverClass::ALL[world.units.len() % MoverClass::ALL.len()];
            if world.spawn(p, class).is_some() {
                let goal = world.random_floor();
                let id = world.units[world.units.len() - 1].id();
                world.order(id, goal);
            }
        }
        world
    }

    /// A world over a given terrain, with no units yet.
    pub fn with_terrain(terrain: TileMap, config: NavConfig, rng: StdRng) -> Self {
        let nav = Navigator::for_map(&terrain, config);
        Self {
            map: terrain.clone(),
            terrain,
            nav,
            units: Vec::new(),
            rng,
            ticks: 0,
            messages: Vec::new(),
        }
    }

    pub fn map(&self) -> &TileMap {
        &self.map
    }

    pub fn nav(&self) -> &Navigator {
        &self.nav
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id() == id)
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Place a new unit on `tile`. Fails when the tile is not free floor.
    pub fn spawn(&mut self, tile: Point, class: MoverClass) -> Option<UnitId> {
        if !matches!(self.map.at(tile), Some(Tile::Floor | Tile::Rough)) {
            return None;
        }
        let id = UnitId(self.units.len() as u32 + 1);
        let controller = MoveController::at_tile(id, tile, self.nav.config().movement);
        self.map.set(tile, Tile::Occupied(id));
        self.nav.invalidate([tile]);
        self.units.push(Unit {
            class,
            controller,
            order: tile,
        });
        Some(id)
    }

    /// Send unit `id` to `goal`.
    pub fn order(&mut self, id: UnitId, goal: Point) {
        if let Some(unit) = self.units.iter_mut().find(|u| u.id() == id) {
            unit.order = goal;
        }
    }

    /// Advance every unit by one tick.
    pub fn tick(&mut self) {
        self.ticks += 1;
        for i in 0..self.units.len() {
            self.step_unit(i);
            self.reassign_if_done(i);
        }
    }

    /// Coordinate unit `i` and keep its occupancy marker in sync.
    fn step_unit(&mut self, i: usize) {
        let unit = &mut self.units[i];
        let before = unit.tile();
        let was_failed = unit.controller.is_failed();
        let alt = unit
            .controller
            .coordinate(&mut self.nav, &self.map, before, unit.order, unit.class);
        let failed = !was_failed && unit.controller.is_failed();
        unit.controller.update_failure_timer();
        let after = unit.tile();
        let id = unit.id();
        let order = unit.order;

        if let Some(alt) = alt {
            self.units[i].order = alt;
            self.log(format!("{id}: blocked, heading to {alt} instead"));
        }
        if failed {
            self.log(format!("{id}: no route to {order}"));
        }
        if after != before {
            let restored = self.terrain.at(before).unwrap_or_default();
            self.map.set(before, restored);
            self.map.set(after, Tile::Occupied(id));
            self.nav.invalidate([before, after]);
        }
    }

    /// Give an idle unit a fresh random order so the field keeps moving.
    fn reassign_if_done(&mut self, i: usize) {
        if self.units[i].controller.state() == MoveState::Idle {
            let goal = self.random_floor();
            self.units[i].order = goal;
        }
    }

    fn random_floor(&mut self) -> Point {
        for _ in 0..200 {
            let p = Point::new(
                self.rng.random_range(0..self.map.width()),
                self.rng.random_range(0..self.map.height()),
            );
            if matches!(self.map.at(p), Some(Tile::Floor | Tile::Rough)) {
                return p;
            }
        }
        Point::new(0, 0)
    }

    fn log(&mut self, msg: String) {
        self.messages.push(msg);
        if self.messages.len() > 50 {
            self.messages.remove(0);
        }
    }

    /// ASCII rendering of the field followed by one status line per unit.
    pub fn frame(&self) -> String {
        let mut out = format!("tick {}\n{}", self.ticks, self.map);
        for u in &self.units {
            let c = &u.controller;
            out.push_str(&format!(
                "{} ({}) at {} {:?} -> {}\n",
                u.id(),
                u.class,
                u.tile(),
                c.state(),
                u.order
            ));
        }
        let stats = self.nav.cache().stats();
        out.push_str(&format!(
            "cache: {} routes, {} hits, {} misses, {} evicted, {} invalidated; {} searches\n",
            self.nav.cache().len(),
            stats.hits,
            stats.misses,
            stats.evictions,
            stats.invalidated,
            self.nav.pathfinder().searches()
        ));
        out
    }
}

/// Open field with scattered wall blocks and patches of rough ground.
fn generate_terrain(rng: &mut StdRng, width: i32, height: i32) -> TileMap {
    let mut map = TileMap::new(width, height);
    for _ in 0..(width * height / 40) {
        let p = Point::new(rng.random_range(0..width), rng.random_range(0..height));
        let tile = if rng.random_range(0..3) == 0 {
            Tile::Rough
        } else {
            Tile::Wall
        };
        let (w, h) = (rng.random_range(1..4), rng.random_range(1..3));
        for y in p.y..p.y + h {
            for x in p.x..p.x + w {
                map.set(Point::new(x, y), tile);
            }
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(rows: &[&str]) -> Skirmish {
        let terrain = TileMap::from_ascii(rows).unwrap();
        Skirmish::with_terrain(terrain, NavConfig::default(), StdRng::seed_from_u64(7))
    }

    fn run_until_idle(world: &mut Skirmish, id: UnitId, max: u32) {
        let i = world.units.iter().position(|u| u.id() == id).unwrap();
        for _ in 0..max {
            let unit = &world.units[i];
            if unit.controller.state() == MoveState::Idle && unit.tile() == unit.order {
                return;
            }
            world.step_unit(i);
        }
    }

    #[test]
    fn spawn_marks_occupancy() {
        let mut w = field(&["....", ".#.."]);
        let id = w.spawn(Point::new(0, 0), MoverClass::Light).unwrap();
        assert_eq!(w.map().occupant(Point::new(0, 0)), Some(id));
        assert_eq!(w.spawn(Point::new(0, 0), MoverClass::Light), None);
        assert_eq!(w.spawn(Point::new(1, 1), MoverClass::Light), None);
    }

    #[test]
    fn leaving_a_tile_restores_its_terrain() {
        let mut w = field(&["~...."]);
        let id = w.spawn(Point::new(0, 0), MoverClass::Light).unwrap();
        w.order(id, Point::new(4, 0));
        run_until_idle(&mut w, id, 200);
        assert_eq!(w.unit(id).unwrap().tile(), Point::new(4, 0));
        assert_eq!(w.map().at(Point::new(0, 0)), Some(Tile::Rough));
        assert_eq!(w.map().occupant(Point::new(4, 0)), Some(id));
        assert_eq!(w.map().count(|t| matches!(t, Tile::Occupied(_))), 1);
    }

    #[test]
    fn blocked_goal_is_replaced_by_alternative() {
        let mut w = field(&["......"]);
        let blocker = w.spawn(Point::new(5, 0), MoverClass::Heavy).unwrap();
        let mover = w.spawn(Point::new(0, 0), MoverClass::Light).unwrap();
        w.order(blocker, Point::new(5, 0));
        w.order(mover, Point::new(5, 0));
        run_until_idle(&mut w, mover, 200);
        let unit = w.unit(mover).unwrap();
        assert_eq!(unit.order, Point::new(4, 0));
        assert_eq!(unit.tile(), Point::new(4, 0));
    }

    #[test]
    fn seeded_worlds_are_reproducible() {
        let mut a = Skirmish::new(42);
        let mut b = Skirmish::new(42);
        assert_eq!(a.units().len(), UNITS as usize);
        for _ in 0..50 {
            a.tick();
            b.tick();
        }
        assert_eq!(a.frame(), b.frame());
        assert_eq!(a.ticks(), 50);
    }

    #[test]
    fn units_never_share_a_tile() {
        let mut w = Skirmish::new(3);
        for _ in 0..200 {
            w.tick();
            let mut tiles: Vec<Point> = w.units().iter().map(Unit::tile).collect();
            tiles.sort();
            tiles.dedup();
            assert_eq!(tiles.len(), w.units().len());
        }
    }
}
