//! Per-unit movement state machine.
//!
//! A [`MoveController`] is driven once per simulation tick through
//! [`MoveController::coordinate`]. It requests a route from the shared
//! [`Navigator`], walks it waypoint by waypoint in pixel space, and reacts to
//! obstructions by proposing an alternative destination to its caller.

use skirmish_core::{GridModel, MoverClass, Occupancy, Point, Position, TileMap, UnitId};
use skirmish_paths::{Path, PathError, octile};

use crate::config::MoveConfig;
use crate::navigator::{Navigator, RouteSource};

/// Where a controller is in its movement cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MoveState {
    /// No active route.
    #[default]
    Idle,
    /// A destination is set and the next tick resolves a route for it.
    PathRequested,
    /// Walking the current route.
    Moving,
    /// The route or the goal got blocked; an alternative destination has
    /// been proposed and is requested on the next tick.
    BlockedRetry,
    /// No route exists. Cleared by the failure timer or a new destination.
    Failed,
}

/// Movement controller of a single unit.
#[derive(Debug, Clone)]
pub struct MoveController {
    unit: UnitId,
    config: MoveConfig,
    position: Position,
    state: MoveState,
    destination: Option<Point>,
    // The caller's destination while `destination` holds an alternative
    // that has not been reached yet.
    overridden: Option<Point>,
    path: Path,
    cursor: usize,
    explored: Vec<Point>,
    blocked_at: Option<Point>,
    failure_ticks: u32,
    last_failure: Option<PathError>,
}

impl MoveController {
    /// A controller for `unit`, idle at `position`.
    pub fn new(unit: UnitId, position: Position, config: MoveConfig) -> Self {
        Self {
            unit,
            config,
            position,
            state: MoveState::Idle,
            destination: None,
            overridden: None,
            path: Path::empty(),
            cursor: 0,
            explored: Vec::new(),
            blocked_at: None,
            failure_ticks: 0,
            last_failure: None,
        }
    }

    /// A controller for `unit`, idle at the centre of `tile`.
    pub fn at_tile(unit: UnitId, tile: Point, config: MoveConfig) -> Self {
        Self::new(unit, Position::tile_center(tile, config.tile_size), config)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[inline]
    pub fn unit(&self) -> UnitId {
        self.unit
    }

    #[inline]
    pub fn config(&self) -> &MoveConfig {
        &self.config
    }

    #[inline]
    pub fn position(&self) -> Position {
        self.position
    }

    /// Teleport the unit. Any route in progress is kept.
    #[inline]
    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// The tile under the unit's position.
    #[inline]
    pub fn tile(&self) -> Point {
        self.position.tile(self.config.tile_size)
    }

    #[inline]
    pub fn state(&self) -> MoveState {
        self.state
    }

    /// Current destination, which may be an alternative proposed after an
    /// obstruction.
    #[inline]
    pub fn destination(&self) -> Option<Point> {
        self.destination
    }

    #[inline]
    pub fn has_path(&self) -> bool {
        !self.path.is_empty()
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        self.state == MoveState::Moving
    }

    #[inline]
    pub fn is_failed(&self) -> bool {
        self.state == MoveState::Failed
    }

    /// The whole current route.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All waypoints of the current route.
    #[inline]
    pub fn waypoints(&self) -> &[Point] {
        self.path.points()
    }

    /// Waypoints not reached yet.
    #[inline]
    pub fn remaining_waypoints(&self) -> &[Point] {
        self.path.get(self.cursor..).unwrap_or(&[])
    }

    /// Index of the next waypoint in [`path`](Self::path).
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Tiles expanded by the search that produced the current route. Empty
    /// when the route came from the cache or exploration recording is off.
    #[inline]
    pub fn explored(&self) -> &[Point] {
        &self.explored
    }

    /// Ticks left before a failure clears.
    #[inline]
    pub fn failure_ticks(&self) -> u32 {
        self.failure_ticks
    }

    /// Error of the most recent failed request.
    #[inline]
    pub fn last_failure(&self) -> Option<PathError> {
        self.last_failure
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Head for `goal`. Clears any failure and requests a fresh route on the
    /// next [`coordinate`](Self::coordinate).
    pub fn set_destination(&mut self, goal: Point) {
        self.destination = Some(goal);
        self.overridden = None;
        self.clear_route();
        self.failure_ticks = 0;
        self.transition(MoveState::PathRequested);
    }

    /// Resume towards the current destination, if any. Returns whether a
    /// route will be requested.
    pub fn start_moving(&mut self) -> bool {
        if self.destination.is_none() {
            return false;
        }
        if matches!(self.state, MoveState::Idle | MoveState::Failed) {
            self.clear_route();
            self.failure_ticks = 0;
            self.transition(MoveState::PathRequested);
        }
        true
    }

    /// Halt in place. The destination is remembered for
    /// [`start_moving`](Self::start_moving); calling this twice is the same
    /// as calling it once.
    pub fn stop_moving(&mut self) {
        self.overridden = None;
        self.clear_route();
        self.failure_ticks = 0;
        self.transition(MoveState::Idle);
    }

    /// Count down a failure. Once the timer runs out the controller is idle
    /// again. Does nothing in other states.
    pub fn update_failure_timer(&mut self) {
        if self.state != MoveState::Failed {
            return;
        }
        self.failure_ticks = self.failure_ticks.saturating_sub(1);
        if self.failure_ticks == 0 {
            self.transition(MoveState::Idle);
        }
    }

    /// Advance the controller by one tick.
    ///
    /// `current` is the unit's tile and `destination` the tile the caller
    /// wants it on. A destination different from the current one (and from
    /// the original one replaced by an alternative) restarts the request.
    ///
    /// Returns `Some(tile)` when an obstruction forced an alternative
    /// destination. The alternative is already adopted; until the unit
    /// arrives or is stopped the caller may pass either it or its original
    /// destination. Afterwards the original destination counts as a new
    /// order again.
    pub fn coordinate(
        &mut self,
        nav: &mut Navigator,
        map: &TileMap,
        current: Point,
        destination: Point,
        class: MoverClass,
    ) -> Option<Point> {
        if self.destination != Some(destination) && self.overridden != Some(destination) {
            self.set_destination(destination);
        }
        if self.state == MoveState::BlockedRetry {
            self.transition(MoveState::PathRequested);
        }
        if self.state == MoveState::PathRequested {
            self.request(nav, map, current, class);
        }
        if self.state == MoveState::Moving {
            self.advance(map);
        }
        if self.state == MoveState::BlockedRetry {
            return self.retry(nav, map, current);
        }
        None
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn request(
        &mut self,
        nav: &mut Navigator,
        map: &TileMap,
        current: Point,
        class: MoverClass,
    ) {
        let Some(goal) = self.destination else {
            self.transition(MoveState::Idle);
            return;
        };
        if goal != current && map.contains(goal) && !self.standable(map, goal) {
            self.blocked_at = Some(goal);
            self.transition(MoveState::BlockedRetry);
            return;
        }
        let record = nav.config().search.record_explored;
        let result = nav.find_path_cached(map, current, goal, class);
        self.explored.clear();
        match result {
            Ok(route) => {
                if record && route.source == RouteSource::Search {
                    self.explored.extend_from_slice(nav.pathfinder().explored());
                }
                self.path = route.path;
                self.cursor = 0;
                if self.position != Position::tile_center(current, self.config.tile_size) {
                    // Stopped between tiles: back to the centre first.
                    self.path = std::iter::once(current)
                        .chain(self.path.iter().copied())
                        .collect();
                }
                if self.path.is_empty() {
                    self.arrive();
                } else {
                    self.transition(MoveState::Moving);
                }
            }
            Err(PathError::GoalBlocked(p)) => {
                self.blocked_at = Some(p);
                self.transition(MoveState::BlockedRetry);
            }
            Err(err) => {
                if record {
                    self.explored.extend_from_slice(nav.pathfinder().explored());
                }
                self.fail(err);
            }
        }
    }

    fn advance(&mut self, map: &TileMap) {
        let Some(&next) = self.path.get(self.cursor) else {
            self.arrive();
            return;
        };
        if !self.standable(map, next) {
            self.blocked_at = Some(next);
            self.transition(MoveState::BlockedRetry);
            return;
        }
        let target = Position::tile_center(next, self.config.tile_size);
        let (pos, reached) = self.position.step_toward(target, self.config.speed);
        self.position = pos;
        if reached {
            self.cursor += 1;
            if self.cursor >= self.path.len() {
                self.arrive();
            }
        }
    }

    /// Pick and adopt an alternative destination after an obstruction.
    fn retry(&mut self, nav: &mut Navigator, map: &TileMap, current: Point) -> Option<Point> {
        if let Some(blocked) = self.blocked_at.take() {
            nav.invalidate([blocked]);
        }
        let Some(goal) = self.destination else {
            self.stop_moving();
            return None;
        };
        let alternative = if self.standable(map, goal) {
            // Something blocks the route: hold on the last tile reached.
            Some(
                self.cursor
                    .checked_sub(1)
                    .and_then(|i| self.path.get(i).copied())
                    .unwrap_or(current),
            )
        } else {
            goal.neighbors_8()
                .into_iter()
                .filter(|&n| self.standable(map, n))
                .min_by_key(|&n| octile(current, n))
        };
        let Some(alt) = alternative else {
            self.fail(PathError::GoalBlocked(goal));
            return None;
        };
        log::debug!("{}: {} is blocked, falling back to {}", self.unit, goal, alt);
        if self.overridden.is_none() {
            self.overridden = Some(goal);
        }
        self.destination = Some(alt);
        self.clear_route();
        Some(alt)
    }

    /// Whether this unit may stand on `p`. Other units always block here,
    /// whatever policy the search uses.
    fn standable(&self, map: &TileMap, p: Point) -> bool {
        GridModel::new(map, Occupancy::Blocking)
            .for_unit(self.unit)
            .is_walkable(p)
    }

    fn arrive(&mut self) {
        self.overridden = None;
        self.clear_route();
        self.transition(MoveState::Idle);
    }

    fn fail(&mut self, err: PathError) {
        log::warn!("{}: {}", self.unit, err);
        self.clear_route();
        self.last_failure = Some(err);
        self.failure_ticks = self.config.failure_ticks;
        self.transition(MoveState::Failed);
    }

    fn clear_route(&mut self) {
        self.path = Path::empty();
        self.cursor = 0;
        self.blocked_at = None;
    }

    fn transition(&mut self, to: MoveState) {
        if self.state != to {
            log::trace!("{}: {:?} -> {:?}", self.unit, self.state, to);
            self.state = to;
        }
    }
}

#[cfg(test)]
mod tests {
    use skirmish_core::Tile;
    use skirmish_paths::SearchConfig;

    use super::*;
    use crate::config::NavConfig;

    const ME: UnitId = UnitId(1);

    fn setup(rows: &[&str]) -> (TileMap, Navigator) {
        let map = TileMap::from_ascii(rows).unwrap();
        let nav = Navigator::for_map(&map, NavConfig::default());
        (map, nav)
    }

    fn fast() -> MoveConfig {
        MoveConfig::default().with_speed(32.0)
    }

    #[test]
    fn new_controller_is_idle() {
        let c = MoveController::at_tile(ME, Point::new(2, 3), MoveConfig::default());
        assert_eq!(c.state(), MoveState::Idle);
        assert_eq!(c.tile(), Point::new(2, 3));
        assert_eq!(c.position(), Position::new(80.0, 112.0));
        assert!(!c.has_path());
        assert!(!c.is_moving());
        assert_eq!(c.destination(), None);
    }

    #[test]
    fn walks_to_destination_and_goes_idle() {
        let (map, mut nav) = setup(&["....."]);
        let start = Point::new(0, 0);
        let goal = Point::new(4, 0);
        let mut c = MoveController::at_tile(ME, start, fast());

        assert_eq!(

            c.coordinate(&mut nav, &map, start, goal, MoverClass::Medium),

            None

        );
        assert!(c.is_moving());
        assert_eq!(c.path().len(), 4);
        // One tile per tick at this speed.
        assert_eq!(c.tile(), Point::new(1, 0));
        assert_eq!(c.remaining_waypoints().len(), 3);

        for _ in 0..3 {
            let here = c.tile();
            c.coordinate(&mut nav, &map, here, goal, MoverClass::Medium);
        }
        assert_eq!(c.state(), MoveState::Idle);
        assert_eq!(c.tile(), goal);
        assert_eq!(c.position(), Position::tile_center(goal, 32.0));
        assert!(!c.has_path());
    }

    #[test]
    fn slow_unit_takes_several_ticks_per_tile() {
        let (map, mut nav) = setup(&["..."]);
        let cfg = MoveConfig::default().with_speed(8.0);
        let mut c = MoveController::at_tile(ME, Point::new(0, 0), cfg);
        let goal = Point::new(1, 0);
        let mut ticks = 0;
        loop {
            let here = c.tile();
            c.coordinate(&mut nav, &map, here, goal, MoverClass::Medium);
            ticks += 1;
            if c.state() == MoveState::Idle {
                break;
            }
            assert!(ticks < 4);
        }
        // 32 pixels at 8 per tick.
        assert_eq!(ticks, 4);
        assert_eq!(c.tile(), goal);
    }

    #[test]
    fn already_there_is_idle() {
        let (map, mut nav) = setup(&["..."]);
        let p = Point::new(1, 0);
        let mut c = MoveController::at_tile(ME, p, MoveConfig::default());
        assert_eq!(c.coordinate(&mut nav, &map, p, p, MoverClass::Medium), None);
        assert_eq!(c.state(), MoveState::Idle);
        assert_eq!(c.destination(), Some(p));
    }

    #[test]
    fn unreachable_goal_fails_and_times_out() {
        let (map, mut nav) = setup(&["..#..", "..#..", "..#.."]);
        let start = Point::new(0, 1);
        let goal = Point::new(4, 1);
        let cfg = MoveConfig::default().with_failure_ticks(3);
        let mut c = MoveController::at_tile(ME, start, cfg);

        c.coordinate(&mut nav, &map, start, goal, MoverClass::Medium);
        assert!(c.is_failed());
        assert_eq!(c.failure_ticks(), 3);
        assert_eq!(
            c.last_failure(),
            Some(PathError::NotFound {
                from: start,
                to: goal
            })
        );

        // Re-sending the same destination does not retry.
        c.coordinate(&mut nav, &map, start, goal, MoverClass::Medium);
        assert!(c.is_failed());
        assert_eq!(nav.pathfinder().searches(), 1);

        c.update_failure_timer();
        c.update_failure_timer();
        assert!(c.is_failed());
        c.update_failure_timer();
        assert_eq!(c.state(), MoveState::Idle);
        assert_eq!(c.failure_ticks(), 0);
        c.update_failure_timer();
        assert_eq!(c.state(), MoveState::Idle);
    }

    #[test]
    fn new_destination_clears_failure() {
        let (map, mut nav) = setup(&["..#..", "..#..", "..#.."]);
        let start = Point::new(0, 1);
        let mut c = MoveController::at_tile(ME, start, fast());
        c.coordinate(&mut nav, &map, start, Point::new(4, 1), MoverClass::Medium);
        assert!(c.is_failed());

        c.coordinate(&mut nav, &map, start, Point::new(1, 1), MoverClass::Medium);
        assert!(!c.is_failed());
        assert_eq!(c.failure_ticks(), 0);
        assert_eq!(c.state(), MoveState::Idle);
        assert_eq!(c.tile(), Point::new(1, 1));
    }

    #[test]
    fn out_of_bounds_destination_fails() {
        let (map, mut nav) = setup(&["..."]);
        let start = Point::new(0, 0);
        let mut c = MoveController::at_tile(ME, start, fast());
        let goal = Point::new(9, 9);
        assert_eq!(
            c.coordinate(&mut nav, &map, start, goal, MoverClass::Medium),
            None
        );
        assert!(c.is_failed());
        assert_eq!(c.last_failure(), Some(PathError::OutOfBounds(goal)));
    }

    #[test]
    fn stop_and_resume() {
        let (map, mut nav) = setup(&["......"]);
        let start = Point::new(0, 0);
        let goal = Point::new(5, 0);
        let mut c = MoveController::at_tile(ME, start, MoveConfig::default());
        c.coordinate(&mut nav, &map, start, goal, MoverClass::Medium);
        assert!(c.is_moving());
        let pos = c.position();

        c.stop_moving();
        c.stop_moving();
        assert_eq!(c.state(), MoveState::Idle);
        assert!(!c.has_path());
        assert_eq!(c.position(), pos);
        assert_eq!(c.destination(), Some(goal));

        // Same destination again: stays put until explicitly resumed.
        c.coordinate(&mut nav, &map, c.tile(), goal, MoverClass::Medium);
        assert_eq!(c.state(), MoveState::Idle);
        assert_eq!(c.position(), pos);

        assert!(c.start_moving());
        assert_eq!(c.state(), MoveState::PathRequested);
        c.coordinate(&mut nav, &map, c.tile(), goal, MoverClass::Medium);
        assert!(c.is_moving());
    }

    #[test]
    fn stopped_between_tiles_recentres_first() {
        let (map, mut nav) = setup(&["....", "...."]);
        let start = Point::new(0, 0);
        let mut c = MoveController::at_tile(ME, start, MoveConfig::default());
        c.coordinate(&mut nav, &map, start, Point::new(3, 0), MoverClass::Medium);
        c.stop_moving();
        assert_eq!(c.position(), Position::new(20.0, 16.0));

        c.coordinate(&mut nav, &map, start, Point::new(1, 1), MoverClass::Medium);
        assert_eq!(c.waypoints(), &[start, Point::new(1, 1)]);
        assert_eq!(c.position(), Position::tile_center(start, 32.0));
        assert_eq!(c.cursor(), 1);

        c.stop_moving();
        c.coordinate(&mut nav, &map, start, start, MoverClass::Medium);
        assert_eq!(c.state(), MoveState::Idle);
        assert!(!c.has_path());
    }

    #[test]
    fn start_without_destination_is_noop() {
        let mut c = MoveController::at_tile(ME, Point::new(0, 0), MoveConfig::default());
        assert!(!c.start_moving());
        assert_eq!(c.state(), MoveState::Idle);
    }

    #[test]
    fn wall_goal_falls_back_to_nearest_neighbor() {
        let (map, mut nav) = setup(&[
            ".....", //
            ".....",
            "...#.",
            ".....",
        ]);
        let start = Point::new(0, 2);
        let goal = Point::new(3, 2);
        let mut c = MoveController::at_tile(ME, start, fast());

        let alt = c.coordinate(&mut nav, &map, start, goal, MoverClass::Medium);
        assert_eq!(alt, Some(Point::new(2, 2)));
        assert_eq!(c.state(), MoveState::BlockedRetry);
        assert_eq!(c.destination(), alt);
        assert_eq!(nav.pathfinder().searches(), 0);

        // The caller keeps sending its original goal; the alternative holds.
        c.coordinate(&mut nav, &map, start, goal, MoverClass::Medium);
        assert!(c.is_moving());
        assert_eq!(c.path().goal(), Some(Point::new(2, 2)));
    }

    #[test]
    fn boxed_in_goal_fails_blocked() {
        let (map, mut nav) = setup(&[
            ".....", //
            ".###.",
            ".###.",
            ".###.",
        ]);
        let start = Point::new(0, 0);
        let goal = Point::new(2, 2);
        let mut c = MoveController::at_tile(ME, start, fast());
        assert_eq!(
            c.coordinate(&mut nav, &map, start, goal, MoverClass::Medium),
            None
        );
        assert!(c.is_failed());
        assert_eq!(c.last_failure(), Some(PathError::GoalBlocked(goal)));
    }

    #[test]
    fn occupied_waypoint_triggers_retry() {
        let (mut map, mut nav) = setup(&["......"]);
        let start = Point::new(0, 0);
        let goal = Point::new(5, 0);
        let mut c = MoveController::at_tile(ME, start, fast());
        map.set(start, Tile::Occupied(ME));

        c.coordinate(&mut nav, &map, start, goal, MoverClass::Medium);
        assert_eq!(c.tile(), Point::new(1, 0));
        map.set(start, Tile::Floor);
        map.set(Point::new(1, 0), Tile::Occupied(ME));
        assert_eq!(nav.cache().len(), 1);

        // Another unit steps onto the next waypoint.
        map.set(Point::new(2, 0), Tile::Occupied(UnitId(2)));
        let alt = c.coordinate(&mut nav, &map, Point::new(1, 0), goal, MoverClass::Medium);
        assert_eq!(alt, Some(Point::new(1, 0)));
        assert_eq!(c.state(), MoveState::BlockedRetry);
        assert!(nav.cache().is_empty());

        // Holding in place resolves to an empty route.
        c.coordinate(&mut nav, &map, Point::new(1, 0), goal, MoverClass::Medium);
        assert_eq!(c.state(), MoveState::Idle);
    }

    #[test]
    fn explored_only_after_fresh_search() {
        let map = TileMap::new(6, 6);
        let cfg = NavConfig::default()
            .with_search(SearchConfig::default().with_record_explored(true));
        let mut nav = Navigator::for_map(&map, cfg);
        let start = Point::new(0, 0);
        let goal = Point::new(5, 5);

        let mut a = MoveController::at_tile(ME, start, MoveConfig::default());
        a.coordinate(&mut nav, &map, start, goal, MoverClass::Medium);
        assert!(!a.explored().is_empty());

        let mut b = MoveController::at_tile(UnitId(2), start, MoveConfig::default());
        b.coordinate(&mut nav, &map, start, goal, MoverClass::Medium);
        assert!(b.explored().is_empty());
        assert!(Path::ptr_eq(a.path(), b.path()));
    }
}
