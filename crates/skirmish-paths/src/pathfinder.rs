use std::collections::BinaryHeap;

use skirmish_core::{MoverClass, Point, Range, TileMap};

use crate::error::{PathError, PathResult};
use crate::path::Path;
use crate::pather::{AstarPather, SearchConfig, TilePather};

/// Sentinel cost of a node not reached yet.
pub const UNREACHABLE: i32 = i32::MAX;

const NO_PARENT: usize = usize::MAX;

// ---------------------------------------------------------------------------
// Search nodes
// ---------------------------------------------------------------------------

/// Per-tile search state. Nodes live in a flat arena indexed like the map,
/// and parents are arena indices.
#[derive(Debug, Clone)]
struct Node {
    g: i32,
    h: i32,
    f: i32,
    parent: usize,
    generation: u32,
    closed: bool,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            g: UNREACHABLE,
            h: 0,
            f: UNREACHABLE,
            parent: NO_PARENT,
            generation: 0,
            closed: false,
        }
    }
}

/// Open-set entry, ordered for `BinaryHeap` so that the lowest `f` pops
/// first and equal `f` pops in discovery order.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct NodeRef {
    idx: usize,
    f: i32,
    seq: u64,
}

impl Ord for NodeRef {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other.f.cmp(&self.f).then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for NodeRef {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

// ---------------------------------------------------------------------------
// Pathfinder
// ---------------------------------------------------------------------------

/// A* search over a rectangle of tiles.
///
/// The node arena, open list and neighbour buffer are kept between queries,
/// so searches allocate nothing after warm-up apart from the returned
/// [`Path`]. A generation counter lazily invalidates the arena instead of
/// clearing it.
#[derive(Debug)]
pub struct Pathfinder {
    rng: Range,
    width: usize,
    nodes: Vec<Node>,
    generation: u32,
    open: BinaryHeap<NodeRef>,
    nbuf: Vec<Point>,
    explored: Vec<Point>,
    config: SearchConfig,
    searches: u64,
}

impl Pathfinder {
    /// Create a pathfinder for the given rectangle.
    pub fn new(rng: Range, config: SearchConfig) -> Self {
        Self {
            rng,
            width: rng.width().max(0) as usize,
            nodes: vec![Node::default(); rng.len()],
            generation: 0,
            open: BinaryHeap::new(),
            nbuf: Vec::with_capacity(8),
            explored: Vec::new(),
            config,
            searches: 0,
        }
    }

    /// Replace the searched rectangle. The arena only grows.
    pub fn set_range(&mut self, rng: Range) {
        self.rng = rng;
        self.width = rng.width().max(0) as usize;
        if rng.len() > self.nodes.len() {
            self.nodes.clear();
            self.nodes.resize(rng.len(), Node::default());
            self.generation = 0;
        } else {
            self.bump_generation();
        }
        self.explored.clear();
    }

    /// The rectangle being searched.
    #[inline]
    pub fn range(&self) -> Range {
        self.rng
    }

    #[inline]
    pub fn config(&self) -> SearchConfig {
        self.config
    }

    pub fn set_config(&mut self, config: SearchConfig) {
        self.config = config;
        if !config.record_explored {
            self.explored.clear();
        }
    }

    /// Tiles expanded by the last search, in expansion order. Empty unless
    /// [`SearchConfig::record_explored`] is set.
    #[inline]
    pub fn explored(&self) -> &[Point] {
        &self.explored
    }

    /// Number of searches actually run (trivial and rejected queries are not
    /// counted).
    #[inline]
    pub fn searches(&self) -> u64 {
        self.searches
    }

    /// Shortest path for a `class` mover from `start` to `goal` on `map`.
    ///
    /// The path excludes `start`; `start == goal` yields an empty path. A goal
    /// the mover can never stand on fails fast with
    /// [`PathError::GoalBlocked`] without searching.
    pub fn find_path(
        &mut self,
        map: &TileMap,
        start: Point,
        goal: Point,
        class: MoverClass,
    ) -> PathResult<Path> {
        if map.bounds() != self.rng {
            self.set_range(map.bounds());
        }
        let pather = TilePather::new(map, class, self.config);
        if self.idx(start).is_some()
            && self.idx(goal).is_some()
            && start != goal
            && !pather.passable(goal)
        {
            self.explored.clear();
            return Err(PathError::GoalBlocked(goal));
        }
        self.astar(&pather, start, goal)
    }

    /// A* from `from` to `to` with any [`AstarPather`].
    ///
    /// Ties on `f` are broken first-discovered-first, so identical inputs
    /// always expand identical node sequences.
    pub fn astar<P: AstarPather>(
        &mut self,
        pather: &P,
        from: Point,
        to: Point,
    ) -> PathResult<Path> {
        self.explored.clear();
        let start_idx = self.idx(from).ok_or(PathError::OutOfBounds(from))?;
        let goal_idx = self.idx(to).ok_or(PathError::OutOfBounds(to))?;
        if start_idx == goal_idx {
            return Ok(Path::empty());
        }

        self.searches += 1;
        self.bump_generation();
        let cur_gen = self.generation;
        let record = self.config.record_explored;
        let mut seq: u64 = 0;

        {
            let h = pather.estimate(from, to);
            let node = &mut self.nodes[start_idx];
            *node = Node {
                g: 0,
                h,
                f: h,
                parent: NO_PARENT,
                generation: cur_gen,
                closed: false,
            };
        }
        self.open.clear();
        self.open.push(NodeRef {
            idx: start_idx,
            f: self.nodes[start_idx].f,
            seq,
        });

        let mut nbuf = std::mem::take(&mut self.nbuf);

        let found = loop {
            let Some(current) = self.open.pop() else {
                break false;
            };
            let ci = current.idx;
            {
                let node = &self.nodes[ci];
                // Stale entry: superseded by a cheaper push or already closed.
                if node.generation != cur_gen || node.closed || node.f != current.f {
                    continue;
                }
            }
            self.nodes[ci].closed = true;
            let cp = self.point(ci);
            if record {
                self.explored.push(cp);
            }
            if ci == goal_idx {
                break true;
            }

            let current_g = self.nodes[ci].g;
            nbuf.clear();
            pather.neighbors(cp, &mut nbuf);

            for &np in nbuf.iter() {
                let Some(ni) = self.idx(np) else {
                    continue;
                };
                let tentative = current_g + pather.cost(cp, np);
                let n = &mut self.nodes[ni];
                if n.generation == cur_gen {
                    if n.closed || tentative >= n.g {
                        continue;
                    }
                } else {
                    *n = Node {
                        generation: cur_gen,
                        h: pather.estimate(np, to),
                        ..Node::default()
                    };
                }
                n.g = tentative;
                n.f = tentative + n.h;
                n.parent = ci;
                seq += 1;
                self.open.push(NodeRef { idx: ni, f: n.f, seq });
            }
        };

        self.nbuf = nbuf;
        self.open.clear();

        if !found {
            log::debug!("no path from {from} to {to}");
            return Err(PathError::NotFound { from, to });
        }

        let mut points = Vec::new();
        let mut ci = goal_idx;
        while ci != start_idx {
            points.push(self.point(ci));
            ci = self.nodes[ci].parent;
        }
        points.reverse();
        Ok(Path::from(points))
    }

    // -----------------------------------------------------------------------
    // Arena helpers
    // -----------------------------------------------------------------------

    fn bump_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            // Wrapped: old stamps would look current again.
            for n in self.nodes.iter_mut() {
                n.generation = 0;
            }
            self.generation = 1;
        }
    }

    /// Flat arena index of `p`, or `None` if out of range.
    #[inline]
    fn idx(&self, p: Point) -> Option<usize> {
        if !self.rng.contains(p) {
            return None;
        }
        let x = (p.x - self.rng.min.x) as usize;
        let y = (p.y - self.rng.min.y) as usize;
        Some(y * self.width + x)
    }

    #[inline]
    fn point(&self, idx: usize) -> Point {
        let x = (idx % self.width) as i32 + self.rng.min.x;
        let y = (idx / self.width) as i32 + self.rng.min.y;
        Point::new(x, y)
    }
}
