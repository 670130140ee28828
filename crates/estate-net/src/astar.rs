//! A* over the road raster.
//!
//! Costs are integers in milli-cells so heap ordering is exact and
//! deterministic: straight moves cost 1000, diagonal moves 1414.  The
//! heuristics match: Manhattan for 4-connectivity, octile for
//! 8-connectivity.  Both are admissible, so the first goal pop is optimal.
//!
//! The heap orders by (f, node index) — the index tie-break makes expansion
//! order, and therefore the reconstructed path, identical across runs.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::raster::RoadRaster;

/// Neighbourhood shape.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Connectivity {
    Four,
    Eight,
}

/// A found path, start and goal cells inclusive.
#[derive(Debug, Clone)]
pub struct GridPath {
    pub cells: Vec<(usize, usize)>,
    /// Total cost in milli-cells (1000 per straight step, 1414 diagonal).
    pub cost_milli: u64,
}

impl GridPath {
    /// Number of moves (cells minus one).
    pub fn steps(&self) -> usize {
        self.cells.len().saturating_sub(1)
    }
}

const STRAIGHT: u64 = 1000;
const DIAGONAL: u64 = 1414;

/// A* from `start` to `goal`.  `None` when no path exists or `start` is
/// blocked.
pub fn astar(
    raster: &RoadRaster,
    start: (usize, usize),
    goal: (usize, usize),
    conn: Connectivity,
) -> Option<GridPath> {
    if raster.is_blocked(start) || raster.is_blocked(goal) {
        return None;
    }
    if start == goal {
        return Some(GridPath { cells: vec![start], cost_milli: 0 });
    }

    let cols = raster.cols();
    let rows = raster.rows();
    let idx = |c: (usize, usize)| c.1 * cols + c.0;
    let cell = |i: usize| (i % cols, i / cols);

    let mut g = vec![u64::MAX; cols * rows];
    let mut prev = vec![usize::MAX; cols * rows];
    g[idx(start)] = 0;

    let mut heap: BinaryHeap<Reverse<(u64, usize)>> = BinaryHeap::new();
    heap.push(Reverse((heuristic(start, goal, conn), idx(start))));

    while let Some(Reverse((f, node))) = heap.pop() {
        let here = cell(node);
        if here == goal {
            return Some(reconstruct(prev, node, g[node], cols));
        }
        // Skip stale heap entries.
        if f > g[node].saturating_add(heuristic(here, goal, conn)) {
            continue;
        }

        for (dx, dy, step) in neighbours(conn) {
            let nx = here.0 as i64 + dx;
            let ny = here.1 as i64 + dy;
            if nx < 0 || ny < 0 || nx as usize >= cols || ny as usize >= rows {
                continue;
            }
            let next = (nx as usize, ny as usize);
            if raster.is_blocked(next) {
                continue;
            }
            let cost = g[node].saturating_add(*step);
            if cost < g[idx(next)] {
                g[idx(next)] = cost;
                prev[idx(next)] = node;
                heap.push(Reverse((cost + heuristic(next, goal, conn), idx(next))));
            }
        }
    }
    None
}

/// Path from a lot cell to the nearest road cell: goal discovery plus A*.
pub fn path_to_road(
    raster: &RoadRaster,
    start: (usize, usize),
    search_radius: usize,
    conn: Connectivity,
) -> Option<GridPath> {
    let goal = raster.nearest_road_cell(start, search_radius)?;
    astar(raster, start, goal, conn)
}

// ── Internals ─────────────────────────────────────────────────────────────────

fn neighbours(conn: Connectivity) -> &'static [(i64, i64, u64)] {
    const FOUR: [(i64, i64, u64); 4] =
        [(1, 0, STRAIGHT), (-1, 0, STRAIGHT), (0, 1, STRAIGHT), (0, -1, STRAIGHT)];
    const EIGHT: [(i64, i64, u64); 8] = [
        (1, 0, STRAIGHT),
        (-1, 0, STRAIGHT),
        (0, 1, STRAIGHT),
        (0, -1, STRAIGHT),
        (1, 1, DIAGONAL),
        (1, -1, DIAGONAL),
        (-1, 1, DIAGONAL),
        (-1, -1, DIAGONAL),
    ];
    match conn {
        Connectivity::Four => &FOUR,
        Connectivity::Eight => &EIGHT,
    }
}

/// Admissible distance estimate: Manhattan (4-conn) or octile (8-conn).
fn heuristic(from: (usize, usize), to: (usize, usize), conn: Connectivity) -> u64 {
    let dx = from.0.abs_diff(to.0) as u64;
    let dy = from.1.abs_diff(to.1) as u64;
    match conn {
        Connectivity::Four => STRAIGHT * (dx + dy),
        Connectivity::Eight => {
            let (lo, hi) = (dx.min(dy), dx.max(dy));
            STRAIGHT * hi + (DIAGONAL - STRAIGHT) * lo
        }
    }
}

fn reconstruct(prev: Vec<usize>, goal: usize, cost: u64, cols: usize) -> GridPath {
    let mut cells = Vec::new();
    let mut cur = goal;
    loop {
        cells.push((cur % cols, cur / cols));
        if prev[cur] == usize::MAX {
            break;
        }
        cur = prev[cur];
    }
    cells.reverse();
    GridPath { cells, cost_milli: cost }
}
