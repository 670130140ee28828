//! Drainage planning.
//!
//! Two modes produce one arrow per lot:
//!
//! - **Direct**: unit vector from the lot centroid straight toward the
//!   wastewater treatment plant (WWTP).
//! - **Network**: the lot attaches to its nearest road-graph node; the
//!   arrow points along the first edge of the shortest road path toward the
//!   WWTP (Dijkstra from the WWTP node).  Lots whose attach node cannot
//!   reach the WWTP fall back to the direct vector.
//!
//! The WWTP itself is the lowest-elevation exterior vertex of the site when
//! an elevation model is supplied, otherwise the site centroid — fully
//! deterministic either way.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use geo::Polygon;

use estate_core::Pt;
use estate_geom::kernel;
use estate_geom::{GeomResult, PointIndex};

// ── ElevationModel ────────────────────────────────────────────────────────────

/// Terrain elevation lookup.  Implementations must be pure.
pub trait ElevationModel: Send + Sync {
    /// Elevation in metres at `p`.
    fn elevation(&self, p: Pt) -> f64;
}

impl<F: Fn(Pt) -> f64 + Send + Sync> ElevationModel for F {
    fn elevation(&self, p: Pt) -> f64 {
        self(p)
    }
}

// ── RoadGraph ─────────────────────────────────────────────────────────────────

/// Undirected road graph built from centreline segments.
///
/// Endpoints within `snap_tol` merge into one node; edge weights are
/// Euclidean lengths.
pub struct RoadGraph {
    nodes: Vec<Pt>,
    adjacency: Vec<Vec<(u32, f64)>>,
    index: PointIndex,
}

impl RoadGraph {
    pub fn from_segments(segments: &[(Pt, Pt)], snap_tol: f64) -> Self {
        let mut nodes: Vec<Pt> = Vec::new();
        let mut adjacency: Vec<Vec<(u32, f64)>> = Vec::new();

        let mut node_of = |p: Pt, nodes: &mut Vec<Pt>, adjacency: &mut Vec<Vec<(u32, f64)>>| {
            for (i, n) in nodes.iter().enumerate() {
                if n.distance(p) <= snap_tol {
                    return i as u32;
                }
            }
            nodes.push(p);
            adjacency.push(Vec::new());
            (nodes.len() - 1) as u32
        };

        for &(a, b) in segments {
            let length = a.distance(b);
            if length <= snap_tol {
                continue;
            }
            let na = node_of(a, &mut nodes, &mut adjacency);
            let nb = node_of(b, &mut nodes, &mut adjacency);
            if na == nb {
                continue;
            }
            adjacency[na as usize].push((nb, length));
            adjacency[nb as usize].push((na, length));
        }
        let index = PointIndex::build(&nodes);
        Self { nodes, adjacency, index }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_pos(&self, node: u32) -> Pt {
        self.nodes[node as usize]
    }

    /// Nearest graph node to `p`, or `None` for an empty graph.
    pub fn nearest_node(&self, p: Pt) -> Option<u32> {
        self.index.nearest(p)
    }

    /// Single-source shortest paths (costs in metres).  Returns
    /// `(distance, previous-node)` arrays; unreachable nodes keep
    /// `f64::INFINITY` / `u32::MAX`.
    pub fn dijkstra(&self, source: u32) -> (Vec<f64>, Vec<u32>) {
        let n = self.nodes.len();
        let mut dist = vec![f64::INFINITY; n];
        let mut prev = vec![u32::MAX; n];
        dist[source as usize] = 0.0;

        // Min-heap over milli-metre integer costs; the node index as the
        // secondary key keeps expansion order deterministic.
        let mut heap: BinaryHeap<Reverse<(u64, u32)>> = BinaryHeap::new();
        heap.push(Reverse((0, source)));

        while let Some(Reverse((cost_mm, node))) = heap.pop() {
            let cost = cost_mm as f64 / 1000.0;
            if cost > dist[node as usize] + 1e-9 {
                continue;
            }
            for &(next, weight) in &self.adjacency[node as usize] {
                let candidate = dist[node as usize] + weight;
                if candidate + 1e-9 < dist[next as usize] {
                    dist[next as usize] = candidate;
                    prev[next as usize] = node;
                    heap.push(Reverse(((candidate * 1000.0) as u64, next)));
                }
            }
        }
        (dist, prev)
    }
}

// ── WWTP choice ───────────────────────────────────────────────────────────────

/// The drainage sink: lowest-elevation exterior vertex under the model, or
/// the site centroid without one.  Elevation ties resolve by (y, x) order.
pub fn choose_wwtp(
    site: &Polygon<f64>,
    elevation: Option<&dyn ElevationModel>,
) -> GeomResult<Pt> {
    let Some(model) = elevation else {
        return kernel::centroid(site);
    };
    let mut best: Option<(f64, Pt)> = None;
    for c in &site.exterior().0 {
        let p = kernel::pt(*c);
        let e = model.elevation(p);
        let better = match best {
            None => true,
            Some((be, bp)) => {
                e < be || (e == be && (p.y, p.x) < (bp.y, bp.x))
            }
        };
        if better {
            best = Some((e, p));
        }
    }
    best.map(|(_, p)| p)
        .ok_or(estate_geom::GeometryError::DegenerateResult("site has no vertices"))
}

// ── Arrows ────────────────────────────────────────────────────────────────────

/// One drainage arrow per lot.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DrainageArrow {
    pub origin: Pt,
    /// Unit direction.
    pub direction: Pt,
    /// Display length, metres.
    pub magnitude: f64,
}

/// Direct-mode arrows: straight toward the WWTP.
pub fn direct_arrows(centroids: &[Pt], wwtp: Pt, arrow_length: f64) -> Vec<DrainageArrow> {
    centroids
        .iter()
        .map(|&origin| DrainageArrow {
            origin,
            direction: (wwtp - origin).unit().unwrap_or(Pt::new(0.0, -1.0)),
            magnitude: arrow_length,
        })
        .collect()
}

/// Network-mode arrows: along the first road edge toward the WWTP.
///
/// Lots attach to their nearest graph node; with Dijkstra rooted at the
/// WWTP node, `prev[attach]` is the next hop downstream.  Unreachable
/// attach nodes (or an empty graph) fall back to the direct vector.
pub fn network_arrows(
    centroids: &[Pt],
    wwtp: Pt,
    graph: &RoadGraph,
    arrow_length: f64,
) -> Vec<DrainageArrow> {
    let Some(wwtp_node) = graph.nearest_node(wwtp) else {
        return direct_arrows(centroids, wwtp, arrow_length);
    };
    let (dist, prev) = graph.dijkstra(wwtp_node);

    centroids
        .iter()
        .map(|&origin| {
            let direction = graph
                .nearest_node(origin)
                .filter(|&attach| dist[attach as usize].is_finite())
                .and_then(|attach| {
                    let hop = if attach == wwtp_node {
                        wwtp
                    } else {
                        graph.node_pos(prev[attach as usize])
                    };
                    (hop - graph.node_pos(attach)).unit()
                })
                .or_else(|| (wwtp - origin).unit())
                .unwrap_or(Pt::new(0.0, -1.0));
            DrainageArrow { origin, direction, magnitude: arrow_length }
        })
        .collect()
}
