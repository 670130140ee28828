//! Electrical trunk network: cut-off graph, Kruskal MST, loop redundancy,
//! and an approximate Steiner variant.

use spade::{DelaunayTriangulation, Point2, Triangulation};

use estate_core::Pt;
use estate_geom::PointIndex;

use crate::error::{NetResult, NetworkError};

// ── Edges ─────────────────────────────────────────────────────────────────────

/// One undirected network edge between node indices.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MstEdge {
    pub a: u32,
    pub b: u32,
    pub length: f64,
}

/// The planned network.
#[derive(Debug)]
pub struct MstOutcome {
    /// Spanning-tree (or forest) edges.
    pub tree: Vec<MstEdge>,
    /// Ring-closing extra edges for fault tolerance.
    pub redundancy: Vec<MstEdge>,
    /// Connected components over the candidate graph (singular when the
    /// graph is connected).
    pub components: Vec<Vec<u32>>,
    /// Total tree length, metres.
    pub total_length: f64,
}

// ── Union-find ────────────────────────────────────────────────────────────────

struct UnionFind {
    parent: Vec<u32>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self { parent: (0..n as u32).collect(), rank: vec![0; n] }
    }

    fn find(&mut self, x: u32) -> u32 {
        let mut root = x;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        // Path compression.
        let mut cur = x;
        while self.parent[cur as usize] != root {
            let next = self.parent[cur as usize];
            self.parent[cur as usize] = root;
            cur = next;
        }
        root
    }

    fn union(&mut self, a: u32, b: u32) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        match self.rank[ra as usize].cmp(&self.rank[rb as usize]) {
            std::cmp::Ordering::Less => self.parent[ra as usize] = rb,
            std::cmp::Ordering::Greater => self.parent[rb as usize] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb as usize] = ra;
                self.rank[ra as usize] += 1;
            }
        }
        true
    }
}

// ── Candidate edges ───────────────────────────────────────────────────────────

/// All point pairs within `max_edge_distance`, sorted by (length, a, b) for
/// deterministic Kruskal order.  The R-tree keeps this out of O(n²) for
/// clustered layouts.
fn candidate_edges(points: &[Pt], max_edge_distance: f64) -> Vec<MstEdge> {
    let index = PointIndex::build(points);
    let mut edges = Vec::new();
    for (i, p) in points.iter().enumerate() {
        for j in index.within_radius(*p, max_edge_distance) {
            if (j as usize) > i {
                edges.push(MstEdge {
                    a: i as u32,
                    b: j,
                    length: p.distance(points[j as usize]),
                });
            }
        }
    }
    edges.sort_by(|x, y| {
        x.length
            .total_cmp(&y.length)
            .then(x.a.cmp(&y.a))
            .then(x.b.cmp(&y.b))
    });
    edges
}

fn components_of(n: usize, uf: &mut UnionFind) -> Vec<Vec<u32>> {
    let mut by_root: std::collections::BTreeMap<u32, Vec<u32>> = Default::default();
    for i in 0..n as u32 {
        by_root.entry(uf.find(i)).or_default().push(i);
    }
    by_root.into_values().collect()
}

// ── MST + redundancy ──────────────────────────────────────────────────────────

/// Kruskal over the cut-off graph; the forest is returned even when the
/// graph is disconnected (callers inspect `components`).
pub fn build_forest(points: &[Pt], max_edge_distance: f64, redundancy_ratio: f64) -> MstOutcome {
    let n = points.len();
    if n == 0 {
        return MstOutcome { tree: vec![], redundancy: vec![], components: vec![], total_length: 0.0 };
    }

    let candidates = candidate_edges(points, max_edge_distance);
    let mut uf = UnionFind::new(n);
    let mut tree = Vec::with_capacity(n.saturating_sub(1));
    let mut non_tree = Vec::new();
    for edge in candidates {
        if uf.union(edge.a, edge.b) {
            tree.push(edge);
        } else {
            non_tree.push(edge);
        }
    }

    // Redundancy: the shortest ring-closing non-tree edges.  Every non-tree
    // edge joins two nodes already connected through the tree, so each one
    // closes a ring; take them in length order.
    let extra_count = (redundancy_ratio * n as f64).ceil() as usize;
    let redundancy: Vec<MstEdge> = non_tree.into_iter().take(extra_count).collect();

    let total_length = tree.iter().map(|e| e.length).sum();
    let components = components_of(n, &mut uf);
    MstOutcome { tree, redundancy, components, total_length }
}

/// Connected MST with redundancy.
///
/// Returns [`NetworkError::Disconnected`] (with the components) when the
/// cut-off graph cannot span all nodes.
pub fn build_network(
    points: &[Pt],
    max_edge_distance: f64,
    redundancy_ratio: f64,
) -> NetResult<MstOutcome> {
    let outcome = build_forest(points, max_edge_distance, redundancy_ratio);
    if outcome.components.len() > 1 {
        return Err(NetworkError::Disconnected { components: outcome.components });
    }
    Ok(outcome)
}

// ── Steiner variant ───────────────────────────────────────────────────────────

/// Steiner candidates: centroids of the Delaunay triangles over the
/// terminals.  Degenerate inputs (collinear, < 3 points) yield none.
pub fn steiner_candidates(terminals: &[Pt]) -> Vec<Pt> {
    if terminals.len() < 3 {
        return vec![];
    }
    let points: Vec<Point2<f64>> =
        terminals.iter().map(|p| Point2::new(p.x, p.y)).collect();
    let Ok(triangulation) = DelaunayTriangulation::<Point2<f64>>::bulk_load(points) else {
        return vec![];
    };
    triangulation
        .inner_faces()
        .map(|face| {
            let [a, b, c] = face.positions();
            Pt::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0)
        })
        .collect()
}

/// Approximate Steiner tree: MST over terminals plus candidate points, then
/// iterative removal of candidate leaves (a candidate only earns its place
/// by joining at least two branches).
///
/// Returns the kept node set (terminals first, in order, then surviving
/// candidates) and the edges over it.
pub fn steiner_tree(
    terminals: &[Pt],
    candidates: &[Pt],
    max_edge_distance: f64,
) -> NetResult<(Vec<Pt>, Vec<MstEdge>)> {
    let n_terminals = terminals.len();
    let mut nodes: Vec<Pt> = terminals.to_vec();
    nodes.extend_from_slice(candidates);

    let outcome = build_forest(&nodes, max_edge_distance, 0.0);
    if outcome.components.len() > 1 {
        return Err(NetworkError::Disconnected { components: outcome.components });
    }

    let mut edges = outcome.tree;
    // Prune candidate leaves until fixed point.
    loop {
        let mut degree = vec![0u32; nodes.len()];
        for e in &edges {
            degree[e.a as usize] += 1;
            degree[e.b as usize] += 1;
        }
        let before = edges.len();
        edges.retain(|e| {
            let leaf_candidate = |v: u32| v as usize >= n_terminals && degree[v as usize] == 1;
            !(leaf_candidate(e.a) || leaf_candidate(e.b))
        });
        if edges.len() == before {
            break;
        }
    }

    // Compact the node list to terminals plus candidates still referenced.
    let mut keep = vec![false; nodes.len()];
    for v in 0..n_terminals {
        keep[v] = true;
    }
    for e in &edges {
        keep[e.a as usize] = true;
        keep[e.b as usize] = true;
    }
    let mut remap = vec![u32::MAX; nodes.len()];
    let mut kept_nodes = Vec::new();
    for (i, k) in keep.iter().enumerate() {
        if *k {
            remap[i] = kept_nodes.len() as u32;
            kept_nodes.push(nodes[i]);
        }
    }
    let edges = edges
        .into_iter()
        .map(|e| MstEdge { a: remap[e.a as usize], b: remap[e.b as usize], length: e.length })
        .collect();
    Ok((kept_nodes, edges))
}
