//! R-tree spatial indexes.
//!
//! Both indexes are bulk-loaded per collection and do not outlive it:
//! entries store the position (or envelope) plus the item's index into the
//! caller's vector.  Queries never miss a true positive; they may return
//! false positives that the caller filters with an exact predicate.
//!
//! Query results are sorted by id so downstream iteration order is
//! deterministic regardless of tree shape.

use geo::Polygon;
use rstar::{AABB, PointDistance, RTree, RTreeObject};

use geo::BoundingRect;

use estate_core::Pt;

// ── PolyIndex ─────────────────────────────────────────────────────────────────

/// Envelope entry: the axis-aligned bounding box of one polygon.
#[derive(Clone)]
struct EnvelopeEntry {
    min: [f64; 2],
    max: [f64; 2],
    id: u32,
}

impl RTreeObject for EnvelopeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

impl PointDistance for EnvelopeEntry {
    /// Squared distance from a point to the envelope (zero inside).
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = (self.min[0] - point[0]).max(0.0).max(point[0] - self.max[0]);
        let dy = (self.min[1] - point[1]).max(0.0).max(point[1] - self.max[1]);
        dx * dx + dy * dy
    }
}

/// R-tree over polygon envelopes for O(log n) candidate queries.
pub struct PolyIndex {
    tree: RTree<EnvelopeEntry>,
}

impl PolyIndex {
    /// Bulk-load from a polygon collection.  Ids are positions in `polys`;
    /// polygons without a bounding rect (empty) are skipped.
    pub fn build(polys: &[Polygon<f64>]) -> Self {
        let entries: Vec<EnvelopeEntry> = polys
            .iter()
            .enumerate()
            .filter_map(|(i, p)| {
                let rect = p.bounding_rect()?;
                Some(EnvelopeEntry {
                    min: [rect.min().x, rect.min().y],
                    max: [rect.max().x, rect.max().y],
                    id: i as u32,
                })
            })
            .collect();
        Self { tree: RTree::bulk_load(entries) }
    }

    /// Ids of all polygons whose envelope intersects the query rectangle.
    pub fn query_envelope(&self, min: Pt, max: Pt) -> Vec<u32> {
        let query = AABB::from_corners([min.x, min.y], [max.x, max.y]);
        let mut ids: Vec<u32> = self
            .tree
            .locate_in_envelope_intersecting(&query)
            .map(|e| e.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Up to `k` polygons nearest to `p` by envelope distance.
    pub fn query_nearest(&self, p: Pt, k: usize) -> Vec<u32> {
        self.tree
            .nearest_neighbor_iter(&[p.x, p.y])
            .take(k)
            .map(|e| e.id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

// ── PointIndex ────────────────────────────────────────────────────────────────

#[derive(Clone)]
struct PointEntry {
    pos: [f64; 2],
    id: u32,
}

impl RTreeObject for PointEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.pos)
    }
}

impl PointDistance for PointEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.pos[0] - point[0];
        let dy = self.pos[1] - point[1];
        dx * dx + dy * dy
    }
}

/// R-tree over points (lot centroids, graph nodes).
pub struct PointIndex {
    tree: RTree<PointEntry>,
}

impl PointIndex {
    pub fn build(points: &[Pt]) -> Self {
        let entries: Vec<PointEntry> = points
            .iter()
            .enumerate()
            .map(|(i, p)| PointEntry { pos: [p.x, p.y], id: i as u32 })
            .collect();
        Self { tree: RTree::bulk_load(entries) }
    }

    /// Ids of all points within `radius` of `p`, sorted ascending.
    pub fn within_radius(&self, p: Pt, radius: f64) -> Vec<u32> {
        let mut ids: Vec<u32> = self
            .tree
            .locate_within_distance([p.x, p.y], radius * radius)
            .map(|e| e.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Nearest point id, or `None` for an empty index.
    pub fn nearest(&self, p: Pt) -> Option<u32> {
        self.tree.nearest_neighbor(&[p.x, p.y]).map(|e| e.id)
    }

    /// Up to `k` nearest point ids, ascending by distance.
    pub fn k_nearest(&self, p: Pt, k: usize) -> Vec<u32> {
        self.tree
            .nearest_neighbor_iter(&[p.x, p.y])
            .take(k)
            .map(|e| e.id)
            .collect()
    }
}
