//! The layout record.
//!
//! All geometry is stored as plain `Pt` rings so the record serialises
//! without dragging geometry-crate internals across the API boundary.  The
//! computation layers exchange `geo` polygons; conversion happens once at
//! assembly.  A layout is built by exactly one pipeline run and then
//! frozen.

use geo::{LineString, Polygon};

use estate_core::{BlockId, FatalCode, LayoutStatus, LotId, Pt, Warning};
use estate_geom::kernel;
use estate_net::{DrainageArrow, MstEdge, Transformer};
use estate_roads::{RoadClass, RoadSegment};
use estate_subdiv::BlockClass;

// ── Geometry records ──────────────────────────────────────────────────────────

/// A polygon as plain rings (closing point included).
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PolygonRec {
    pub exterior: Vec<Pt>,
    pub holes: Vec<Vec<Pt>>,
}

impl PolygonRec {
    pub fn from_geo(poly: &Polygon<f64>) -> Self {
        Self {
            exterior: kernel::ring_pts(poly.exterior()),
            holes: poly.interiors().iter().map(kernel::ring_pts).collect(),
        }
    }

    /// Rebuild the `geo` polygon (no validity re-check; layouts only hold
    /// geometry that already passed through the kernel).
    pub fn to_geo(&self) -> Polygon<f64> {
        Polygon::new(
            kernel::ring(&self.exterior),
            self.holes.iter().map(|h| kernel::ring(h)).collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.exterior.is_empty()
    }
}

/// A road centreline piece with class and footprint width.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoadRec {
    pub a: Pt,
    pub b: Pt,
    pub class: RoadClass,
    pub width_m: f64,
}

impl From<&RoadSegment> for RoadRec {
    fn from(s: &RoadSegment) -> Self {
        Self { a: s.a, b: s.b, class: s.class, width_m: s.width }
    }
}

/// A classified block.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockRec {
    pub id: BlockId,
    pub polygon: PolygonRec,
    pub class: BlockClass,
    pub area_m2: f64,
    pub rectangularity: f64,
    pub aspect: f64,
}

/// A sellable lot inside a block.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LotRec {
    pub id: LotId,
    pub block: BlockId,
    pub polygon: PolygonRec,
    pub width_m: f64,
    pub depth_m: f64,
    pub area_m2: f64,
    pub centroid: Pt,
}

// ── Metrics ───────────────────────────────────────────────────────────────────

/// Summary metrics over one layout.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutMetrics {
    /// Sum of commercial block areas, m².
    pub total_commercial_area: f64,
    /// Sum of green block areas, m².
    pub total_green_area: f64,
    /// Commercial area over site area, clamped to [0, 1].
    pub utilization_ratio: f64,
    /// Total electrical trunk (tree) length, metres.
    pub mst_length_m: f64,
    pub average_lot_area: f64,
    /// Blocks discarded outright plus blocks that fell back to green after
    /// an infeasible subdivision.
    pub discarded_blocks: usize,
}

// ── Layout ────────────────────────────────────────────────────────────────────

/// The final, frozen result of one pipeline run.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Layout {
    pub status: LayoutStatus,
    /// Present only when `status == Failed`.
    pub fatal: Option<FatalCode>,
    pub warnings: Vec<Warning>,

    pub site: PolygonRec,
    pub roads: Vec<RoadRec>,
    pub road_footprint: Vec<PolygonRec>,
    pub blocks: Vec<BlockRec>,
    pub lots: Vec<LotRec>,

    /// Electrical trunk edges over lot indices.
    pub mst_edges: Vec<MstEdge>,
    pub redundancy_edges: Vec<MstEdge>,
    pub transformers: Vec<Transformer>,
    pub drainage: Vec<DrainageArrow>,

    pub metrics: LayoutMetrics,
}

impl Layout {
    /// A failed layout: empty geometry, one fatal code.
    pub fn failed(code: FatalCode) -> Self {
        Self {
            status: LayoutStatus::Failed,
            fatal: Some(code),
            warnings: vec![],
            site: PolygonRec::default(),
            roads: vec![],
            road_footprint: vec![],
            blocks: vec![],
            lots: vec![],
            mst_edges: vec![],
            redundancy_edges: vec![],
            transformers: vec![],
            drainage: vec![],
            metrics: LayoutMetrics::default(),
        }
    }

    /// Total centreline length of the road network, metres.
    pub fn road_length_m(&self) -> f64 {
        self.roads.iter().map(|r| r.a.distance(r.b)).sum()
    }
}

/// Convenience for tests and exporters: site exterior as a `LineString`.
pub fn site_ring(layout: &Layout) -> LineString<f64> {
    kernel::ring(&layout.site.exterior)
}
