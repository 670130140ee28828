//! Block metrics and classification.
//!
//! Metrics derive from the minimum rotated rectangle (OBB):
//!
//! - `rectangularity = area(block) / area(OBB)` — 1.0 for rectangles;
//! - `aspect = longer OBB edge / shorter OBB edge`;
//! - `dominant_edge` — unit vector along the longer OBB edge (the frontage
//!   direction the slicer aligns to).
//!
//! Classification is a first-match decision table; `Service` exists in the
//! tag set for externally-supplied blocks but is never produced by the
//! table itself.

use geo::Polygon;

use estate_core::Pt;
use estate_geom::kernel;
use estate_geom::{GeomResult, GeometryError};

// ── BlockClass ────────────────────────────────────────────────────────────────

/// Block classification tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BlockClass {
    Commercial,
    Service,
    Green,
    Utility,
    Discard,
}

// ── BlockMetrics ──────────────────────────────────────────────────────────────

/// Shape measurements the classifier and slicer share.
#[derive(Clone, Debug)]
pub struct BlockMetrics {
    pub area: f64,
    pub perimeter: f64,
    /// area / OBB area, clamped to [0, 1].
    pub rectangularity: f64,
    /// longer OBB edge / shorter OBB edge (≥ 1).
    pub aspect: f64,
    /// Shorter OBB edge length in metres.
    pub obb_width: f64,
    /// Longer OBB edge length in metres.
    pub obb_length: f64,
    /// Unit vector along the longer OBB edge.
    pub dominant_edge: Pt,
}

/// Measure a block.  Fails only on degenerate geometry (no OBB, zero-length
/// edges).
pub fn metrics(block: &Polygon<f64>) -> GeomResult<BlockMetrics> {
    let area = kernel::area(block);
    let perimeter = kernel::perimeter(block);
    let obb = kernel::minimum_rotated_rect(block)?;
    let obb_area = kernel::area(&obb);
    if obb_area <= 0.0 {
        return Err(GeometryError::DegenerateResult("OBB has zero area"));
    }

    let coords = &obb.exterior().0;
    if coords.len() < 5 {
        return Err(GeometryError::DegenerateResult("OBB is not a quadrilateral"));
    }
    let e1 = kernel::pt(coords[1]) - kernel::pt(coords[0]);
    let e2 = kernel::pt(coords[2]) - kernel::pt(coords[1]);
    let (short, long_vec) = if e1.length() <= e2.length() { (e1, e2) } else { (e2, e1) };
    let obb_width = short.length();
    let obb_length = long_vec.length();
    if obb_width <= 0.0 {
        return Err(GeometryError::DegenerateResult("OBB collapsed to a segment"));
    }
    let dominant_edge = long_vec
        .unit()
        .ok_or(GeometryError::DegenerateResult("OBB edge has zero length"))?;

    Ok(BlockMetrics {
        area,
        perimeter,
        rectangularity: (area / obb_area).min(1.0),
        aspect: obb_length / obb_width,
        obb_width,
        obb_length,
        dominant_edge,
    })
}

// ── Classification ────────────────────────────────────────────────────────────

/// Decision-table thresholds.
#[derive(Copy, Clone, Debug)]
pub struct ClassifyParams {
    /// Blocks below this area are discarded outright, m².
    pub min_lot_area: f64,
    pub min_rectangularity: f64,
    pub max_aspect: f64,
    /// How close a block vertex must be to the site boundary to count as
    /// touching it, metres.
    pub boundary_tol: f64,
}

impl ClassifyParams {
    pub fn new(min_lot_area: f64, boundary_tol: f64) -> Self {
        Self {
            min_lot_area,
            min_rectangularity: 0.65,
            max_aspect: 4.0,
            boundary_tol,
        }
    }
}

/// First-match classification:
///
/// | Condition                                  | Class      |
/// |--------------------------------------------|------------|
/// | area < min_lot_area                        | Discard    |
/// | rectangularity < 0.65 or aspect > 4.0      | Green      |
/// | touches site boundary on one short edge    | Utility    |
/// | otherwise                                  | Commercial |
pub fn classify(
    block: &Polygon<f64>,
    m: &BlockMetrics,
    site: &Polygon<f64>,
    params: &ClassifyParams,
) -> BlockClass {
    if m.area < params.min_lot_area {
        return BlockClass::Discard;
    }
    if m.rectangularity < params.min_rectangularity || m.aspect > params.max_aspect {
        return BlockClass::Green;
    }
    let contact = boundary_contact_length(block, site, params.boundary_tol);
    if contact > 0.0 && contact <= m.obb_width * 1.2 {
        return BlockClass::Utility;
    }
    BlockClass::Commercial
}

/// Aesthetic tie-break score: `0.7·rectangularity + 0.3/aspect`.
pub fn aesthetic_score(m: &BlockMetrics) -> f64 {
    0.7 * m.rectangularity + 0.3 / m.aspect
}

/// Total length of block-exterior edges lying on the site boundary
/// (both endpoints within `tol` of the exterior ring).
fn boundary_contact_length(block: &Polygon<f64>, site: &Polygon<f64>, tol: f64) -> f64 {
    let on_boundary = |p: Pt| -> bool {
        site.exterior()
            .0
            .windows(2)
            .any(|w| {
                kernel::distance_point_to_segment(p, kernel::pt(w[0]), kernel::pt(w[1])) <= tol
            })
    };
    block
        .exterior()
        .0
        .windows(2)
        .filter_map(|w| {
            let (a, b) = (kernel::pt(w[0]), kernel::pt(w[1]));
            (on_boundary(a) && on_boundary(b)).then(|| a.distance(b))
        })
        .sum()
}
