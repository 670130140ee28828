//! Orthogonal slicing: dominant-edge frame, width plan, rotate back, clip.

use geo::Polygon;

use estate_core::{Deadline, Pt};
use estate_geom::kernel;

use crate::classify::BlockMetrics;
use crate::error::SubdivResult;
use crate::solver::{self, FrontageSpec};

// ── Parameters ────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug)]
pub struct SliceParams {
    pub min_width_m: f64,
    pub max_width_m: f64,
    pub target_width_m: f64,
    /// Front and rear setback subtracted from the block depth, metres.
    pub setback_m: f64,
    /// A lot is kept only if clipping to the block preserves this fraction
    /// of the ideal rectangle's area.
    pub min_clip_ratio: f64,
}

// ── Output ────────────────────────────────────────────────────────────────────

/// One emitted lot.
#[derive(Clone, Debug)]
pub struct LotRect {
    /// Lot polygon in global coordinates (the ideal rectangle clipped to
    /// the block).
    pub polygon: Polygon<f64>,
    pub width_m: f64,
    pub depth_m: f64,
    pub area_m2: f64,
    pub centroid: Pt,
}

/// Lots produced from one block.
pub struct SliceResult {
    pub lots: Vec<LotRect>,
    /// The frontage solver hit its deadline; the plan is best-so-far.
    pub timed_out: bool,
}

// ── Slicer ────────────────────────────────────────────────────────────────────

/// Subdivide one commercial block.
///
/// 1. Rotate the block by −θ (θ from the dominant edge) around its
///    centroid so the frontage lies along +x.
/// 2. Read frontage L and depth D off the axis-aligned bounds.
/// 3. Solve the integer width plan for L.
/// 4. Emit lot rectangles `[x₀+Σw, setback] × [w, D−2·setback]`, rotate
///    them back by +θ, and clip each to the original block.
/// 5. Drop lots whose clipped area falls under `min_clip_ratio` of the
///    ideal rectangle (the block was not rectangular there).
pub fn slice_block(
    block: &Polygon<f64>,
    metrics: &BlockMetrics,
    params: &SliceParams,
    deadline: Deadline,
) -> SubdivResult<SliceResult> {
    let centre = kernel::centroid(block)?;
    let theta = metrics.dominant_edge.y.atan2(metrics.dominant_edge.x);
    let aligned = kernel::rotate_rad(block, -theta, centre);
    let (min, max) = kernel::bounds(&aligned)?;

    let frontage = max.x - min.x;
    let depth = (max.y - min.y) - 2.0 * params.setback_m;
    if depth <= 0.0 {
        return Err(crate::error::SolverError::Infeasible);
    }

    let plan = solver::solve_frontage(
        &FrontageSpec {
            frontage_m: frontage,
            min_width_m: params.min_width_m,
            max_width_m: params.max_width_m,
            target_width_m: params.target_width_m,
        },
        deadline,
    )?;

    let y0 = min.y + params.setback_m;
    let mut lots = Vec::with_capacity(plan.lot_count());
    let mut cursor = min.x;
    for width in plan.widths_m() {
        let rect = kernel::rect_poly(
            Pt::new(cursor, y0),
            Pt::new(cursor + width, y0 + depth),
        );
        cursor += width;

        let rect_global = kernel::rotate_rad(&rect, theta, centre);
        let clipped = kernel::intersection(&rect_global, block);
        let Some(part) = kernel::largest_part(&clipped) else { continue };
        let part_area = kernel::area(&part);
        if part_area < params.min_clip_ratio * width * depth {
            continue;
        }
        let centroid = kernel::centroid(&part)?;
        lots.push(LotRect {
            polygon: part,
            width_m: width,
            depth_m: depth,
            area_m2: part_area,
            centroid,
        });
    }

    Ok(SliceResult { lots, timed_out: plan.timed_out })
}
