//! Buffering built on boolean ops.
//!
//! The kernel does not re-implement polygon offsetting from scratch.  A
//! buffer is the union (outward) or difference (inward) of the polygon with
//! a *band*: per-segment quads of width 2·|d| centred on the boundary,
//! extended by |d| past each endpoint so square caps fill the corner gaps.
//! Square caps approximate mitre joins, which keep road intersections clean;
//! the sub-1 % corner artefacts are inside the tolerance the road stage
//! budgets for.

use geo::{LineString, MultiPolygon, Polygon};

use estate_core::{COORD_EPS, Pt};

use crate::error::{GeomResult, GeometryError};
use crate::kernel;

/// Offset a polygon by `d` metres: outward for `d > 0`, inward for `d < 0`.
///
/// An inward offset that consumes the whole polygon returns an empty
/// multipolygon rather than an error; vanishing is a legitimate outcome for
/// thin inputs.
pub fn buffer_polygon(poly: &Polygon<f64>, d: f64) -> GeomResult<MultiPolygon<f64>> {
    if !d.is_finite() {
        return Err(GeometryError::InvalidInput("non-finite buffer distance".into()));
    }
    if d.abs() < COORD_EPS {
        return Ok(MultiPolygon::new(vec![poly.clone()]));
    }

    let mut band_quads = Vec::new();
    ring_band(poly.exterior(), d.abs(), &mut band_quads);
    for hole in poly.interiors() {
        ring_band(hole, d.abs(), &mut band_quads);
    }
    let band = kernel::union_all(&band_quads);
    let subject = MultiPolygon::new(vec![poly.clone()]);

    let result = if d > 0.0 {
        kernel::union_multi(&subject, &band)
    } else {
        kernel::difference_multi(&subject, &band)
    };
    Ok(result)
}

/// Footprint of a polyline buffered to `width` (centreline ± width/2),
/// square caps.
pub fn polyline_footprint(pts: &[Pt], width: f64) -> GeomResult<MultiPolygon<f64>> {
    if pts.len() < 2 {
        return Err(GeometryError::InvalidInput("polyline needs at least 2 points".into()));
    }
    let segments: Vec<(Pt, Pt)> = pts.windows(2).map(|w| (w[0], w[1])).collect();
    segments_footprint(&segments, width)
}

/// Footprint of a set of independent centreline segments buffered to
/// `width`.  Used for road networks, where segments meet at junctions and
/// the square caps close the joints.
pub fn segments_footprint(segments: &[(Pt, Pt)], width: f64) -> GeomResult<MultiPolygon<f64>> {
    if !(width.is_finite() && width > 0.0) {
        return Err(GeometryError::InvalidInput("footprint width must be positive".into()));
    }
    let half = width * 0.5;
    let quads: Vec<Polygon<f64>> = segments
        .iter()
        .filter_map(|&(a, b)| segment_quad(a, b, half, half))
        .collect();
    if quads.is_empty() {
        return Err(GeometryError::DegenerateResult("all footprint segments degenerate"));
    }
    Ok(kernel::union_all(&quads))
}

// ── Internals ─────────────────────────────────────────────────────────────────

fn ring_band(ls: &LineString<f64>, half: f64, out: &mut Vec<Polygon<f64>>) {
    for w in ls.0.windows(2) {
        let (a, b) = (kernel::pt(w[0]), kernel::pt(w[1]));
        if let Some(quad) = segment_quad(a, b, half, half) {
            out.push(quad);
        }
    }
}

/// Oriented rectangle of half-width `half` around segment `a`–`b`, extended
/// `cap` beyond both endpoints.  `None` for zero-length segments.
fn segment_quad(a: Pt, b: Pt, half: f64, cap: f64) -> Option<Polygon<f64>> {
    let dir = (b - a).unit()?;
    let n = dir.perp().scale(half);
    let a = a - dir.scale(cap);
    let b = b + dir.scale(cap);
    Some(Polygon::new(
        kernel::ring(&[a + n, b + n, b - n, a - n]),
        vec![],
    ))
}
