//! Polygon operations.
//!
//! Boolean ops, area, centroids, and oriented bounding rectangles come from
//! the `geo` crate; this module adds validity checking, conversion between
//! [`Pt`] rings and `geo` types, snap-rounding, and the small exact
//! predicates the rest of the engine needs (point-segment distance, segment
//! clipping).
//!
//! All boolean-op results pass through [`clean`], which snaps coordinates to
//! the 1 µm grid, removes duplicate vertices, and drops rings whose area
//! vanished.  Outputs are therefore always valid-or-empty.

use geo::{
    Area, BooleanOps, BoundingRect, Centroid, Contains, Coord, Intersects, LineString,
    MinimumRotatedRect, MultiPolygon, Point, Polygon, Rotate, Simplify, Translate,
};

use estate_core::{COORD_EPS, Pt};

use crate::error::{GeomResult, GeometryError};

/// Rings with less area than this after snap-rounding are dropped as
/// numerical debris.
pub const MIN_RING_AREA: f64 = 1e-7;

// ── Conversions ───────────────────────────────────────────────────────────────

#[inline]
pub fn coord(p: Pt) -> Coord<f64> {
    Coord { x: p.x, y: p.y }
}

#[inline]
pub fn pt(c: Coord<f64>) -> Pt {
    Pt::new(c.x, c.y)
}

/// Build a closed `LineString` ring from points (closing point appended if
/// the caller left it implicit).
pub fn ring(pts: &[Pt]) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> = pts.iter().copied().map(coord).collect();
    if let (Some(&first), Some(&last)) = (coords.first(), coords.last()) {
        if (first.x - last.x).abs() > COORD_EPS || (first.y - last.y).abs() > COORD_EPS {
            coords.push(first);
        }
    }
    LineString::new(coords)
}

/// The exterior ring of a polygon as `Pt`s, closing point included.
pub fn ring_pts(ls: &LineString<f64>) -> Vec<Pt> {
    ls.coords().copied().map(pt).collect()
}

/// Construct and validate a hole-free polygon.
pub fn polygon(outer: &[Pt]) -> GeomResult<Polygon<f64>> {
    polygon_with_holes(outer, &[])
}

/// Construct and validate a polygon with holes.
pub fn polygon_with_holes(outer: &[Pt], holes: &[Vec<Pt>]) -> GeomResult<Polygon<f64>> {
    let poly = Polygon::new(ring(outer), holes.iter().map(|h| ring(h)).collect());
    validate(&poly)?;
    Ok(poly)
}

/// Axis-aligned rectangle polygon from opposite corners.
pub fn rect_poly(min: Pt, max: Pt) -> Polygon<f64> {
    Polygon::new(
        ring(&[
            Pt::new(min.x, min.y),
            Pt::new(max.x, min.y),
            Pt::new(max.x, max.y),
            Pt::new(min.x, max.y),
        ]),
        vec![],
    )
}

// ── Validity ──────────────────────────────────────────────────────────────────

/// Check the polygon invariants: finite coordinates, closed simple rings
/// with positive area, holes strictly inside the outer ring, no touching
/// holes.
pub fn validate(poly: &Polygon<f64>) -> GeomResult<()> {
    validate_ring(poly.exterior(), "outer ring")?;
    let shell = Polygon::new(poly.exterior().clone(), vec![]);
    for (i, hole) in poly.interiors().iter().enumerate() {
        validate_ring(hole, "hole")?;
        let hole_poly = Polygon::new(hole.clone(), vec![]);
        if !shell.contains(&hole_poly) {
            return Err(GeometryError::InvalidInput(format!(
                "hole {i} is not strictly inside the outer ring"
            )));
        }
        for other in &poly.interiors()[..i] {
            let other_poly = Polygon::new(other.clone(), vec![]);
            if hole_poly.intersects(&other_poly) {
                return Err(GeometryError::InvalidInput(format!("hole {i} touches another hole")));
            }
        }
    }
    Ok(())
}

fn validate_ring(ls: &LineString<f64>, what: &str) -> GeomResult<()> {
    let coords = &ls.0;
    for c in coords {
        if !c.x.is_finite() || !c.y.is_finite() {
            return Err(GeometryError::InvalidInput(format!("{what} has non-finite coordinate")));
        }
    }
    if coords.len() < 4 {
        return Err(GeometryError::InvalidInput(format!("{what} has fewer than 3 distinct points")));
    }
    let first = coords[0];
    let last = coords[coords.len() - 1];
    if (first.x - last.x).abs() > COORD_EPS || (first.y - last.y).abs() > COORD_EPS {
        return Err(GeometryError::InvalidInput(format!("{what} is not closed")));
    }
    let area = Polygon::new(ls.clone(), vec![]).unsigned_area();
    if area <= MIN_RING_AREA {
        return Err(GeometryError::InvalidInput(format!("{what} has (near-)zero area")));
    }
    if ring_self_intersects(coords) {
        return Err(GeometryError::InvalidInput(format!("{what} self-intersects")));
    }
    Ok(())
}

/// O(n²) proper-intersection scan over non-adjacent ring segments.
fn ring_self_intersects(coords: &[Coord<f64>]) -> bool {
    let n = coords.len() - 1; // closing point duplicates the first
    for i in 0..n {
        for j in (i + 1)..n {
            // Skip adjacent segments (shared endpoint) including the wrap pair.
            if j == i + 1 || (i == 0 && j == n - 1) {
                continue;
            }
            let (a1, a2) = (pt(coords[i]), pt(coords[i + 1]));
            let (b1, b2) = (pt(coords[j]), pt(coords[j + 1]));
            if segments_properly_intersect(a1, a2, b1, b2) {
                return true;
            }
        }
    }
    false
}

fn segments_properly_intersect(a1: Pt, a2: Pt, b1: Pt, b2: Pt) -> bool {
    let d1 = (b2 - b1).cross(a1 - b1);
    let d2 = (b2 - b1).cross(a2 - b1);
    let d3 = (a2 - a1).cross(b1 - a1);
    let d4 = (a2 - a1).cross(b2 - a1);
    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

// ── Measures ──────────────────────────────────────────────────────────────────

#[inline]
pub fn area(poly: &Polygon<f64>) -> f64 {
    poly.unsigned_area()
}

#[inline]
pub fn multi_area(mp: &MultiPolygon<f64>) -> f64 {
    mp.unsigned_area()
}

/// Exterior-ring perimeter in metres.
pub fn perimeter(poly: &Polygon<f64>) -> f64 {
    let coords = &poly.exterior().0;
    coords.windows(2).map(|w| pt(w[0]).distance(pt(w[1]))).sum()
}

pub fn centroid(poly: &Polygon<f64>) -> GeomResult<Pt> {
    poly.centroid()
        .map(|p: Point<f64>| Pt::new(p.x(), p.y()))
        .ok_or(GeometryError::DegenerateResult("polygon has no centroid"))
}

/// Axis-aligned bounds as (min, max) corners.
pub fn bounds(poly: &Polygon<f64>) -> GeomResult<(Pt, Pt)> {
    let rect = poly
        .bounding_rect()
        .ok_or(GeometryError::DegenerateResult("polygon has no bounding rect"))?;
    Ok((pt(rect.min()), pt(rect.max())))
}

// ── Transforms ────────────────────────────────────────────────────────────────

/// Rotate by `theta` **radians** counter-clockwise around `origin`.
pub fn rotate_rad(poly: &Polygon<f64>, theta: f64, origin: Pt) -> Polygon<f64> {
    poly.rotate_around_point(theta.to_degrees(), Point::new(origin.x, origin.y))
}

pub fn translate(poly: &Polygon<f64>, dx: f64, dy: f64) -> Polygon<f64> {
    Translate::translate(poly, dx, dy)
}

/// Ramer–Douglas–Peucker simplification.
pub fn simplify(poly: &Polygon<f64>, tolerance: f64) -> Polygon<f64> {
    poly.simplify(&tolerance)
}

// ── Boolean ops ───────────────────────────────────────────────────────────────

pub fn intersection(a: &Polygon<f64>, b: &Polygon<f64>) -> MultiPolygon<f64> {
    clean(BooleanOps::intersection(a, b))
}

pub fn difference(a: &Polygon<f64>, b: &Polygon<f64>) -> MultiPolygon<f64> {
    clean(BooleanOps::difference(a, b))
}

pub fn union(a: &Polygon<f64>, b: &Polygon<f64>) -> MultiPolygon<f64> {
    clean(BooleanOps::union(a, b))
}

pub fn intersection_multi(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    clean(BooleanOps::intersection(a, b))
}

pub fn difference_multi(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    clean(BooleanOps::difference(a, b))
}

pub fn union_multi(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    clean(BooleanOps::union(a, b))
}

/// Union of an arbitrary polygon collection (pairwise fold).
pub fn union_all(polys: &[Polygon<f64>]) -> MultiPolygon<f64> {
    let mut acc = MultiPolygon::new(vec![]);
    for p in polys {
        if acc.0.is_empty() {
            acc = MultiPolygon::new(vec![p.clone()]);
        } else {
            acc = BooleanOps::union(&acc, &MultiPolygon::new(vec![p.clone()]));
        }
    }
    clean(acc)
}

/// Snap coordinates to the 1 µm grid, drop duplicate vertices and rings
/// whose area vanished.  Applied to every boolean-op output.
pub fn clean(mp: MultiPolygon<f64>) -> MultiPolygon<f64> {
    let mut out = Vec::new();
    for poly in mp {
        let Some(exterior) = clean_ring(poly.exterior()) else { continue };
        let holes: Vec<LineString<f64>> =
            poly.interiors().iter().filter_map(clean_ring).collect();
        out.push(Polygon::new(exterior, holes));
    }
    MultiPolygon::new(out)
}

fn clean_ring(ls: &LineString<f64>) -> Option<LineString<f64>> {
    let snap = |v: f64| (v / COORD_EPS).round() * COORD_EPS;
    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(ls.0.len());
    for c in &ls.0 {
        let c = Coord { x: snap(c.x), y: snap(c.y) };
        if coords.last().is_none_or(|p: &Coord<f64>| p.x != c.x || p.y != c.y) {
            coords.push(c);
        }
    }
    // Re-close after snapping.
    if coords.first() == coords.last() {
        coords.pop();
    }
    if coords.len() < 3 {
        return None;
    }
    coords.push(coords[0]);
    let ring = LineString::new(coords);
    if Polygon::new(ring.clone(), vec![]).unsigned_area() <= MIN_RING_AREA {
        return None;
    }
    Some(ring)
}

/// The largest-area part of a multipolygon, if any survived cleaning.
pub fn largest_part(mp: &MultiPolygon<f64>) -> Option<Polygon<f64>> {
    mp.iter()
        .max_by(|a, b| a.unsigned_area().total_cmp(&b.unsigned_area()))
        .cloned()
}

// ── Oriented bounding rectangle ───────────────────────────────────────────────

/// Minimum rotated rectangle (OBB) of a polygon.
pub fn minimum_rotated_rect(poly: &Polygon<f64>) -> GeomResult<Polygon<f64>> {
    MinimumRotatedRect::minimum_rotated_rect(poly)
        .ok_or(GeometryError::DegenerateResult("no minimum rotated rectangle"))
}

// ── Predicates ────────────────────────────────────────────────────────────────

pub fn contains_point(poly: &Polygon<f64>, p: Pt) -> bool {
    poly.contains(&Point::new(p.x, p.y))
}

/// Closed containment: boundary points count as inside.
pub fn covers_point(poly: &Polygon<f64>, p: Pt) -> bool {
    poly.intersects(&Point::new(p.x, p.y))
}

pub fn contains_polygon(outer: &Polygon<f64>, inner: &Polygon<f64>) -> bool {
    outer.contains(inner)
}

pub fn intersects(a: &Polygon<f64>, b: &Polygon<f64>) -> bool {
    a.intersects(b)
}

/// Distance from `p` to segment `a`–`b`.
pub fn distance_point_to_segment(p: Pt, a: Pt, b: Pt) -> f64 {
    let ab = b - a;
    let len_sq = ab.dot(ab);
    if len_sq < COORD_EPS * COORD_EPS {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab.scale(t))
}

// ── Segment clipping ──────────────────────────────────────────────────────────

/// Clip segment `a`–`b` to the closed interior of `poly`.
///
/// Returns the sub-segments (possibly none, possibly several for concave
/// polygons) whose midpoints lie in the polygon.  Collinear overlaps with
/// the boundary are resolved by the midpoint test as well.
pub fn clip_segment_to_polygon(a: Pt, b: Pt, poly: &Polygon<f64>) -> Vec<(Pt, Pt)> {
    let mut ts = vec![0.0f64, 1.0];
    let mut boundary_segments = |ls: &LineString<f64>| {
        for w in ls.0.windows(2) {
            if let Some(t) = segment_intersection_t(a, b, pt(w[0]), pt(w[1])) {
                ts.push(t);
            }
        }
    };
    boundary_segments(poly.exterior());
    for hole in poly.interiors() {
        boundary_segments(hole);
    }
    ts.sort_by(f64::total_cmp);
    ts.dedup_by(|x, y| (*x - *y).abs() < 1e-12);

    let mut out = Vec::new();
    for w in ts.windows(2) {
        let (t0, t1) = (w[0], w[1]);
        if t1 - t0 < 1e-9 {
            continue;
        }
        let p0 = a + (b - a).scale(t0);
        let p1 = a + (b - a).scale(t1);
        let mid = a + (b - a).scale((t0 + t1) * 0.5);
        if covers_point(poly, mid) && p0.distance(p1) > COORD_EPS {
            out.push((p0, p1));
        }
    }
    out
}

/// Parameter `t` on `a`–`b` where it crosses `c`–`d`, if the segments
/// properly intersect.  Collinear pairs return `None`.
fn segment_intersection_t(a: Pt, b: Pt, c: Pt, d: Pt) -> Option<f64> {
    let r = b - a;
    let s = d - c;
    let denom = r.cross(s);
    if denom.abs() < 1e-14 {
        return None;
    }
    let t = (c - a).cross(s) / denom;
    let u = (c - a).cross(r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(t)
    } else {
        None
    }
}
