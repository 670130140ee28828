//! Road segments, footprints, and block derivation.
//!
//! The road network is the complement's complement: segments are buffered to
//! their class width, the footprint is clipped to the site, and blocks are
//! whatever the site has left.  That construction makes "blocks + roads =
//! site" hold by definition, up to snap-rounding.

use geo::{MultiPolygon, Polygon};

use estate_core::Pt;
use estate_geom::buffer;
use estate_geom::kernel;

use crate::error::{RoadError, RoadResult};

// ── Types ─────────────────────────────────────────────────────────────────────

/// Road classification.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RoadClass {
    Main,
    Internal,
}

/// A straight centreline piece with its class and footprint width.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoadSegment {
    pub a: Pt,
    pub b: Pt,
    pub class: RoadClass,
    pub width: f64,
}

impl RoadSegment {
    #[inline]
    pub fn length(&self) -> f64 {
        self.a.distance(self.b)
    }
}

/// The stage-1 road network: classified segments plus the merged footprint
/// clipped to the site.
pub struct RoadNetwork {
    pub segments: Vec<RoadSegment>,
    pub footprint: MultiPolygon<f64>,
}

impl RoadNetwork {
    /// Total centreline length in metres.
    pub fn total_length(&self) -> f64 {
        self.segments.iter().map(RoadSegment::length).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

// ── Classification ────────────────────────────────────────────────────────────

/// Classify raw centreline segments as main or internal.
///
/// A segment is `Main` when it hugs the site boundary (midpoint within one
/// main-road width of the exterior ring) or is longer than the 75th
/// percentile of all segment lengths; everything else is `Internal`.
pub fn classify_edges(
    site: &Polygon<f64>,
    edges: &[(Pt, Pt)],
    main_width: f64,
) -> Vec<(Pt, Pt, RoadClass)> {
    if edges.is_empty() {
        return vec![];
    }
    let mut lengths: Vec<f64> = edges.iter().map(|(a, b)| a.distance(*b)).collect();
    lengths.sort_by(f64::total_cmp);
    let p75 = lengths[(lengths.len() * 3) / 4..].first().copied().unwrap_or(f64::MAX);

    edges
        .iter()
        .map(|&(a, b)| {
            let mid = (a + b).scale(0.5);
            let near_boundary = boundary_distance(site, mid) <= main_width;
            let long = a.distance(b) >= p75;
            let class = if near_boundary || long { RoadClass::Main } else { RoadClass::Internal };
            (a, b, class)
        })
        .collect()
}

/// Classification for regular lattices, where edge lengths carry no
/// signal: only the boundary-hugging perimeter ring becomes `Main`.
pub fn classify_by_boundary(
    site: &Polygon<f64>,
    edges: &[(Pt, Pt)],
    main_width: f64,
) -> Vec<(Pt, Pt, RoadClass)> {
    edges
        .iter()
        .map(|&(a, b)| {
            let mid = (a + b).scale(0.5);
            let class = if boundary_distance(site, mid) <= main_width {
                RoadClass::Main
            } else {
                RoadClass::Internal
            };
            (a, b, class)
        })
        .collect()
}

/// Distance from `p` to the site's exterior ring.
fn boundary_distance(site: &Polygon<f64>, p: Pt) -> f64 {
    site.exterior()
        .0
        .windows(2)
        .map(|w| {
            kernel::distance_point_to_segment(p, kernel::pt(w[0]), kernel::pt(w[1]))
        })
        .fold(f64::MAX, f64::min)
}

// ── Network construction ──────────────────────────────────────────────────────

/// Buffer classified centrelines to their widths and clip to the site.
pub fn build_network(
    site: &Polygon<f64>,
    classified: &[(Pt, Pt, RoadClass)],
    main_width: f64,
    internal_width: f64,
) -> RoadResult<RoadNetwork> {
    let segments: Vec<RoadSegment> = classified
        .iter()
        .map(|&(a, b, class)| RoadSegment {
            a,
            b,
            class,
            width: match class {
                RoadClass::Main => main_width,
                RoadClass::Internal => internal_width,
            },
        })
        .filter(|s| s.length() > estate_core::COORD_EPS)
        .collect();

    let mains: Vec<(Pt, Pt)> = segments
        .iter()
        .filter(|s| s.class == RoadClass::Main)
        .map(|s| (s.a, s.b))
        .collect();
    let internals: Vec<(Pt, Pt)> = segments
        .iter()
        .filter(|s| s.class == RoadClass::Internal)
        .map(|s| (s.a, s.b))
        .collect();

    let mut footprint = MultiPolygon::new(vec![]);
    if !mains.is_empty() {
        footprint = buffer::segments_footprint(&mains, main_width)?;
    }
    if !internals.is_empty() {
        let internal_fp = buffer::segments_footprint(&internals, internal_width)?;
        footprint = if footprint.0.is_empty() {
            internal_fp
        } else {
            kernel::union_multi(&footprint, &internal_fp)
        };
    }
    if footprint.0.is_empty() {
        return Err(RoadError::Geometry(estate_geom::GeometryError::DegenerateResult(
            "road network has no footprint",
        )));
    }

    let site_mp = MultiPolygon::new(vec![site.clone()]);
    let footprint = kernel::intersection_multi(&footprint, &site_mp);
    Ok(RoadNetwork { segments, footprint })
}

/// Blocks are the site minus the road footprint.
pub fn derive_blocks(site: &Polygon<f64>, footprint: &MultiPolygon<f64>) -> Vec<Polygon<f64>> {
    let site_mp = MultiPolygon::new(vec![site.clone()]);
    kernel::difference_multi(&site_mp, footprint).0
}

/// Pre-split the site by user-supplied main roads (polyline + width pairs):
/// returns the sub-regions and the main-road footprint.  The Voronoi
/// generator then runs per region, guaranteeing the supplied roads stay
/// straight.
pub fn presplit_site(
    site: &Polygon<f64>,
    main_roads: &[(Vec<Pt>, f64)],
) -> RoadResult<(Vec<Polygon<f64>>, MultiPolygon<f64>)> {
    if main_roads.is_empty() {
        return Ok((vec![site.clone()], MultiPolygon::new(vec![])));
    }
    let mut footprint = MultiPolygon::new(vec![]);
    for (polyline, width) in main_roads {
        let fp = buffer::polyline_footprint(polyline, *width)?;
        footprint = if footprint.0.is_empty() {
            fp
        } else {
            kernel::union_multi(&footprint, &fp)
        };
    }
    let site_mp = MultiPolygon::new(vec![site.clone()]);
    let footprint = kernel::intersection_multi(&footprint, &site_mp);
    let regions = kernel::difference_multi(&site_mp, &footprint).0;
    Ok((regions, footprint))
}
