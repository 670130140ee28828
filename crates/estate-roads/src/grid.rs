//! Rotated-lattice grid candidate generator.
//!
//! For a gene vector `(spacing_x, spacing_y, angle, offset_x, offset_y)` the
//! generator lays a rectangular lattice over the site's bounding circle,
//! centres one tile per lattice cell (shrunk by the road width so adjacent
//! tiles leave a road gap), rotates the whole family around the site
//! centroid, and clips every tile to the site.  Each clipped part is a block
//! candidate.
//!
//! The lattice is sized to the bounding circle, not the bounding box, so any
//! rotation still covers the whole site.

use geo::Polygon;

use estate_core::{LayoutConfig, Pt};
use estate_geom::PolyIndex;
use estate_geom::buffer;
use estate_geom::kernel;

use crate::error::RoadResult;

// ── GridGenes ─────────────────────────────────────────────────────────────────

/// Decoded grid parameters.  Gene order matches [`GridGenes::from_genes`].
#[derive(Copy, Clone, Debug)]
pub struct GridGenes {
    /// Lattice pitch along x, metres.
    pub spacing_x: f64,
    /// Lattice pitch along y, metres.
    pub spacing_y: f64,
    /// Rotation of the lattice around the site centroid, degrees in [0, 90).
    pub angle_deg: f64,
    /// Lattice phase offsets, metres.
    pub offset_x: f64,
    pub offset_y: f64,
}

impl GridGenes {
    pub const GENE_COUNT: usize = 5;

    /// Decode from a raw gene slice (`len >= 5`).
    pub fn from_genes(genes: &[f64]) -> Self {
        Self {
            spacing_x: genes[0],
            spacing_y: genes[1],
            angle_deg: genes[2],
            offset_x: genes[3],
            offset_y: genes[4],
        }
    }

    /// Per-gene bounds for the evolutionary search, from the configuration.
    ///
    /// Offsets range over one full maximum pitch so every lattice phase is
    /// reachable.
    pub fn gene_bounds(cfg: &LayoutConfig) -> Vec<(f64, f64)> {
        vec![
            (cfg.spacing_min, cfg.spacing_max),
            (cfg.spacing_min, cfg.spacing_max),
            (cfg.angle_min, cfg.angle_max),
            (-cfg.spacing_max * 0.5, cfg.spacing_max * 0.5),
            (-cfg.spacing_max * 0.5, cfg.spacing_max * 0.5),
        ]
    }
}

// ── GridCandidate ─────────────────────────────────────────────────────────────

/// One evaluated grid: clipped block candidates plus the lattice road
/// centrelines clipped to the site.
pub struct GridCandidate {
    pub blocks: Vec<Polygon<f64>>,
    pub centrelines: Vec<(Pt, Pt)>,
}

/// Generate block candidates and road centrelines for one gene vector.
///
/// `road_width` is the gap left between adjacent tiles (the internal road
/// footprint width).  Tiles narrower than the gap produce no blocks.
///
/// `boundary_road_width` reserves a perimeter main road: tiles are clipped
/// against the site inset by the full width, and the perimeter centreline
/// (inset by half) is appended to the returned centrelines.  Pass `0.0` to
/// let blocks run to the site boundary.
pub fn generate(
    site: &Polygon<f64>,
    genes: &GridGenes,
    road_width: f64,
    boundary_road_width: f64,
) -> RoadResult<GridCandidate> {
    let centre = kernel::centroid(site)?;
    let (min, max) = kernel::bounds(site)?;
    let radius = min.distance(max) * 0.5 + genes.spacing_x.max(genes.spacing_y);

    let sx = genes.spacing_x;
    let sy = genes.spacing_y;
    let half_w = (sx - road_width) * 0.5;
    let half_h = (sy - road_width) * 0.5;
    if half_w <= 0.0 || half_h <= 0.0 {
        // Road gap swallows the tile entirely; an empty candidate is a
        // legitimately terrible individual, not an error.
        return Ok(GridCandidate { blocks: vec![], centrelines: vec![] });
    }

    // Perimeter road: tiles stop short of the boundary by the full road
    // width; its centreline sits at half that inset.
    let clip_region: Polygon<f64> = if boundary_road_width > 0.0 {
        match kernel::largest_part(&buffer::buffer_polygon(site, -boundary_road_width)?) {
            Some(p) => p,
            None => return Ok(GridCandidate { blocks: vec![], centrelines: vec![] }),
        }
    } else {
        site.clone()
    };

    let nx = (radius / sx).ceil() as i64;
    let ny = (radius / sy).ceil() as i64;
    let theta = genes.angle_deg.to_radians();

    // ── Tiles ─────────────────────────────────────────────────────────────
    let mut tiles = Vec::with_capacity(((2 * nx + 1) * (2 * ny + 1)) as usize);
    for i in -nx..=nx {
        for j in -ny..=ny {
            let cx = centre.x + genes.offset_x + i as f64 * sx;
            let cy = centre.y + genes.offset_y + j as f64 * sy;
            let tile = kernel::rect_poly(
                Pt::new(cx - half_w, cy - half_h),
                Pt::new(cx + half_w, cy + half_h),
            );
            tiles.push(kernel::rotate_rad(&tile, theta, centre));
        }
    }

    // Envelope pre-filter before the exact (and costly) clip.
    let index = PolyIndex::build(&tiles);
    let candidates = index.query_envelope(min, max);

    let mut blocks = Vec::new();
    for id in candidates {
        let clipped = kernel::intersection(&tiles[id as usize], &clip_region);
        for part in clipped {
            blocks.push(part);
        }
    }

    // ── Centrelines ───────────────────────────────────────────────────────
    //
    // Roads run between lattice cells: at half-pitch offsets from the tile
    // centres.  Lines are built in the unrotated frame, rotated, then
    // clipped to the site.
    let mut centrelines = Vec::new();
    let span_y = (ny as f64 + 1.0) * sy;
    for i in -nx - 1..=nx {
        let x = centre.x + genes.offset_x + (i as f64 + 0.5) * sx;
        let a = Pt::new(x, centre.y - span_y).rotate_about(theta, centre);
        let b = Pt::new(x, centre.y + span_y).rotate_about(theta, centre);
        centrelines.extend(kernel::clip_segment_to_polygon(a, b, site));
    }
    let span_x = (nx as f64 + 1.0) * sx;
    for j in -ny - 1..=ny {
        let y = centre.y + genes.offset_y + (j as f64 + 0.5) * sy;
        let a = Pt::new(centre.x - span_x, y).rotate_about(theta, centre);
        let b = Pt::new(centre.x + span_x, y).rotate_about(theta, centre);
        centrelines.extend(kernel::clip_segment_to_polygon(a, b, site));
    }

    if boundary_road_width > 0.0 {
        let ring_region =
            kernel::largest_part(&buffer::buffer_polygon(site, -boundary_road_width * 0.5)?);
        if let Some(ring_poly) = ring_region {
            for w in ring_poly.exterior().0.windows(2) {
                centrelines.push((kernel::pt(w[0]), kernel::pt(w[1])));
            }
        }
    }

    Ok(GridCandidate { blocks, centrelines })
}
