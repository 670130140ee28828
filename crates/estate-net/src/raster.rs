//! Road-network rasterisation.
//!
//! A `RoadRaster` is a uniform cell grid over the site's bounding box.
//! Cells are *road* when they lie within half a road width of a centreline,
//! and *blocked* when their centre falls outside the site.  The A* search
//! treats blocked cells as walls and road cells as goals.
//!
//! Cell size is a tuning knob: 1 m cells give ~10⁵ cells for a 300×300 m
//! site.  Callers with larger sites should grow the cell so the grid stays
//! under ~10⁶ cells.

use geo::Polygon;

use estate_core::Pt;
use estate_geom::kernel;
use estate_geom::{GeomResult, GeometryError};

/// Road/blocked occupancy grid.
pub struct RoadRaster {
    origin: Pt,
    cell: f64,
    cols: usize,
    rows: usize,
    road: Vec<bool>,
    blocked: Vec<bool>,
}

impl RoadRaster {
    /// An all-free raster with no roads; used by tests and the constrained
    /// placement problem, which paint cells explicitly.
    pub fn blank(origin: Pt, cols: usize, rows: usize, cell: f64) -> Self {
        Self {
            origin,
            cell,
            cols,
            rows,
            road: vec![false; cols * rows],
            blocked: vec![false; cols * rows],
        }
    }

    /// Rasterise road centrelines over the site.
    ///
    /// `segments` carry their full footprint width; a cell is road when its
    /// centre is within `width / 2` of the centreline.  Cells outside the
    /// site are blocked.
    pub fn from_site(
        site: &Polygon<f64>,
        segments: &[(Pt, Pt, f64)],
        cell: f64,
    ) -> GeomResult<Self> {
        if !(cell.is_finite() && cell > 0.0) {
            return Err(GeometryError::InvalidInput("cell size must be positive".into()));
        }
        let (min, max) = kernel::bounds(site)?;
        let cols = ((max.x - min.x) / cell).ceil().max(1.0) as usize;
        let rows = ((max.y - min.y) / cell).ceil().max(1.0) as usize;
        let mut raster = Self::blank(min, cols, rows, cell);

        for iy in 0..rows {
            for ix in 0..cols {
                let centre = raster.centre_of((ix, iy));
                if !kernel::covers_point(site, centre) {
                    raster.blocked[iy * cols + ix] = true;
                }
            }
        }

        // Per-segment window scan: only cells inside the segment's inflated
        // bounding box are tested against the exact distance.
        for &(a, b, width) in segments {
            let half = width * 0.5;
            let pad = half + cell;
            let lo_x = (((a.x.min(b.x) - pad) - min.x) / cell).floor().max(0.0) as usize;
            let hi_x = ((((a.x.max(b.x) + pad) - min.x) / cell).ceil() as usize).min(cols);
            let lo_y = (((a.y.min(b.y) - pad) - min.y) / cell).floor().max(0.0) as usize;
            let hi_y = ((((a.y.max(b.y) + pad) - min.y) / cell).ceil() as usize).min(rows);
            for iy in lo_y..hi_y {
                for ix in lo_x..hi_x {
                    if raster.blocked[iy * cols + ix] {
                        continue;
                    }
                    let centre = raster.centre_of((ix, iy));
                    if kernel::distance_point_to_segment(centre, a, b) <= half {
                        raster.road[iy * cols + ix] = true;
                    }
                }
            }
        }
        Ok(raster)
    }

    // ── Geometry mapping ──────────────────────────────────────────────────

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Grid cell containing `p`, or `None` outside the raster extent.
    pub fn cell_of(&self, p: Pt) -> Option<(usize, usize)> {
        let fx = (p.x - self.origin.x) / self.cell;
        let fy = (p.y - self.origin.y) / self.cell;
        if fx < 0.0 || fy < 0.0 {
            return None;
        }
        let (ix, iy) = (fx as usize, fy as usize);
        (ix < self.cols && iy < self.rows).then_some((ix, iy))
    }

    /// World coordinates of a cell centre.
    pub fn centre_of(&self, cell: (usize, usize)) -> Pt {
        Pt::new(
            self.origin.x + (cell.0 as f64 + 0.5) * self.cell,
            self.origin.y + (cell.1 as f64 + 0.5) * self.cell,
        )
    }

    // ── Cell state ────────────────────────────────────────────────────────

    #[inline]
    pub fn is_road(&self, cell: (usize, usize)) -> bool {
        self.road[cell.1 * self.cols + cell.0]
    }

    #[inline]
    pub fn is_blocked(&self, cell: (usize, usize)) -> bool {
        self.blocked[cell.1 * self.cols + cell.0]
    }

    pub fn set_road(&mut self, cell: (usize, usize)) {
        self.road[cell.1 * self.cols + cell.0] = true;
    }

    pub fn set_blocked(&mut self, cell: (usize, usize)) {
        self.blocked[cell.1 * self.cols + cell.0] = true;
    }

    /// Count of road cells (diagnostics).
    pub fn road_cell_count(&self) -> usize {
        self.road.iter().filter(|&&r| r).count()
    }

    // ── Goal search ───────────────────────────────────────────────────────

    /// Nearest road cell to `from` within `search_radius` Chebyshev rings.
    ///
    /// Rings are scanned outward; within a ring, candidates are compared by
    /// exact squared distance with (x, y) order as the deterministic
    /// tie-break.
    pub fn nearest_road_cell(
        &self,
        from: (usize, usize),
        search_radius: usize,
    ) -> Option<(usize, usize)> {
        if self.is_road(from) {
            return Some(from);
        }
        let (fx, fy) = (from.0 as i64, from.1 as i64);
        for r in 1..=search_radius as i64 {
            let mut best: Option<((usize, usize), i64)> = None;
            for dy in -r..=r {
                for dx in -r..=r {
                    if dx.abs() != r && dy.abs() != r {
                        continue; // interior of the ring was already scanned
                    }
                    let (x, y) = (fx + dx, fy + dy);
                    if x < 0 || y < 0 || x as usize >= self.cols || y as usize >= self.rows {
                        continue;
                    }
                    let cell = (x as usize, y as usize);
                    if !self.is_road(cell) {
                        continue;
                    }
                    let d2 = dx * dx + dy * dy;
                    let better = match best {
                        None => true,
                        Some((bc, bd2)) => d2 < bd2 || (d2 == bd2 && cell < bc),
                    };
                    if better {
                        best = Some((cell, d2));
                    }
                }
            }
            if let Some((cell, _)) = best {
                return Some(cell);
            }
        }
        None
    }
}
