//! Hard-constrained facility placement.
//!
//! An alternative stage-1 encoding for explicit plot-placement problems:
//! each facility contributes an `(x, y)` gene pair, and feasibility is
//! enforced through NSGA-II constraint domination rather than penalties:
//!
//! - g₁/g₃: `min_separation(kind_i, kind_j) − dist(i, j) ≤ 0` for all
//!   pairs, from a per-kind-pair separation matrix;
//! - g₂: every facility must reach a road cell of the supplied raster
//!   (−1 when a path exists, +1 otherwise).
//!
//! Objectives favour compact, well-connected arrangements: total pairwise
//! distance and total distance-to-road.

use estate_core::Pt;
use estate_evo::{Evaluation, Problem};
use estate_net::astar::{self, Connectivity};
use estate_net::RoadRaster;

/// Facility kind index into the separation matrix.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FacilityKind(pub usize);

/// The placement problem definition.
pub struct PlacementProblem {
    /// Site bounding rectangle, (min, max).
    bounds_min: Pt,
    bounds_max: Pt,
    /// Kind of each facility.
    kinds: Vec<FacilityKind>,
    /// Symmetric matrix of minimum centre separations per kind pair.
    min_separation: Vec<Vec<f64>>,
    /// Road raster for the access constraint.
    raster: RoadRaster,
    /// Search radius (cells) for the nearest road cell.
    search_radius: usize,
}

impl PlacementProblem {
    pub fn new(
        bounds_min: Pt,
        bounds_max: Pt,
        kinds: Vec<FacilityKind>,
        min_separation: Vec<Vec<f64>>,
        raster: RoadRaster,
        search_radius: usize,
    ) -> Self {
        Self { bounds_min, bounds_max, kinds, min_separation, raster, search_radius }
    }

    pub fn facility_count(&self) -> usize {
        self.kinds.len()
    }

    fn positions(&self, genes: &[f64]) -> Vec<Pt> {
        genes.chunks_exact(2).map(|c| Pt::new(c[0], c[1])).collect()
    }

    /// Decode a gene vector into facility positions (for reporting the
    /// winning layout).
    pub fn decode(&self, genes: &[f64]) -> Vec<Pt> {
        self.positions(genes)
    }
}

impl Problem for PlacementProblem {
    fn gene_bounds(&self) -> Vec<(f64, f64)> {
        let mut bounds = Vec::with_capacity(self.kinds.len() * 2);
        for _ in &self.kinds {
            bounds.push((self.bounds_min.x, self.bounds_max.x));
            bounds.push((self.bounds_min.y, self.bounds_max.y));
        }
        bounds
    }

    fn evaluate(&self, genes: &[f64]) -> Evaluation {
        let positions = self.positions(genes);
        let n = positions.len();

        // ── Constraints ───────────────────────────────────────────────────
        let mut violations = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                let required =
                    self.min_separation[self.kinds[i].0][self.kinds[j].0];
                violations.push(required - positions[i].distance(positions[j]));
            }
        }

        let mut road_distance_total = 0.0;
        for p in &positions {
            let reach = self
                .raster
                .cell_of(*p)
                .and_then(|cell| {
                    astar::path_to_road(&self.raster, cell, self.search_radius, Connectivity::Eight)
                });
            match reach {
                Some(path) => {
                    road_distance_total += path.cost_milli as f64 / 1000.0;
                    violations.push(-1.0);
                }
                None => violations.push(1.0),
            }
        }

        // ── Objectives ────────────────────────────────────────────────────
        let mut pairwise = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                pairwise += positions[i].distance(positions[j]);
            }
        }

        Evaluation { objectives: vec![pairwise, road_distance_total], violations }
    }
}
