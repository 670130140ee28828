//! Pipeline configuration.
//!
//! One flat record carries every knob the orchestrator recognises.  Callers
//! construct it via `LayoutConfig { ..Default::default() }` and the
//! orchestrator calls [`LayoutConfig::validate`] before any work starts;
//! invalid configurations are fatal at the boundary and never repaired.

use crate::error::{CoreError, CoreResult};

// ── LayoutMethod ──────────────────────────────────────────────────────────────

/// Stage-1 road/block generation algorithm.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LayoutMethod {
    /// Rotated-lattice grid, parameters found by the evolutionary search.
    Grid,
    /// Centroidal Voronoi tessellation road network.
    Voronoi,
    /// Site-scale decision rule: large unconstrained sites use Voronoi,
    /// everything else uses the grid search.
    #[default]
    Auto,
}

// ── LayoutConfig ──────────────────────────────────────────────────────────────

/// Top-level configuration for one pipeline run.
///
/// | Field | Effect |
/// |---|---|
/// | `layout_method` | stage-1 algorithm (`Grid`, `Voronoi`, `Auto`) |
/// | `spacing_min`/`spacing_max` | grid-spacing gene bounds, metres |
/// | `angle_min`/`angle_max` | grid-rotation gene bounds, degrees in [0, 90) |
/// | `population_size`/`generations` | evolutionary search budget |
/// | `crossover_prob` | SBX probability (default 0.9) |
/// | `mutation_prob` | per-gene mutation probability; `None` → 1/n_genes |
/// | `stall_generations` | early stop after N generations with < 1 % improvement; `None` → fixed budget |
/// | `target_lot_width`/`min_lot_width`/`max_lot_width` | frontage solver targets, metres |
/// | `min_lot_area` | classification + lot acceptance threshold, m² |
/// | `setback_distance` | front/rear lot offset, metres (default 6) |
/// | `road_main_width`/`road_internal_width` | road footprint widths, metres |
/// | `solver_time_limit_sec` | per-block frontage solver budget (default 5 s) |
/// | `loop_redundancy_ratio` | MST extra-edge fraction (default 0.15) |
/// | `max_edge_distance` | MST candidate-edge cut-off, metres (default 500) |
/// | `transformer_capacity_kva` | per-transformer cap (default 1000) |
/// | `lot_load_kw` | assumed per-lot electrical load (default 100) |
/// | `lots_per_transformer` | initial k-means size hint (default 15) |
/// | `voronoi_seeds` | seed count for the Voronoi generator |
/// | `lloyd_iterations` | CVT relaxation cap (default 30) |
/// | `raster_cell_size` | connectivity-raster resolution, metres (default 1) |
/// | `seed` | root PRNG seed |
/// | `num_threads` | rayon pool size; `None` → all logical cores |
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutConfig {
    pub layout_method: LayoutMethod,

    pub spacing_min: f64,
    pub spacing_max: f64,
    pub angle_min: f64,
    pub angle_max: f64,

    pub population_size: usize,
    pub generations: u32,
    pub crossover_prob: f64,
    pub mutation_prob: Option<f64>,
    pub stall_generations: Option<u32>,

    pub target_lot_width: f64,
    pub min_lot_width: f64,
    pub max_lot_width: f64,
    pub min_lot_area: f64,
    pub setback_distance: f64,

    pub road_main_width: f64,
    pub road_internal_width: f64,

    pub solver_time_limit_sec: f64,

    pub loop_redundancy_ratio: f64,
    pub max_edge_distance: f64,
    pub transformer_capacity_kva: f64,
    pub lot_load_kw: f64,
    pub lots_per_transformer: usize,

    pub voronoi_seeds: usize,
    pub lloyd_iterations: u32,
    pub raster_cell_size: f64,

    pub seed: u64,
    pub num_threads: Option<usize>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            layout_method: LayoutMethod::Auto,
            spacing_min: 20.0,
            spacing_max: 100.0,
            angle_min: 0.0,
            angle_max: 90.0,
            population_size: 50,
            generations: 40,
            crossover_prob: 0.9,
            mutation_prob: None,
            stall_generations: None,
            target_lot_width: 30.0,
            min_lot_width: 20.0,
            max_lot_width: 60.0,
            min_lot_area: 1000.0,
            setback_distance: 6.0,
            road_main_width: 12.0,
            road_internal_width: 7.0,
            solver_time_limit_sec: 5.0,
            loop_redundancy_ratio: 0.15,
            max_edge_distance: 500.0,
            transformer_capacity_kva: 1000.0,
            lot_load_kw: 100.0,
            lots_per_transformer: 15,
            voronoi_seeds: 20,
            lloyd_iterations: 30,
            raster_cell_size: 1.0,
            seed: 0,
            num_threads: None,
        }
    }
}

impl LayoutConfig {
    /// Reject configurations the pipeline cannot honour.
    ///
    /// Every violated bound is reported with its field name; the first
    /// violation wins (callers fix one at a time anyway).
    pub fn validate(&self) -> CoreResult<()> {
        fn bad(field: &'static str, reason: impl Into<String>) -> CoreError {
            CoreError::InvalidConfig { field, reason: reason.into() }
        }

        let finite = [
            ("spacing_min", self.spacing_min),
            ("spacing_max", self.spacing_max),
            ("angle_min", self.angle_min),
            ("angle_max", self.angle_max),
            ("crossover_prob", self.crossover_prob),
            ("target_lot_width", self.target_lot_width),
            ("min_lot_width", self.min_lot_width),
            ("max_lot_width", self.max_lot_width),
            ("min_lot_area", self.min_lot_area),
            ("setback_distance", self.setback_distance),
            ("road_main_width", self.road_main_width),
            ("road_internal_width", self.road_internal_width),
            ("solver_time_limit_sec", self.solver_time_limit_sec),
            ("loop_redundancy_ratio", self.loop_redundancy_ratio),
            ("max_edge_distance", self.max_edge_distance),
            ("transformer_capacity_kva", self.transformer_capacity_kva),
            ("lot_load_kw", self.lot_load_kw),
            ("raster_cell_size", self.raster_cell_size),
        ];
        for (field, v) in finite {
            if !v.is_finite() {
                return Err(bad(field, "must be finite"));
            }
        }

        if self.spacing_min <= 0.0 || self.spacing_min > self.spacing_max {
            return Err(bad("spacing_min", "need 0 < spacing_min <= spacing_max"));
        }
        if !(0.0..90.0).contains(&self.angle_min) || self.angle_min > self.angle_max {
            return Err(bad("angle_min", "need 0 <= angle_min <= angle_max < 90"));
        }
        if self.angle_max >= 90.0 {
            return Err(bad("angle_max", "rotation is periodic at 90 degrees"));
        }
        if self.population_size < 4 {
            return Err(bad("population_size", "need at least 4 individuals"));
        }
        if self.generations == 0 {
            return Err(bad("generations", "need at least 1 generation"));
        }
        if !(0.0..=1.0).contains(&self.crossover_prob) {
            return Err(bad("crossover_prob", "must lie in [0, 1]"));
        }
        if let Some(p) = self.mutation_prob {
            if !(0.0..=1.0).contains(&p) {
                return Err(bad("mutation_prob", "must lie in [0, 1]"));
            }
        }
        if self.min_lot_width <= 0.0
            || self.min_lot_width > self.target_lot_width
            || self.target_lot_width > self.max_lot_width
        {
            return Err(bad(
                "target_lot_width",
                "need 0 < min_lot_width <= target_lot_width <= max_lot_width",
            ));
        }
        if self.min_lot_area < 0.0 {
            return Err(bad("min_lot_area", "must be non-negative"));
        }
        if self.setback_distance < 0.0 {
            return Err(bad("setback_distance", "must be non-negative"));
        }
        if self.road_main_width <= 0.0 || self.road_internal_width <= 0.0 {
            return Err(bad("road_main_width", "road widths must be positive"));
        }
        if self.solver_time_limit_sec <= 0.0 {
            return Err(bad("solver_time_limit_sec", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.loop_redundancy_ratio) {
            return Err(bad("loop_redundancy_ratio", "must lie in [0, 1]"));
        }
        if self.max_edge_distance <= 0.0 {
            return Err(bad("max_edge_distance", "must be positive"));
        }
        if self.transformer_capacity_kva <= 0.0 {
            return Err(bad("transformer_capacity_kva", "must be positive"));
        }
        if self.lot_load_kw <= 0.0 {
            return Err(bad("lot_load_kw", "must be positive"));
        }
        if self.lot_load_kw > self.transformer_capacity_kva {
            return Err(bad("lot_load_kw", "a single lot exceeds transformer capacity"));
        }
        if self.lots_per_transformer == 0 {
            return Err(bad("lots_per_transformer", "must be positive"));
        }
        if self.voronoi_seeds < 3 {
            return Err(bad("voronoi_seeds", "need at least 3 seeds"));
        }
        if self.raster_cell_size <= 0.0 {
            return Err(bad("raster_cell_size", "must be positive"));
        }
        Ok(())
    }
}
