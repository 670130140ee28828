//! Stage 1: road network and block candidates.
//!
//! Two paths produce the same output shape:
//!
//! - **Grid**: NSGA-II over `(spacing_x, spacing_y, angle, offset_x,
//!   offset_y)`.  Fitness maximises the clipped area of near-rectangular
//!   blocks and minimises fragment count.  The winning gene vector is
//!   re-expanded into blocks and centrelines.
//! - **Voronoi**: seeded CVT, optionally per pre-split region when the
//!   caller supplied main roads that must stay straight.
//!
//! The road footprint is always re-derived as `site − blocks`, which keeps
//! the partition invariant exact rather than within buffering error.

use geo::{MultiPolygon, Polygon};

use estate_core::{Deadline, LayoutConfig, Pt, RunRng};
use estate_evo::{Evaluation, NsgaOptimizer, NsgaParams, Problem};
use estate_geom::kernel;
use estate_roads::roads::{self, RoadSegment};
use estate_roads::voronoi::{self, CvtParams};
use estate_roads::{GridGenes, grid};
use estate_subdiv::classify;

use crate::error::PipelineResult;

/// Minimum rectangularity for a block's area to count toward the usable
/// objective.
const USABLE_RECTANGULARITY: f64 = 0.75;

/// What stage 1 hands to stage 2.
pub struct Stage1Output {
    pub blocks: Vec<Polygon<f64>>,
    pub segments: Vec<RoadSegment>,
    pub footprint: MultiPolygon<f64>,
    /// The optimizer hit its deadline; blocks come from the best-so-far
    /// individual.
    pub partial: bool,
}

// ── Grid problem ──────────────────────────────────────────────────────────────

/// NSGA-II fitness for the grid search.
///
/// Objectives (both minimised):
/// - f₁ = −Σ area of clipped blocks with rectangularity ≥ 0.75;
/// - f₂ = number of blocks with area < `min_lot_area`.
pub struct GridPlanProblem<'a> {
    site: &'a Polygon<f64>,
    config: &'a LayoutConfig,
}

impl<'a> GridPlanProblem<'a> {
    pub fn new(site: &'a Polygon<f64>, config: &'a LayoutConfig) -> Self {
        Self { site, config }
    }
}

impl Problem for GridPlanProblem<'_> {
    fn gene_bounds(&self) -> Vec<(f64, f64)> {
        GridGenes::gene_bounds(self.config)
    }

    fn evaluate(&self, genes: &[f64]) -> Evaluation {
        let decoded = GridGenes::from_genes(genes);
        let candidate = match grid::generate(
            self.site,
            &decoded,
            self.config.road_internal_width,
            self.config.road_main_width,
        ) {
            Ok(c) => c,
            // Degenerate candidates score as empty layouts.
            Err(_) => return Evaluation::of(vec![0.0, 0.0]),
        };

        let mut usable_area = 0.0;
        let mut fragments = 0usize;
        for block in &candidate.blocks {
            let area = kernel::area(block);
            if area < self.config.min_lot_area {
                fragments += 1;
                continue;
            }
            if let Ok(m) = classify::metrics(block) {
                if m.rectangularity >= USABLE_RECTANGULARITY {
                    usable_area += area;
                }
            }
        }
        Evaluation::of(vec![-usable_area, fragments as f64])
    }
}

// ── Grid driver ───────────────────────────────────────────────────────────────

/// Run the evolutionary grid search and expand the winner.
pub fn run_grid(
    site: &Polygon<f64>,
    config: &LayoutConfig,
    rng: RunRng,
    deadline: Deadline,
    mut on_generation: impl FnMut(u32, f64),
) -> PipelineResult<Stage1Output> {
    let problem = GridPlanProblem::new(site, config);
    let params = NsgaParams {
        population_size: config.population_size,
        generations: config.generations,
        crossover_prob: config.crossover_prob,
        mutation_prob: config.mutation_prob,
        stall_generations: config.stall_generations,
        ..Default::default()
    };
    let mut optimizer = NsgaOptimizer::new(&problem, params, rng);
    let outcome = optimizer.run_observed(deadline, &mut on_generation)?;

    // Pick the pareto member with the largest usable area (smallest f₁);
    // the population is already in deterministic order, so `min_by` with a
    // total comparison is stable.
    let best = outcome
        .pareto
        .iter()
        .min_by(|a, b| {
            let fa = a.eval.as_ref().map(|e| e.objectives[0]).unwrap_or(0.0);
            let fb = b.eval.as_ref().map(|e| e.objectives[0]).unwrap_or(0.0);
            fa.total_cmp(&fb)
        })
        .or_else(|| outcome.best())
        .ok_or(estate_evo::OptimizerError::NoFeasibleSolution)?;

    let genes = GridGenes::from_genes(&best.genes);
    let candidate = grid::generate(
        site,
        &genes,
        config.road_internal_width,
        config.road_main_width,
    )?;

    let classified =
        roads::classify_by_boundary(site, &candidate.centrelines, config.road_main_width);
    let network = roads::build_network(
        site,
        &classified,
        config.road_main_width,
        config.road_internal_width,
    )?;

    let footprint = complement_footprint(site, &candidate.blocks);
    Ok(Stage1Output {
        blocks: candidate.blocks,
        segments: network.segments,
        footprint,
        partial: outcome.partial,
    })
}

// ── Voronoi driver ────────────────────────────────────────────────────────────

/// Run the CVT road generator, pre-splitting by user main roads when
/// present.
pub fn run_voronoi(
    site: &Polygon<f64>,
    config: &LayoutConfig,
    main_roads: &[(Vec<Pt>, f64)],
    rng: &mut RunRng,
) -> PipelineResult<Stage1Output> {
    let (regions, presplit_footprint) = roads::presplit_site(site, main_roads)?;
    let site_area = kernel::area(site);

    let mut edges: Vec<(Pt, Pt)> = Vec::new();
    for (i, region) in regions.iter().enumerate() {
        let share = kernel::area(region) / site_area;
        let seeds = ((config.voronoi_seeds as f64 * share).round() as usize).max(3);
        if kernel::area(region) < config.min_lot_area {
            continue; // too small to tessellate; it stays one block
        }
        let params = CvtParams {
            seeds,
            lloyd_iterations: config.lloyd_iterations,
            ..Default::default()
        };
        let mut stream = rng.child(i as u64);
        match voronoi::cvt(region, &params, &mut stream) {
            Ok(outcome) => edges.extend(outcome.diagram.edges),
            Err(err) => {
                // A region the tessellation cannot handle stays one block.
                log::warn!("voronoi failed on region {i}: {err}; keeping it whole");
            }
        }
    }

    // User-supplied roads contribute their own centrelines as main roads.
    let mut classified = roads::classify_edges(site, &edges, config.road_main_width);
    for (polyline, _) in main_roads {
        for w in polyline.windows(2) {
            for (a, b) in kernel::clip_segment_to_polygon(w[0], w[1], site) {
                classified.push((a, b, estate_roads::RoadClass::Main));
            }
        }
    }

    let network = roads::build_network(
        site,
        &classified,
        config.road_main_width,
        config.road_internal_width,
    )?;
    let mut footprint = network.footprint.clone();
    if !presplit_footprint.0.is_empty() {
        footprint = kernel::union_multi(&footprint, &presplit_footprint);
    }

    let blocks = roads::derive_blocks(site, &footprint);
    // Re-derive the footprint from the final block set so the partition is
    // exact (buffer corner artefacts land in the roads, not in limbo).
    let footprint = complement_footprint(site, &blocks);

    Ok(Stage1Output { blocks, segments: network.segments, footprint, partial: false })
}

// ── Shared ────────────────────────────────────────────────────────────────────

/// `site − blocks`, the exact road footprint.
fn complement_footprint(site: &Polygon<f64>, blocks: &[Polygon<f64>]) -> MultiPolygon<f64> {
    let union = kernel::union_all(blocks);
    kernel::difference_multi(&MultiPolygon::new(vec![site.clone()]), &union)
}
