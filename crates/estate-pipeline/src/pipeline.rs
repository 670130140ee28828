//! The orchestrator: validate → stage 1 → stage 2 → connectivity →
//! stage 3 → assemble.
//!
//! `Pipeline::run` never returns `Err`: boundary failures produce a
//! `Failed` layout with one fatal code, recoverable failures degrade the
//! layout and append warnings, and an expired deadline downgrades the
//! status to `Partial`.

use std::time::Duration;

use geo::Polygon;

use estate_core::{
    BlockId, CancelToken, Deadline, FatalCode, LayoutConfig, LayoutMethod, LayoutStatus, LotId,
    Pt, RunRng, Warning,
};
use estate_geom::kernel;
use estate_net::astar::{self, Connectivity};
use estate_net::drainage::{self, ElevationModel, RoadGraph};
use estate_net::transformer::{self, TransformerParams};
use estate_net::{mst, RoadRaster};
use estate_subdiv::classify::{self, ClassifyParams};
use estate_subdiv::slicer::{self, SliceParams};
use estate_subdiv::{BlockClass, SolverError};

use crate::error::{PipelineError, PipelineResult};
use crate::layout::{BlockRec, Layout, LayoutMetrics, LotRec, PolygonRec, RoadRec};
use crate::observer::{NoopObserver, PipelineObserver, Stage};
use crate::stage1::{self, Stage1Output};

/// `auto` switches to Voronoi above this site area (m²) when no internal
/// roads constrain the layout.
const VORONOI_AREA_THRESHOLD: f64 = 50_000.0;
/// Nearest-road search radius for the connectivity check, in cells.
const ROAD_SEARCH_RADIUS_CELLS: usize = 100;
/// Display length of drainage arrows, metres.
const DRAINAGE_ARROW_LENGTH: f64 = 10.0;
/// Road-graph endpoint snapping tolerance, metres.
const ROAD_GRAPH_SNAP_TOL: f64 = 0.5;
/// RNG stream offsets per subsystem.
const STREAM_STAGE1: u64 = 1;
const STREAM_TRANSFORMERS: u64 = 2;

// ── Builder ───────────────────────────────────────────────────────────────────

/// Configure and construct a [`Pipeline`].
pub struct PipelineBuilder {
    config: LayoutConfig,
    internal_roads: Vec<(Vec<Pt>, f64)>,
    elevation: Option<Box<dyn ElevationModel>>,
    network_drainage: bool,
}

impl PipelineBuilder {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            internal_roads: vec![],
            elevation: None,
            network_drainage: false,
        }
    }

    /// Caller-supplied main roads (polyline + width).  Their presence also
    /// forces `auto` mode onto the grid path and pre-splits the Voronoi
    /// path.
    pub fn internal_roads(mut self, roads: Vec<(Vec<Pt>, f64)>) -> Self {
        self.internal_roads = roads;
        self
    }

    /// Terrain model used to pick the drainage sink; without one the site
    /// centroid is used.
    pub fn elevation(mut self, model: Box<dyn ElevationModel>) -> Self {
        self.elevation = Some(model);
        self
    }

    /// Route drainage along the road graph instead of straight vectors.
    pub fn network_drainage(mut self, enabled: bool) -> Self {
        self.network_drainage = enabled;
        self
    }

    /// Validate the configuration and produce a ready pipeline.
    pub fn build(self) -> PipelineResult<Pipeline> {
        self.config.validate().map_err(PipelineError::InvalidConfig)?;
        Ok(Pipeline {
            config: self.config,
            internal_roads: self.internal_roads,
            elevation: self.elevation,
            network_drainage: self.network_drainage,
        })
    }
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

/// A validated, reusable pipeline.  Each [`run`](Pipeline::run) is an
/// independent deterministic function of (site, config, seed).
pub struct Pipeline {
    config: LayoutConfig,
    internal_roads: Vec<(Vec<Pt>, f64)>,
    elevation: Option<Box<dyn ElevationModel>>,
    network_drainage: bool,
}

impl Pipeline {
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Run with no deadline, no cancellation, and no observer.
    pub fn run(&self, outer: &[Pt], holes: &[Vec<Pt>]) -> Layout {
        self.run_with(outer, holes, Deadline::none(), &CancelToken::new(), &mut NoopObserver)
    }

    /// Full-control entry point.
    pub fn run_with(
        &self,
        outer: &[Pt],
        holes: &[Vec<Pt>],
        deadline: Deadline,
        cancel: &CancelToken,
        observer: &mut dyn PipelineObserver,
    ) -> Layout {
        // ── Validate the site ─────────────────────────────────────────────
        let site = match kernel::polygon_with_holes(outer, holes) {
            Ok(site) => site,
            Err(err) => {
                log::warn!("site rejected: {err}");
                return Layout::failed(FatalCode::InvalidSite);
            }
        };
        let site_area = kernel::area(&site);
        let mut warnings: Vec<Warning> = Vec::new();
        let mut rng = RunRng::new(self.config.seed);

        // ── Stage 1: roads and blocks ─────────────────────────────────────
        if cancel.is_cancelled() {
            return Layout::failed(FatalCode::Cancelled);
        }
        observer.on_stage_start(Stage::RoadsAndBlocks);
        let stage1 = match self.run_stage1(&site, site_area, &mut rng, deadline, observer) {
            Ok(out) => out,
            Err(err) => {
                log::warn!("stage 1 failed: {err}");
                return Layout::failed(FatalCode::NoFeasibleSolution);
            }
        };
        if stage1.partial {
            warnings.push(Warning::OptimizerPartial);
        }
        observer.on_stage_end(Stage::RoadsAndBlocks);

        // ── Stage 2: classification and subdivision ───────────────────────
        if cancel.is_cancelled() {
            return Layout::failed(FatalCode::Cancelled);
        }
        observer.on_stage_start(Stage::Subdivision);
        let (mut blocks, mut lots, mut discarded) =
            self.subdivide(&site, &stage1, deadline, &mut warnings);
        observer.on_stage_end(Stage::Subdivision);

        // ── Road-connectivity validation ──────────────────────────────────
        if cancel.is_cancelled() {
            return Layout::failed(FatalCode::Cancelled);
        }
        observer.on_stage_start(Stage::Connectivity);
        self.validate_connectivity(&site, &stage1, &mut blocks, &mut lots, &mut warnings);
        observer.on_stage_end(Stage::Connectivity);

        // ── Stage 3: infrastructure ───────────────────────────────────────
        if cancel.is_cancelled() {
            return Layout::failed(FatalCode::Cancelled);
        }
        observer.on_stage_start(Stage::Infrastructure);
        let centroids: Vec<Pt> = lots.iter().map(|l| l.centroid).collect();

        let trunk = mst::build_forest(
            &centroids,
            self.config.max_edge_distance,
            self.config.loop_redundancy_ratio,
        );
        if trunk.components.len() > 1 {
            warnings.push(Warning::NetworkDisconnected { components: trunk.components.len() });
        }

        let transformer_params = TransformerParams {
            capacity_kva: self.config.transformer_capacity_kva,
            lots_per_transformer: self.config.lots_per_transformer,
            ..Default::default()
        };
        let loads = vec![self.config.lot_load_kw; centroids.len()];
        let mut transformer_stream = rng.child(STREAM_TRANSFORMERS);
        let plan = transformer::plan(&centroids, &loads, &transformer_params, &mut transformer_stream);
        if !plan.feasible {
            for (i, t) in plan.transformers.iter().enumerate() {
                if t.load_kw > self.config.transformer_capacity_kva {
                    warnings.push(Warning::TransformerOverCapacity {
                        transformer: i,
                        load_kw: t.load_kw,
                    });
                }
            }
        }

        let drainage_arrows = self.plan_drainage(&site, &stage1, &centroids, &mut warnings);
        observer.on_stage_end(Stage::Infrastructure);

        // ── Assemble ──────────────────────────────────────────────────────
        discarded += blocks
            .iter()
            .filter(|b| b.class == BlockClass::Discard)
            .count();

        let total_commercial_area: f64 = blocks
            .iter()
            .filter(|b| b.class == BlockClass::Commercial)
            .map(|b| b.area_m2)
            .sum();
        let total_green_area: f64 = blocks
            .iter()
            .filter(|b| b.class == BlockClass::Green)
            .map(|b| b.area_m2)
            .sum();
        let average_lot_area = if lots.is_empty() {
            0.0
        } else {
            lots.iter().map(|l| l.area_m2).sum::<f64>() / lots.len() as f64
        };

        let status = if warnings
            .iter()
            .any(|w| matches!(w, Warning::OptimizerPartial | Warning::SolverTimeout { .. }))
        {
            LayoutStatus::Partial
        } else {
            LayoutStatus::Ok
        };

        Layout {
            status,
            fatal: None,
            warnings,
            site: PolygonRec::from_geo(&site),
            roads: stage1.segments.iter().map(RoadRec::from).collect(),
            road_footprint: stage1.footprint.iter().map(PolygonRec::from_geo).collect(),
            blocks,
            lots,
            mst_edges: trunk.tree,
            redundancy_edges: trunk.redundancy,
            transformers: plan.transformers,
            drainage: drainage_arrows,
            metrics: LayoutMetrics {
                total_commercial_area,
                total_green_area,
                utilization_ratio: (total_commercial_area / site_area).clamp(0.0, 1.0),
                mst_length_m: trunk.total_length,
                average_lot_area,
                discarded_blocks: discarded,
            },
        }
    }

    // ── Stage 1 dispatch ──────────────────────────────────────────────────

    fn run_stage1(
        &self,
        site: &Polygon<f64>,
        site_area: f64,
        rng: &mut RunRng,
        deadline: Deadline,
        observer: &mut dyn PipelineObserver,
    ) -> PipelineResult<Stage1Output> {
        let method = match self.config.layout_method {
            LayoutMethod::Grid => LayoutMethod::Grid,
            LayoutMethod::Voronoi => LayoutMethod::Voronoi,
            LayoutMethod::Auto => {
                if site_area > VORONOI_AREA_THRESHOLD && self.internal_roads.is_empty() {
                    LayoutMethod::Voronoi
                } else {
                    LayoutMethod::Grid
                }
            }
        };
        let mut stream = rng.child(STREAM_STAGE1);
        match method {
            LayoutMethod::Voronoi => {
                stage1::run_voronoi(site, &self.config, &self.internal_roads, &mut stream)
            }
            _ => stage1::run_grid(site, &self.config, stream, deadline, |generation, best| {
                observer.on_generation(generation, best)
            }),
        }
    }

    // ── Stage 2 ───────────────────────────────────────────────────────────

    /// Classify every block; slice the commercial ones.  Returns (blocks,
    /// lots, infeasible-block count).
    fn subdivide(
        &self,
        site: &Polygon<f64>,
        stage1: &Stage1Output,
        deadline: Deadline,
        warnings: &mut Vec<Warning>,
    ) -> (Vec<BlockRec>, Vec<LotRec>, usize) {
        let classify_params = ClassifyParams::new(self.config.min_lot_area, 0.01);
        let slice_params = SliceParams {
            min_width_m: self.config.min_lot_width,
            max_width_m: self.config.max_lot_width,
            target_width_m: self.config.target_lot_width,
            setback_m: self.config.setback_distance,
            min_clip_ratio: 0.9,
        };
        let solver_budget = Duration::from_secs_f64(self.config.solver_time_limit_sec);

        let mut blocks = Vec::with_capacity(stage1.blocks.len());
        let mut lots: Vec<LotRec> = Vec::new();
        let mut infeasible = 0usize;

        for (index, polygon) in stage1.blocks.iter().enumerate() {
            let block_id = BlockId(index as u32);
            let metrics = match classify::metrics(polygon) {
                Ok(m) => m,
                Err(_) => {
                    warnings.push(Warning::DegenerateGeometry { stage: "classification".into() });
                    blocks.push(BlockRec {
                        id: block_id,
                        polygon: PolygonRec::from_geo(polygon),
                        class: BlockClass::Discard,
                        area_m2: kernel::area(polygon),
                        rectangularity: 0.0,
                        aspect: 0.0,
                    });
                    continue;
                }
            };
            let mut class = classify::classify(polygon, &metrics, site, &classify_params);

            if class == BlockClass::Commercial {
                match slicer::slice_block(polygon, &metrics, &slice_params, deadline.capped(solver_budget)) {
                    Ok(result) => {
                        if result.timed_out {
                            warnings.push(Warning::SolverTimeout { block: block_id });
                        }
                        let kept: Vec<_> = result
                            .lots
                            .into_iter()
                            .filter(|lot| lot.area_m2 >= self.config.min_lot_area)
                            .collect();
                        if kept.is_empty() {
                            // Undersized residuals promote to green space.
                            class = BlockClass::Green;
                            infeasible += 1;
                            warnings.push(Warning::BlockInfeasible { block: block_id });
                        } else {
                            for lot in kept {
                                lots.push(LotRec {
                                    id: LotId(lots.len() as u32),
                                    block: block_id,
                                    polygon: PolygonRec::from_geo(&lot.polygon),
                                    width_m: lot.width_m,
                                    depth_m: lot.depth_m,
                                    area_m2: lot.area_m2,
                                    centroid: lot.centroid,
                                });
                            }
                        }
                    }
                    Err(SolverError::Timeout) => {
                        class = BlockClass::Green;
                        infeasible += 1;
                        warnings.push(Warning::SolverTimeout { block: block_id });
                    }
                    Err(_) => {
                        class = BlockClass::Green;
                        infeasible += 1;
                        warnings.push(Warning::BlockInfeasible { block: block_id });
                    }
                }
            }

            blocks.push(BlockRec {
                id: block_id,
                polygon: PolygonRec::from_geo(polygon),
                class,
                area_m2: metrics.area,
                rectangularity: metrics.rectangularity,
                aspect: metrics.aspect,
            });
        }
        (blocks, lots, infeasible)
    }

    // ── Connectivity validation ───────────────────────────────────────────

    /// Drop lots that cannot reach a road cell; blocks that lose all their
    /// lots fall back to green.
    fn validate_connectivity(
        &self,
        site: &Polygon<f64>,
        stage1: &Stage1Output,
        blocks: &mut [BlockRec],
        lots: &mut Vec<LotRec>,
        warnings: &mut Vec<Warning>,
    ) {
        if lots.is_empty() || stage1.segments.is_empty() {
            return;
        }
        let segments: Vec<(Pt, Pt, f64)> =
            stage1.segments.iter().map(|s| (s.a, s.b, s.width)).collect();
        let raster = match RoadRaster::from_site(site, &segments, self.config.raster_cell_size) {
            Ok(r) => r,
            Err(err) => {
                log::warn!("connectivity raster failed: {err}; skipping validation");
                warnings.push(Warning::DegenerateGeometry { stage: "connectivity".into() });
                return;
            }
        };

        let mut kept: Vec<LotRec> = Vec::with_capacity(lots.len());
        for lot in lots.drain(..) {
            let reachable = raster
                .cell_of(lot.centroid)
                .and_then(|cell| {
                    astar::path_to_road(&raster, cell, ROAD_SEARCH_RADIUS_CELLS, Connectivity::Eight)
                })
                .is_some();
            if reachable {
                kept.push(lot);
            } else {
                warnings.push(Warning::LotUnreachable { lot: lot.id });
            }
        }

        // Re-number after removals so LotIds index the final vector.
        for (i, lot) in kept.iter_mut().enumerate() {
            lot.id = LotId(i as u32);
        }

        for block in blocks.iter_mut() {
            if block.class == BlockClass::Commercial
                && !kept.iter().any(|lot| lot.block == block.id)
            {
                block.class = BlockClass::Green;
            }
        }
        *lots = kept;
    }

    // ── Drainage ──────────────────────────────────────────────────────────

    fn plan_drainage(
        &self,
        site: &Polygon<f64>,
        stage1: &Stage1Output,
        centroids: &[Pt],
        warnings: &mut Vec<Warning>,
    ) -> Vec<estate_net::DrainageArrow> {
        let wwtp = match drainage::choose_wwtp(site, self.elevation.as_deref()) {
            Ok(p) => p,
            Err(_) => {
                warnings.push(Warning::DegenerateGeometry { stage: "drainage".into() });
                return vec![];
            }
        };
        if self.network_drainage && !stage1.segments.is_empty() {
            let segments: Vec<(Pt, Pt)> =
                stage1.segments.iter().map(|s| (s.a, s.b)).collect();
            let graph = RoadGraph::from_segments(&segments, ROAD_GRAPH_SNAP_TOL);
            drainage::network_arrows(centroids, wwtp, &graph, DRAINAGE_ARROW_LENGTH)
        } else {
            drainage::direct_arrows(centroids, wwtp, DRAINAGE_ARROW_LENGTH)
        }
    }
}
