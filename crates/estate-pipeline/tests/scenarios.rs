//! End-to-end scenarios over the full pipeline, plus the layout invariants
//! every run must satisfy.

use estate_core::{LayoutConfig, LayoutMethod, LayoutStatus, Pt, RunRng, Warning};
use estate_evo::{NsgaOptimizer, NsgaParams};
use estate_geom::kernel;
use estate_net::RoadRaster;
use estate_pipeline::{FacilityKind, Layout, PipelineBuilder, PlacementProblem};

// ── Shared checks ─────────────────────────────────────────────────────────────

/// I1: blocks plus road footprint partition the site (1 % area slack).
fn assert_partition(layout: &Layout) {
    let site_area = kernel::area(&layout.site.to_geo());
    let blocks_area: f64 = layout
        .blocks
        .iter()
        .map(|b| kernel::area(&b.polygon.to_geo()))
        .sum();
    let roads_area: f64 = layout
        .road_footprint
        .iter()
        .map(|p| kernel::area(&p.to_geo()))
        .sum();
    assert!(
        (blocks_area + roads_area - site_area).abs() <= site_area * 0.01,
        "blocks {blocks_area:.1} + roads {roads_area:.1} vs site {site_area:.1}"
    );
}

/// I2: every lot lies inside its parent block (and only that block).
fn assert_lots_in_blocks(layout: &Layout) {
    for lot in &layout.lots {
        let lot_poly = lot.polygon.to_geo();
        let lot_area = kernel::area(&lot_poly);
        let parent = &layout.blocks[lot.block.index()];
        let overlap =
            kernel::multi_area(&kernel::intersection(&lot_poly, &parent.polygon.to_geo()));
        assert!(
            overlap >= lot_area * 0.999,
            "{} escapes its parent block ({overlap:.2} of {lot_area:.2})",
            lot.id
        );
    }
}

/// I3: no two lots overlap.
fn assert_lots_disjoint(layout: &Layout) {
    let polys: Vec<_> = layout.lots.iter().map(|l| l.polygon.to_geo()).collect();
    let total: f64 = layout.lots.iter().map(|l| l.area_m2).sum();
    for i in 0..polys.len() {
        for j in (i + 1)..polys.len() {
            let overlap = kernel::multi_area(&kernel::intersection(&polys[i], &polys[j]));
            assert!(
                overlap <= total * 1e-6,
                "lots {i} and {j} overlap by {overlap}"
            );
        }
    }
}

/// I5 (connected case) + I6.
fn assert_infrastructure(layout: &Layout, capacity_kva: f64) {
    let n = layout.lots.len();
    let disconnected = layout
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::NetworkDisconnected { .. }));
    if !disconnected && n > 0 {
        assert_eq!(layout.mst_edges.len(), n - 1, "tree edge count");
    }
    for t in &layout.transformers {
        assert!(
            t.load_kw <= capacity_kva + 1e-6,
            "transformer over capacity: {} kW",
            t.load_kw
        );
    }
    let served: usize = layout.transformers.iter().map(|t| t.served.len()).sum();
    assert_eq!(served, n, "every lot is served by exactly one transformer");
    assert_eq!(layout.drainage.len(), n, "one drainage arrow per lot");
}

// ── Scenario 1: unit square, grid mode ────────────────────────────────────────

fn square_config() -> LayoutConfig {
    // With an 8 m perimeter road the usable span is 84 m; four 19.5 m
    // tiles plus three 2 m internal roads fill it exactly at 21.5 m pitch,
    // so the optimum sits at the top of the spacing range.
    LayoutConfig {
        layout_method: LayoutMethod::Grid,
        spacing_min: 19.0,
        spacing_max: 21.5,
        angle_min: 0.0,
        angle_max: 5.0,
        population_size: 50,
        generations: 20,
        target_lot_width: 6.0,
        min_lot_width: 4.0,
        max_lot_width: 8.0,
        min_lot_area: 30.0,
        setback_distance: 6.0,
        road_main_width: 8.0,
        road_internal_width: 2.0,
        seed: 42,
        ..Default::default()
    }
}

fn square_site() -> Vec<Pt> {
    vec![
        Pt::new(0.0, 0.0),
        Pt::new(100.0, 0.0),
        Pt::new(100.0, 100.0),
        Pt::new(0.0, 100.0),
    ]
}

#[test]
fn scenario_unit_square_grid() {
    let pipeline = PipelineBuilder::new(square_config()).build().unwrap();
    let layout = pipeline.run(&square_site(), &[]);

    assert_ne!(layout.status, LayoutStatus::Failed);
    let commercial = layout
        .blocks
        .iter()
        .filter(|b| b.class == estate_pipeline::BlockClass::Commercial)
        .count();
    assert!(commercial >= 1, "no commercial blocks");
    assert!(layout.lots.len() >= 40, "only {} lots", layout.lots.len());
    assert!(
        layout.metrics.utilization_ratio >= 0.55,
        "utilization {}",
        layout.metrics.utilization_ratio
    );
    assert!(layout.metrics.utilization_ratio <= 1.0);
    assert!(layout.metrics.average_lot_area >= 30.0);

    assert_partition(&layout);
    assert_lots_in_blocks(&layout);
    assert_lots_disjoint(&layout);
    assert_infrastructure(&layout, pipeline.config().transformer_capacity_kva);

    // I4: commercial lot frontages respect the width bounds.
    for lot in &layout.lots {
        assert!(
            (4.0 - 1e-9..=8.0 + 1e-9).contains(&lot.width_m),
            "lot width {}",
            lot.width_m
        );
        assert!(lot.area_m2 >= 30.0 - 1e-9);
    }
}

/// I7: identical inputs and seed replay to an identical layout.
#[test]
fn scenario_unit_square_is_deterministic() {
    let run = || {
        let pipeline = PipelineBuilder::new(square_config()).build().unwrap();
        pipeline.run(&square_site(), &[])
    };
    let a = run();
    let b = run();
    assert_eq!(a.lots.len(), b.lots.len());
    assert_eq!(a.blocks.len(), b.blocks.len());
    assert_eq!(a.metrics.total_commercial_area, b.metrics.total_commercial_area);
    assert_eq!(a.metrics.mst_length_m, b.metrics.mst_length_m);
    assert_eq!(a.road_length_m(), b.road_length_m());
    for (x, y) in a.lots.iter().zip(&b.lots) {
        assert!(x.centroid.approx_eq(y.centroid));
        assert_eq!(x.width_m, y.width_m);
    }
    for (x, y) in a.transformers.iter().zip(&b.transformers) {
        assert!(x.position.approx_eq(y.position));
        assert_eq!(x.served, y.served);
    }
}

// ── Scenario 2: thin rectangle, grid mode ─────────────────────────────────────

#[test]
fn scenario_thin_rectangle_grid() {
    // Usable strip is 194×24 m: seven 26 m tiles at 28 m pitch fill the
    // long axis exactly, and any pitch ≥ 26 covers the depth in one row.
    let config = LayoutConfig {
        layout_method: LayoutMethod::Grid,
        spacing_min: 24.0,
        spacing_max: 28.0,
        angle_min: 0.0,
        angle_max: 2.0,
        population_size: 50,
        generations: 30,
        target_lot_width: 6.0,
        min_lot_width: 4.0,
        max_lot_width: 8.0,
        min_lot_area: 5.0,
        setback_distance: 6.0,
        road_main_width: 3.0,
        road_internal_width: 2.0,
        seed: 42,
        ..Default::default()
    };
    let site = vec![
        Pt::new(0.0, 0.0),
        Pt::new(200.0, 0.0),
        Pt::new(200.0, 30.0),
        Pt::new(0.0, 30.0),
    ];
    let pipeline = PipelineBuilder::new(config).build().unwrap();
    let layout = pipeline.run(&site, &[]);

    assert_ne!(layout.status, LayoutStatus::Failed);
    assert!(!layout.lots.is_empty());
    assert_eq!(layout.metrics.discarded_blocks, 0, "warnings: {:?}", layout.warnings);

    // Single row: every lot-bearing block spans (almost) the full usable
    // depth of the strip.
    for block in &layout.blocks {
        if layout.lots.iter().any(|l| l.block == block.id) {
            let (min, max) = kernel::bounds(&block.polygon.to_geo()).unwrap();
            assert!(max.y - min.y >= 20.0, "block is not full-depth");
        }
    }
    for lot in &layout.lots {
        assert!((4.0 - 1e-9..=8.0 + 1e-9).contains(&lot.width_m));
    }
    assert_partition(&layout);
    assert_lots_disjoint(&layout);
}

// ── Scenario 3: L-shaped site, Voronoi mode ───────────────────────────────────

fn l_shape() -> Vec<Pt> {
    // Outer 200×200 with a 100×100 notch removed from the top-right.
    vec![
        Pt::new(0.0, 0.0),
        Pt::new(200.0, 0.0),
        Pt::new(200.0, 100.0),
        Pt::new(100.0, 100.0),
        Pt::new(100.0, 200.0),
        Pt::new(0.0, 200.0),
    ]
}

fn l_shape_config() -> LayoutConfig {
    LayoutConfig {
        layout_method: LayoutMethod::Voronoi,
        voronoi_seeds: 15,
        lloyd_iterations: 20,
        min_lot_area: 500.0,
        target_lot_width: 30.0,
        min_lot_width: 20.0,
        max_lot_width: 60.0,
        road_main_width: 10.0,
        road_internal_width: 6.0,
        seed: 7,
        ..Default::default()
    }
}

#[test]
fn scenario_l_shape_voronoi() {
    let pipeline = PipelineBuilder::new(l_shape_config()).build().unwrap();
    let layout = pipeline.run(&l_shape(), &[]);

    assert_ne!(layout.status, LayoutStatus::Failed);
    assert!(layout.blocks.len() >= 5, "only {} blocks", layout.blocks.len());

    // No block geometry crosses the notch boundary (all blocks ⊆ site).
    let site = layout.site.to_geo();
    for block in &layout.blocks {
        let poly = block.polygon.to_geo();
        let inside = kernel::multi_area(&kernel::intersection(&poly, &site));
        let area = kernel::area(&poly);
        assert!(
            inside >= area * 0.999,
            "block {} leaks outside the site",
            block.id
        );
    }
    assert_partition(&layout);
}

#[test]
fn scenario_l_shape_road_length_is_deterministic() {
    let run = || {
        let pipeline = PipelineBuilder::new(l_shape_config()).build().unwrap();
        pipeline.run(&l_shape(), &[])
    };
    let a = run();
    let b = run();
    assert_eq!(a.road_length_m(), b.road_length_m());
    assert!(a.road_length_m() > 0.0);
}

// ── Scenario 4: constrained facility placement ────────────────────────────────

#[test]
fn scenario_constrained_placement() {
    const WAREHOUSE: FacilityKind = FacilityKind(0);
    const OFFICE: FacilityKind = FacilityKind(1);
    const FACTORY: FacilityKind = FacilityKind(2);

    // 500×400 m boundary with two crossing roads.
    let mut raster = RoadRaster::blank(Pt::ZERO, 50, 40, 10.0);
    for y in 0..40 {
        raster.set_road((25, y));
    }
    for x in 0..50 {
        raster.set_road((x, 20));
    }

    // Separations: (warehouse, office) = 50, (factory, office) = 100,
    // everything else 20.
    let mut separation = vec![vec![20.0; 3]; 3];
    separation[0][1] = 50.0;
    separation[1][0] = 50.0;
    separation[2][1] = 100.0;
    separation[1][2] = 100.0;

    let problem = PlacementProblem::new(
        Pt::ZERO,
        Pt::new(500.0, 400.0),
        vec![WAREHOUSE, WAREHOUSE, OFFICE, FACTORY],
        separation,
        raster,
        100,
    );

    let params = NsgaParams {
        population_size: 40,
        generations: 200,
        ..Default::default()
    };
    let mut optimizer = NsgaOptimizer::new(&problem, params, RunRng::new(42));
    let outcome = optimizer
        .run(estate_core::Deadline::none())
        .expect("a feasible placement exists");

    let feasible: Vec<_> = outcome
        .pareto
        .iter()
        .filter(|ind| ind.eval.as_ref().is_some_and(|e| e.feasible()))
        .collect();
    assert!(!feasible.is_empty(), "no feasible pareto member after 200 generations");

    for ind in &feasible {
        let eval = ind.eval.as_ref().unwrap();
        assert!(eval.violations.iter().all(|&g| g <= 0.0));
        let positions = problem.decode(&ind.genes);
        assert_eq!(positions.len(), 4);
        for p in &positions {
            assert!((0.0..=500.0).contains(&p.x) && (0.0..=400.0).contains(&p.y));
        }
        // Spot-check the binding separations.
        assert!(positions[0].distance(positions[2]) >= 50.0 - 1e-6);
        assert!(positions[3].distance(positions[2]) >= 100.0 - 1e-6);
    }
}

// ── Auto-mode decision rule ───────────────────────────────────────────────────

#[test]
fn auto_mode_prefers_voronoi_on_large_unconstrained_sites() {
    // 300×300 m = 90 000 m² > 50 000 m² and no internal roads → Voronoi.
    // Voronoi stage 1 has no optimizer, so OptimizerPartial can never
    // appear even under an instant deadline — that distinguishes the path.
    let config = LayoutConfig {
        voronoi_seeds: 12,
        lloyd_iterations: 10,
        min_lot_area: 500.0,
        seed: 3,
        ..Default::default()
    };
    let site = vec![
        Pt::new(0.0, 0.0),
        Pt::new(300.0, 0.0),
        Pt::new(300.0, 300.0),
        Pt::new(0.0, 300.0),
    ];
    let pipeline = PipelineBuilder::new(config).build().unwrap();
    let layout = pipeline.run(&site, &[]);
    assert_ne!(layout.status, LayoutStatus::Failed);
    assert!(
        !layout.warnings.iter().any(|w| matches!(w, Warning::OptimizerPartial)),
        "auto mode should have taken the Voronoi path"
    );
    assert!(layout.blocks.len() >= 6);
    assert_partition(&layout);
}
