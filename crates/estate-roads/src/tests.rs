//! Unit tests for grid and Voronoi generation.

use estate_core::Pt;
use estate_geom::kernel;

fn square_site(side: f64) -> geo::Polygon<f64> {
    kernel::polygon(&[
        Pt::new(0.0, 0.0),
        Pt::new(side, 0.0),
        Pt::new(side, side),
        Pt::new(0.0, side),
    ])
    .unwrap()
}

#[cfg(test)]
mod grid {
    use estate_core::{LayoutConfig, Pt};
    use estate_geom::kernel;

    use super::square_site;
    use crate::grid::{self, GridGenes};

    #[test]
    fn gene_bounds_match_gene_count() {
        let cfg = LayoutConfig::default();
        assert_eq!(GridGenes::gene_bounds(&cfg).len(), GridGenes::GENE_COUNT);
    }

    #[test]
    fn aligned_lattice_tiles_square_site() {
        let site = square_site(100.0);
        let genes = GridGenes {
            spacing_x: 25.0,
            spacing_y: 25.0,
            angle_deg: 0.0,
            offset_x: 0.0,
            offset_y: 0.0,
        };
        let cand = grid::generate(&site, &genes, 5.0, 0.0).unwrap();
        // Lattice centres land on 0, 25, 50, 75, 100 → 5×5 clipped tiles.
        assert_eq!(cand.blocks.len(), 25);
        let total: f64 = cand.blocks.iter().map(kernel::area).sum();
        // Interior tiles are 20×20; the two boundary rows/columns are halved.
        assert!((total - 6400.0).abs() < 1.0, "total {total}");
    }

    #[test]
    fn rotation_preserves_coverage() {
        let site = square_site(100.0);
        let genes = GridGenes {
            spacing_x: 30.0,
            spacing_y: 30.0,
            angle_deg: 45.0,
            offset_x: 3.0,
            offset_y: -2.0,
        };
        let cand = grid::generate(&site, &genes, 6.0, 0.0).unwrap();
        assert!(!cand.blocks.is_empty());
        let total: f64 = cand.blocks.iter().map(kernel::area).sum();
        // Tile share of a cell is (24/30)² = 0.64; clipping only loses more.
        assert!(total < 0.70 * 10_000.0);
        assert!(total > 0.40 * 10_000.0, "total {total}");
        for b in &cand.blocks {
            let (min, max) = kernel::bounds(b).unwrap();
            assert!(min.x >= -1e-6 && min.y >= -1e-6);
            assert!(max.x <= 100.0 + 1e-6 && max.y <= 100.0 + 1e-6);
        }
    }

    #[test]
    fn boundary_road_insets_blocks() {
        let site = square_site(100.0);
        let genes = GridGenes {
            spacing_x: 25.0,
            spacing_y: 25.0,
            angle_deg: 0.0,
            offset_x: 0.0,
            offset_y: 0.0,
        };
        let cand = grid::generate(&site, &genes, 5.0, 6.0).unwrap();
        for b in &cand.blocks {
            let (min, max) = kernel::bounds(b).unwrap();
            assert!(min.x >= 6.0 - 1e-6 && min.y >= 6.0 - 1e-6, "block reaches boundary");
            assert!(max.x <= 94.0 + 1e-6 && max.y <= 94.0 + 1e-6);
        }
        // The perimeter centreline ring was appended.
        let near_ring = cand
            .centrelines
            .iter()
            .filter(|(a, _)| (a.x - 3.0).abs() < 1e-6 || (a.y - 3.0).abs() < 1e-6)
            .count();
        assert!(near_ring >= 2, "expected perimeter centreline segments");
    }

    #[test]
    fn road_gap_wider_than_tile_yields_no_blocks() {
        let site = square_site(100.0);
        let genes = GridGenes {
            spacing_x: 20.0,
            spacing_y: 20.0,
            angle_deg: 0.0,
            offset_x: 0.0,
            offset_y: 0.0,
        };
        let cand = grid::generate(&site, &genes, 25.0, 0.0).unwrap();
        assert!(cand.blocks.is_empty());
    }

    #[test]
    fn centrelines_stay_inside_site() {
        let site = square_site(100.0);
        let genes = GridGenes {
            spacing_x: 25.0,
            spacing_y: 25.0,
            angle_deg: 10.0,
            offset_x: 0.0,
            offset_y: 0.0,
        };
        let cand = grid::generate(&site, &genes, 5.0, 0.0).unwrap();
        assert!(!cand.centrelines.is_empty());
        for &(a, b) in &cand.centrelines {
            let mid = (a + b).scale(0.5);
            assert!(kernel::covers_point(&site, mid));
        }
    }
}

#[cfg(test)]
mod voronoi {
    use estate_core::{Pt, RunRng};
    use estate_geom::kernel;

    use super::square_site;
    use crate::voronoi::{self, CvtParams, SeedMode};

    fn five_seeds() -> Vec<Pt> {
        vec![
            Pt::new(25.0, 25.0),
            Pt::new(75.0, 25.0),
            Pt::new(75.0, 75.0),
            Pt::new(25.0, 75.0),
            Pt::new(50.0, 50.0),
        ]
    }

    #[test]
    fn cells_partition_the_site() {
        let site = square_site(100.0);
        let diag = voronoi::diagram(&site, &five_seeds()).unwrap();
        assert_eq!(diag.cells.len(), 5);
        let total: f64 = diag
            .cells
            .iter()
            .map(|(_, cell)| kernel::multi_area(cell))
            .sum();
        assert!((total - 10_000.0).abs() < 100.0, "total {total}");
        assert!(!diag.edges.is_empty());
    }

    #[test]
    fn edges_stay_inside_site() {
        let site = square_site(100.0);
        let diag = voronoi::diagram(&site, &five_seeds()).unwrap();
        for &(a, b) in &diag.edges {
            let mid = (a + b).scale(0.5);
            assert!(kernel::covers_point(&site, mid), "edge midpoint {mid} escaped");
        }
    }

    #[test]
    fn rejects_collinear_seeds() {
        let site = square_site(100.0);
        let seeds = vec![Pt::new(10.0, 50.0), Pt::new(50.0, 50.0), Pt::new(90.0, 50.0)];
        assert!(voronoi::diagram(&site, &seeds).is_err());
    }

    #[test]
    fn rejects_too_few_seeds() {
        let site = square_site(100.0);
        assert!(voronoi::diagram(&site, &[Pt::new(1.0, 1.0), Pt::new(2.0, 2.0)]).is_err());
    }

    #[test]
    fn lloyd_converges_and_keeps_partition() {
        let site = square_site(100.0);
        let mut rng = RunRng::new(7);
        let seeds = voronoi::sample_seeds(&site, 12, SeedMode::Uniform, &mut rng).unwrap();
        let (relaxed, iters) = voronoi::lloyd_relax(&site, seeds, 20, 0.1).unwrap();
        assert!(iters <= 20);
        assert_eq!(relaxed.len(), 12);
        for s in &relaxed {
            assert!(kernel::covers_point(&site, *s), "relaxed seed {s} left the site");
        }
        let diag = voronoi::diagram(&site, &relaxed).unwrap();
        let total: f64 = diag.cells.iter().map(|(_, c)| kernel::multi_area(c)).sum();
        assert!((total - 10_000.0).abs() < 100.0);
    }

    #[test]
    fn sampling_is_deterministic() {
        let site = square_site(100.0);
        let a = voronoi::sample_seeds(&site, 10, SeedMode::Uniform, &mut RunRng::new(42)).unwrap();
        let b = voronoi::sample_seeds(&site, 10, SeedMode::Uniform, &mut RunRng::new(42)).unwrap();
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert!(x.approx_eq(*y));
        }
    }

    #[test]
    fn latin_hypercube_covers_strata() {
        let site = square_site(100.0);
        let seeds =
            voronoi::sample_seeds(&site, 16, SeedMode::LatinHypercube, &mut RunRng::new(3))
                .unwrap();
        assert_eq!(seeds.len(), 16);
        for s in &seeds {
            assert!(kernel::contains_point(&site, *s));
        }
    }

    #[test]
    fn cvt_runs_end_to_end() {
        let site = square_site(100.0);
        let params = CvtParams { seeds: 10, lloyd_iterations: 15, ..Default::default() };
        let out = voronoi::cvt(&site, &params, &mut RunRng::new(11)).unwrap();
        assert!(out.iterations >= 1 && out.iterations <= 15);
        assert!(out.seeds.len() >= 8, "kept {} seeds", out.seeds.len());
        for (_, cell) in &out.diagram.cells {
            assert!(kernel::multi_area(cell) > 0.0);
        }
    }
}

#[cfg(test)]
mod roads {
    use estate_core::Pt;
    use estate_geom::kernel;

    use super::square_site;
    use crate::roads::{self, RoadClass};

    #[test]
    fn boundary_edges_classify_main() {
        let site = square_site(100.0);
        let edges = vec![
            (Pt::new(0.0, 2.0), Pt::new(30.0, 2.0)),   // hugs the boundary
            (Pt::new(40.0, 50.0), Pt::new(60.0, 50.0)), // interior, short
        ];
        let classified = roads::classify_edges(&site, &edges, 8.0);
        assert_eq!(classified[0].2, RoadClass::Main);
        assert_eq!(classified[1].2, RoadClass::Internal);
    }

    #[test]
    fn blocks_and_footprint_partition_site() {
        let site = square_site(100.0);
        let classified = vec![
            (Pt::new(50.0, 0.0), Pt::new(50.0, 100.0), RoadClass::Main),
            (Pt::new(0.0, 50.0), Pt::new(100.0, 50.0), RoadClass::Internal),
        ];
        let network = roads::build_network(&site, &classified, 10.0, 6.0).unwrap();
        let blocks = roads::derive_blocks(&site, &network.footprint);
        assert_eq!(blocks.len(), 4);

        let blocks_area: f64 = blocks.iter().map(kernel::area).sum();
        let roads_area = kernel::multi_area(&network.footprint);
        let site_area = kernel::area(&site);
        assert!(
            (blocks_area + roads_area - site_area).abs() < site_area * 0.01,
            "blocks {blocks_area} + roads {roads_area} != site {site_area}"
        );
    }

    #[test]
    fn network_length_sums_segments() {
        let site = square_site(100.0);
        let classified = vec![
            (Pt::new(50.0, 0.0), Pt::new(50.0, 100.0), RoadClass::Main),
        ];
        let network = roads::build_network(&site, &classified, 10.0, 6.0).unwrap();
        assert!((network.total_length() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn presplit_divides_site() {
        let site = square_site(100.0);
        let roads_in = vec![(vec![Pt::new(50.0, -5.0), Pt::new(50.0, 105.0)], 10.0)];
        let (regions, footprint) = roads::presplit_site(&site, &roads_in).unwrap();
        assert_eq!(regions.len(), 2);
        assert!(kernel::multi_area(&footprint) > 900.0);
    }

    #[test]
    fn presplit_without_roads_is_identity() {
        let site = square_site(100.0);
        let (regions, footprint) = roads::presplit_site(&site, &[]).unwrap();
        assert_eq!(regions.len(), 1);
        assert!(footprint.0.is_empty());
    }
}
