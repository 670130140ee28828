//! Unit tests for raster, A*, MST, k-means, transformers, and drainage.

#[cfg(test)]
mod raster {
    use estate_core::Pt;
    use estate_geom::kernel;

    use crate::raster::RoadRaster;

    #[test]
    fn rasterises_roads_and_site() {
        let site = kernel::rect_poly(Pt::ZERO, Pt::new(50.0, 50.0));
        let segments = vec![(Pt::new(25.0, 0.0), Pt::new(25.0, 50.0), 4.0)];
        let raster = RoadRaster::from_site(&site, &segments, 1.0).unwrap();
        assert_eq!(raster.cols(), 50);
        assert_eq!(raster.rows(), 50);
        assert!(raster.is_road((25, 10)) || raster.is_road((24, 10)));
        assert!(!raster.is_road((5, 5)));
        assert!(raster.road_cell_count() > 100);
    }

    #[test]
    fn cells_outside_site_are_blocked() {
        // Triangle: the top-left half of the bounding box is outside.
        let site = kernel::polygon(&[
            Pt::new(0.0, 0.0),
            Pt::new(50.0, 0.0),
            Pt::new(50.0, 50.0),
        ])
        .unwrap();
        let raster = RoadRaster::from_site(&site, &[], 1.0).unwrap();
        assert!(raster.is_blocked((2, 45)));
        assert!(!raster.is_blocked((45, 2)));
    }

    #[test]
    fn cell_mapping_round_trips() {
        let site = kernel::rect_poly(Pt::new(10.0, 20.0), Pt::new(60.0, 70.0));
        let raster = RoadRaster::from_site(&site, &[], 1.0).unwrap();
        let cell = raster.cell_of(Pt::new(14.4, 22.9)).unwrap();
        assert_eq!(cell, (4, 2));
        let centre = raster.centre_of(cell);
        assert!(centre.approx_eq(Pt::new(14.5, 22.5)));
        assert!(raster.cell_of(Pt::new(5.0, 5.0)).is_none());
    }

    #[test]
    fn nearest_road_cell_scans_outward() {
        let mut raster = RoadRaster::blank(Pt::ZERO, 20, 20, 1.0);
        raster.set_road((10, 14));
        assert_eq!(raster.nearest_road_cell((10, 10), 100), Some((10, 14)));
        assert_eq!(raster.nearest_road_cell((10, 10), 2), None);
        raster.set_road((10, 10));
        assert_eq!(raster.nearest_road_cell((10, 10), 100), Some((10, 10)));
    }
}

#[cfg(test)]
mod astar {
    use estate_core::Pt;

    use crate::astar::{self, Connectivity};
    use crate::raster::RoadRaster;

    /// Scenario raster: 50×50 grid, two crossing roads at x = 25 and
    /// y = 25.
    fn crossing_roads() -> RoadRaster {
        let mut raster = RoadRaster::blank(Pt::ZERO, 50, 50, 1.0);
        for i in 0..50 {
            raster.set_road((25, i));
            raster.set_road((i, 25));
        }
        raster
    }

    #[test]
    fn plot_reaches_road() {
        let raster = crossing_roads();
        let path = astar::path_to_road(&raster, (10, 10), 100, Connectivity::Four).unwrap();
        assert_eq!(path.cells.first(), Some(&(10, 10)));
        let last = *path.cells.last().unwrap();
        assert!(raster.is_road(last), "path must end on a road cell");
        // Nearest road from (10, 10) is 15 straight cells away.
        assert_eq!(path.cost_milli, 15_000);
    }

    #[test]
    fn walled_in_plot_is_unreachable() {
        let mut raster = crossing_roads();
        for x in 0..8 {
            raster.set_blocked((x, 7));
            raster.set_blocked((7, x));
        }
        assert!(astar::path_to_road(&raster, (3, 3), 100, Connectivity::Four).is_none());
    }

    #[test]
    fn diagonal_moves_shorten_paths() {
        let raster = crossing_roads();
        let four = astar::astar(&raster, (10, 10), (20, 20), Connectivity::Four).unwrap();
        let eight = astar::astar(&raster, (10, 10), (20, 20), Connectivity::Eight).unwrap();
        assert_eq!(four.cost_milli, 20_000);
        assert_eq!(eight.cost_milli, 14_140);
        assert!(eight.steps() < four.steps());
    }

    #[test]
    fn paths_route_around_walls() {
        let mut raster = RoadRaster::blank(Pt::ZERO, 20, 20, 1.0);
        for y in 0..19 {
            raster.set_blocked((10, y)); // wall with a gap at the top
        }
        let path = astar::astar(&raster, (5, 5), (15, 5), Connectivity::Four).unwrap();
        assert!(path.cells.iter().any(|&(_, y)| y == 19), "path must use the gap");
        assert!(path.cells.iter().all(|&c| !raster.is_blocked(c)));
    }

    #[test]
    fn same_cell_is_trivial() {
        let raster = crossing_roads();
        let path = astar::astar(&raster, (9, 9), (9, 9), Connectivity::Eight).unwrap();
        assert_eq!(path.cells, vec![(9, 9)]);
        assert_eq!(path.cost_milli, 0);
    }

    #[test]
    fn replay_is_deterministic() {
        let raster = crossing_roads();
        let a = astar::astar(&raster, (3, 40), (44, 2), Connectivity::Eight).unwrap();
        let b = astar::astar(&raster, (3, 40), (44, 2), Connectivity::Eight).unwrap();
        assert_eq!(a.cells, b.cells);
    }
}

#[cfg(test)]
mod mst {
    use estate_core::{Pt, RunRng};

    use crate::error::NetworkError;
    use crate::mst;

    /// Ten deterministic pseudo-uniform points in 100×100.
    fn ten_points() -> Vec<Pt> {
        let mut rng = RunRng::new(6);
        (0..10)
            .map(|_| Pt::new(rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0)))
            .collect()
    }

    #[test]
    fn ten_nodes_make_nine_tree_edges_and_two_loops() {
        let outcome = mst::build_network(&ten_points(), 500.0, 0.15).unwrap();
        assert_eq!(outcome.tree.len(), 9);
        assert_eq!(outcome.redundancy.len(), 2); // ⌈0.15 · 10⌉
        assert_eq!(outcome.components.len(), 1);
        assert!(outcome.total_length > 0.0);
    }

    #[test]
    fn tree_is_minimal_on_a_known_square() {
        let points = vec![
            Pt::new(0.0, 0.0),
            Pt::new(10.0, 0.0),
            Pt::new(10.0, 10.0),
            Pt::new(0.0, 10.0),
        ];
        let outcome = mst::build_network(&points, 500.0, 0.0).unwrap();
        assert_eq!(outcome.tree.len(), 3);
        assert!((outcome.total_length - 30.0).abs() < 1e-9);
        assert!(outcome.redundancy.is_empty());
    }

    #[test]
    fn cut_off_disconnects_far_clusters() {
        let points = vec![
            Pt::new(0.0, 0.0),
            Pt::new(10.0, 0.0),
            Pt::new(500.0, 0.0),
            Pt::new(510.0, 0.0),
        ];
        match mst::build_network(&points, 50.0, 0.15) {
            Err(NetworkError::Disconnected { components }) => {
                assert_eq!(components.len(), 2);
                assert_eq!(components[0], vec![0, 1]);
                assert_eq!(components[1], vec![2, 3]);
            }
            other => panic!("expected Disconnected, got {other:?}"),
        }
        // The forest is still available for degraded layouts.
        let forest = mst::build_forest(&points, 50.0, 0.15);
        assert_eq!(forest.tree.len(), 2);
    }

    #[test]
    fn redundancy_edges_are_distinct_from_tree() {
        let outcome = mst::build_network(&ten_points(), 500.0, 0.3).unwrap();
        for extra in &outcome.redundancy {
            assert!(!outcome.tree.contains(extra));
        }
    }

    #[test]
    fn steiner_candidates_are_triangle_centroids() {
        let terminals = vec![
            Pt::new(0.0, 0.0),
            Pt::new(30.0, 0.0),
            Pt::new(15.0, 30.0),
        ];
        let candidates = mst::steiner_candidates(&terminals);
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].approx_eq(Pt::new(15.0, 10.0)));
    }

    #[test]
    fn steiner_tree_shortens_the_network() {
        // Equilateral-ish triangle: the Fermat point helps.
        let terminals = vec![
            Pt::new(0.0, 0.0),
            Pt::new(40.0, 0.0),
            Pt::new(20.0, 34.6),
        ];
        let plain = mst::build_network(&terminals, 500.0, 0.0).unwrap();
        let candidates = mst::steiner_candidates(&terminals);
        let (nodes, edges) = mst::steiner_tree(&terminals, &candidates, 500.0).unwrap();
        let steiner_len: f64 = edges.iter().map(|e| e.length).sum();
        assert!(nodes.len() >= terminals.len());
        assert!(
            steiner_len < plain.total_length,
            "steiner {steiner_len} !< mst {}",
            plain.total_length
        );
    }

    #[test]
    fn steiner_prunes_useless_candidates() {
        // Collinear-ish terminals: a far-away candidate must not survive.
        let terminals = vec![Pt::new(0.0, 0.0), Pt::new(10.0, 1.0), Pt::new(20.0, 0.0)];
        let candidates = vec![Pt::new(10.0, 80.0)];
        let (nodes, edges) = mst::steiner_tree(&terminals, &candidates, 500.0).unwrap();
        assert_eq!(nodes.len(), 3, "the stray candidate should be pruned");
        assert_eq!(edges.len(), 2);
    }
}

#[cfg(test)]
mod kmeans {
    use estate_core::{Pt, RunRng};

    use crate::kmeans::kmeans;

    fn two_clusters() -> Vec<Pt> {
        let mut pts = Vec::new();
        for i in 0..10 {
            pts.push(Pt::new(i as f64 * 0.5, 0.0));
            pts.push(Pt::new(100.0 + i as f64 * 0.5, 0.0));
        }
        pts
    }

    #[test]
    fn separates_obvious_clusters() {
        let points = two_clusters();
        let out = kmeans(&points, 2, 100, 0.1, &mut RunRng::new(4));
        assert_eq!(out.centers.len(), 2);
        assert!(out.final_movement < 0.1);
        // Points 0..10 share a cluster; 10..20 share the other.
        let first = out.assignment[0];
        assert!(out.assignment[..10].iter().all(|&a| a == first));
        assert!(out.assignment[10..].iter().all(|&a| a != first));
    }

    #[test]
    fn deterministic_for_same_stream() {
        let points = two_clusters();
        let a = kmeans(&points, 3, 100, 0.1, &mut RunRng::new(9));
        let b = kmeans(&points, 3, 100, 0.1, &mut RunRng::new(9));
        assert_eq!(a.assignment, b.assignment);
        for (x, y) in a.centers.iter().zip(&b.centers) {
            assert!(x.approx_eq(*y));
        }
    }

    #[test]
    fn k_clamped_to_point_count() {
        let points = vec![Pt::ZERO, Pt::new(1.0, 0.0)];
        let out = kmeans(&points, 10, 100, 0.1, &mut RunRng::new(0));
        assert_eq!(out.centers.len(), 2);
    }

    #[test]
    fn empty_input_is_empty_outcome() {
        let out = kmeans(&[], 3, 100, 0.1, &mut RunRng::new(0));
        assert!(out.centers.is_empty());
        assert!(out.assignment.is_empty());
    }
}

#[cfg(test)]
mod transformer {
    use estate_core::{Pt, RunRng};

    use crate::transformer::{self, TransformerParams};

    #[test]
    fn splits_load_over_capacity() {
        // 20 lots at 100 kW = 2000 kW total → at least 2 transformers.
        let centroids: Vec<Pt> = (0..20)
            .map(|i| Pt::new((i % 5) as f64 * 20.0, (i / 5) as f64 * 20.0))
            .collect();
        let loads = vec![100.0; 20];
        let params = TransformerParams::default();
        let plan = transformer::plan(&centroids, &loads, &params, &mut RunRng::new(1));
        assert!(plan.feasible);
        assert!(plan.transformers.len() >= 2);
        for t in &plan.transformers {
            assert!(t.load_kw <= params.capacity_kva + 1e-9);
        }
        let served: usize = plan.transformers.iter().map(|t| t.served.len()).sum();
        assert_eq!(served, 20);
        assert!(plan.final_movement < params.kmeans_tol);
    }

    #[test]
    fn single_transformer_when_load_fits() {
        let centroids = vec![Pt::ZERO, Pt::new(10.0, 0.0), Pt::new(0.0, 10.0)];
        let loads = vec![100.0; 3];
        let plan = transformer::plan(
            &centroids,
            &loads,
            &TransformerParams::default(),
            &mut RunRng::new(2),
        );
        assert!(plan.feasible);
        assert_eq!(plan.transformers.len(), 1);
        assert!((plan.transformers[0].load_kw - 300.0).abs() < 1e-9);
    }

    #[test]
    fn coincident_lots_fall_back_to_overload() {
        // Ten co-located 300 kW lots: k-means cannot split them spatially,
        // so every k yields one overloaded cluster and the minimal-overload
        // attempt is returned infeasible.
        let centroids = vec![Pt::new(5.0, 5.0); 10];
        let loads = vec![300.0; 10];
        let plan = transformer::plan(
            &centroids,
            &loads,
            &TransformerParams::default(),
            &mut RunRng::new(3),
        );
        assert!(!plan.feasible);
        let total: f64 = plan.transformers.iter().map(|t| t.load_kw).sum();
        assert!((total - 3000.0).abs() < 1e-9);
    }

    #[test]
    fn empty_input_is_feasible_and_empty() {
        let plan = transformer::plan(
            &[],
            &[],
            &TransformerParams::default(),
            &mut RunRng::new(0),
        );
        assert!(plan.feasible);
        assert!(plan.transformers.is_empty());
    }
}

#[cfg(test)]
mod drainage {
    use estate_core::Pt;
    use estate_geom::kernel;

    use crate::drainage::{self, RoadGraph};

    #[test]
    fn wwtp_defaults_to_centroid() {
        let site = kernel::rect_poly(Pt::ZERO, Pt::new(100.0, 60.0));
        let wwtp = drainage::choose_wwtp(&site, None).unwrap();
        assert!(wwtp.approx_eq(Pt::new(50.0, 30.0)));
    }

    #[test]
    fn wwtp_follows_elevation() {
        let site = kernel::rect_poly(Pt::ZERO, Pt::new(100.0, 60.0));
        // Ground falls toward +x: the lowest corner wins.
        let model = |p: Pt| -p.x;
        let model: &dyn drainage::ElevationModel = &model;
        let wwtp = drainage::choose_wwtp(&site, Some(model)).unwrap();
        assert!((wwtp.x - 100.0).abs() < 1e-9);
    }

    #[test]
    fn direct_arrows_are_unit_vectors() {
        let centroids = vec![Pt::new(0.0, 0.0), Pt::new(10.0, 10.0)];
        let arrows = drainage::direct_arrows(&centroids, Pt::new(10.0, 0.0), 5.0);
        assert_eq!(arrows.len(), 2);
        for a in &arrows {
            assert!((a.direction.length() - 1.0).abs() < 1e-9);
            assert!((a.magnitude - 5.0).abs() < 1e-12);
        }
        assert!(arrows[0].direction.approx_eq(Pt::new(1.0, 0.0)));
        assert!(arrows[1].direction.approx_eq(Pt::new(0.0, -1.0)));
    }

    #[test]
    fn graph_merges_snapped_endpoints() {
        let segments = vec![
            (Pt::new(0.0, 0.0), Pt::new(10.0, 0.0)),
            (Pt::new(10.0, 0.0005), Pt::new(20.0, 0.0)),
        ];
        let graph = RoadGraph::from_segments(&segments, 0.01);
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn network_arrows_follow_the_road() {
        // An L-shaped road: (0,0)─(50,0)─(50,50); WWTP at the far end.
        let segments = vec![
            (Pt::new(0.0, 0.0), Pt::new(50.0, 0.0)),
            (Pt::new(50.0, 0.0), Pt::new(50.0, 50.0)),
        ];
        let graph = RoadGraph::from_segments(&segments, 0.01);
        let wwtp = Pt::new(0.0, 0.0);
        // A lot near the (50,50) end must drain along −y first, not
        // straight toward the WWTP.
        let arrows = drainage::network_arrows(&[Pt::new(52.0, 48.0)], wwtp, &graph, 5.0);
        assert!(arrows[0].direction.approx_eq(Pt::new(0.0, -1.0)));
    }

    #[test]
    fn dijkstra_distances_accumulate() {
        let segments = vec![
            (Pt::new(0.0, 0.0), Pt::new(30.0, 0.0)),
            (Pt::new(30.0, 0.0), Pt::new(30.0, 40.0)),
        ];
        let graph = RoadGraph::from_segments(&segments, 0.01);
        let source = graph.nearest_node(Pt::new(0.0, 0.0)).unwrap();
        let (dist, prev) = graph.dijkstra(source);
        let far = graph.nearest_node(Pt::new(30.0, 40.0)).unwrap();
        assert!((dist[far as usize] - 70.0).abs() < 1e-6);
        assert_ne!(prev[far as usize], u32::MAX);
    }
}
