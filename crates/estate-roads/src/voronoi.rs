//! Voronoi cell and edge extraction with Lloyd (CVT) relaxation.
//!
//! Cells are built from the Delaunay triangulation's dual: for each seed,
//! the circumcentres of its adjacent triangles, plus far-extended rays for
//! hull seeds, sorted by angle around the seed and clipped to the site.
//! Edges come from the undirected Voronoi edge set (finite segments between
//! circumcentres; rays clipped at the extension distance).
//!
//! Degenerate inputs (fewer than three seeds, all-collinear seeds) are
//! rejected; individual seeds whose cells vanish under clipping are retried
//! once with a small perturbation and dropped if they still fail.

use geo::{MultiPolygon, Polygon};
use spade::handles::VoronoiVertex::{Inner, Outer};
use spade::{DelaunayTriangulation, Point2, Triangulation};

use estate_core::{Pt, RunRng};
use estate_geom::kernel;

use crate::error::{RoadError, RoadResult};

// ── Parameters ────────────────────────────────────────────────────────────────

/// Seed placement strategy.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SeedMode {
    /// Uniform rejection sampling inside the site.
    #[default]
    Uniform,
    /// Latin-hypercube strata over the bounding box, rejected to the site.
    LatinHypercube,
}

/// Centroidal-Voronoi-tessellation parameters.
#[derive(Copy, Clone, Debug)]
pub struct CvtParams {
    pub seeds: usize,
    pub lloyd_iterations: u32,
    /// Stop relaxing once the largest seed movement drops below this, metres.
    pub movement_tol: f64,
    pub seed_mode: SeedMode,
}

impl Default for CvtParams {
    fn default() -> Self {
        Self {
            seeds: 20,
            lloyd_iterations: 30,
            movement_tol: 0.1,
            seed_mode: SeedMode::Uniform,
        }
    }
}

// ── Diagram ───────────────────────────────────────────────────────────────────

/// A Voronoi diagram clipped to the site.
pub struct VoronoiDiagram {
    /// One entry per surviving seed: the seed and its clipped cell (which
    /// may have several parts on concave sites).
    pub cells: Vec<(Pt, MultiPolygon<f64>)>,
    /// Cell-boundary centreline segments clipped to the site.
    pub edges: Vec<(Pt, Pt)>,
}

/// Result of a full CVT run.
pub struct CvtOutcome {
    pub seeds: Vec<Pt>,
    pub diagram: VoronoiDiagram,
    /// Lloyd iterations actually performed.
    pub iterations: u32,
}

// ── Seed sampling ─────────────────────────────────────────────────────────────

/// Sample `n` seeds inside the site.
pub fn sample_seeds(
    site: &Polygon<f64>,
    n: usize,
    mode: SeedMode,
    rng: &mut RunRng,
) -> RoadResult<Vec<Pt>> {
    let (min, max) = kernel::bounds(site)?;
    let mut seeds = Vec::with_capacity(n);

    if mode == SeedMode::LatinHypercube {
        // One stratum per seed on each axis, independently permuted.
        let mut xs: Vec<usize> = (0..n).collect();
        let mut ys: Vec<usize> = (0..n).collect();
        rng.shuffle(&mut xs);
        rng.shuffle(&mut ys);
        for i in 0..n {
            let fx = (xs[i] as f64 + rng.gen_range(0.0..1.0)) / n as f64;
            let fy = (ys[i] as f64 + rng.gen_range(0.0..1.0)) / n as f64;
            let p = Pt::new(min.x + fx * (max.x - min.x), min.y + fy * (max.y - min.y));
            if kernel::contains_point(site, p) {
                seeds.push(p);
            }
        }
    }

    // Uniform fill (also tops up strata that fell outside the site).
    let mut attempts = 0usize;
    let cap = n.max(1) * 200;
    while seeds.len() < n && attempts < cap {
        attempts += 1;
        let p = Pt::new(
            rng.gen_range(min.x..max.x),
            rng.gen_range(min.y..max.y),
        );
        if kernel::contains_point(site, p) {
            seeds.push(p);
        }
    }
    if seeds.len() < n.min(3) {
        return Err(RoadError::SeedSampling { wanted: n, placed: seeds.len() });
    }
    Ok(seeds)
}

// ── Diagram construction ──────────────────────────────────────────────────────

/// Compute the Voronoi diagram of `seeds` clipped to `site`.
pub fn diagram(site: &Polygon<f64>, seeds: &[Pt]) -> RoadResult<VoronoiDiagram> {
    if seeds.len() < 3 {
        return Err(RoadError::DegenerateSeeds("need at least 3 seeds"));
    }
    let points: Vec<Point2<f64>> = seeds.iter().map(|p| Point2::new(p.x, p.y)).collect();
    let triangulation: DelaunayTriangulation<Point2<f64>> =
        DelaunayTriangulation::bulk_load(points)
            .map_err(|_| RoadError::DegenerateSeeds("non-finite seed coordinate"))?;
    if triangulation.num_inner_faces() == 0 {
        return Err(RoadError::DegenerateSeeds("all seeds collinear"));
    }

    let (site_min, site_max) = kernel::bounds(site)?;
    // Rays are extended well past anything the site clip can keep.
    let extension = ((site_max.x - site_min.x) + (site_max.y - site_min.y)) * 2.0;

    // ── Cells ─────────────────────────────────────────────────────────────
    let mut cells = Vec::new();
    for face in triangulation.voronoi_faces() {
        let seed_pos = face.as_delaunay_vertex().position();
        let seed = Pt::new(seed_pos.x, seed_pos.y);

        fn push_unique(v: Pt, vertices: &mut Vec<Pt>) {
            if !vertices.iter().any(|u| u.approx_eq(v)) {
                vertices.push(v);
            }
        }
        let mut vertices: Vec<Pt> = Vec::new();

        for edge in face.adjacent_edges() {
            for vertex in [edge.from(), edge.to()] {
                match vertex {
                    Inner(tri_face) => {
                        let cc = tri_face.circumcenter();
                        push_unique(Pt::new(cc.x, cc.y), &mut vertices);
                    }
                    Outer(_) => {}
                }
            }
            // Hull seeds get one far point per outgoing ray.
            if let (Inner(tri_face), Outer(outer)) | (Outer(outer), Inner(tri_face)) =
                (edge.from(), edge.to())
            {
                let cc = tri_face.circumcenter();
                let dir = outer.direction_vector();
                if let Some(unit) = Pt::new(dir.x, dir.y).unit() {
                    let far = Pt::new(cc.x, cc.y) + unit.scale(extension);
                    push_unique(far, &mut vertices);
                }
            }
        }

        if vertices.len() < 3 {
            cells.push((seed, MultiPolygon::new(vec![])));
            continue;
        }
        // Voronoi cells are convex; angular order around the seed recovers
        // the boundary walk.
        vertices.sort_by(|a, b| {
            let aa = (a.y - seed.y).atan2(a.x - seed.x);
            let ab = (b.y - seed.y).atan2(b.x - seed.x);
            aa.total_cmp(&ab)
        });
        let raw = Polygon::new(kernel::ring(&vertices), vec![]);
        cells.push((seed, kernel::intersection(&raw, site)));
    }

    // ── Edges ─────────────────────────────────────────────────────────────
    let mut edges = Vec::new();
    for edge in triangulation.undirected_voronoi_edges() {
        let segment = match edge.vertices() {
            [Inner(a), Inner(b)] => {
                let ca = a.circumcenter();
                let cb = b.circumcenter();
                Some((Pt::new(ca.x, ca.y), Pt::new(cb.x, cb.y)))
            }
            [Inner(a), Outer(outer)] | [Outer(outer), Inner(a)] => {
                let cc = a.circumcenter();
                let origin = Pt::new(cc.x, cc.y);
                let dir = outer.direction_vector();
                Pt::new(dir.x, dir.y)
                    .unit()
                    .map(|u| (origin, origin + u.scale(extension)))
            }
            // Both endpoints at infinity only happens for collinear input,
            // which was rejected above.
            [Outer(_), Outer(_)] => None,
        };
        if let Some((a, b)) = segment {
            edges.extend(kernel::clip_segment_to_polygon(a, b, site));
        }
    }

    Ok(VoronoiDiagram { cells, edges })
}

// ── Lloyd relaxation ──────────────────────────────────────────────────────────

/// Move each seed to the area-weighted centroid of its clipped cell until
/// movement falls below `tol` or `max_iters` is reached.
///
/// Seeds whose cells vanished keep their position for the iteration; the
/// caller decides whether to drop them.
pub fn lloyd_relax(
    site: &Polygon<f64>,
    mut seeds: Vec<Pt>,
    max_iters: u32,
    tol: f64,
) -> RoadResult<(Vec<Pt>, u32)> {
    let mut iterations = 0;
    for _ in 0..max_iters {
        let diag = diagram(site, &seeds)?;
        let mut max_move = 0.0f64;
        let mut next = Vec::with_capacity(seeds.len());
        for (seed, cell) in &diag.cells {
            let moved = cell_centroid(cell).unwrap_or(*seed);
            max_move = max_move.max(seed.distance(moved));
            next.push(moved);
        }
        seeds = next;
        iterations += 1;
        if max_move < tol {
            break;
        }
    }
    Ok((seeds, iterations))
}

fn cell_centroid(cell: &MultiPolygon<f64>) -> Option<Pt> {
    let mut area_sum = 0.0;
    let mut acc = Pt::ZERO;
    for part in cell {
        let a = kernel::area(part);
        if a <= 0.0 {
            continue;
        }
        let c = kernel::centroid(part).ok()?;
        acc = acc + c.scale(a);
        area_sum += a;
    }
    if area_sum <= 0.0 {
        return None;
    }
    Some(acc.scale(1.0 / area_sum))
}

// ── Full CVT run ──────────────────────────────────────────────────────────────

/// Sample, relax, and extract the final diagram.
///
/// Seeds whose final cells are empty are perturbed once (0.1 % of the site
/// diagonal) and the diagram recomputed; seeds that still produce nothing
/// are dropped with a warning.
pub fn cvt(site: &Polygon<f64>, params: &CvtParams, rng: &mut RunRng) -> RoadResult<CvtOutcome> {
    let seeds = sample_seeds(site, params.seeds, params.seed_mode, rng)?;
    let (mut seeds, iterations) =
        lloyd_relax(site, seeds, params.lloyd_iterations, params.movement_tol)?;

    let mut diag = diagram(site, &seeds)?;
    if diag.cells.iter().any(|(_, cell)| cell.0.is_empty()) {
        let (min, max) = kernel::bounds(site)?;
        let jitter = min.distance(max) * 1e-3;
        let empty: Vec<Pt> = diag
            .cells
            .iter()
            .filter(|(_, cell)| cell.0.is_empty())
            .map(|(s, _)| *s)
            .collect();
        for seed in seeds.iter_mut() {
            if empty.iter().any(|e| e.approx_eq(*seed)) {
                *seed = Pt::new(
                    seed.x + rng.gen_range(-jitter..jitter),
                    seed.y + rng.gen_range(-jitter..jitter),
                );
            }
        }
        diag = diagram(site, &seeds)?;

        let dropped = diag.cells.iter().filter(|(_, cell)| cell.0.is_empty()).count();
        if dropped > 0 {
            log::warn!("dropping {dropped} seeds with persistently empty voronoi cells");
            let survivors: Vec<Pt> = diag
                .cells
                .iter()
                .filter(|(_, cell)| !cell.0.is_empty())
                .map(|(s, _)| *s)
                .collect();
            seeds = survivors;
            diag = diagram(site, &seeds)?;
        }
    }

    Ok(CvtOutcome { seeds, diagram: diag, iterations })
}
