//! Seeded k-means (k-means++ initialisation, Lloyd iterations).
//!
//! Fully deterministic given the RNG stream: initialisation draws only from
//! the provided [`RunRng`], assignment ties go to the lower centre index,
//! and empty clusters keep their previous centre.

use estate_core::{Pt, RunRng};

/// Clustering result.
pub struct KMeansOutcome {
    pub centers: Vec<Pt>,
    /// Centre index per input point.
    pub assignment: Vec<u32>,
    pub iterations: u32,
    /// Largest centre movement on the final iteration, metres.
    pub final_movement: f64,
}

/// Lloyd's algorithm with k-means++ seeding.
///
/// `k` is clamped to the point count; `k = 0` (or no points) returns an
/// empty outcome.
pub fn kmeans(
    points: &[Pt],
    k: usize,
    max_iters: u32,
    movement_tol: f64,
    rng: &mut RunRng,
) -> KMeansOutcome {
    let k = k.min(points.len());
    if k == 0 {
        return KMeansOutcome {
            centers: vec![],
            assignment: vec![],
            iterations: 0,
            final_movement: 0.0,
        };
    }

    let mut centers = plus_plus_init(points, k, rng);
    let mut assignment = vec![0u32; points.len()];
    let mut iterations = 0;
    let mut final_movement: f64 = 0.0;

    for _ in 0..max_iters {
        iterations += 1;

        // Assign: nearest centre, ties to the lower index.
        for (i, p) in points.iter().enumerate() {
            let mut best = 0u32;
            let mut best_d2 = f64::INFINITY;
            for (c, centre) in centers.iter().enumerate() {
                let d2 = p.distance_sq(*centre);
                if d2 < best_d2 {
                    best_d2 = d2;
                    best = c as u32;
                }
            }
            assignment[i] = best;
        }

        // Update: mean of assigned points; empty clusters stay put.
        let mut sums = vec![Pt::ZERO; k];
        let mut counts = vec![0usize; k];
        for (i, p) in points.iter().enumerate() {
            let c = assignment[i] as usize;
            sums[c] = sums[c] + *p;
            counts[c] += 1;
        }
        final_movement = 0.0;
        for c in 0..k {
            if counts[c] == 0 {
                continue;
            }
            let next = sums[c].scale(1.0 / counts[c] as f64);
            final_movement = final_movement.max(centers[c].distance(next));
            centers[c] = next;
        }

        if final_movement < movement_tol {
            break;
        }
    }

    KMeansOutcome { centers, assignment, iterations, final_movement }
}

/// k-means++: first centre uniform, subsequent centres sampled with
/// probability proportional to squared distance from the nearest chosen
/// centre.
fn plus_plus_init(points: &[Pt], k: usize, rng: &mut RunRng) -> Vec<Pt> {
    let mut centers = Vec::with_capacity(k);
    centers.push(points[rng.gen_range(0..points.len())]);

    let mut d2 = vec![0.0f64; points.len()];
    while centers.len() < k {
        let last = *centers.last().expect("at least one centre");
        let mut total = 0.0;
        for (i, p) in points.iter().enumerate() {
            let d = p.distance_sq(last);
            if centers.len() == 1 || d < d2[i] {
                d2[i] = d;
            }
            total += d2[i];
        }
        if total <= 0.0 {
            // All remaining points coincide with a centre; duplicate one.
            centers.push(points[0]);
            continue;
        }
        let mut threshold = rng.gen_range(0.0..total);
        let mut chosen = points.len() - 1;
        for (i, &w) in d2.iter().enumerate() {
            if threshold < w {
                chosen = i;
                break;
            }
            threshold -= w;
        }
        centers.push(points[chosen]);
    }
    centers
}
