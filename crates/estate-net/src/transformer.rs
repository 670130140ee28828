//! Transformer placement: capacity-bounded cluster count search.
//!
//! The smallest `k` in `[⌈ΣP/C⌉, 2·⌈ΣP/C⌉]` whose k-means clustering keeps
//! every cluster's summed load under the transformer capacity wins.  When
//! no `k` in the range is feasible, the attempt with the smallest total
//! overload is returned flagged infeasible — the pipeline downgrades that
//! to a warning rather than failing the layout.

use estate_core::{LotId, Pt, RunRng};

use crate::kmeans::{self, KMeansOutcome};

// ── Parameters ────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug)]
pub struct TransformerParams {
    /// Per-transformer capacity, kVA.
    pub capacity_kva: f64,
    /// Sizing hint: raises the minimum cluster count to
    /// `⌈n / lots_per_transformer⌉` when that binds harder than capacity.
    pub lots_per_transformer: usize,
    /// Fixed cost per transformer installed.
    pub transformer_cost: f64,
    /// Cable cost per metre of lot-to-transformer distance.
    pub cable_cost_per_m: f64,
    /// Weight on cluster-load variance in the cost tie-break.
    pub load_variance_weight: f64,
    pub kmeans_max_iters: u32,
    /// k-means convergence threshold, metres.
    pub kmeans_tol: f64,
}

impl Default for TransformerParams {
    fn default() -> Self {
        Self {
            capacity_kva: 1000.0,
            lots_per_transformer: 15,
            transformer_cost: 50_000.0,
            cable_cost_per_m: 25.0,
            load_variance_weight: 0.01,
            kmeans_max_iters: 100,
            kmeans_tol: 0.1,
        }
    }
}

// ── Output ────────────────────────────────────────────────────────────────────

/// One placed transformer.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transformer {
    pub position: Pt,
    /// Lots served, as indices into the layout's lot vector.
    pub served: Vec<LotId>,
    pub load_kw: f64,
}

/// The chosen clustering.
pub struct TransformerPlan {
    pub transformers: Vec<Transformer>,
    pub total_cost: f64,
    /// Every transformer respects the capacity bound.
    pub feasible: bool,
    /// Largest centre movement on the final k-means iteration.
    pub final_movement: f64,
}

// ── Planner ───────────────────────────────────────────────────────────────────

/// Plan transformer positions for the given lot centroids and loads.
///
/// `loads` must parallel `centroids`.  Each candidate `k` clusters with its
/// own child RNG stream, so adding candidates never perturbs earlier ones.
pub fn plan(
    centroids: &[Pt],
    loads: &[f64],
    params: &TransformerParams,
    rng: &mut RunRng,
) -> TransformerPlan {
    if centroids.is_empty() {
        return TransformerPlan {
            transformers: vec![],
            total_cost: 0.0,
            feasible: true,
            final_movement: 0.0,
        };
    }

    let total_load: f64 = loads.iter().sum();
    let k_capacity = (total_load / params.capacity_kva).ceil().max(1.0) as usize;
    let k_hint = centroids.len().div_ceil(params.lots_per_transformer.max(1));
    let k_min = k_capacity.max(k_hint).min(centroids.len()).max(1);
    let k_max = (2 * k_capacity).clamp(k_min, centroids.len());

    let mut fallback: Option<(f64, TransformerPlan)> = None; // keyed by overload
    for k in k_min..=k_max.max(k_min) {
        let mut stream = rng.child(k as u64);
        let clustering = kmeans::kmeans(
            centroids,
            k,
            params.kmeans_max_iters,
            params.kmeans_tol,
            &mut stream,
        );
        let plan = assemble(centroids, loads, params, clustering);
        let overload: f64 = plan
            .transformers
            .iter()
            .map(|t| (t.load_kw - params.capacity_kva).max(0.0))
            .sum();
        if plan.feasible {
            return plan;
        }
        if fallback.as_ref().is_none_or(|(best, _)| overload < *best) {
            fallback = Some((overload, plan));
        }
    }

    let (_, plan) = fallback.expect("at least one k was attempted");
    plan
}

fn assemble(
    centroids: &[Pt],
    loads: &[f64],
    params: &TransformerParams,
    clustering: KMeansOutcome,
) -> TransformerPlan {
    let k = clustering.centers.len();
    let mut transformers: Vec<Transformer> = clustering
        .centers
        .iter()
        .map(|&position| Transformer { position, served: vec![], load_kw: 0.0 })
        .collect();

    let mut cable = 0.0;
    for (i, &cluster) in clustering.assignment.iter().enumerate() {
        let t = &mut transformers[cluster as usize];
        t.served.push(LotId(i as u32));
        t.load_kw += loads[i];
        cable += centroids[i].distance(t.position);
    }

    let feasible = transformers.iter().all(|t| t.load_kw <= params.capacity_kva + 1e-9);
    let mean_load = transformers.iter().map(|t| t.load_kw).sum::<f64>() / k.max(1) as f64;
    let variance = transformers
        .iter()
        .map(|t| (t.load_kw - mean_load).powi(2))
        .sum::<f64>()
        / k.max(1) as f64;

    let total_cost = k as f64 * params.transformer_cost
        + cable * params.cable_cost_per_m
        + params.load_variance_weight * variance;

    TransformerPlan {
        transformers,
        total_cost,
        feasible,
        final_movement: clustering.final_movement,
    }
}
