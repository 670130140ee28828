//! Integer frontage-width solver.
//!
//! Decision variables are lot widths in whole centimetres.  For a frontage
//! of `S` cm and `k` lots the constraints are
//!
//! - `w_min ≤ w_i ≤ w_max` for each lot,
//! - `Σ w_i = S` (the frontage is filled exactly),
//!
//! and the objective rewards filled frontage while penalising deviation
//! from the target width: `Σ w_i · 100 − 50 · Σ |w_i − target|`.
//!
//! Because the equality constraint pins `Σ w_i`, the objective reduces to
//! minimising total deviation, and the problem is separable-convex: for a
//! fixed `k` the optimum spreads `S` as evenly as possible around the
//! target, so each candidate lot count is solved exactly in O(k) and the
//! search is a bounded scan over feasible `k`.  The deadline is checked per
//! candidate; ties prefer more lots.

use estate_core::Deadline;

use crate::error::{SolverError, SubdivResult};

/// Width-scale factor: all widths are solved in centimetres.
const SCALE: f64 = 100.0;
/// Deviation penalty weight from the objective.
const DEVIATION_PENALTY: i64 = 50;

// ── FrontageSpec ──────────────────────────────────────────────────────────────

/// One block's frontage problem.
#[derive(Copy, Clone, Debug)]
pub struct FrontageSpec {
    /// Frontage length along the dominant edge, metres.
    pub frontage_m: f64,
    pub min_width_m: f64,
    pub max_width_m: f64,
    pub target_width_m: f64,
}

// ── FrontagePlan ──────────────────────────────────────────────────────────────

/// The chosen subdivision.
#[derive(Clone, Debug)]
pub struct FrontagePlan {
    /// Lot widths in centimetres; sums exactly to the scaled frontage.
    pub widths_cm: Vec<i64>,
    /// Total deviation from the target, centimetres.
    pub deviation_cm: i64,
    /// Objective value (`Σw·100 − 50·Σ|w−t|`).
    pub objective: i64,
    /// The deadline expired before the scan finished; this is the best plan
    /// found so far.
    pub timed_out: bool,
}

impl FrontagePlan {
    pub fn lot_count(&self) -> usize {
        self.widths_cm.len()
    }

    /// Widths converted back to metres.
    pub fn widths_m(&self) -> Vec<f64> {
        self.widths_cm.iter().map(|&w| w as f64 / SCALE).collect()
    }
}

// ── Solver ────────────────────────────────────────────────────────────────────

/// Solve one frontage.
///
/// Returns [`SolverError::Infeasible`] when no lot count can fill the
/// frontage within the width bounds, and [`SolverError::Timeout`] only when
/// the deadline expired before *any* candidate was solved.
pub fn solve_frontage(spec: &FrontageSpec, deadline: Deadline) -> SubdivResult<FrontagePlan> {
    let s = (spec.frontage_m * SCALE).round() as i64;
    let w_min = (spec.min_width_m * SCALE).round() as i64;
    let w_max = (spec.max_width_m * SCALE).round() as i64;
    let target = (spec.target_width_m * SCALE).round() as i64;
    if s <= 0 || w_min <= 0 || w_min > w_max {
        return Err(SolverError::Infeasible);
    }

    // Feasible lot counts: k·w_min ≤ S ≤ k·w_max.
    let k_hi = s / w_min;
    let k_lo = ((s + w_max - 1) / w_max).max(1);
    if k_hi < 1 || k_lo > k_hi {
        return Err(SolverError::Infeasible);
    }

    let mut best: Option<FrontagePlan> = None;
    // Scan from the largest feasible count down so equal-deviation ties
    // keep the higher lot count.
    for k in (k_lo..=k_hi).rev() {
        if deadline.expired() {
            return match best {
                Some(mut plan) => {
                    plan.timed_out = true;
                    Ok(plan)
                }
                None => Err(SolverError::Timeout),
            };
        }

        let widths = even_fill(s, k);
        let deviation: i64 = widths.iter().map(|w| (w - target).abs()).sum();
        let objective = s * SCALE as i64 - DEVIATION_PENALTY * deviation;
        if best.as_ref().is_none_or(|b| deviation < b.deviation_cm) {
            best = Some(FrontagePlan {
                widths_cm: widths,
                deviation_cm: deviation,
                objective,
                timed_out: false,
            });
        }
    }
    best.ok_or(SolverError::Infeasible)
}

/// Spread `s` centimetres over `k` lots as evenly as possible.
///
/// The deviation-minimal plan under a fixed sum: every width is `s/k`
/// rounded down, with the remainder distributed one centimetre at a time.
/// Bounds hold automatically because `k` was chosen with
/// `k·w_min ≤ s ≤ k·w_max`.
fn even_fill(s: i64, k: i64) -> Vec<i64> {
    let base = s.div_euclid(k);
    let rem = s.rem_euclid(k);
    (0..k).map(|i| if i < rem { base + 1 } else { base }).collect()
}
