//! Variation operators.
//!
//! Continuous genes use simulated binary crossover (SBX) and polynomial
//! mutation; permutation encodings use order crossover and swap mutation.
//! Every operator draws from an explicit [`RunRng`] — no global randomness.

use estate_core::RunRng;

// ── Continuous operators ──────────────────────────────────────────────────────

/// Simulated binary crossover (Deb & Agrawal), distribution index `eta`.
///
/// Produces two children whose spread around the parents follows the SBX
/// distribution; genes are clamped to their bounds.
pub fn sbx_crossover(
    a: &[f64],
    b: &[f64],
    bounds: &[(f64, f64)],
    eta: f64,
    rng: &mut RunRng,
) -> (Vec<f64>, Vec<f64>) {
    let mut c1 = a.to_vec();
    let mut c2 = b.to_vec();
    for i in 0..a.len() {
        if (a[i] - b[i]).abs() < 1e-14 {
            continue;
        }
        let u: f64 = rng.gen_range(0.0..1.0);
        let beta = if u <= 0.5 {
            (2.0 * u).powf(1.0 / (eta + 1.0))
        } else {
            (1.0 / (2.0 * (1.0 - u))).powf(1.0 / (eta + 1.0))
        };
        let (lo, hi) = bounds[i];
        c1[i] = (0.5 * ((1.0 + beta) * a[i] + (1.0 - beta) * b[i])).clamp(lo, hi);
        c2[i] = (0.5 * ((1.0 - beta) * a[i] + (1.0 + beta) * b[i])).clamp(lo, hi);
    }
    (c1, c2)
}

/// Polynomial mutation (Deb), distribution index `eta`, per-gene
/// probability `rate`.
pub fn polynomial_mutation(
    genes: &mut [f64],
    bounds: &[(f64, f64)],
    eta: f64,
    rate: f64,
    rng: &mut RunRng,
) {
    for (i, g) in genes.iter_mut().enumerate() {
        if !rng.gen_bool(rate) {
            continue;
        }
        let (lo, hi) = bounds[i];
        let span = hi - lo;
        if span <= 0.0 {
            continue;
        }
        let u: f64 = rng.gen_range(0.0..1.0);
        let delta = if u < 0.5 {
            (2.0 * u).powf(1.0 / (eta + 1.0)) - 1.0
        } else {
            1.0 - (2.0 * (1.0 - u)).powf(1.0 / (eta + 1.0))
        };
        *g = (*g + delta * span).clamp(lo, hi);
    }
}

// ── Permutation operators ─────────────────────────────────────────────────────

/// Order crossover (OX): copy a random slice from the first parent, fill
/// the remainder in the second parent's order without duplicates.
pub fn order_crossover(a: &[usize], b: &[usize], rng: &mut RunRng) -> Vec<usize> {
    let n = a.len();
    if n < 2 {
        return a.to_vec();
    }
    let i = rng.gen_range(0..n);
    let j = rng.gen_range(0..n);
    let (lo, hi) = (i.min(j), i.max(j));

    let mut child = vec![usize::MAX; n];
    child[lo..=hi].copy_from_slice(&a[lo..=hi]);

    let mut fill = b.iter().filter(|x| !a[lo..=hi].contains(x));
    let (left, rest) = child.split_at_mut(lo);
    let right = &mut rest[hi + 1 - lo..];
    for slot in left.iter_mut().chain(right.iter_mut()) {
        if let Some(&v) = fill.next() {
            *slot = v;
        }
    }
    child
}

/// Swap two random positions in a permutation.
pub fn swap_mutation(perm: &mut [usize], rng: &mut RunRng) {
    if perm.len() < 2 {
        return;
    }
    let i = rng.gen_range(0..perm.len());
    let j = rng.gen_range(0..perm.len());
    perm.swap(i, j);
}

/// Annealed mutation rate: `rate · (1 − g/G)²`.
#[inline]
pub fn annealed_rate(base: f64, generation: u32, total: u32) -> f64 {
    if total == 0 {
        return base;
    }
    let f = 1.0 - generation as f64 / total as f64;
    base * f * f
}
