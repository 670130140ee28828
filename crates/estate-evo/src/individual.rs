//! Population members and stable gene hashing.

use std::hash::Hasher;

use rustc_hash::FxHasher;

use crate::problem::Evaluation;

/// One member of the population.
///
/// `rank` and `crowding` are filled in by the non-dominated sort; `eval` is
/// `None` only between creation and the next evaluation sweep.
#[derive(Clone, Debug)]
pub struct Individual {
    pub genes: Vec<f64>,
    pub eval: Option<Evaluation>,
    pub rank: u32,
    pub crowding: f64,
}

impl Individual {
    pub fn new(genes: Vec<f64>) -> Self {
        Self { genes, eval: None, rank: u32::MAX, crowding: 0.0 }
    }

    /// Stable hash of the gene bit patterns — the deterministic tie-break
    /// for selection, ordering, and parallel-evaluation collection.
    #[inline]
    pub fn hash(&self) -> u64 {
        gene_hash(&self.genes)
    }
}

/// FxHash over the exact bit patterns of a gene vector.
///
/// Identical gene vectors hash identically on every platform with IEEE-754
/// doubles, which is what the determinism contract needs.
pub fn gene_hash(genes: &[f64]) -> u64 {
    let mut hasher = FxHasher::default();
    for g in genes {
        hasher.write_u64(g.to_bits());
    }
    hasher.finish()
}
