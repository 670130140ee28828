//! The μ+λ elitist NSGA-II generational loop.

use estate_core::{Deadline, RunRng};

use crate::error::{EvoResult, OptimizerError};
use crate::individual::Individual;
use crate::ops;
use crate::problem::Problem;
use crate::sort;

// ── Parameters ────────────────────────────────────────────────────────────────

/// Search parameters.  Defaults follow the standard NSGA-II settings.
#[derive(Clone, Debug)]
pub struct NsgaParams {
    pub population_size: usize,
    pub generations: u32,
    /// SBX probability per parent pair.
    pub crossover_prob: f64,
    /// Per-gene mutation probability; `None` → `1 / n_genes`.
    pub mutation_prob: Option<f64>,
    pub sbx_eta: f64,
    pub mutation_eta: f64,
    pub tournament_size: usize,
    /// Stop early after this many consecutive generations whose best
    /// first-objective improvement stays under `stall_improvement`.
    /// `None` runs the full generation budget.
    pub stall_generations: Option<u32>,
    pub stall_improvement: f64,
}

impl Default for NsgaParams {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 40,
            crossover_prob: 0.9,
            mutation_prob: None,
            sbx_eta: 15.0,
            mutation_eta: 20.0,
            tournament_size: 3,
            stall_generations: None,
            stall_improvement: 0.01,
        }
    }
}

// ── Outcome ───────────────────────────────────────────────────────────────────

/// Search result: the rank-0 front plus the final population.
pub struct NsgaOutcome {
    /// Rank-0 individuals in deterministic order.
    pub pareto: Vec<Individual>,
    /// Whole final population, ordered by (rank, crowding, hash).
    pub population: Vec<Individual>,
    pub generations_run: u32,
    /// The deadline expired before the generation budget was spent.
    pub partial: bool,
}

impl NsgaOutcome {
    /// The single best individual by the deterministic total order.
    pub fn best(&self) -> Option<&Individual> {
        self.population.first()
    }
}

// ── Optimizer ─────────────────────────────────────────────────────────────────

/// NSGA-II over a [`Problem`].
///
/// Selection, sorting, and variation are single-threaded; fitness
/// evaluation fans out across individuals when the `parallel` feature is
/// enabled.  See the crate docs for the determinism contract.
pub struct NsgaOptimizer<'p, P: Problem> {
    problem: &'p P,
    params: NsgaParams,
    rng: RunRng,
}

impl<'p, P: Problem> NsgaOptimizer<'p, P> {
    pub fn new(problem: &'p P, params: NsgaParams, rng: RunRng) -> Self {
        Self { problem, params, rng }
    }

    /// Run the search; see [`run_observed`](Self::run_observed).
    pub fn run(&mut self, deadline: Deadline) -> EvoResult<NsgaOutcome> {
        self.run_observed(deadline, |_, _| {})
    }

    /// Run the search, invoking `on_generation(generation, best_objective)`
    /// after every completed generation.
    ///
    /// Returns [`OptimizerError::NoFeasibleSolution`] only for constrained
    /// problems that end with zero feasible individuals; deadline expiry is
    /// reported through `partial` on the outcome instead.
    pub fn run_observed(
        &mut self,
        deadline: Deadline,
        mut on_generation: impl FnMut(u32, f64),
    ) -> EvoResult<NsgaOutcome> {
        let bounds = self.problem.gene_bounds();
        if bounds.is_empty() {
            return Err(OptimizerError::EmptyGeneSpace);
        }
        let mutation_rate = self
            .params
            .mutation_prob
            .unwrap_or(1.0 / bounds.len() as f64);

        // ── Initial population ────────────────────────────────────────────
        let mut pop: Vec<Individual> = (0..self.params.population_size)
            .map(|_| {
                let genes = bounds
                    .iter()
                    .map(|&(lo, hi)| self.rng.gen_range(lo..=hi))
                    .collect();
                Individual::new(genes)
            })
            .collect();
        evaluate_all(self.problem, &mut pop);
        rank_and_order(&mut pop);

        let mut partial = false;
        let mut generations_run = 0;
        let mut stall_best = f64::INFINITY;
        let mut stall_count = 0u32;

        // ── Generational loop ─────────────────────────────────────────────
        for g in 0..self.params.generations {
            if deadline.expired() {
                partial = true;
                break;
            }

            let rate = ops::annealed_rate(mutation_rate, g, self.params.generations);
            let mut offspring = Vec::with_capacity(self.params.population_size);
            while offspring.len() < self.params.population_size {
                let p1 = self.tournament(&pop);
                let p2 = self.tournament(&pop);
                let (mut c1, mut c2) = if self.rng.gen_bool(self.params.crossover_prob) {
                    ops::sbx_crossover(
                        &pop[p1].genes,
                        &pop[p2].genes,
                        &bounds,
                        self.params.sbx_eta,
                        &mut self.rng,
                    )
                } else {
                    (pop[p1].genes.clone(), pop[p2].genes.clone())
                };
                ops::polynomial_mutation(&mut c1, &bounds, self.params.mutation_eta, rate, &mut self.rng);
                ops::polynomial_mutation(&mut c2, &bounds, self.params.mutation_eta, rate, &mut self.rng);
                offspring.push(Individual::new(c1));
                if offspring.len() < self.params.population_size {
                    offspring.push(Individual::new(c2));
                }
            }

            evaluate_all(self.problem, &mut offspring);

            // μ+λ elitism: combine, re-rank, truncate.
            pop.extend(offspring);
            rank_and_order(&mut pop);
            pop.truncate(self.params.population_size);

            generations_run = g + 1;

            let best = best_feasible_objective(&pop);
            on_generation(g, best);

            // ── Optional stall-based early stop ───────────────────────────
            if let Some(limit) = self.params.stall_generations {
                let improvement = if stall_best.is_finite() {
                    (stall_best - best) / stall_best.abs().max(1e-12)
                } else {
                    f64::INFINITY
                };
                if improvement < self.params.stall_improvement {
                    stall_count += 1;
                    if stall_count >= limit {
                        break;
                    }
                } else {
                    stall_count = 0;
                }
                if best < stall_best {
                    stall_best = best;
                }
            }
        }

        // ── Outcome ───────────────────────────────────────────────────────
        let constrained = pop
            .iter()
            .any(|ind| ind.eval.as_ref().is_some_and(|e| !e.violations.is_empty()));
        let any_feasible = pop
            .iter()
            .any(|ind| ind.eval.as_ref().is_some_and(|e| e.feasible()));
        if constrained && !any_feasible {
            return Err(OptimizerError::NoFeasibleSolution);
        }

        let pareto: Vec<Individual> = pop.iter().filter(|i| i.rank == 0).cloned().collect();
        Ok(NsgaOutcome { pareto, population: pop, generations_run, partial })
    }

    /// Tournament selection: best of `tournament_size` uniform picks under
    /// the deterministic (rank, crowding, hash) order.
    fn tournament(&mut self, pop: &[Individual]) -> usize {
        let mut best = self.rng.gen_range(0..pop.len());
        for _ in 1..self.params.tournament_size {
            let challenger = self.rng.gen_range(0..pop.len());
            if sort::compare(&pop[challenger], &pop[best]) == std::cmp::Ordering::Less {
                best = challenger;
            }
        }
        best
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Evaluate all unevaluated individuals, then restore a deterministic
/// storage order by gene hash.  The re-sort is what keeps parallel and
/// serial runs identical: ranking and selection below only ever see the
/// hash order, never the scheduling order.
fn evaluate_all<P: Problem>(problem: &P, pop: &mut [Individual]) {
    #[cfg(not(feature = "parallel"))]
    {
        for ind in pop.iter_mut() {
            if ind.eval.is_none() {
                ind.eval = Some(problem.evaluate(&ind.genes));
            }
        }
    }

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        pop.par_iter_mut().for_each(|ind| {
            if ind.eval.is_none() {
                ind.eval = Some(problem.evaluate(&ind.genes));
            }
        });
    }

    pop.sort_by_key(Individual::hash);
}

fn rank_and_order(pop: &mut Vec<Individual>) {
    let fronts = sort::fast_nondominated_sort(pop);
    for front in &fronts {
        sort::crowding_distance(pop, front);
    }
    sort::order_population(pop);
}

/// Best (minimal) first objective among feasible individuals, or infinity.
fn best_feasible_objective(pop: &[Individual]) -> f64 {
    pop.iter()
        .filter_map(|i| i.eval.as_ref())
        .filter(|e| e.feasible())
        .filter_map(|e| e.objectives.first().copied())
        .fold(f64::INFINITY, f64::min)
}
