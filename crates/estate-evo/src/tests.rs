//! Unit tests for the evolutionary search.

use estate_core::{Deadline, RunRng};

use crate::problem::{Evaluation, Problem};

/// Schaffer's two-objective test function: f1 = x², f2 = (x − 2)².
/// The Pareto set is x ∈ [0, 2].
struct Schaffer;

impl Problem for Schaffer {
    fn gene_bounds(&self) -> Vec<(f64, f64)> {
        vec![(-10.0, 10.0)]
    }
    fn evaluate(&self, genes: &[f64]) -> Evaluation {
        let x = genes[0];
        Evaluation::of(vec![x * x, (x - 2.0) * (x - 2.0)])
    }
}

/// Single objective with one constraint g = 1 − x ≤ 0 (feasible for x ≥ 1).
struct ConstrainedLine;

impl Problem for ConstrainedLine {
    fn gene_bounds(&self) -> Vec<(f64, f64)> {
        vec![(0.0, 10.0)]
    }
    fn evaluate(&self, genes: &[f64]) -> Evaluation {
        let x = genes[0];
        Evaluation { objectives: vec![x], violations: vec![1.0 - x] }
    }
}

/// A constraint that can never be satisfied.
struct Impossible;

impl Problem for Impossible {
    fn gene_bounds(&self) -> Vec<(f64, f64)> {
        vec![(0.0, 1.0)]
    }
    fn evaluate(&self, genes: &[f64]) -> Evaluation {
        Evaluation { objectives: vec![genes[0]], violations: vec![1.0] }
    }
}

#[cfg(test)]
mod ops {
    use estate_core::RunRng;

    use crate::ops;

    #[test]
    fn sbx_respects_bounds() {
        let bounds = vec![(0.0, 1.0); 4];
        let a = vec![0.1, 0.9, 0.5, 0.0];
        let b = vec![0.8, 0.2, 0.5, 1.0];
        let mut rng = RunRng::new(5);
        for _ in 0..200 {
            let (c1, c2) = ops::sbx_crossover(&a, &b, &bounds, 15.0, &mut rng);
            for g in c1.iter().chain(&c2) {
                assert!((0.0..=1.0).contains(g), "gene {g} escaped bounds");
            }
        }
    }

    #[test]
    fn sbx_is_deterministic() {
        let bounds = vec![(0.0, 1.0); 2];
        let a = vec![0.2, 0.7];
        let b = vec![0.6, 0.3];
        let r1 = ops::sbx_crossover(&a, &b, &bounds, 15.0, &mut RunRng::new(9));
        let r2 = ops::sbx_crossover(&a, &b, &bounds, 15.0, &mut RunRng::new(9));
        assert_eq!(r1, r2);
    }

    #[test]
    fn polynomial_mutation_respects_bounds() {
        let bounds = vec![(-5.0, 5.0); 3];
        let mut rng = RunRng::new(1);
        for _ in 0..200 {
            let mut genes = vec![0.0, 4.9, -4.9];
            ops::polynomial_mutation(&mut genes, &bounds, 20.0, 1.0, &mut rng);
            for g in &genes {
                assert!((-5.0..=5.0).contains(g));
            }
        }
    }

    #[test]
    fn order_crossover_is_a_permutation() {
        let a: Vec<usize> = (0..10).collect();
        let b: Vec<usize> = (0..10).rev().collect();
        let mut rng = RunRng::new(3);
        for _ in 0..50 {
            let mut child = ops::order_crossover(&a, &b, &mut rng);
            child.sort_unstable();
            assert_eq!(child, a, "child lost or duplicated elements");
        }
    }

    #[test]
    fn swap_mutation_keeps_elements() {
        let mut perm: Vec<usize> = (0..6).collect();
        ops::swap_mutation(&mut perm, &mut RunRng::new(0));
        let mut sorted = perm.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..6).collect::<Vec<_>>());
    }

    #[test]
    fn annealed_rate_decays_to_zero() {
        assert_eq!(ops::annealed_rate(0.2, 0, 10), 0.2);
        let mid = ops::annealed_rate(0.2, 5, 10);
        assert!((mid - 0.05).abs() < 1e-12);
        assert_eq!(ops::annealed_rate(0.2, 10, 10), 0.0);
    }
}

#[cfg(test)]
mod sort {
    use crate::individual::Individual;
    use crate::problem::Evaluation;
    use crate::sort;

    fn ind(objectives: Vec<f64>, violations: Vec<f64>) -> Individual {
        let mut i = Individual::new(objectives.clone());
        i.eval = Some(Evaluation { objectives, violations });
        i
    }

    #[test]
    fn pareto_domination() {
        let a = Evaluation::of(vec![1.0, 1.0]);
        let b = Evaluation::of(vec![2.0, 1.0]);
        let c = Evaluation::of(vec![0.5, 2.0]);
        assert!(sort::dominates(&a, &b));
        assert!(!sort::dominates(&b, &a));
        assert!(!sort::dominates(&a, &c) && !sort::dominates(&c, &a));
    }

    #[test]
    fn feasible_dominates_infeasible() {
        let feasible = Evaluation { objectives: vec![100.0], violations: vec![-1.0] };
        let infeasible = Evaluation { objectives: vec![0.0], violations: vec![2.0] };
        assert!(sort::dominates(&feasible, &infeasible));
        assert!(!sort::dominates(&infeasible, &feasible));
    }

    #[test]
    fn smaller_violation_dominates() {
        let a = Evaluation { objectives: vec![5.0], violations: vec![1.0] };
        let b = Evaluation { objectives: vec![1.0], violations: vec![3.0] };
        assert!(sort::dominates(&a, &b));
    }

    #[test]
    fn fronts_are_layered() {
        let mut pop = vec![
            ind(vec![1.0, 1.0], vec![]),
            ind(vec![2.0, 2.0], vec![]),
            ind(vec![0.5, 3.0], vec![]),
            ind(vec![3.0, 3.0], vec![]),
        ];
        let fronts = sort::fast_nondominated_sort(&mut pop);
        assert_eq!(pop[0].rank, 0);
        assert_eq!(pop[2].rank, 0);
        assert_eq!(pop[1].rank, 1);
        assert_eq!(pop[3].rank, 2);
        assert_eq!(fronts.len(), 3);
    }

    #[test]
    fn crowding_boundaries_are_infinite() {
        let mut pop = vec![
            ind(vec![0.0, 3.0], vec![]),
            ind(vec![1.0, 2.0], vec![]),
            ind(vec![3.0, 0.0], vec![]),
        ];
        let front = vec![0, 1, 2];
        sort::crowding_distance(&mut pop, &front);
        assert!(pop[0].crowding.is_infinite());
        assert!(pop[2].crowding.is_infinite());
        assert!(pop[1].crowding.is_finite() && pop[1].crowding > 0.0);
    }

    #[test]
    fn hash_breaks_exact_ties() {
        let mut a = ind(vec![1.0], vec![]);
        let mut b = ind(vec![1.0], vec![]);
        a.genes = vec![0.25];
        b.genes = vec![0.75];
        a.rank = 0;
        b.rank = 0;
        a.crowding = 1.0;
        b.crowding = 1.0;
        let ab = sort::compare(&a, &b);
        let ba = sort::compare(&b, &a);
        assert_ne!(ab, std::cmp::Ordering::Equal);
        assert_eq!(ab, ba.reverse());
    }
}

#[cfg(test)]
mod optimizer {
    use super::*;
    use crate::optimizer::{NsgaOptimizer, NsgaParams};

    fn params(generations: u32) -> NsgaParams {
        NsgaParams { population_size: 40, generations, ..Default::default() }
    }

    #[test]
    fn converges_to_schaffer_front() {
        let mut opt = NsgaOptimizer::new(&Schaffer, params(60), RunRng::new(42));
        let out = opt.run(Deadline::none()).unwrap();
        assert!(!out.partial);
        assert_eq!(out.generations_run, 60);
        assert!(!out.pareto.is_empty());
        for ind in &out.pareto {
            let x = ind.genes[0];
            assert!((-0.5..=2.5).contains(&x), "pareto member x={x} far from [0, 2]");
        }
    }

    #[test]
    fn deterministic_replay() {
        let run = |seed| {
            let mut opt = NsgaOptimizer::new(&Schaffer, params(25), RunRng::new(seed));
            opt.run(Deadline::none()).unwrap()
        };
        let a = run(7);
        let b = run(7);
        assert_eq!(a.population.len(), b.population.len());
        for (x, y) in a.population.iter().zip(&b.population) {
            assert_eq!(x.genes, y.genes);
            assert_eq!(x.eval.as_ref().unwrap().objectives, y.eval.as_ref().unwrap().objectives);
        }
    }

    #[test]
    fn constrained_search_finds_feasible() {
        let mut opt = NsgaOptimizer::new(&ConstrainedLine, params(40), RunRng::new(1));
        let out = opt.run(Deadline::none()).unwrap();
        let best = out.best().unwrap();
        let eval = best.eval.as_ref().unwrap();
        assert!(eval.feasible());
        // Optimum sits on the constraint boundary x = 1.
        assert!((best.genes[0] - 1.0).abs() < 0.3, "best x = {}", best.genes[0]);
    }

    #[test]
    fn impossible_constraints_report_no_feasible_solution() {
        let mut opt = NsgaOptimizer::new(&Impossible, params(5), RunRng::new(1));
        assert!(matches!(
            opt.run(Deadline::none()),
            Err(crate::OptimizerError::NoFeasibleSolution)
        ));
    }

    #[test]
    fn expired_deadline_yields_partial() {
        let mut opt = NsgaOptimizer::new(&Schaffer, params(1000), RunRng::new(3));
        let out = opt.run(Deadline::after_secs(0.0)).unwrap();
        assert!(out.partial);
        assert!(out.generations_run < 1000);
        assert!(out.best().is_some(), "initial population is still reported");
    }

    #[test]
    fn stall_stops_early() {
        /// Constant objectives: zero improvement from generation one.
        struct Flat;
        impl Problem for Flat {
            fn gene_bounds(&self) -> Vec<(f64, f64)> {
                vec![(0.0, 1.0)]
            }
            fn evaluate(&self, _genes: &[f64]) -> Evaluation {
                Evaluation::of(vec![1.0, 2.0])
            }
        }
        let p = NsgaParams {
            population_size: 40,
            generations: 500,
            stall_generations: Some(10),
            ..Default::default()
        };
        let mut opt = NsgaOptimizer::new(&Flat, p, RunRng::new(11));
        let out = opt.run(Deadline::none()).unwrap();
        assert_eq!(out.generations_run, 11, "stall counter should fire after 10 flat generations");
    }

    #[test]
    fn observer_sees_every_generation() {
        let mut seen = Vec::new();
        let mut opt = NsgaOptimizer::new(&Schaffer, params(12), RunRng::new(2));
        opt.run_observed(Deadline::none(), |g, _| seen.push(g)).unwrap();
        assert_eq!(seen, (0..12).collect::<Vec<_>>());
    }
}

#[cfg(test)]
mod individual {
    use crate::individual::gene_hash;

    #[test]
    fn hash_is_stable_and_discriminating() {
        let a = vec![1.0, 2.0, 3.0];
        assert_eq!(gene_hash(&a), gene_hash(&a));
        assert_ne!(gene_hash(&a), gene_hash(&[1.0, 2.0, 3.0000001]));
    }
}
