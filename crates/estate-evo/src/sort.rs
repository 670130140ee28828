//! Constraint-dominated non-dominated sorting and crowding distance.

use crate::individual::Individual;
use crate::problem::Evaluation;

/// NSGA-II constraint-domination.
///
/// A feasible solution dominates any infeasible one; between two
/// infeasibles, the smaller positive-violation sum dominates; between two
/// feasibles, ordinary Pareto domination applies.
pub fn dominates(a: &Evaluation, b: &Evaluation) -> bool {
    match (a.feasible(), b.feasible()) {
        (true, false) => true,
        (false, true) => false,
        (false, false) => a.violation_sum() < b.violation_sum(),
        (true, true) => {
            let mut strictly_better = false;
            for (x, y) in a.objectives.iter().zip(&b.objectives) {
                if x > y {
                    return false;
                }
                if x < y {
                    strictly_better = true;
                }
            }
            strictly_better
        }
    }
}

/// Fast non-dominated sort.  Assigns `rank` to every individual and returns
/// the fronts as index lists (front 0 first).
///
/// Every individual must already carry an evaluation.
pub fn fast_nondominated_sort(pop: &mut [Individual]) -> Vec<Vec<usize>> {
    let n = pop.len();
    let evals: Vec<&Evaluation> = pop
        .iter()
        .map(|ind| ind.eval.as_ref().expect("population evaluated before ranking"))
        .collect();

    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut domination_count = vec![0usize; n];
    let mut fronts: Vec<Vec<usize>> = vec![Vec::new()];

    for i in 0..n {
        for j in (i + 1)..n {
            if dominates(evals[i], evals[j]) {
                dominated_by[i].push(j);
                domination_count[j] += 1;
            } else if dominates(evals[j], evals[i]) {
                dominated_by[j].push(i);
                domination_count[i] += 1;
            }
        }
    }
    for i in 0..n {
        if domination_count[i] == 0 {
            fronts[0].push(i);
        }
    }

    let mut current = 0;
    while !fronts[current].is_empty() {
        let mut next = Vec::new();
        for &i in &fronts[current] {
            for &j in &dominated_by[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    next.push(j);
                }
            }
        }
        current += 1;
        fronts.push(next);
    }
    fronts.pop(); // trailing empty front

    for (rank, front) in fronts.iter().enumerate() {
        for &i in front {
            pop[i].rank = rank as u32;
        }
    }
    fronts
}

/// Crowding distance within one front (objective-space spread).
///
/// Boundary individuals get infinite distance; interior ones accumulate the
/// normalised gap between their neighbours on each objective.
pub fn crowding_distance(pop: &mut [Individual], front: &[usize]) {
    for &i in front {
        pop[i].crowding = 0.0;
    }
    if front.len() <= 2 {
        for &i in front {
            pop[i].crowding = f64::INFINITY;
        }
        return;
    }

    let n_obj = pop[front[0]]
        .eval
        .as_ref()
        .map(|e| e.objectives.len())
        .unwrap_or(0);

    let obj = |pop: &[Individual], idx: usize, m: usize| -> f64 {
        pop[idx].eval.as_ref().expect("evaluated").objectives[m]
    };

    for m in 0..n_obj {
        let mut order: Vec<usize> = front.to_vec();
        order.sort_by(|&a, &b| obj(pop, a, m).total_cmp(&obj(pop, b, m)));

        let lo = obj(pop, order[0], m);
        let hi = obj(pop, *order.last().expect("non-empty front"), m);
        pop[order[0]].crowding = f64::INFINITY;
        pop[*order.last().expect("non-empty front")].crowding = f64::INFINITY;

        let span = hi - lo;
        if span <= 0.0 {
            continue;
        }
        for w in order.windows(3) {
            let gap = (obj(pop, w[2], m) - obj(pop, w[0], m)) / span;
            if pop[w[1]].crowding.is_finite() {
                pop[w[1]].crowding += gap;
            }
        }
    }
}

/// Total order used everywhere selection or truncation needs "better":
/// rank ascending, then crowding descending, then the stable gene hash
/// ascending.  The hash tie-break is what makes replays byte-identical when
/// two individuals agree on rank and crowding.
pub fn compare(a: &Individual, b: &Individual) -> std::cmp::Ordering {
    a.rank
        .cmp(&b.rank)
        .then_with(|| b.crowding.total_cmp(&a.crowding))
        .then_with(|| a.hash().cmp(&b.hash()))
}

/// Sort the whole population by [`compare`].
pub fn order_population(pop: &mut [Individual]) {
    pop.sort_by(compare);
}
