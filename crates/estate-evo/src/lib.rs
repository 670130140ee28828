//! `estate-evo` — NSGA-II multi-objective evolutionary search.
//!
//! The optimizer is generic over a [`Problem`]: anything with gene bounds
//! and a pure, deterministic fitness function.  The grid layout search and
//! the constrained facility-placement search both plug in here.
//!
//! # Determinism
//!
//! Same problem, same parameters, same seed → identical outcome, with or
//! without the `parallel` feature.  Fitness evaluations are pure functions
//! of the gene vector; after every (possibly parallel) evaluation sweep the
//! population is re-ordered by a stable gene hash before ranking, so
//! scheduling order never leaks into results.
//!
//! # Crate layout
//!
//! | Module         | Contents                                              |
//! |----------------|-------------------------------------------------------|
//! | [`problem`]    | `Problem` trait, `Evaluation`                         |
//! | [`individual`] | `Individual`, stable gene hashing                     |
//! | [`ops`]        | SBX, polynomial mutation, order crossover, swap       |
//! | [`sort`]       | constraint-dominated non-dominated sort, crowding     |
//! | [`optimizer`]  | `NsgaOptimizer`, `NsgaParams`, `NsgaOutcome`          |

pub mod error;
pub mod individual;
pub mod ops;
pub mod optimizer;
pub mod problem;
pub mod sort;

#[cfg(test)]
mod tests;

pub use error::{EvoResult, OptimizerError};
pub use individual::{Individual, gene_hash};
pub use optimizer::{NsgaOptimizer, NsgaOutcome, NsgaParams};
pub use problem::{Evaluation, Problem};
