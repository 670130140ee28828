//! Optimizer error type.

use thiserror::Error;

/// Errors produced by `estate-evo`.
#[derive(Debug, Error)]
pub enum OptimizerError {
    /// Hard-constrained mode finished its final generation with zero
    /// feasible individuals.
    #[error("no feasible solution after the final generation")]
    NoFeasibleSolution,

    #[error("problem reports zero genes")]
    EmptyGeneSpace,
}

pub type EvoResult<T> = Result<T, OptimizerError>;
