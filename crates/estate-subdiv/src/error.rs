//! Subdivision error type.

use thiserror::Error;

use estate_geom::GeometryError;

/// Errors produced by `estate-subdiv`.
///
/// `Infeasible` and `Timeout` are recoverable at the pipeline level: the
/// affected block is re-classified as green space.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("no lot count fits the frontage within the width bounds")]
    Infeasible,

    #[error("frontage solver hit its deadline before finding a plan")]
    Timeout,

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

pub type SubdivResult<T> = Result<T, SolverError>;
