//! Geometry-subsystem error type.

use thiserror::Error;

/// Errors produced by `estate-geom`.
///
/// Callers in the road and subdivision stages treat `DegenerateResult` as
/// recoverable — the affected candidate is skipped and the run continues.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("invalid geometry input: {0}")]
    InvalidInput(String),

    #[error("degenerate geometry result: {0}")]
    DegenerateResult(&'static str),
}

pub type GeomResult<T> = Result<T, GeometryError>;
