//! Road-generation error type.

use thiserror::Error;

use estate_geom::GeometryError;

/// Errors produced by `estate-roads`.
#[derive(Debug, Error)]
pub enum RoadError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("site too small to sample {wanted} seeds (placed {placed})")]
    SeedSampling { wanted: usize, placed: usize },

    #[error("voronoi input degenerate: {0}")]
    DegenerateSeeds(&'static str),
}

pub type RoadResult<T> = Result<T, RoadError>;
