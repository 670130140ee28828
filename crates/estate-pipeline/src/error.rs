//! Pipeline error type.
//!
//! Only boundary failures escape as `Err`; everything recoverable becomes a
//! [`Warning`](estate_core::Warning) on the layout instead.

use thiserror::Error;

use estate_core::CoreError;
use estate_evo::OptimizerError;
use estate_geom::GeometryError;
use estate_net::NetworkError;
use estate_roads::RoadError;

/// Errors produced by `estate-pipeline`.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid site: {0}")]
    InvalidSite(String),

    #[error(transparent)]
    InvalidConfig(#[from] CoreError),

    #[error(transparent)]
    Roads(#[from] RoadError),

    #[error(transparent)]
    Optimizer(#[from] OptimizerError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("cancelled by caller")]
    Cancelled,
}

pub type PipelineResult<T> = Result<T, PipelineError>;
