//! Infrastructure error type.

use thiserror::Error;

use estate_geom::GeometryError;

/// Errors produced by `estate-net`.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The candidate-edge graph does not connect all nodes under the
    /// distance cut-off.  Carries the connected components so callers can
    /// report or bridge them.
    #[error("utility graph is disconnected ({} components)", components.len())]
    Disconnected { components: Vec<Vec<u32>> },

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

pub type NetResult<T> = Result<T, NetworkError>;
