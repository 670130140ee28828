//! `estate-net` — stage-3 infrastructure planning.
//!
//! Everything downstream of lots lives here: verifying each lot can reach a
//! road (grid raster + A*), the electrical trunk network (cut-off graph →
//! Kruskal MST → loop redundancy, with an approximate Steiner variant),
//! transformer placement (capacity-bounded k-means), and drainage vectors
//! (direct to the treatment plant, or along the road graph).
//!
//! # Crate layout
//!
//! | Module          | Contents                                             |
//! |-----------------|------------------------------------------------------|
//! | [`raster`]      | `RoadRaster` — road/blocked cell grid                |
//! | [`astar`]       | A* over the raster, 4-/8-connectivity                |
//! | [`mst`]         | cut-off graph, Kruskal, redundancy, Steiner variant  |
//! | [`kmeans`]      | seeded k-means++ / Lloyd                             |
//! | [`transformer`] | capacity-bounded cluster count search                |
//! | [`drainage`]    | `RoadGraph`, WWTP choice, drainage arrows            |
//! | [`error`]       | `NetworkError`, `NetResult<T>`                       |

pub mod astar;
pub mod drainage;
pub mod error;
pub mod kmeans;
pub mod mst;
pub mod raster;
pub mod transformer;

#[cfg(test)]
mod tests;

pub use astar::{Connectivity, GridPath};
pub use drainage::{DrainageArrow, ElevationModel, RoadGraph};
pub use error::{NetResult, NetworkError};
pub use mst::{MstEdge, MstOutcome};
pub use raster::RoadRaster;
pub use transformer::{Transformer, TransformerParams, TransformerPlan};
