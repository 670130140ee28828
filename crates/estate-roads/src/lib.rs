//! `estate-roads` — stage-1 road and block generation.
//!
//! Two generators produce the raw material the rest of the pipeline works
//! on: a rotated-lattice grid (parameterised by the evolutionary search) and
//! a centroidal Voronoi tessellation for organic layouts.  Both hand over
//! the same things: candidate block polygons, road centrelines, and a road
//! footprint whose complement against the site *is* the block set.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`grid`]    | `GridGenes`, rotated-lattice tile generation              |
//! | [`voronoi`] | seed sampling, Lloyd/CVT relaxation, cell + edge extraction |
//! | [`roads`]   | edge classification, footprints, block derivation, pre-split |
//! | [`error`]   | `RoadError`, `RoadResult<T>`                              |

pub mod error;
pub mod grid;
pub mod roads;
pub mod voronoi;

#[cfg(test)]
mod tests;

pub use error::{RoadError, RoadResult};
pub use grid::{GridCandidate, GridGenes};
pub use roads::{RoadClass, RoadNetwork, RoadSegment};
pub use voronoi::{CvtOutcome, CvtParams, VoronoiDiagram};
