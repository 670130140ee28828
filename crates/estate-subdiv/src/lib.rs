//! `estate-subdiv` — stage-2 block classification and lot subdivision.
//!
//! Blocks coming out of stage 1 are measured (rectangularity, aspect,
//! dominant edge), classified, and — when commercial — carved into lots:
//! the block is rotated into its dominant-edge frame, an integer-centimetre
//! width plan fills the frontage exactly, and the lots are rotated back and
//! clipped to the block.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                 |
//! |--------------|----------------------------------------------------------|
//! | [`classify`] | `BlockMetrics`, `BlockClass`, the decision table         |
//! | [`solver`]   | integer frontage-width solver with deadline              |
//! | [`slicer`]   | rotate → slice → rotate back → clip                      |
//! | [`error`]    | `SolverError`, `SubdivResult<T>`                         |

pub mod classify;
pub mod error;
pub mod slicer;
pub mod solver;


pub use classify::{BlockClass, BlockMetrics, ClassifyParams};
pub use error::{SolverError, SubdivResult};
pub use slicer::{LotRect, SliceParams, SliceResult};
pub use solver::{FrontagePlan, FrontageSpec};
