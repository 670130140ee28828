//! `estate-pipeline` — the three-stage layout orchestrator.
//!
//! Stage 1 carves the site into roads and blocks (grid search or Voronoi
//! CVT), stage 2 classifies blocks and subdivides the commercial ones into
//! lots, stage 3 plans infrastructure (electrical trunk MST, transformers,
//! drainage) and validates road connectivity.  The result is one frozen
//! [`Layout`] record carrying geometry, metrics, warnings, and a status.
//!
//! # Crate layout
//!
//! | Module        | Contents                                               |
//! |---------------|--------------------------------------------------------|
//! | [`layout`]    | `Layout`, plain serialisable geometry records, metrics |
//! | [`pipeline`]  | `PipelineBuilder`, `Pipeline::run`                     |
//! | [`stage1`]    | `GridPlanProblem`, grid/Voronoi stage-1 drivers        |
//! | [`placement`] | hard-constrained facility placement problem            |
//! | [`observer`]  | `PipelineObserver` hooks                               |
//! | [`error`]     | `PipelineError`                                        |
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                  |
//! |------------|---------------------------------------------------------|
//! | `serde`    | Serialise/deserialise `Layout` and everything in it.    |
//! | `parallel` | Rayon-parallel fitness evaluation in stage 1.           |

pub mod error;
pub mod layout;
pub mod observer;
pub mod placement;
pub mod pipeline;
pub mod stage1;


pub use error::{PipelineError, PipelineResult};
pub use layout::{BlockRec, Layout, LayoutMetrics, LotRec, PolygonRec, RoadRec};
pub use observer::{NoopObserver, PipelineObserver, Stage};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use placement::{FacilityKind, PlacementProblem};

// Re-exported so layout consumers don't need the stage crates on their own
// dependency list.
pub use estate_roads::RoadClass;
pub use estate_subdiv::BlockClass;
