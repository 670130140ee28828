//! `estate-core` — foundational types for the estate layout engine.
//!
//! This crate is a dependency of every other `estate-*` crate.  It
//! intentionally has no `estate-*` dependencies and minimal external ones
//! (only `rand` and `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module       | Contents                                                |
//! |--------------|---------------------------------------------------------|
//! | [`ids`]      | `BlockId`, `LotId`, `NodeId`, `EdgeId`                  |
//! | [`point`]    | `Pt` — metric 2-D point/vector                          |
//! | [`config`]   | `LayoutConfig`, `LayoutMethod`, validation              |
//! | [`rng`]      | `RunRng` — seeded stream with child splitting           |
//! | [`deadline`] | `Deadline` (monotonic), `CancelToken`                   |
//! | [`status`]   | `LayoutStatus`, `Warning`, `FatalCode`                  |
//! | [`error`]    | `CoreError`, `CoreResult`                               |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod deadline;
pub mod error;
pub mod ids;
pub mod point;
pub mod rng;
pub mod status;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{LayoutConfig, LayoutMethod};
pub use deadline::{CancelToken, Deadline};
pub use error::{CoreError, CoreResult};
pub use ids::{BlockId, EdgeId, LotId, NodeId};
pub use point::Pt;
pub use rng::RunRng;
pub use status::{FatalCode, LayoutStatus, Warning};

/// Coordinate tolerance in metres (1 µm).  Used for point equality, ring
/// closure checks, and snap-rounding of boolean-op output.
pub const COORD_EPS: f64 = 1e-6;
