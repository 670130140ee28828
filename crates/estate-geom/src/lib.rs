//! `estate-geom` — geometry kernel and spatial indexing.
//!
//! The kernel delegates polygon boolean operations, area, centroids, and
//! minimum rotated rectangles to the `geo` crate and owns the layers above:
//! validity checking, snap-rounding of boolean-op output, buffering built
//! from boolean ops, polyline footprints, and segment clipping.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                   |
//! |------------|------------------------------------------------------------|
//! | [`kernel`] | validity, area/centroid/bounds, rotate, boolean ops,       |
//! |            | minimum rotated rectangle, snap-rounding, segment clipping |
//! | [`buffer`] | polygon offsets and polyline footprints                    |
//! | [`index`]  | `PolyIndex` / `PointIndex` R-trees over `rstar`            |
//! | [`error`]  | `GeometryError`, `GeomResult<T>`                           |
//!
//! # Numeric policy
//!
//! Double precision throughout.  Point equality and ring closure use the
//! engine-wide tolerance [`estate_core::COORD_EPS`] (1 µm); boolean-op
//! output is snapped to that grid to eliminate spurious vertices.

pub mod buffer;
pub mod error;
pub mod index;
pub mod kernel;


pub use error::{GeomResult, GeometryError};
pub use index::{PointIndex, PolyIndex};
