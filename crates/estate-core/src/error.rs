//! Core error type.
//!
//! Sub-crates define their own error enums (`GeometryError`, `SolverError`,
//! …) and the pipeline crate aggregates them; `CoreError` covers only what
//! this crate itself can reject.

use thiserror::Error;

/// Errors produced by `estate-core`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid config: {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

/// Shorthand result type for `estate-core`.
pub type CoreResult<T> = Result<T, CoreError>;
