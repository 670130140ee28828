//! Layout status, warnings, and fatal error codes.
//!
//! A layout run never panics its way out: it either completes (`Ok`),
//! completes degraded (`Partial` — some solver hit its deadline or a
//! recoverable failure was absorbed), or fails at a boundary (`Failed`,
//! with one [`FatalCode`] and empty geometry).  Everything recoverable is
//! recorded as a [`Warning`] on the layout.

use std::fmt;

use crate::ids::{BlockId, LotId};

// ── LayoutStatus ──────────────────────────────────────────────────────────────

/// Overall outcome of a pipeline run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LayoutStatus {
    #[default]
    Ok,
    /// Best-so-far results under an expired deadline or recovered failures.
    Partial,
    /// Fatal boundary error; the layout carries no geometry.
    Failed,
}

// ── FatalCode ─────────────────────────────────────────────────────────────────

/// The single error code carried by a failed layout.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FatalCode {
    InvalidSite,
    InvalidConfig,
    NoFeasibleSolution,
    Cancelled,
}

impl fmt::Display for FatalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FatalCode::InvalidSite => "invalid_site",
            FatalCode::InvalidConfig => "invalid_config",
            FatalCode::NoFeasibleSolution => "no_feasible_solution",
            FatalCode::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

// ── Warning ───────────────────────────────────────────────────────────────────

/// A recoverable degradation recorded on the layout.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Warning {
    /// A candidate or cell produced degenerate geometry and was skipped.
    DegenerateGeometry { stage: String },
    /// A block's frontage subdivision was infeasible; re-classified green.
    BlockInfeasible { block: BlockId },
    /// The per-block solver hit its time limit; best feasible plan kept.
    SolverTimeout { block: BlockId },
    /// The evolutionary search hit its deadline; best-so-far result kept.
    OptimizerPartial,
    /// A lot could not reach any road cell; re-classified green.
    LotUnreachable { lot: LotId },
    /// The utility graph splits into this many connected components.
    NetworkDisconnected { components: usize },
    /// No transformer count in the allowed range could satisfy the capacity
    /// bound; the minimal-overload clustering was kept.
    TransformerOverCapacity { transformer: usize, load_kw: f64 },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::DegenerateGeometry { stage } => {
                write!(f, "degenerate geometry skipped during {stage}")
            }
            Warning::BlockInfeasible { block } => {
                write!(f, "{block} infeasible to subdivide; re-classified green")
            }
            Warning::SolverTimeout { block } => {
                write!(f, "frontage solver timed out on {block}")
            }
            Warning::OptimizerPartial => {
                write!(f, "optimizer deadline expired; best-so-far layout kept")
            }
            Warning::LotUnreachable { lot } => {
                write!(f, "{lot} cannot reach the road network")
            }
            Warning::NetworkDisconnected { components } => {
                write!(f, "utility network splits into {components} components")
            }
            Warning::TransformerOverCapacity { transformer, load_kw } => {
                write!(f, "transformer {transformer} over capacity at {load_kw:.0} kW")
            }
        }
    }
}
