//! Pipeline progress hooks.
//!
//! Callers that want to watch a run (CLI progress bars, web sockets, the
//! interactive agent) implement [`PipelineObserver`]; the default no-op
//! keeps the core free of any UI dependency.

/// Pipeline stages in execution order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Stage 1: road network and block candidates.
    RoadsAndBlocks,
    /// Stage 2: classification and lot subdivision.
    Subdivision,
    /// Road-connectivity validation over all lots.
    Connectivity,
    /// Stage 3: MST, transformers, drainage.
    Infrastructure,
}

/// Observer hooks.  All methods default to no-ops.
pub trait PipelineObserver {
    fn on_stage_start(&mut self, _stage: Stage) {}
    fn on_stage_end(&mut self, _stage: Stage) {}
    /// Emitted once per optimizer generation during the grid search with
    /// the best feasible first objective so far.
    fn on_generation(&mut self, _generation: u32, _best_objective: f64) {}
}

/// The do-nothing observer.
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}
