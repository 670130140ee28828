//! Monotonic deadlines and cooperative cancellation.
//!
//! Long-running solves (the evolutionary search, the per-block frontage
//! solver) accept a [`Deadline`] as an explicit parameter — never a
//! thread-local or global — and check it between iterations.  On expiry they
//! return their best-so-far result marked partial.
//!
//! [`CancelToken`] carries an *external* cancellation signal from the
//! orchestrator's caller; unlike a deadline it aborts the pipeline rather
//! than degrading it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

// ── Deadline ──────────────────────────────────────────────────────────────────

/// A point on the monotonic clock after which work should stop.
///
/// `Deadline::none()` never expires; all solver loops can thread a deadline
/// unconditionally without branching on an `Option`.
#[derive(Copy, Clone, Debug)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// A deadline that never expires.
    pub fn none() -> Self {
        Self { at: None }
    }

    /// Expires `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self { at: Some(Instant::now() + budget) }
    }

    /// Expires `secs` seconds from now (fractional seconds allowed).
    pub fn after_secs(secs: f64) -> Self {
        Self::after(Duration::from_secs_f64(secs.max(0.0)))
    }

    #[inline]
    pub fn expired(&self) -> bool {
        match self.at {
            None => false,
            Some(at) => Instant::now() >= at,
        }
    }

    /// Time left, or `None` for an unbounded deadline.  Zero once expired.
    pub fn remaining(&self) -> Option<Duration> {
        self.at.map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// A child deadline capped at `budget` from now but never later than
    /// `self`.  Used to hand each block solver its own slice of the
    /// pipeline's overall budget.
    pub fn capped(&self, budget: Duration) -> Deadline {
        let capped = Instant::now() + budget;
        let at = match self.at {
            None => capped,
            Some(at) => at.min(capped),
        };
        Deadline { at: Some(at) }
    }
}

// ── CancelToken ───────────────────────────────────────────────────────────────

/// Shared flag for external cancellation.
///
/// Cloning is cheap; the orchestrator's caller keeps one clone and the
/// pipeline polls another between stages.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation.  Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
