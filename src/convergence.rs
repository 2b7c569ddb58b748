//! Stopping rule shared by both EM engines.
//!
//! EM keeps iterating while the iteration cap has not been reached and the
//! objective still moves by at least `tol`:
//!
//! ```text
//! continue ⇔ it < max_iter ∧ (prev is undefined ∨ |ll − prev| ≥ tol)
//! ```
//!
//! The first iteration has no previous objective, so at least two iterations
//! always run (when `max_iter ≥ 2`).

use crate::error::{Error, Result};
use tracing::warn;

/// Default convergence threshold on the absolute objective change.
pub const DEFAULT_TOL: f64 = 1e-3;
/// Default iteration cap.
pub const DEFAULT_MAX_ITER: usize = 1000;
/// A drop larger than this between iterations is reported as a warning.
pub const DECREASE_TOLERANCE: f64 = 1e-6;

/// Continuation predicate.
///
/// `iteration` is the number of completed iterations, `current` the objective
/// after the last one and `previous` the objective before it.
pub fn should_continue(
    iteration: usize,
    current: Option<f64>,
    previous: Option<f64>,
    tol: f64,
    max_iter: usize,
) -> bool {
    if iteration >= max_iter {
        return false;
    }
    match (current, previous) {
        (Some(ll), Some(prev)) => (ll - prev).abs() >= tol,
        _ => true,
    }
}

/// Objective values recorded by one EM run, one per iteration.
#[derive(Debug, Clone, Default)]
pub struct LogLikelihoodTrace {
    values: Vec<f64>,
}

impl LogLikelihoodTrace {
    /// Empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed iterations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True before the first iteration.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Objective after the last iteration.
    pub fn current(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Objective after the second-to-last iteration.
    pub fn previous(&self) -> Option<f64> {
        self.values.len().checked_sub(2).map(|i| self.values[i])
    }

    /// Apply [`should_continue`] to the recorded state.
    pub fn should_continue(&self, tol: f64, max_iter: usize) -> bool {
        should_continue(self.len(), self.current(), self.previous(), tol, max_iter)
    }

    /// True when the last step moved the objective by less than `tol`.
    pub fn has_converged(&self, tol: f64) -> bool {
        match (self.current(), self.previous()) {
            (Some(ll), Some(prev)) => (ll - prev).abs() < tol,
            _ => false,
        }
    }

    /// Record the objective of the iteration just completed.
    ///
    /// A non-finite value is fatal. A decrease is only logged: EM never
    /// lowers the objective in exact arithmetic, so a drop points at
    /// near-degenerate components rather than at a reason to stop.
    pub fn record(&mut self, ll: f64) -> Result<()> {
        let iteration = self.values.len() + 1;
        if !ll.is_finite() {
            return Err(Error::NonFiniteLogLikelihood { iteration });
        }
        if let Some(prev) = self.current() {
            if ll < prev - DECREASE_TOLERANCE {
                warn!(
                    iteration,
                    previous = prev,
                    current = ll,
                    "log-likelihood decreased"
                );
            }
        }
        self.values.push(ll);
        Ok(())
    }

    /// All recorded values, oldest first.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Consume the trace.
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}
