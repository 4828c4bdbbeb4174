//! Error taxonomy for the robust estimation engine.
//!
//! Configuration problems are rejected at the mutator that introduced
//! them, before any state changes. `Locked`, `NotReady` and the two
//! estimation-failure variants are produced by [`estimate`] itself.
//!
//! [`estimate`]: crate::engine::RobustEstimator::estimate

use thiserror::Error;

/// Errors reported by estimator mutators and by `estimate()`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EstimatorError {
    #[error("inlier threshold must be greater than {min}, got {got}")]
    InvalidThreshold { min: f64, got: f64 },

    #[error("stop threshold must be strictly positive, got {0}")]
    InvalidStopThreshold(f64),

    #[error("confidence must lie strictly inside (0, 1), got {0}")]
    InvalidConfidence(f64),

    #[error("maximum iteration count must be at least 1")]
    InvalidMaxIterations,

    #[error("progress delta must lie inside [0, 1], got {0}")]
    InvalidProgressDelta(f64),

    #[error("suggestion weights must satisfy 0 < min < max with a positive step")]
    InvalidSuggestionWeights,

    #[error("need at least {needed} correspondences, got {got}")]
    TooFewCorrespondences { needed: usize, got: usize },

    #[error("quality score count {scores} does not match correspondence count {points}")]
    LengthMismatch { scores: usize, points: usize },

    /// A mutator or a reentrant `estimate()` was invoked while an
    /// estimation is running.
    #[error("estimator is locked while an estimation is in progress")]
    Locked,

    /// `estimate()` was invoked before the estimator held consistent data.
    #[error("estimator is not ready: {0}")]
    NotReady(&'static str),

    /// Every drawn sample was degenerate; no candidate model was ever
    /// produced within the iteration budget.
    #[error("no valid model could be estimated from the correspondences")]
    NoValidModel,

    /// The adapter's nonlinear refinement did not converge.
    #[error("refinement of the best model did not converge")]
    RefinementFailure,
}

impl EstimatorError {
    /// Whether this error describes an invalid configuration value
    /// (as opposed to a lifecycle or estimation failure).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            EstimatorError::InvalidThreshold { .. }
                | EstimatorError::InvalidStopThreshold(_)
                | EstimatorError::InvalidConfidence(_)
                | EstimatorError::InvalidMaxIterations
                | EstimatorError::InvalidProgressDelta(_)
                | EstimatorError::InvalidSuggestionWeights
                | EstimatorError::TooFewCorrespondences { .. }
                | EstimatorError::LengthMismatch { .. }
        )
    }
}
