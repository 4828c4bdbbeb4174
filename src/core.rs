//! Collaborator contracts for the robust estimation engine.
//!
//! The engine in [`crate::engine`] is generic over three seams:
//!
//! - [`ModelEstimator`]: fits candidate models from minimal samples and
//!   measures residuals; the only place model knowledge lives.
//! - [`Sampler`]: draws minimal-size index subsets.
//! - [`ConsensusScoring`]: turns a residual vector into a comparable
//!   score and an inlier set.
//!
//! [`EstimationListener`] and [`EstimatorControl`] form the observer
//! surface: callbacks receive a control handle so they can query the lock
//! phase and have configuration mutations rejected while a run is live.

use std::fmt;

use crate::config::EstimatorConfig;
use crate::error::EstimatorError;
use crate::refine::{RefinedModel, RefinementOptions};

/// Model adapter: everything the engine needs to know about one
/// geometric model family.
pub trait ModelEstimator {
    /// One observed correspondence (a point, a point pair, a plane, ...).
    type Datum;

    /// Candidate model fitted from a minimal sample.
    type Model: Clone;

    /// Size of a minimal sample.
    fn sample_size(&self) -> usize;

    /// Check a sample before fitting. The default rejects short samples,
    /// out-of-range indices, and repeated indices.
    fn is_valid_sample(&self, data: &[Self::Datum], sample: &[usize]) -> bool {
        if sample.len() < self.sample_size() {
            return false;
        }
        for (i, &a) in sample.iter().enumerate() {
            if a >= data.len() {
                return false;
            }
            if sample[..i].contains(&a) {
                return false;
            }
        }
        true
    }

    /// Fit zero or more candidate models from a minimal sample.
    ///
    /// A degenerate sample yields an empty vector; it is never an error.
    fn estimate(&self, data: &[Self::Datum], sample: &[usize]) -> Vec<Self::Model>;

    /// Fit from more than the minimal sample, optionally weighted.
    ///
    /// `weights`, when present, runs parallel to `data` (indexed by datum
    /// index, not by position in `sample`). The default ignores weights
    /// and delegates to the minimal fit, which suits adapters whose
    /// solver already handles overdetermined systems.
    fn estimate_nonminimal(
        &self,
        data: &[Self::Datum],
        sample: &[usize],
        weights: Option<&[f64]>,
    ) -> Vec<Self::Model> {
        let _ = weights;
        self.estimate(data, sample)
    }

    /// Non-negative residual of one correspondence against a model.
    /// Must be pure.
    fn residual(&self, model: &Self::Model, datum: &Self::Datum) -> f64;

    /// Nonlinear local refinement over the consensus set.
    ///
    /// `weights`, when present, runs parallel to `data`. Returning `None`
    /// signals non-convergence and aborts the estimation with
    /// [`EstimatorError::RefinementFailure`]. The default passes the
    /// model through unchanged, leaving refinement a no-op for adapters
    /// without a nonlinear stage.
    fn refine(
        &self,
        data: &[Self::Datum],
        inliers: &[usize],
        weights: Option<&[f64]>,
        model: &Self::Model,
        options: &RefinementOptions,
    ) -> Option<RefinedModel<Self::Model>> {
        let _ = (data, inliers, weights, options);
        Some(RefinedModel::unrefined(model.clone()))
    }
}

/// Minimal-sample selector.
pub trait Sampler {
    /// Prepare for a run over `point_count` correspondences.
    ///
    /// Quality scores, when provided, run parallel to the correspondence
    /// sequence; rank-aware samplers build their ordering here, once.
    fn initialize(&mut self, point_count: usize, sample_size: usize, quality_scores: Option<&[f64]>);

    /// Draw `out_indices.len()` indices into `out_indices`.
    ///
    /// Returns `false` when a sample cannot be drawn; the engine retries
    /// with the same bookkeeping as a degenerate fit.
    fn sample(&mut self, out_indices: &mut [usize]) -> bool;

    /// Whether this sampler cannot run without per-correspondence
    /// quality scores (PROSAC-family).
    fn requires_quality_scores(&self) -> bool {
        false
    }
}

/// Variant-specific consensus rule.
pub trait ConsensusScoring {
    /// Comparable score; "better" direction is defined by `is_better`.
    type Score: Clone + fmt::Debug;

    /// Score a candidate from the residuals of *all* correspondences,
    /// filling `inliers_out` with the indices of its consensus set.
    fn evaluate(
        &self,
        residuals: &[f64],
        config: &EstimatorConfig,
        sample_size: usize,
        inliers_out: &mut Vec<usize>,
    ) -> Self::Score;

    /// Strict comparison: `true` only when `candidate` beats `incumbent`.
    /// Equal scores keep the incumbent (first found wins).
    fn is_better(&self, candidate: &Self::Score, incumbent: &Self::Score) -> bool;

    /// Inlier ratio driving the adaptive iteration bound, or `None` for
    /// variants (median-based) that do not adapt the bound.
    fn inlier_ratio(&self, score: &Self::Score, point_count: usize) -> Option<f64>;

    /// Early-termination test against the configured stop threshold.
    fn reached_stop_threshold(&self, score: &Self::Score, config: &EstimatorConfig) -> bool {
        let _ = (score, config);
        false
    }
}

/// Narrow control surface handed to listener callbacks.
///
/// During a run `is_locked()` reports `true` and every setter returns
/// [`EstimatorError::Locked`] without mutating, so a listener can verify
/// the lock discipline from inside a callback.
pub trait EstimatorControl {
    fn is_locked(&self) -> bool;
    fn config(&self) -> &EstimatorConfig;
    fn set_threshold(&mut self, value: f64) -> Result<(), EstimatorError>;
    fn set_stop_threshold(&mut self, value: f64) -> Result<(), EstimatorError>;
    fn set_confidence(&mut self, value: f64) -> Result<(), EstimatorError>;
    fn set_max_iterations(&mut self, value: usize) -> Result<(), EstimatorError>;
    fn set_progress_delta(&mut self, value: f64) -> Result<(), EstimatorError>;
}

/// Observer notified synchronously, on the calling thread, in iteration
/// order: exactly one start, zero or more iteration/progress events with
/// increasing indices, exactly one end (also on failure).
pub trait EstimationListener {
    fn on_estimation_start(&mut self, control: &mut dyn EstimatorControl) {
        let _ = control;
    }

    fn on_estimation_end(&mut self, control: &mut dyn EstimatorControl) {
        let _ = control;
    }

    /// `iteration` is 1-based.
    fn on_iteration(&mut self, control: &mut dyn EstimatorControl, iteration: usize) {
        let _ = (control, iteration);
    }

    /// Fires only when the progress fraction advanced by at least the
    /// configured delta since the previous emission.
    fn on_progress_change(&mut self, control: &mut dyn EstimatorControl, progress: f64) {
        let _ = (control, progress);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug)]
    struct UnitModel;

    struct PairEstimator;

    impl ModelEstimator for PairEstimator {
        type Datum = f64;
        type Model = UnitModel;

        fn sample_size(&self) -> usize {
            2
        }

        fn estimate(&self, _data: &[f64], _sample: &[usize]) -> Vec<UnitModel> {
            vec![UnitModel]
        }

        fn residual(&self, _model: &UnitModel, datum: &f64) -> f64 {
            datum.abs()
        }
    }

    #[test]
    fn default_sample_validation_rejects_duplicates_and_overflow() {
        let est = PairEstimator;
        let data = [0.0, 1.0, 2.0];

        assert!(est.is_valid_sample(&data, &[0, 2]));
        assert!(!est.is_valid_sample(&data, &[1, 1]));
        assert!(!est.is_valid_sample(&data, &[0, 3]));
        assert!(!est.is_valid_sample(&data, &[0]));
    }

    #[test]
    fn default_refine_passes_model_through() {
        let est = PairEstimator;
        let data = [0.0, 1.0];
        let refined = est
            .refine(&data, &[0, 1], None, &UnitModel, &RefinementOptions::default())
            .expect("default refine never fails");
        assert!(refined.covariance.is_none());
    }

    #[test]
    fn default_nonminimal_delegates_to_minimal_fit() {
        let est = PairEstimator;
        let data = [0.0, 1.0, 2.0];
        let models = est.estimate_nonminimal(&data, &[0, 1, 2], Some(&[1.0, 1.0, 1.0]));
        assert_eq!(models.len(), 1);
    }
}
