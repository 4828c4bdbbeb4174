//! Estimator configuration.
//!
//! [`EstimatorConfig`] carries every tunable the engine consults during a
//! run. Setters validate before mutating, so an invalid value can never
//! land in a live configuration; the same checks run again as part of the
//! engine's readiness test to cover deserialized configurations.

use serde::{Deserialize, Serialize};

use crate::error::EstimatorError;

/// Lower bound for the inlier threshold (exclusive).
pub const MIN_THRESHOLD: f64 = 0.0;

/// Robust estimation variant selected through the high-level API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    /// Maximize the inlier count under a fixed threshold.
    Ransac,
    /// Minimize the median squared residual; threshold-free.
    Lmeds,
    /// Minimize a threshold-saturated squared-residual cost.
    Msac,
    /// RANSAC scoring with quality-ranked progressive sampling.
    Prosac,
    /// LMedS scoring with quality-ranked progressive sampling.
    Promeds,
}

/// Whether a degenerate minimal-sample fit consumes iteration budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DegeneracyPolicy {
    /// Retry with fresh samples inside the same iteration, up to an
    /// internal attempt bound; only then let the iteration lapse.
    RetrySample,
    /// Charge every failed fit one full iteration.
    CountIteration,
}

/// Configuration shared by all estimation variants.
///
/// Threshold semantics are variant-specific: RANSAC/MSAC/PROSAC classify
/// inliers against `threshold`, while LMedS/PROMedS ignore it and use
/// `stop_threshold` as their early-termination bound on the median
/// residual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatorConfig {
    threshold: f64,
    stop_threshold: f64,
    confidence: f64,
    max_iterations: usize,
    progress_delta: f64,
    refine_result: bool,
    keep_covariance: bool,
    keep_inliers: bool,
    keep_residuals: bool,
    min_suggestion_weight: f64,
    max_suggestion_weight: f64,
    suggestion_weight_step: f64,
    degeneracy_policy: DegeneracyPolicy,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            threshold: 1.0,
            stop_threshold: 1e-6,
            confidence: 0.99,
            max_iterations: 5000,
            progress_delta: 0.05,
            refine_result: false,
            keep_covariance: false,
            keep_inliers: false,
            keep_residuals: false,
            min_suggestion_weight: 0.1,
            max_suggestion_weight: 2.0,
            suggestion_weight_step: 0.475,
            degeneracy_policy: DegeneracyPolicy::RetrySample,
        }
    }
}

impl EstimatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn stop_threshold(&self) -> f64 {
        self.stop_threshold
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn progress_delta(&self) -> f64 {
        self.progress_delta
    }

    pub fn refine_result(&self) -> bool {
        self.refine_result
    }

    pub fn keep_covariance(&self) -> bool {
        self.keep_covariance
    }

    pub fn keep_inliers(&self) -> bool {
        self.keep_inliers
    }

    pub fn keep_residuals(&self) -> bool {
        self.keep_residuals
    }

    pub fn min_suggestion_weight(&self) -> f64 {
        self.min_suggestion_weight
    }

    pub fn max_suggestion_weight(&self) -> f64 {
        self.max_suggestion_weight
    }

    pub fn suggestion_weight_step(&self) -> f64 {
        self.suggestion_weight_step
    }

    pub fn degeneracy_policy(&self) -> DegeneracyPolicy {
        self.degeneracy_policy
    }

    pub fn set_threshold(&mut self, value: f64) -> Result<(), EstimatorError> {
        if !value.is_finite() || value <= MIN_THRESHOLD {
            return Err(EstimatorError::InvalidThreshold {
                min: MIN_THRESHOLD,
                got: value,
            });
        }
        self.threshold = value;
        Ok(())
    }

    pub fn set_stop_threshold(&mut self, value: f64) -> Result<(), EstimatorError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(EstimatorError::InvalidStopThreshold(value));
        }
        self.stop_threshold = value;
        Ok(())
    }

    pub fn set_confidence(&mut self, value: f64) -> Result<(), EstimatorError> {
        if !value.is_finite() || value <= 0.0 || value >= 1.0 {
            return Err(EstimatorError::InvalidConfidence(value));
        }
        self.confidence = value;
        Ok(())
    }

    pub fn set_max_iterations(&mut self, value: usize) -> Result<(), EstimatorError> {
        if value < 1 {
            return Err(EstimatorError::InvalidMaxIterations);
        }
        self.max_iterations = value;
        Ok(())
    }

    pub fn set_progress_delta(&mut self, value: f64) -> Result<(), EstimatorError> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(EstimatorError::InvalidProgressDelta(value));
        }
        self.progress_delta = value;
        Ok(())
    }

    pub fn set_refine_result(&mut self, value: bool) {
        self.refine_result = value;
    }

    pub fn set_keep_covariance(&mut self, value: bool) {
        self.keep_covariance = value;
    }

    pub fn set_keep_inliers(&mut self, value: bool) {
        self.keep_inliers = value;
    }

    pub fn set_keep_residuals(&mut self, value: bool) {
        self.keep_residuals = value;
    }

    pub fn set_degeneracy_policy(&mut self, value: DegeneracyPolicy) {
        self.degeneracy_policy = value;
    }

    /// Set the suggestion-weight annealing schedule used by adapters that
    /// bias refinement toward externally suggested parameter values.
    pub fn set_suggestion_weights(
        &mut self,
        min: f64,
        max: f64,
        step: f64,
    ) -> Result<(), EstimatorError> {
        if !min.is_finite() || !max.is_finite() || !step.is_finite() {
            return Err(EstimatorError::InvalidSuggestionWeights);
        }
        if min <= 0.0 || min >= max || step <= 0.0 {
            return Err(EstimatorError::InvalidSuggestionWeights);
        }
        self.min_suggestion_weight = min;
        self.max_suggestion_weight = max;
        self.suggestion_weight_step = step;
        Ok(())
    }

    /// Re-run every setter check; used by the engine's readiness test so
    /// that configurations built by deserialization get validated too.
    pub fn validate(&self) -> Result<(), EstimatorError> {
        let mut probe = self.clone();
        probe.set_threshold(self.threshold)?;
        probe.set_stop_threshold(self.stop_threshold)?;
        probe.set_confidence(self.confidence)?;
        probe.set_max_iterations(self.max_iterations)?;
        probe.set_progress_delta(self.progress_delta)?;
        probe.set_suggestion_weights(
            self.min_suggestion_weight,
            self.max_suggestion_weight,
            self.suggestion_weight_step,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = EstimatorConfig::default();
        assert!(cfg.validate().is_ok());
        assert!((cfg.threshold() - 1.0).abs() < 1e-12);
        assert!((cfg.confidence() - 0.99).abs() < 1e-12);
        assert_eq!(cfg.max_iterations(), 5000);
        assert!((cfg.progress_delta() - 0.05).abs() < 1e-12);
        assert_eq!(cfg.degeneracy_policy(), DegeneracyPolicy::RetrySample);
        assert!(!cfg.refine_result());
    }

    #[test]
    fn setters_round_trip_valid_values() {
        let mut cfg = EstimatorConfig::default();
        cfg.set_threshold(0.25).unwrap();
        cfg.set_stop_threshold(1e-3).unwrap();
        cfg.set_confidence(0.999).unwrap();
        cfg.set_max_iterations(42).unwrap();
        cfg.set_progress_delta(0.2).unwrap();

        assert!((cfg.threshold() - 0.25).abs() < 1e-12);
        assert!((cfg.stop_threshold() - 1e-3).abs() < 1e-12);
        assert!((cfg.confidence() - 0.999).abs() < 1e-12);
        assert_eq!(cfg.max_iterations(), 42);
        assert!((cfg.progress_delta() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn invalid_values_are_rejected_without_mutation() {
        let mut cfg = EstimatorConfig::default();
        let before = cfg.clone();

        assert_eq!(
            cfg.set_threshold(0.0),
            Err(EstimatorError::InvalidThreshold { min: 0.0, got: 0.0 })
        );
        assert_eq!(
            cfg.set_confidence(1.0),
            Err(EstimatorError::InvalidConfidence(1.0))
        );
        assert_eq!(
            cfg.set_max_iterations(0),
            Err(EstimatorError::InvalidMaxIterations)
        );
        assert_eq!(
            cfg.set_progress_delta(1.5),
            Err(EstimatorError::InvalidProgressDelta(1.5))
        );
        assert_eq!(
            cfg.set_stop_threshold(-1.0),
            Err(EstimatorError::InvalidStopThreshold(-1.0))
        );
        assert_eq!(
            cfg.set_suggestion_weights(1.0, 0.5, 0.1),
            Err(EstimatorError::InvalidSuggestionWeights)
        );

        assert_eq!(cfg, before);
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let mut cfg = EstimatorConfig::default();
        assert!(cfg.set_threshold(f64::NAN).is_err());
        assert!(cfg.set_confidence(f64::INFINITY).is_err());
        assert!(cfg.set_progress_delta(f64::NAN).is_err());
    }
}
