//! LMedS consensus rule: minimize the median squared residual,
//! threshold-free.

use crate::config::EstimatorConfig;
use crate::core::ConsensusScoring;
use crate::utils::median_in_place;

/// Consistency factor of the robust standard deviation estimate derived
/// from the median (Rousseeuw & Leroy).
const MAD_CONSISTENCY: f64 = 1.4826;

/// Inliers lie within this many robust standard deviations.
const INLIER_SIGMAS: f64 = 2.5;

/// Median squared residual (lower is better) with the robust scale used
/// post hoc to classify inliers.
#[derive(Debug, Clone, PartialEq)]
pub struct MedianScore {
    pub median_squared: f64,
    pub scale: f64,
    pub inlier_count: usize,
}

/// Least-median-of-squares scoring.
///
/// The score needs no threshold; a robust scale
/// `1.4826 * (1 + 5 / (n - k)) * sqrt(median)` is derived from the median
/// and classifies inliers at `2.5 * scale`. The configured stop threshold
/// bounds the median residual for early termination.
#[derive(Debug, Clone, Copy, Default)]
pub struct LmedsScoring;

impl ConsensusScoring for LmedsScoring {
    type Score = MedianScore;

    fn evaluate(
        &self,
        residuals: &[f64],
        _config: &EstimatorConfig,
        sample_size: usize,
        inliers_out: &mut Vec<usize>,
    ) -> Self::Score {
        inliers_out.clear();
        let n = residuals.len();

        let mut squared: Vec<f64> = residuals.iter().map(|&r| r * r).collect();
        let median_squared = median_in_place(&mut squared);

        let dof = n.saturating_sub(sample_size).max(1);
        let scale = MAD_CONSISTENCY * (1.0 + 5.0 / dof as f64) * median_squared.max(0.0).sqrt();
        let cutoff = INLIER_SIGMAS * scale;

        for (i, &r) in residuals.iter().enumerate() {
            if r <= cutoff {
                inliers_out.push(i);
            }
        }

        MedianScore {
            median_squared,
            scale,
            inlier_count: inliers_out.len(),
        }
    }

    fn is_better(&self, candidate: &Self::Score, incumbent: &Self::Score) -> bool {
        candidate.median_squared < incumbent.median_squared
    }

    /// Median-based variants do not drive the adaptive iteration bound.
    fn inlier_ratio(&self, _score: &Self::Score, _point_count: usize) -> Option<f64> {
        None
    }

    fn reached_stop_threshold(&self, score: &Self::Score, config: &EstimatorConfig) -> bool {
        score.median_squared.max(0.0).sqrt() < config.stop_threshold()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_squared_residuals() {
        let scoring = LmedsScoring;
        let cfg = EstimatorConfig::default();
        let residuals = [1.0, 2.0, 3.0, 4.0, 5.0];

        let mut inliers = Vec::new();
        let score = scoring.evaluate(&residuals, &cfg, 2, &mut inliers);

        assert!((score.median_squared - 9.0).abs() < 1e-12);
        assert!(score.scale > 0.0);
    }

    #[test]
    fn scale_classifies_gross_outliers() {
        let scoring = LmedsScoring;
        let cfg = EstimatorConfig::default();
        // Nine well-fitting points and one gross outlier.
        let residuals = [0.1, 0.12, 0.09, 0.11, 0.1, 0.13, 0.08, 0.1, 0.11, 50.0];

        let mut inliers = Vec::new();
        let score = scoring.evaluate(&residuals, &cfg, 2, &mut inliers);

        assert_eq!(score.inlier_count, 9);
        assert!(!inliers.contains(&9));
    }

    #[test]
    fn lower_median_wins_and_ties_keep_incumbent() {
        let scoring = LmedsScoring;
        let a = MedianScore {
            median_squared: 0.5,
            scale: 1.0,
            inlier_count: 5,
        };
        let b = MedianScore {
            median_squared: 0.7,
            scale: 1.0,
            inlier_count: 8,
        };
        assert!(scoring.is_better(&a, &b));
        assert!(!scoring.is_better(&b, &a));
        assert!(!scoring.is_better(&a, &a.clone()));
    }

    #[test]
    fn stop_threshold_bounds_the_median_residual() {
        let scoring = LmedsScoring;
        let mut cfg = EstimatorConfig::default();
        cfg.set_stop_threshold(0.1).unwrap();

        let below = MedianScore {
            median_squared: 0.0001, // median residual 0.01
            scale: 0.0,
            inlier_count: 10,
        };
        let above = MedianScore {
            median_squared: 1.0,
            scale: 0.0,
            inlier_count: 10,
        };
        assert!(scoring.reached_stop_threshold(&below, &cfg));
        assert!(!scoring.reached_stop_threshold(&above, &cfg));
    }

    #[test]
    fn no_adaptive_ratio_for_median_scoring() {
        let scoring = LmedsScoring;
        let score = MedianScore {
            median_squared: 0.5,
            scale: 1.0,
            inlier_count: 5,
        };
        assert_eq!(scoring.inlier_ratio(&score, 10), None);
    }
}
