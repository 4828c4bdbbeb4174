//! MSAC consensus rule: minimize a threshold-saturated squared-residual
//! cost.

use crate::config::EstimatorConfig;
use crate::core::ConsensusScoring;

/// Truncated squared loss over all correspondences, lower is better;
/// the inlier count is kept for the adaptive iteration bound.
#[derive(Debug, Clone, PartialEq)]
pub struct TruncatedLossScore {
    pub loss: f64,
    pub inlier_count: usize,
}

/// M-estimator SAC scoring: every correspondence contributes
/// `min(r^2, threshold^2)`, so inliers are graded by how well they fit
/// instead of merely counted.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsacScoring;

impl ConsensusScoring for MsacScoring {
    type Score = TruncatedLossScore;

    fn evaluate(
        &self,
        residuals: &[f64],
        config: &EstimatorConfig,
        _sample_size: usize,
        inliers_out: &mut Vec<usize>,
    ) -> Self::Score {
        let threshold = config.threshold();
        let threshold_sq = threshold * threshold;
        inliers_out.clear();

        let mut loss = 0.0;
        for (i, &r) in residuals.iter().enumerate() {
            let r_sq = r * r;
            if r < threshold {
                inliers_out.push(i);
                loss += r_sq;
            } else {
                loss += threshold_sq;
            }
        }

        TruncatedLossScore {
            loss,
            inlier_count: inliers_out.len(),
        }
    }

    fn is_better(&self, candidate: &Self::Score, incumbent: &Self::Score) -> bool {
        candidate.loss < incumbent.loss
    }

    fn inlier_ratio(&self, score: &Self::Score, point_count: usize) -> Option<f64> {
        if point_count == 0 {
            return None;
        }
        Some((score.inlier_count as f64 / point_count as f64).clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_threshold(threshold: f64) -> EstimatorConfig {
        let mut cfg = EstimatorConfig::default();
        cfg.set_threshold(threshold).unwrap();
        cfg
    }

    #[test]
    fn outliers_saturate_at_squared_threshold() {
        let scoring = MsacScoring;
        let cfg = config_with_threshold(1.0);
        let residuals = [0.5, 2.0, 10.0];

        let mut inliers = Vec::new();
        let score = scoring.evaluate(&residuals, &cfg, 2, &mut inliers);

        // 0.25 + 1.0 + 1.0
        assert!((score.loss - 2.25).abs() < 1e-12);
        assert_eq!(score.inlier_count, 1);
        assert_eq!(inliers, vec![0]);
    }

    #[test]
    fn lower_loss_wins_and_ties_keep_incumbent() {
        let scoring = MsacScoring;
        let a = TruncatedLossScore {
            loss: 1.0,
            inlier_count: 3,
        };
        let b = TruncatedLossScore {
            loss: 2.0,
            inlier_count: 5,
        };
        assert!(scoring.is_better(&a, &b));
        assert!(!scoring.is_better(&b, &a));
        assert!(!scoring.is_better(&a, &a.clone()));
    }

    #[test]
    fn grades_within_equal_inlier_counts() {
        // Two models covering the same points: the one with tighter
        // residuals must win, which plain inlier counting cannot express.
        let scoring = MsacScoring;
        let cfg = config_with_threshold(1.0);
        let mut inliers = Vec::new();

        let tight = scoring.evaluate(&[0.1, 0.1, 5.0], &cfg, 2, &mut inliers);
        let loose = scoring.evaluate(&[0.9, 0.9, 5.0], &cfg, 2, &mut inliers);

        assert_eq!(tight.inlier_count, loose.inlier_count);
        assert!(scoring.is_better(&tight, &loose));
    }
}
