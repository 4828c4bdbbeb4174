//! RANSAC consensus rule: maximize the inlier count under a fixed
//! threshold.

use crate::config::EstimatorConfig;
use crate::core::ConsensusScoring;

/// Inlier count plus the residual sum over the consensus set, which
/// breaks ties between equal counts.
#[derive(Debug, Clone, PartialEq)]
pub struct InlierCountScore {
    pub inlier_count: usize,
    pub residual_sum: f64,
}

/// Classic RANSAC scoring: a correspondence with residual strictly below
/// the threshold supports the candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RansacScoring;

impl ConsensusScoring for RansacScoring {
    type Score = InlierCountScore;

    fn evaluate(
        &self,
        residuals: &[f64],
        config: &EstimatorConfig,
        _sample_size: usize,
        inliers_out: &mut Vec<usize>,
    ) -> Self::Score {
        let threshold = config.threshold();
        inliers_out.clear();

        let mut residual_sum = 0.0;
        for (i, &r) in residuals.iter().enumerate() {
            if r < threshold {
                inliers_out.push(i);
                residual_sum += r;
            }
        }

        InlierCountScore {
            inlier_count: inliers_out.len(),
            residual_sum,
        }
    }

    fn is_better(&self, candidate: &Self::Score, incumbent: &Self::Score) -> bool {
        candidate.inlier_count > incumbent.inlier_count
            || (candidate.inlier_count == incumbent.inlier_count
                && candidate.residual_sum < incumbent.residual_sum)
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
    fn counts_strict_inliers() {
        let scoring = RansacScoring;
        let cfg = config_with_threshold(0.5);
        let residuals = [0.1, 0.4, 0.5, 1.0, 0.3];

        let mut inliers = Vec::new();
        let score = scoring.evaluate(&residuals, &cfg, 2, &mut inliers);

        assert_eq!(score.inlier_count, 3);
        assert_eq!(inliers, vec![0, 1, 4]);
        assert!((score.residual_sum - 0.8).abs() < 1e-12);
    }

    #[test]
    fn more_inliers_beat_fewer() {
        let scoring = RansacScoring;
        let a = InlierCountScore {
            inlier_count: 5,
            residual_sum: 10.0,
        };
        let b = InlierCountScore {
            inlier_count: 4,
            residual_sum: 0.1,
        };
        assert!(scoring.is_better(&a, &b));
        assert!(!scoring.is_better(&b, &a));
    }

    #[test]
    fn equal_counts_break_ties_on_residual_sum() {
        let scoring = RansacScoring;
        let tighter = InlierCountScore {
            inlier_count: 4,
            residual_sum: 0.2,
        };
        let looser = InlierCountScore {
            inlier_count: 4,
            residual_sum: 0.3,
        };
        assert!(scoring.is_better(&tighter, &looser));
        // Fully equal scores keep the incumbent.
        assert!(!scoring.is_better(&looser, &looser.clone()));
    }

    #[test]
    fn ratio_is_fraction_of_points() {
        let scoring = RansacScoring;
        let score = InlierCountScore {
            inlier_count: 3,
            residual_sum: 0.0,
        };
        assert_eq!(scoring.inlier_ratio(&score, 6), Some(0.5));
        assert_eq!(scoring.inlier_ratio(&score, 0), None);
    }
}
