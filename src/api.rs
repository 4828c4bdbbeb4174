//! High-level one-shot estimation functions.
//!
//! Each function wires the sampler/scoring pair for the requested
//! [`Method`] around a bundled adapter and runs a single estimation.
//! For full control (listeners, keep flags, reuse across calls) build a
//! [`RobustEstimator`] directly.

use nalgebra::Point2;

use crate::config::{EstimatorConfig, Method};
use crate::engine::{EstimationOutcome, RobustEstimator};
use crate::error::EstimatorError;
use crate::estimators::{Circle, CircleEstimator, Line2D, LineEstimator};

/// Estimate a 2D line from points.
///
/// `threshold` is the inlier threshold for RANSAC/MSAC/PROSAC and the
/// early-termination stop threshold for LMedS/PROMedS. PROSAC/PROMedS
/// additionally require `quality_scores` (one per point).
pub fn estimate_line(
    points: &[Point2<f64>],
    method: Method,
    threshold: f64,
    quality_scores: Option<&[f64]>,
    config: Option<EstimatorConfig>,
) -> Result<EstimationOutcome<Line2D>, EstimatorError> {
    let data = points.to_vec();
    let quality = quality_scores.map(<[f64]>::to_vec);
    match method {
        Method::Ransac => run(
            RobustEstimator::ransac(LineEstimator::new()),
            data,
            quality,
            config,
            threshold,
            false,
        ),
        Method::Msac => run(
            RobustEstimator::msac(LineEstimator::new()),
            data,
            quality,
            config,
            threshold,
            false,
        ),
        Method::Lmeds => run(
            RobustEstimator::lmeds(LineEstimator::new()),
            data,
            quality,
            config,
            threshold,
            true,
        ),
        Method::Prosac => run(
            RobustEstimator::prosac(LineEstimator::new()),
            data,
            quality,
            config,
            threshold,
            false,
        ),
        Method::Promeds => run(
            RobustEstimator::promeds(LineEstimator::new()),
            data,
            quality,
            config,
            threshold,
            true,
        ),
    }
}

/// Estimate a circle from points; threshold semantics as in
/// [`estimate_line`].
pub fn estimate_circle(
    points: &[Point2<f64>],
    method: Method,
    threshold: f64,
    quality_scores: Option<&[f64]>,
    config: Option<EstimatorConfig>,
) -> Result<EstimationOutcome<Circle>, EstimatorError> {
    let data = points.to_vec();
    let quality = quality_scores.map(<[f64]>::to_vec);
    match method {
        Method::Ransac => run(
            RobustEstimator::ransac(CircleEstimator::new()),
            data,
            quality,
            config,
            threshold,
            false,
        ),
        Method::Msac => run(
            RobustEstimator::msac(CircleEstimator::new()),
            data,
            quality,
            config,
            threshold,
            false,
        ),
        Method::Lmeds => run(
            RobustEstimator::lmeds(CircleEstimator::new()),
            data,
            quality,
            config,
            threshold,
            true,
        ),
        Method::Prosac => run(
            RobustEstimator::prosac(CircleEstimator::new()),
            data,
            quality,
            config,
            threshold,
            false,
        ),
        Method::Promeds => run(
            RobustEstimator::promeds(CircleEstimator::new()),
            data,
            quality,
            config,
            threshold,
            true,
        ),
    }
}

fn run<E, Sa, Sc>(
    mut engine: RobustEstimator<E, Sa, Sc>,
    data: Vec<E::Datum>,
    quality: Option<Vec<f64>>,
    config: Option<EstimatorConfig>,
    threshold: f64,
    threshold_is_stop_bound: bool,
) -> Result<EstimationOutcome<E::Model>, EstimatorError>
where
    E: crate::core::ModelEstimator,
    Sa: crate::core::Sampler,
    Sc: crate::core::ConsensusScoring,
{
    if let Some(config) = config {
        engine.set_config(config)?;
    }
    if threshold_is_stop_bound {
        engine.set_stop_threshold(threshold)?;
    } else {
        engine.set_threshold(threshold)?;
    }
    engine.set_correspondences(data)?;
    engine.set_quality_scores(quality)?;
    engine.estimate()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_points() -> Vec<Point2<f64>> {
        (0..30)
            .map(|i| {
                let x = i as f64;
                Point2::new(x, 2.0 * x - 1.0)
            })
            .collect()
    }

    #[test]
    fn ransac_line_on_clean_points() {
        let points = line_points();
        let outcome = estimate_line(&points, Method::Ransac, 0.1, None, None).unwrap();
        for p in &points {
            assert!(outcome.model.distance(p) < 1e-9);
        }
    }

    #[test]
    fn lmeds_circle_on_clean_points() {
        let points: Vec<Point2<f64>> = (0..60)
            .map(|i| {
                let angle = i as f64 * 2.0 * std::f64::consts::PI / 60.0;
                Point2::new(4.0 + 3.0 * angle.cos(), -2.0 + 3.0 * angle.sin())
            })
            .collect();
        let outcome = estimate_circle(&points, Method::Lmeds, 1e-6, None, None).unwrap();
        assert!((outcome.model.center.x - 4.0).abs() < 1e-6);
        assert!((outcome.model.center.y + 2.0).abs() < 1e-6);
        assert!((outcome.model.radius - 3.0).abs() < 1e-6);
    }

    #[test]
    fn prosac_without_scores_reports_not_ready() {
        let points = line_points();
        let result = estimate_line(&points, Method::Prosac, 0.1, None, None);
        assert!(matches!(result, Err(EstimatorError::NotReady(_))));
    }

    #[test]
    fn promeds_with_scores_succeeds() {
        let points = line_points();
        let scores = vec![1.0; points.len()];
        let outcome =
            estimate_line(&points, Method::Promeds, 1e-6, Some(&scores), None).unwrap();
        for p in &points {
            assert!(outcome.model.distance(p) < 1e-9);
        }
    }
}
