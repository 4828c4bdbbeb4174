//! Circle adapter.

use argmin::core::CostFunction;
use nalgebra::{DVector, Matrix3, Point2, Vector3};

use crate::core::ModelEstimator;
use crate::refine::{
    levenberg_marquardt, LeastSquaresProblem, LmOptions, RefinedModel, RefinementOptions,
};

/// Circle with center and radius.
#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    pub center: Point2<f64>,
    pub radius: f64,
}

impl Circle {
    pub fn new(center: Point2<f64>, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Distance from `point` to the circle locus.
    pub fn distance(&self, point: &Point2<f64>) -> f64 {
        ((point - self.center).norm() - self.radius).abs()
    }

    /// Whether `point` lies on the circle within `tolerance`.
    pub fn is_on_locus(&self, point: &Point2<f64>, tolerance: f64) -> bool {
        self.distance(point) <= tolerance
    }
}

/// Fits [`Circle`] models from point samples.
pub struct CircleEstimator;

impl Default for CircleEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl CircleEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Circumcircle of three points via the perpendicular-bisector
    /// system; collinear points are degenerate.
    fn circumcircle(p1: &Point2<f64>, p2: &Point2<f64>, p3: &Point2<f64>) -> Option<Circle> {
        let ax = p2.x - p1.x;
        let ay = p2.y - p1.y;
        let bx = p3.x - p1.x;
        let by = p3.y - p1.y;

        let det = 2.0 * (ax * by - ay * bx);
        if det.abs() < 1e-12 {
            return None;
        }

        let a_sq = ax * ax + ay * ay;
        let b_sq = bx * bx + by * by;
        let ux = (by * a_sq - ay * b_sq) / det;
        let uy = (ax * b_sq - bx * a_sq) / det;

        let center = Point2::new(p1.x + ux, p1.y + uy);
        let radius = (ux * ux + uy * uy).sqrt();
        if !radius.is_finite() || radius < 1e-12 {
            return None;
        }
        Some(Circle::new(center, radius))
    }

    /// Weighted Kasa fit: linear least squares on
    /// x^2 + y^2 + D x + E y + F = 0 through the 3x3 normal equations.
    fn fit_kasa(
        &self,
        data: &[Point2<f64>],
        sample: &[usize],
        weights: Option<&[f64]>,
    ) -> Option<Circle> {
        let mut ata = Matrix3::<f64>::zeros();
        let mut atb = Vector3::<f64>::zeros();

        for &idx in sample {
            let p = data.get(idx)?;
            let w = weights.map_or(1.0, |w| w[idx]).max(0.0);
            if w == 0.0 {
                continue;
            }
            let row = Vector3::new(p.x, p.y, 1.0);
            let rhs = -(p.x * p.x + p.y * p.y);
            ata += w * row * row.transpose();
            atb += w * rhs * row;
        }

        let solution = ata.lu().solve(&atb)?;
        let (d, e, f) = (solution[0], solution[1], solution[2]);

        let cx = -d / 2.0;
        let cy = -e / 2.0;
        let radius_sq = cx * cx + cy * cy - f;
        if radius_sq <= 1e-12 {
            return None;
        }
        Some(Circle::new(Point2::new(cx, cy), radius_sq.sqrt()))
    }
}

impl ModelEstimator for CircleEstimator {
    type Datum = Point2<f64>;
    type Model = Circle;

    fn sample_size(&self) -> usize {
        3
    }

    fn estimate(&self, data: &[Point2<f64>], sample: &[usize]) -> Vec<Circle> {
        if sample.len() != self.sample_size() {
            return self.fit_kasa(data, sample, None).into_iter().collect();
        }
        let (Some(p1), Some(p2), Some(p3)) = (
            data.get(sample[0]),
            data.get(sample[1]),
            data.get(sample[2]),
        ) else {
            return Vec::new();
        };
        Self::circumcircle(p1, p2, p3).into_iter().collect()
    }

    fn estimate_nonminimal(
        &self,
        data: &[Point2<f64>],
        sample: &[usize],
        weights: Option<&[f64]>,
    ) -> Vec<Circle> {
        if sample.len() < self.sample_size() {
            return Vec::new();
        }
        self.fit_kasa(data, sample, weights).into_iter().collect()
    }

    fn residual(&self, model: &Circle, datum: &Point2<f64>) -> f64 {
        model.distance(datum)
    }

    fn refine(
        &self,
        data: &[Point2<f64>],
        inliers: &[usize],
        weights: Option<&[f64]>,
        model: &Circle,
        options: &RefinementOptions,
    ) -> Option<RefinedModel<Circle>> {
        if inliers.len() <= self.sample_size() {
            return Some(RefinedModel::unrefined(model.clone()));
        }

        let problem = CircleRefineProblem {
            points: inliers.iter().map(|&i| data[i]).collect(),
            weights: weights.map(|w| inliers.iter().map(|&i| w[i]).collect()),
        };
        let initial = DVector::from_vec(vec![model.center.x, model.center.y, model.radius]);

        let solution = levenberg_marquardt(
            &problem,
            initial,
            &LmOptions::default(),
            options.compute_covariance,
        )?;

        let radius = solution.params[2].abs();
        if radius < 1e-12 {
            return None;
        }
        let refined = Circle::new(
            Point2::new(solution.params[0], solution.params[1]),
            radius,
        );
        Some(RefinedModel::new(refined, solution.covariance))
    }
}

struct CircleRefineProblem {
    points: Vec<Point2<f64>>,
    weights: Option<Vec<f64>>,
}

impl CircleRefineProblem {
    fn weighted_residual(&self, i: usize, cx: f64, cy: f64, radius: f64) -> f64 {
        let p = &self.points[i];
        let dx = p.x - cx;
        let dy = p.y - cy;
        let r = (dx * dx + dy * dy).sqrt() - radius;
        match &self.weights {
            Some(w) => w[i].max(0.0).sqrt() * r,
            None => r,
        }
    }
}

impl CostFunction for CircleRefineProblem {
    type Param = DVector<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        let mut total = 0.0;
        for i in 0..self.points.len() {
            let r = self.weighted_residual(i, param[0], param[1], param[2]);
            total += r * r;
        }
        Ok(total)
    }
}

impl LeastSquaresProblem for CircleRefineProblem {
    fn residual_count(&self) -> usize {
        self.points.len()
    }

    fn residuals(&self, params: &DVector<f64>, out: &mut DVector<f64>) {
        for i in 0..self.points.len() {
            out[i] = self.weighted_residual(i, params[0], params[1], params[2]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn circle_points(center: (f64, f64), radius: f64, count: usize) -> Vec<Point2<f64>> {
        (0..count)
            .map(|i| {
                let angle = i as f64 * 2.0 * std::f64::consts::PI / count as f64;
                Point2::new(
                    center.0 + radius * angle.cos(),
                    center.1 + radius * angle.sin(),
                )
            })
            .collect()
    }

    #[test]
    fn circumcircle_through_three_points() {
        let est = CircleEstimator::new();
        let data = circle_points((2.0, -1.0), 5.0, 12);
        let models = est.estimate(&data, &[0, 4, 8]);
        assert_eq!(models.len(), 1);

        let circle = &models[0];
        assert_relative_eq!(circle.center.x, 2.0, epsilon = 1e-9);
        assert_relative_eq!(circle.center.y, -1.0, epsilon = 1e-9);
        assert_relative_eq!(circle.radius, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn collinear_sample_is_degenerate() {
        let est = CircleEstimator::new();
        let data = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(2.0, 2.0),
        ];
        assert!(est.estimate(&data, &[0, 1, 2]).is_empty());
    }

    #[test]
    fn kasa_fit_uses_all_points() {
        let est = CircleEstimator::new();
        let data = circle_points((-3.0, 4.0), 2.5, 40);
        let sample: Vec<usize> = (0..data.len()).collect();

        let models = est.estimate_nonminimal(&data, &sample, None);
        assert_eq!(models.len(), 1);
        let circle = &models[0];
        assert_relative_eq!(circle.center.x, -3.0, epsilon = 1e-9);
        assert_relative_eq!(circle.center.y, 4.0, epsilon = 1e-9);
        assert_relative_eq!(circle.radius, 2.5, epsilon = 1e-9);
    }

    #[test]
    fn residual_measures_distance_to_locus() {
        let est = CircleEstimator::new();
        let circle = Circle::new(Point2::new(0.0, 0.0), 2.0);
        assert_relative_eq!(
            est.residual(&circle, &Point2::new(5.0, 0.0)),
            3.0,
            epsilon = 1e-12
        );
        assert!(circle.is_on_locus(&Point2::new(0.0, -2.0), 1e-12));
    }

    #[test]
    fn refinement_recovers_the_true_circle() {
        let est = CircleEstimator::new();
        let data = circle_points((10.0, 20.0), 7.0, 50);
        let inliers: Vec<usize> = (0..data.len()).collect();

        let rough = Circle::new(Point2::new(10.3, 19.6), 6.8);
        let mut options = RefinementOptions::default();
        options.compute_covariance = true;

        let refined = est
            .refine(&data, &inliers, None, &rough, &options)
            .expect("refinement converges");

        assert_relative_eq!(refined.model.center.x, 10.0, epsilon = 1e-6);
        assert_relative_eq!(refined.model.center.y, 20.0, epsilon = 1e-6);
        assert_relative_eq!(refined.model.radius, 7.0, epsilon = 1e-6);

        let cov = refined.covariance.expect("covariance requested");
        assert_eq!((cov.nrows(), cov.ncols()), (3, 3));
    }
}
