//! 2D line adapter.

use argmin::core::CostFunction;
use nalgebra::{DVector, Point2};

use crate::core::ModelEstimator;
use crate::refine::{
    levenberg_marquardt, LeastSquaresProblem, LmOptions, RefinedModel, RefinementOptions,
};

/// Line ax + by + c = 0 with the normal normalized to a^2 + b^2 = 1, so
/// `signed_distance` is a true Euclidean distance.
#[derive(Debug, Clone, PartialEq)]
pub struct Line2D {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Line2D {
    /// Build a line from raw coefficients, normalizing the normal.
    /// Returns `None` for a degenerate (zero-normal) input.
    pub fn from_coefficients(a: f64, b: f64, c: f64) -> Option<Self> {
        let norm = (a * a + b * b).sqrt();
        if norm < 1e-12 {
            return None;
        }
        Some(Self {
            a: a / norm,
            b: b / norm,
            c: c / norm,
        })
    }

    pub fn signed_distance(&self, point: &Point2<f64>) -> f64 {
        self.a * point.x + self.b * point.y + self.c
    }

    pub fn distance(&self, point: &Point2<f64>) -> f64 {
        self.signed_distance(point).abs()
    }

    /// Whether `point` lies on the line within `tolerance`.
    pub fn is_on_locus(&self, point: &Point2<f64>, tolerance: f64) -> bool {
        self.distance(point) <= tolerance
    }
}

/// Fits [`Line2D`] models from point samples.
pub struct LineEstimator;

impl Default for LineEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl LineEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Weighted PCA fit: the line normal is the eigenvector of the
    /// scatter matrix with the smallest eigenvalue, and the line passes
    /// through the weighted centroid.
    fn fit_least_squares(
        &self,
        data: &[Point2<f64>],
        sample: &[usize],
        weights: Option<&[f64]>,
    ) -> Option<Line2D> {
        let mut sum_w = 0.0;
        let mut cx = 0.0;
        let mut cy = 0.0;
        for &idx in sample {
            let p = data.get(idx)?;
            let w = weights.map_or(1.0, |w| w[idx]);
            sum_w += w;
            cx += w * p.x;
            cy += w * p.y;
        }
        if sum_w < 1e-12 {
            return None;
        }
        cx /= sum_w;
        cy /= sum_w;

        let mut cov_xx = 0.0;
        let mut cov_xy = 0.0;
        let mut cov_yy = 0.0;
        for &idx in sample {
            let p = &data[idx];
            let w = weights.map_or(1.0, |w| w[idx]);
            let dx = p.x - cx;
            let dy = p.y - cy;
            cov_xx += w * dx * dx;
            cov_xy += w * dx * dy;
            cov_yy += w * dy * dy;
        }

        // Smallest-eigenvalue eigenvector of the 2x2 scatter matrix.
        let trace = cov_xx + cov_yy;
        let det = cov_xx * cov_yy - cov_xy * cov_xy;
        let discriminant = (trace * trace - 4.0 * det).max(0.0);
        let lambda_min = (trace - discriminant.sqrt()) / 2.0;

        let (a, b) = if cov_xy.abs() > 1e-12 {
            (cov_xy, lambda_min - cov_xx)
        } else if cov_xx <= cov_yy {
            (1.0, 0.0)
        } else {
            (0.0, 1.0)
        };

        let line = Line2D::from_coefficients(a, b, 0.0)?;
        let c = -(line.a * cx + line.b * cy);
        Some(Line2D { c, ..line })
    }
}

impl ModelEstimator for LineEstimator {
    type Datum = Point2<f64>;
    type Model = Line2D;

    fn sample_size(&self) -> usize {
        2
    }

    fn estimate(&self, data: &[Point2<f64>], sample: &[usize]) -> Vec<Line2D> {
        if sample.len() != self.sample_size() {
            return self
                .fit_least_squares(data, sample, None)
                .into_iter()
                .collect();
        }

        let (Some(p1), Some(p2)) = (data.get(sample[0]), data.get(sample[1])) else {
            return Vec::new();
        };

        // Cross product of the homogeneous points.
        let a = p1.y - p2.y;
        let b = p2.x - p1.x;
        let c = p1.x * p2.y - p2.x * p1.y;

        Line2D::from_coefficients(a, b, c).into_iter().collect()
    }

    fn estimate_nonminimal(
        &self,
        data: &[Point2<f64>],
        sample: &[usize],
        weights: Option<&[f64]>,
    ) -> Vec<Line2D> {
        if sample.len() < self.sample_size() {
            return Vec::new();
        }
        self.fit_least_squares(data, sample, weights)
            .into_iter()
            .collect()
    }

    fn residual(&self, model: &Line2D, datum: &Point2<f64>) -> f64 {
        model.distance(datum)
    }

    fn refine(
        &self,
        data: &[Point2<f64>],
        inliers: &[usize],
        weights: Option<&[f64]>,
        model: &Line2D,
        options: &RefinementOptions,
    ) -> Option<RefinedModel<Line2D>> {
        if inliers.len() <= self.sample_size() {
            return Some(RefinedModel::unrefined(model.clone()));
        }

        let problem = LineRefineProblem {
            points: inliers.iter().map(|&i| data[i]).collect(),
            weights: weights.map(|w| inliers.iter().map(|&i| w[i]).collect()),
        };

        // Hessian-normal parameterization (theta, rho): the constraint
        // a^2 + b^2 = 1 holds by construction.
        let theta = model.b.atan2(model.a);
        let rho = -model.c;
        let initial = DVector::from_vec(vec![theta, rho]);

        let solution = levenberg_marquardt(
            &problem,
            initial,
            &LmOptions::default(),
            options.compute_covariance,
        )?;

        let refined = Line2D {
            a: solution.params[0].cos(),
            b: solution.params[0].sin(),
            c: -solution.params[1],
        };
        Some(RefinedModel::new(refined, solution.covariance))
    }
}

struct LineRefineProblem {
    points: Vec<Point2<f64>>,
    weights: Option<Vec<f64>>,
}

impl LineRefineProblem {
    fn weighted_residual(&self, i: usize, theta: f64, rho: f64) -> f64 {
        let p = &self.points[i];
        let r = theta.cos() * p.x + theta.sin() * p.y - rho;
        match &self.weights {
            Some(w) => w[i].max(0.0).sqrt() * r,
            None => r,
        }
    }
}

impl CostFunction for LineRefineProblem {
    type Param = DVector<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        let mut total = 0.0;
        for i in 0..self.points.len() {
            let r = self.weighted_residual(i, param[0], param[1]);
            total += r * r;
        }
        Ok(total)
    }
}

impl LeastSquaresProblem for LineRefineProblem {
    fn residual_count(&self) -> usize {
        self.points.len()
    }

    fn residuals(&self, params: &DVector<f64>, out: &mut DVector<f64>) {
        for i in 0..self.points.len() {
            out[i] = self.weighted_residual(i, params[0], params[1]);
        }
    }
}
