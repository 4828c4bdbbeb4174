//! Nonlinear refinement of a best model over its consensus set.
//!
//! Refinement problems expose a residual vector and implement
//! `argmin::core::CostFunction` for total-cost evaluation; the driver
//! below runs a Levenberg–Marquardt loop with a numerically
//! differentiated Jacobian and multiplicative damping, and can derive a
//! parameter covariance at the solution.

use argmin::core::CostFunction;
use log::debug;
use nalgebra::{DMatrix, DVector};

/// Result of a refinement pass: the refined model and, when requested,
/// the covariance of its parameters.
#[derive(Debug, Clone)]
pub struct RefinedModel<M> {
    pub model: M,
    pub covariance: Option<DMatrix<f64>>,
}

impl<M> RefinedModel<M> {
    pub fn new(model: M, covariance: Option<DMatrix<f64>>) -> Self {
        Self { model, covariance }
    }

    /// A model passed through refinement unchanged.
    pub fn unrefined(model: M) -> Self {
        Self {
            model,
            covariance: None,
        }
    }
}

/// Annealing schedule for adapters that bias refinement toward suggested
/// parameter values: the bias weight grows from `min` to `max` in `step`
/// increments across refinement rounds.
#[derive(Debug, Clone, Copy)]
pub struct SuggestionWeights {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

/// Options handed to [`crate::core::ModelEstimator::refine`], assembled
/// by the engine from its configuration.
#[derive(Debug, Clone, Copy)]
pub struct RefinementOptions {
    pub compute_covariance: bool,
    pub suggestion_weights: SuggestionWeights,
}

impl Default for RefinementOptions {
    fn default() -> Self {
        Self {
            compute_covariance: false,
            suggestion_weights: SuggestionWeights {
                min: 0.1,
                max: 2.0,
                step: 0.475,
            },
        }
    }
}

/// A weighted least-squares problem: parameters in, stacked residuals out.
pub trait LeastSquaresProblem: CostFunction<Param = DVector<f64>, Output = f64> {
    /// Number of residual entries (rows of the Jacobian).
    fn residual_count(&self) -> usize;

    /// Evaluate the residual vector at `params` into `out`
    /// (`out.len() == residual_count()`).
    fn residuals(&self, params: &DVector<f64>, out: &mut DVector<f64>);
}

/// Levenberg–Marquardt driver settings.
#[derive(Debug, Clone, Copy)]
pub struct LmOptions {
    pub max_iterations: usize,
    /// Relative cost decrease below which the loop stops.
    pub cost_tolerance: f64,
    pub initial_damping: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            cost_tolerance: 1e-10,
            initial_damping: 1e-3,
        }
    }
}

/// Converged solution of a [`LeastSquaresProblem`].
#[derive(Debug, Clone)]
pub struct LmSolution {
    pub params: DVector<f64>,
    pub cost: f64,
    pub iterations: usize,
    pub covariance: Option<DMatrix<f64>>,
}

const JACOBIAN_EPS: f64 = 1e-8;
const DAMPING_DECREASE: f64 = 0.5;
const DAMPING_INCREASE: f64 = 10.0;
const MAX_DAMPING: f64 = 1e12;

fn numeric_jacobian<P: LeastSquaresProblem>(
    problem: &P,
    params: &DVector<f64>,
    base: &DVector<f64>,
) -> DMatrix<f64> {
    let m = problem.residual_count();
    let n = params.len();
    let mut jac = DMatrix::<f64>::zeros(m, n);
    let mut shifted = DVector::<f64>::zeros(m);
    for j in 0..n {
        let mut probe = params.clone();
        probe[j] += JACOBIAN_EPS;
        problem.residuals(&probe, &mut shifted);
        for i in 0..m {
            jac[(i, j)] = (shifted[i] - base[i]) / JACOBIAN_EPS;
        }
    }
    jac
}

/// Minimize the sum of squared residuals starting from `initial`.
///
/// Returns `None` when the problem is degenerate (fewer residuals than
/// parameters, non-finite cost, or a normal-equation system that never
/// becomes solvable).
pub fn levenberg_marquardt<P: LeastSquaresProblem>(
    problem: &P,
    initial: DVector<f64>,
    options: &LmOptions,
    compute_covariance: bool,
) -> Option<LmSolution> {
    let m = problem.residual_count();
    let n = initial.len();
    if m < n || n == 0 {
        return None;
    }

    let mut params = initial;
    let mut cost = problem.cost(&params).ok()?;
    if !cost.is_finite() {
        return None;
    }

    let mut residuals = DVector::<f64>::zeros(m);
    let mut damping = options.initial_damping;
    let mut iterations = 0usize;

    for iter in 0..options.max_iterations {
        iterations = iter + 1;
        problem.residuals(&params, &mut residuals);
        let jac = numeric_jacobian(problem, &params, &residuals);
        let jtj = jac.transpose() * &jac;
        let gradient = jac.transpose() * &residuals;

        // Damped normal equations; back off and re-damp when the system
        // is singular or the step does not decrease the cost.
        let mut stepped = false;
        while damping < MAX_DAMPING {
            let mut system = jtj.clone();
            for d in 0..n {
                system[(d, d)] += damping * jtj[(d, d)].max(1e-12);
            }
            let step = match system.lu().solve(&gradient) {
                Some(s) => s,
                None => {
                    damping *= DAMPING_INCREASE;
                    continue;
                }
            };

            let candidate = &params - &step;
            let candidate_cost = problem.cost(&candidate).ok()?;
            if candidate_cost.is_finite() && candidate_cost < cost {
                let relative_drop = (cost - candidate_cost) / cost.max(f64::MIN_POSITIVE);
                params = candidate;
                cost = candidate_cost;
                damping = (damping * DAMPING_DECREASE).max(1e-12);
                stepped = true;
                if relative_drop < options.cost_tolerance {
                    iterations = iter + 1;
                    return finish(problem, params, cost, iterations, compute_covariance);
                }
                break;
            }
            damping *= DAMPING_INCREASE;
        }

        if !stepped {
            debug!("levenberg_marquardt: no descent step found at iteration {iter}");
            break;
        }
    }

    finish(problem, params, cost, iterations, compute_covariance)
}

fn finish<P: LeastSquaresProblem>(
    problem: &P,
    params: DVector<f64>,
    cost: f64,
    iterations: usize,
    compute_covariance: bool,
) -> Option<LmSolution> {
    let covariance = if compute_covariance {
        covariance_at(problem, &params)
    } else {
        None
    };
    Some(LmSolution {
        params,
        cost,
        iterations,
        covariance,
    })
}

/// Parameter covariance sigma^2 (J^T J)^-1 at the given solution, with
/// sigma^2 the residual variance over the remaining degrees of freedom.
pub fn covariance_at<P: LeastSquaresProblem>(
    problem: &P,
    params: &DVector<f64>,
) -> Option<DMatrix<f64>> {
    let m = problem.residual_count();
    let n = params.len();
    if m <= n {
        return None;
    }
    let mut residuals = DVector::<f64>::zeros(m);
    problem.residuals(params, &mut residuals);
    let jac = numeric_jacobian(problem, params, &residuals);
    let jtj = jac.transpose() * &jac;
    let inverse = jtj.try_inverse()?;
    let sigma_sq = residuals.norm_squared() / (m - n) as f64;
    Some(inverse * sigma_sq)
}
