//! Iteration bookkeeping: the adaptive required-iteration bound and
//! progress-event throttling.

use crate::config::EstimatorConfig;

/// Tracks elapsed iterations, recomputes the theoretically required
/// iteration count from the confidence and the best observed inlier
/// ratio, and throttles progress reports.
#[derive(Debug, Clone)]
pub struct IterationController {
    iteration: usize,
    required_iterations: usize,
    max_iterations: usize,
    confidence: f64,
    progress_delta: f64,
    last_progress: f64,
}

impl IterationController {
    pub fn new(config: &EstimatorConfig) -> Self {
        Self {
            iteration: 0,
            required_iterations: config.max_iterations(),
            max_iterations: config.max_iterations(),
            confidence: config.confidence(),
            progress_delta: config.progress_delta(),
            last_progress: 0.0,
        }
    }

    /// Completed iterations so far.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Current required iteration count (already clamped to the maximum).
    pub fn required_iterations(&self) -> usize {
        self.required_iterations
    }

    /// Whether the loop has exhausted its (possibly shrunk) budget.
    pub fn finished(&self) -> bool {
        self.iteration >= self.required_iterations
    }

    /// Recompute the required count after the tracker accepted a strictly
    /// better candidate with the given inlier ratio.
    ///
    /// `N = log(1 - confidence) / log(1 - ratio^sample_size)`, rounded
    /// up, at least 1, and never growing: the ratio can only have
    /// increased, so the bound only shrinks.
    pub fn update_required(&mut self, inlier_ratio: f64, sample_size: usize) {
        if inlier_ratio <= 0.0 {
            return;
        }
        if inlier_ratio >= 1.0 {
            // An outlier-free sample has been observed; one iteration
            // satisfies any confidence level.
            self.required_iterations = 1;
            return;
        }

        let p_good_sample = inlier_ratio.powi(sample_size as i32);
        if p_good_sample <= 0.0 || p_good_sample >= 1.0 {
            return;
        }

        let log_one_minus_conf = (1.0 - self.confidence).ln();
        let log_one_minus_p = (1.0 - p_good_sample).ln();
        if !log_one_minus_conf.is_finite() || !log_one_minus_p.is_finite() {
            return;
        }

        let required = (log_one_minus_conf / log_one_minus_p).ceil().max(1.0);
        let required = if required >= self.max_iterations as f64 {
            self.max_iterations
        } else {
            required as usize
        };
        if required < self.required_iterations {
            self.required_iterations = required;
        }
    }

    /// Complete one iteration and return its 1-based index.
    pub fn advance(&mut self) -> usize {
        self.iteration += 1;
        self.iteration
    }

    /// Progress fraction `min(1, i / N)`.
    pub fn progress(&self) -> f64 {
        let fraction = self.iteration as f64 / self.required_iterations.max(1) as f64;
        fraction.min(1.0)
    }

    /// Report the current progress once it advanced by at least the
    /// configured delta since the last report.
    pub fn take_progress_event(&mut self) -> Option<f64> {
        let progress = self.progress();
        if progress - self.last_progress >= self.progress_delta {
            self.last_progress = progress;
            Some(progress)
        } else {
            None
        }
    }
}
