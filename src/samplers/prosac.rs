//! PROSAC sampler: progressively grows a quality-ranked sampling window.

use crate::core::Sampler;
use crate::utils::UniformRandomGenerator;

/// Default number of samples after which PROSAC degenerates to uniform
/// sampling over the full sequence, preserving RANSAC's guarantees.
const DEFAULT_CONVERGENCE_SAMPLES: usize = 100_000;

/// PROSAC sampler.
///
/// Correspondences are ranked once, descending by quality score, at
/// `initialize`. Sample `t` is drawn from the first `n(t)` ranks, where
/// `n(t)` is non-decreasing and driven by the standard PROSAC growth
/// function, so early iterations concentrate on high-quality data. After
/// the convergence sample count the sampler falls back to uniform draws
/// over the whole sequence. Emitted indices are always in the caller's
/// original order.
pub struct ProsacSampler {
    rng: UniformRandomGenerator,
    /// Rank -> original index, quality descending.
    order: Vec<usize>,
    growth_function: Vec<usize>,
    point_count: usize,
    sample_size: usize,
    convergence_samples: usize,
    kth_sample_number: usize,
    subset_size: usize,
}

impl Default for ProsacSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl ProsacSampler {
    pub fn new() -> Self {
        Self::with_rng(UniformRandomGenerator::new())
    }

    pub fn from_seed(seed: u64) -> Self {
        Self::with_rng(UniformRandomGenerator::from_seed(seed))
    }

    fn with_rng(rng: UniformRandomGenerator) -> Self {
        Self {
            rng,
            order: Vec::new(),
            growth_function: Vec::new(),
            point_count: 0,
            sample_size: 0,
            convergence_samples: DEFAULT_CONVERGENCE_SAMPLES,
            kth_sample_number: 1,
            subset_size: 0,
        }
    }

    /// Override the sample count after which sampling becomes uniform.
    pub fn set_convergence_samples(&mut self, samples: usize) {
        self.convergence_samples = samples.max(1);
    }

    /// Current window size `n(t)` (ranks eligible for the next draw).
    pub fn window_size(&self) -> usize {
        self.subset_size
    }

    /// Growth function of the PROSAC paper: `T_n` is the expected number
    /// of uniform samples fully contained in the `n` best points;
    /// `growth_function[n - 1]` is the (integer) sample number at which
    /// the window grows past `n`.
    fn build_growth_function(&mut self) {
        let n = self.point_count;
        let k = self.sample_size;
        self.growth_function.clear();
        self.growth_function.resize(n, 0);

        let mut t_n = self.convergence_samples as f64;
        for i in 0..k {
            t_n *= (k - i) as f64 / (n - i) as f64;
        }

        let mut t_n_prime: usize = 1;
        for i in 0..n {
            if i < k {
                self.growth_function[i] = t_n_prime;
                continue;
            }
            let t_n_plus1 = (i + 1) as f64 * t_n / (i + 1 - k) as f64;
            self.growth_function[i] = t_n_prime + (t_n_plus1 - t_n).ceil() as usize;
            t_n = t_n_plus1;
            t_n_prime = self.growth_function[i];
        }
    }

    fn advance_window(&mut self) {
        self.kth_sample_number += 1;
        if self.kth_sample_number <= self.convergence_samples
            && self.subset_size < self.point_count
            && self.kth_sample_number > self.growth_function[self.subset_size - 1]
        {
            self.subset_size += 1;
        }
    }
}

impl Sampler for ProsacSampler {
    fn initialize(
        &mut self,
        point_count: usize,
        sample_size: usize,
        quality_scores: Option<&[f64]>,
    ) {
        self.point_count = point_count;
        self.sample_size = sample_size;
        self.kth_sample_number = 1;
        self.subset_size = sample_size.min(point_count);

        self.order = (0..point_count).collect();
        if let Some(scores) = quality_scores {
            if scores.len() == point_count {
                // Stable sort: ties keep the caller's original order.
                self.order.sort_by(|&a, &b| {
                    scores[b]
                        .partial_cmp(&scores[a])
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
            }
        }

        if point_count > 0 && sample_size > 0 && sample_size <= point_count {
            self.build_growth_function();
        } else {
            self.growth_function.clear();
        }
    }

    fn sample(&mut self, out_indices: &mut [usize]) -> bool {
        let n = self.point_count;
        let k = out_indices.len();
        if k == 0 || n == 0 || k > n || self.growth_function.is_empty() {
            return false;
        }

        if self.kth_sample_number > self.convergence_samples {
            // PROSAC has converged to plain RANSAC.
            self.rng.fill_unique(out_indices, 0, n - 1);
        } else {
            let window = self.subset_size.max(k);
            self.rng.fill_unique(out_indices, 0, window - 1);
            for rank in out_indices.iter_mut() {
                *rank = self.order[*rank];
            }
        }

        self.advance_window();
        true
    }

    fn requires_quality_scores(&self) -> bool {
        true
    }
}
