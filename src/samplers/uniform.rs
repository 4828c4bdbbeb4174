//! Uniform random sampler drawing minimal samples without replacement.

use crate::core::Sampler;
use crate::utils::UniformRandomGenerator;

/// Uniform random sampler: every draw picks distinct indices with equal
/// probability over the full correspondence sequence; repeats across
/// draws are allowed.
pub struct UniformRandomSampler {
    rng: UniformRandomGenerator,
    point_count: usize,
    sample_size: usize,
}

impl Default for UniformRandomSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl UniformRandomSampler {
    /// Construct with an entropy seed (production use).
    pub fn new() -> Self {
        Self {
            rng: UniformRandomGenerator::new(),
            point_count: 0,
            sample_size: 0,
        }
    }

    /// Construct from a fixed seed (deterministic tests).
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: UniformRandomGenerator::from_seed(seed),
            point_count: 0,
            sample_size: 0,
        }
    }
}

impl Sampler for UniformRandomSampler {
    fn initialize(
        &mut self,
        point_count: usize,
        sample_size: usize,
        _quality_scores: Option<&[f64]>,
    ) {
        self.point_count = point_count;
        self.sample_size = sample_size;
    }

    fn sample(&mut self, out_indices: &mut [usize]) -> bool {
        let n = self.point_count;
        let k = out_indices.len();
        if k == 0 || n == 0 || k > n || k < self.sample_size {
            return false;
        }
        self.rng.fill_unique(out_indices, 0, n - 1);
        true
    }
}
