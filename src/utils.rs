//! Shared utilities: a thin uniform random generator over `rand`, and a
//! selection-based median helper used by median-of-squares scoring.

use rand::distributions::Uniform;
use rand::prelude::*;

/// Uniform integer random-number generator used by all samplers.
///
/// Production constructors seed from entropy; tests construct from a
/// fixed seed for reproducible draws.
pub struct UniformRandomGenerator {
    rng: StdRng,
    dist: Option<Uniform<usize>>,
}

impl Default for UniformRandomGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl UniformRandomGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            dist: None,
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            dist: None,
        }
    }

    /// Reset the inclusive sampling range.
    pub fn reset(&mut self, min: usize, max: usize) {
        self.dist = Some(Uniform::new_inclusive(min, max));
    }

    /// Draw one value from the current range; `reset` must have run.
    pub fn next(&mut self) -> usize {
        match &self.dist {
            Some(dist) => self.rng.sample(dist),
            None => 0,
        }
    }

    /// Fill `out` with distinct values drawn uniformly from `[min, max]`.
    ///
    /// Rejection sampling; fine for the small minimal-sample sizes this
    /// crate draws.
    pub fn fill_unique(&mut self, out: &mut [usize], min: usize, max: usize) {
        self.reset(min, max);
        for i in 0..out.len() {
            loop {
                let candidate = self.next();
                if out[..i].iter().all(|&v| v != candidate) {
                    out[i] = candidate;
                    break;
                }
            }
        }
    }
}

/// Median of a scratch buffer, by partial selection.
///
/// Consumes the buffer's ordering; callers pass a copy they do not need
/// sorted. Even-length inputs take the mean of the two middle elements.
pub fn median_in_place(values: &mut [f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return f64::NAN;
    }
    let mid = n / 2;
    let (_, upper_mid, _) = values
        .select_nth_unstable_by(mid, |a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let upper = *upper_mid;
    if n % 2 == 1 {
        upper
    } else {
        let lower = values[..mid]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        0.5 * (lower + upper)
    }
}

#[cfg(test)]
mod tests {
    use super::{median_in_place, UniformRandomGenerator};

    #[test]
    fn unique_draws_stay_in_bounds() {
        let mut rng = UniformRandomGenerator::from_seed(1234);
        let mut buf = [0usize; 5];
        rng.fill_unique(&mut buf, 0, 10);

        assert!(buf.iter().all(|&v| v <= 10));
        for i in 0..buf.len() {
            for j in (i + 1)..buf.len() {
                assert_ne!(buf[i], buf[j]);
            }
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = UniformRandomGenerator::from_seed(42);
        let mut b = UniformRandomGenerator::from_seed(42);
        a.reset(0, 100);
        b.reset(0, 100);
        let xs: Vec<usize> = (0..10).map(|_| a.next()).collect();
        let ys: Vec<usize> = (0..10).map(|_| b.next()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn median_odd_and_even() {
        let mut odd = [5.0, 1.0, 3.0];
        assert!((median_in_place(&mut odd) - 3.0).abs() < 1e-12);

        let mut even = [4.0, 1.0, 3.0, 2.0];
        assert!((median_in_place(&mut even) - 2.5).abs() < 1e-12);

        let mut single = [7.0];
        assert!((median_in_place(&mut single) - 7.0).abs() < 1e-12);
    }
}
