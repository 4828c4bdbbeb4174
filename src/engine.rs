//! The generic robust estimation engine.
//!
//! [`RobustEstimator`] orchestrates one loop (sample, fit, score, track)
//! over three pluggable strategies: a [`ModelEstimator`] adapter, a
//! [`Sampler`] and a [`ConsensusScoring`] rule. The five classic
//! variants are the strategy combinations exposed through the
//! constructors on the concrete alias types below.

use log::{debug, warn};
use nalgebra::DMatrix;

use crate::config::{DegeneracyPolicy, EstimatorConfig};
use crate::core::{
    ConsensusScoring, EstimationListener, EstimatorControl, ModelEstimator, Sampler,
};
use crate::error::EstimatorError;
use crate::iteration::IterationController;
use crate::lock::LockFlag;
use crate::refine::{RefinementOptions, SuggestionWeights};
use crate::samplers::{ProsacSampler, UniformRandomSampler};
use crate::scoring::{LmedsScoring, MsacScoring, RansacScoring};

/// Fresh samples tried inside a single iteration before it is allowed to
/// lapse under [`DegeneracyPolicy::RetrySample`]; keeps all-degenerate
/// inputs terminating.
const MAX_SAMPLE_ATTEMPTS: usize = 100;

/// Final result of one `estimate()` call.
///
/// Inliers and residuals are retained only when the corresponding keep
/// flags are set; the covariance additionally requires refinement to
/// have produced one.
#[derive(Debug, Clone)]
pub struct EstimationOutcome<M> {
    pub model: M,
    pub inliers: Option<Vec<usize>>,
    pub residuals: Option<Vec<f64>>,
    pub covariance: Option<DMatrix<f64>>,
    /// Iterations actually spent in the sampling loop.
    pub iterations: usize,
}

/// Best-so-far candidate and its consensus.
struct BestCandidate<M, S> {
    model: M,
    score: S,
    inliers: Vec<usize>,
    residuals: Vec<f64>,
}

/// Configuration plus the lock phase; the mutable surface handed to
/// listener callbacks as `&mut dyn EstimatorControl`.
pub(crate) struct ControlState {
    lock: LockFlag,
    config: EstimatorConfig,
}

impl ControlState {
    fn new(config: EstimatorConfig) -> Self {
        Self {
            lock: LockFlag::new(),
            config,
        }
    }

    fn ensure_unlocked(&self) -> Result<(), EstimatorError> {
        if self.lock.is_locked() {
            Err(EstimatorError::Locked)
        } else {
            Ok(())
        }
    }
}

impl EstimatorControl for ControlState {
    fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    fn set_threshold(&mut self, value: f64) -> Result<(), EstimatorError> {
        self.ensure_unlocked()?;
        self.config.set_threshold(value)
    }

    fn set_stop_threshold(&mut self, value: f64) -> Result<(), EstimatorError> {
        self.ensure_unlocked()?;
        self.config.set_stop_threshold(value)
    }

    fn set_confidence(&mut self, value: f64) -> Result<(), EstimatorError> {
        self.ensure_unlocked()?;
        self.config.set_confidence(value)
    }

    fn set_max_iterations(&mut self, value: usize) -> Result<(), EstimatorError> {
        self.ensure_unlocked()?;
        self.config.set_max_iterations(value)
    }

    fn set_progress_delta(&mut self, value: f64) -> Result<(), EstimatorError> {
        self.ensure_unlocked()?;
        self.config.set_progress_delta(value)
    }
}

/// Generic robust estimator over an adapter, a sampler and a scoring
/// rule.
///
/// The estimator owns its correspondence store and configuration; both
/// are mutable only while Idle. `estimate()` is the sole operation that
/// locks the estimator, and the lock is restored on every exit path.
pub struct RobustEstimator<E, Sa, Sc>
where
    E: ModelEstimator,
    Sa: Sampler,
    Sc: ConsensusScoring,
{
    estimator: E,
    sampler: Sa,
    scoring: Sc,
    ctl: ControlState,
    data: Vec<E::Datum>,
    quality_scores: Option<Vec<f64>>,
    listener: Option<Box<dyn EstimationListener>>,
}

impl<E, Sa, Sc> RobustEstimator<E, Sa, Sc>
where
    E: ModelEstimator,
    Sa: Sampler,
    Sc: ConsensusScoring,
{
    /// Assemble an engine from explicit strategies.
    pub fn new(estimator: E, sampler: Sa, scoring: Sc) -> Self {
        Self {
            estimator,
            sampler,
            scoring,
            ctl: ControlState::new(EstimatorConfig::default()),
            data: Vec::new(),
            quality_scores: None,
            listener: None,
        }
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    pub fn config(&self) -> &EstimatorConfig {
        self.ctl.config()
    }

    pub fn correspondences(&self) -> &[E::Datum] {
        &self.data
    }

    pub fn quality_scores(&self) -> Option<&[f64]> {
        self.quality_scores.as_deref()
    }

    pub fn is_locked(&self) -> bool {
        self.ctl.is_locked()
    }

    /// Replace the whole configuration at once (validated).
    pub fn set_config(&mut self, config: EstimatorConfig) -> Result<(), EstimatorError> {
        self.ctl.ensure_unlocked()?;
        config.validate()?;
        self.ctl.config = config;
        Ok(())
    }

    pub fn set_threshold(&mut self, value: f64) -> Result<(), EstimatorError> {
        self.ctl.set_threshold(value)
    }

    pub fn set_stop_threshold(&mut self, value: f64) -> Result<(), EstimatorError> {
        self.ctl.set_stop_threshold(value)
    }

    pub fn set_confidence(&mut self, value: f64) -> Result<(), EstimatorError> {
        self.ctl.set_confidence(value)
    }

    pub fn set_max_iterations(&mut self, value: usize) -> Result<(), EstimatorError> {
        self.ctl.set_max_iterations(value)
    }

    pub fn set_progress_delta(&mut self, value: f64) -> Result<(), EstimatorError> {
        self.ctl.set_progress_delta(value)
    }

    pub fn set_refine_result(&mut self, value: bool) -> Result<(), EstimatorError> {
        self.ctl.ensure_unlocked()?;
        self.ctl.config.set_refine_result(value);
        Ok(())
    }

    pub fn set_keep_covariance(&mut self, value: bool) -> Result<(), EstimatorError> {
        self.ctl.ensure_unlocked()?;
        self.ctl.config.set_keep_covariance(value);
        Ok(())
    }

    pub fn set_keep_inliers(&mut self, value: bool) -> Result<(), EstimatorError> {
        self.ctl.ensure_unlocked()?;
        self.ctl.config.set_keep_inliers(value);
        Ok(())
    }

    pub fn set_keep_residuals(&mut self, value: bool) -> Result<(), EstimatorError> {
        self.ctl.ensure_unlocked()?;
        self.ctl.config.set_keep_residuals(value);
        Ok(())
    }

    pub fn set_degeneracy_policy(&mut self, value: DegeneracyPolicy) -> Result<(), EstimatorError> {
        self.ctl.ensure_unlocked()?;
        self.ctl.config.set_degeneracy_policy(value);
        Ok(())
    }

    /// Replace the correspondence store.
    ///
    /// Undersized sequences are rejected and the previous store is left
    /// untouched.
    pub fn set_correspondences(&mut self, data: Vec<E::Datum>) -> Result<(), EstimatorError> {
        self.ctl.ensure_unlocked()?;
        let needed = self.estimator.sample_size();
        if data.len() < needed {
            return Err(EstimatorError::TooFewCorrespondences {
                needed,
                got: data.len(),
            });
        }
        self.data = data;
        Ok(())
    }

    /// Set or clear the per-correspondence quality scores.
    ///
    /// Absence (`None`) is distinct from an empty vector; PROSAC-family
    /// samplers refuse to run without scores.
    pub fn set_quality_scores(&mut self, scores: Option<Vec<f64>>) -> Result<(), EstimatorError> {
        self.ctl.ensure_unlocked()?;
        if let Some(scores) = &scores {
            if scores.len() != self.data.len() {
                return Err(EstimatorError::LengthMismatch {
                    scores: scores.len(),
                    points: self.data.len(),
                });
            }
        }
        self.quality_scores = scores;
        Ok(())
    }

    /// Register the event listener.
    pub fn set_listener(
        &mut self,
        listener: Box<dyn EstimationListener>,
    ) -> Result<(), EstimatorError> {
        self.ctl.ensure_unlocked()?;
        self.listener = Some(listener);
        Ok(())
    }

    /// Remove and return the registered listener, if any.
    pub fn clear_listener(
        &mut self,
    ) -> Result<Option<Box<dyn EstimationListener>>, EstimatorError> {
        self.ctl.ensure_unlocked()?;
        Ok(self.listener.take())
    }

    /// Whether `estimate()` can run right now.
    pub fn is_ready(&self) -> bool {
        self.readiness().is_ok()
    }

    fn readiness(&self) -> Result<(), EstimatorError> {
        self.ctl.config().validate()?;
        let needed = self.estimator.sample_size();
        if self.data.len() < needed {
            return Err(EstimatorError::NotReady(
                "correspondence store smaller than the minimal sample size",
            ));
        }
        if let Some(scores) = &self.quality_scores {
            if scores.len() != self.data.len() {
                return Err(EstimatorError::NotReady(
                    "quality scores no longer match the correspondence count",
                ));
            }
        }
        if self.sampler.requires_quality_scores() && self.quality_scores.is_none() {
            return Err(EstimatorError::NotReady(
                "this variant requires per-correspondence quality scores",
            ));
        }
        Ok(())
    }

    /// Run the robust estimation loop.
    ///
    /// Locks the estimator for the whole call, delivers listener events
    /// in iteration order, optionally refines the best model over its
    /// consensus set, and restores the Idle phase on every exit path.
    pub fn estimate(&mut self) -> Result<EstimationOutcome<E::Model>, EstimatorError> {
        let _guard = self.ctl.lock.acquire().ok_or(EstimatorError::Locked)?;
        self.readiness()?;

        let mut listener = self.listener.take();
        if let Some(l) = listener.as_deref_mut() {
            l.on_estimation_start(&mut self.ctl);
        }

        let result = self.run_loop(listener.as_deref_mut());

        if let Some(l) = listener.as_deref_mut() {
            l.on_estimation_end(&mut self.ctl);
        }
        self.listener = listener;
        result
    }

    fn run_loop(
        &mut self,
        mut listener: Option<&mut dyn EstimationListener>,
    ) -> Result<EstimationOutcome<E::Model>, EstimatorError> {
        let cfg = self.ctl.config().clone();
        let sample_size = self.estimator.sample_size();
        let point_count = self.data.len();

        self.sampler
            .initialize(point_count, sample_size, self.quality_scores.as_deref());

        let mut sample = vec![0usize; sample_size];
        let mut residuals = vec![0.0f64; point_count];
        let mut inliers_scratch: Vec<usize> = Vec::with_capacity(point_count);
        let mut best: Option<BestCandidate<E::Model, Sc::Score>> = None;
        let mut controller = IterationController::new(&cfg);
        let mut stop = false;

        while !stop && !controller.finished() {
            let attempts = match cfg.degeneracy_policy() {
                DegeneracyPolicy::RetrySample => MAX_SAMPLE_ATTEMPTS,
                DegeneracyPolicy::CountIteration => 1,
            };

            let mut models = Vec::new();
            for _ in 0..attempts {
                if !self.sampler.sample(&mut sample) {
                    continue;
                }
                if !self.estimator.is_valid_sample(&self.data, &sample) {
                    continue;
                }
                models = self.estimator.estimate(&self.data, &sample);
                if !models.is_empty() {
                    break;
                }
            }

            let mut improved = false;
            for model in &models {
                for (i, datum) in self.data.iter().enumerate() {
                    residuals[i] = self.estimator.residual(model, datum);
                }
                let score =
                    self.scoring
                        .evaluate(&residuals, &cfg, sample_size, &mut inliers_scratch);

                let better = match &best {
                    None => true,
                    Some(incumbent) => self.scoring.is_better(&score, &incumbent.score),
                };
                if better {
                    best = Some(BestCandidate {
                        model: model.clone(),
                        score,
                        inliers: inliers_scratch.clone(),
                        residuals: residuals.clone(),
                    });
                    improved = true;
                }
            }

            if improved {
                if let Some(b) = &best {
                    debug!(
                        "better candidate with {} inliers at iteration {}",
                        b.inliers.len(),
                        controller.iteration() + 1
                    );
                    if let Some(ratio) = self.scoring.inlier_ratio(&b.score, point_count) {
                        controller.update_required(ratio, sample_size);
                    }
                    if self.scoring.reached_stop_threshold(&b.score, &cfg) {
                        stop = true;
                    }
                }
            }

            let iteration = controller.advance();
            if let Some(l) = listener.as_mut() {
                l.on_iteration(&mut self.ctl, iteration);
            }
            if let Some(progress) = controller.take_progress_event() {
                if let Some(l) = listener.as_mut() {
                    l.on_progress_change(&mut self.ctl, progress);
                }
            }
        }

        let Some(best) = best else {
            warn!(
                "no valid candidate after {} iterations; every sample was degenerate",
                controller.iteration()
            );
            return Err(EstimatorError::NoValidModel);
        };

        self.finish(best, &cfg, controller.iteration())
    }

    fn finish(
        &self,
        best: BestCandidate<E::Model, Sc::Score>,
        cfg: &EstimatorConfig,
        iterations: usize,
    ) -> Result<EstimationOutcome<E::Model>, EstimatorError> {
        let mut model = best.model;
        let mut covariance = None;

        if cfg.refine_result() {
            let options = RefinementOptions {
                compute_covariance: cfg.keep_covariance(),
                suggestion_weights: SuggestionWeights {
                    min: cfg.min_suggestion_weight(),
                    max: cfg.max_suggestion_weight(),
                    step: cfg.suggestion_weight_step(),
                },
            };
            let refined = self
                .estimator
                .refine(
                    &self.data,
                    &best.inliers,
                    self.quality_scores.as_deref(),
                    &model,
                    &options,
                )
                .ok_or(EstimatorError::RefinementFailure)?;
            model = refined.model;
            covariance = refined.covariance;
        }

        let inliers = cfg.keep_inliers().then_some(best.inliers);
        let residuals = cfg.keep_residuals().then_some(best.residuals);

        Ok(EstimationOutcome {
            model,
            inliers,
            residuals,
            covariance: if cfg.keep_covariance() { covariance } else { None },
            iterations,
        })
    }
}

/// RANSAC: uniform sampling, inlier-count scoring.
pub type RansacEstimator<E> = RobustEstimator<E, UniformRandomSampler, RansacScoring>;

/// MSAC: uniform sampling, truncated-loss scoring.
pub type MsacEstimator<E> = RobustEstimator<E, UniformRandomSampler, MsacScoring>;

/// LMedS: uniform sampling, median-of-squares scoring.
pub type LmedsEstimator<E> = RobustEstimator<E, UniformRandomSampler, LmedsScoring>;

/// PROSAC: quality-ranked progressive sampling, inlier-count scoring.
pub type ProsacEstimator<E> = RobustEstimator<E, ProsacSampler, RansacScoring>;

/// PROMedS: quality-ranked progressive sampling, median-of-squares
/// scoring.
pub type PromedsEstimator<E> = RobustEstimator<E, ProsacSampler, LmedsScoring>;

impl<E: ModelEstimator> RobustEstimator<E, UniformRandomSampler, RansacScoring> {
    pub fn ransac(estimator: E) -> Self {
        Self::new(estimator, UniformRandomSampler::new(), RansacScoring)
    }

    pub fn ransac_seeded(estimator: E, seed: u64) -> Self {
        Self::new(estimator, UniformRandomSampler::from_seed(seed), RansacScoring)
    }
}

impl<E: ModelEstimator> RobustEstimator<E, UniformRandomSampler, MsacScoring> {
    pub fn msac(estimator: E) -> Self {
        Self::new(estimator, UniformRandomSampler::new(), MsacScoring)
    }

    pub fn msac_seeded(estimator: E, seed: u64) -> Self {
        Self::new(estimator, UniformRandomSampler::from_seed(seed), MsacScoring)
    }
}

impl<E: ModelEstimator> RobustEstimator<E, UniformRandomSampler, LmedsScoring> {
    pub fn lmeds(estimator: E) -> Self {
        Self::new(estimator, UniformRandomSampler::new(), LmedsScoring)
    }

    pub fn lmeds_seeded(estimator: E, seed: u64) -> Self {
        Self::new(estimator, UniformRandomSampler::from_seed(seed), LmedsScoring)
    }
}

impl<E: ModelEstimator> RobustEstimator<E, ProsacSampler, RansacScoring> {
    pub fn prosac(estimator: E) -> Self {
        Self::new(estimator, ProsacSampler::new(), RansacScoring)
    }

    pub fn prosac_seeded(estimator: E, seed: u64) -> Self {
        Self::new(estimator, ProsacSampler::from_seed(seed), RansacScoring)
    }
}

impl<E: ModelEstimator> RobustEstimator<E, ProsacSampler, LmedsScoring> {
    pub fn promeds(estimator: E) -> Self {
        Self::new(estimator, ProsacSampler::new(), LmedsScoring)
    }

    pub fn promeds_seeded(estimator: E, seed: u64) -> Self {
        Self::new(estimator, ProsacSampler::from_seed(seed), LmedsScoring)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::core::{EstimationListener, EstimatorControl, ModelEstimator};

    /// Scalar "location" model: fits the value of the first sampled
    /// datum, residual is the absolute difference.
    struct LocationEstimator;

    impl ModelEstimator for LocationEstimator {
        type Datum = f64;
        type Model = f64;

        fn sample_size(&self) -> usize {
            1
        }

        fn estimate(&self, data: &[f64], sample: &[usize]) -> Vec<f64> {
            vec![data[sample[0]]]
        }

        fn residual(&self, model: &f64, datum: &f64) -> f64 {
            (model - datum).abs()
        }
    }

    /// Adapter whose every sample is degenerate.
    struct DegenerateEstimator;

    impl ModelEstimator for DegenerateEstimator {
        type Datum = f64;
        type Model = f64;

        fn sample_size(&self) -> usize {
            1
        }

        fn estimate(&self, _data: &[f64], _sample: &[usize]) -> Vec<f64> {
            Vec::new()
        }

        fn residual(&self, model: &f64, datum: &f64) -> f64 {
            (model - datum).abs()
        }
    }

    fn clustered_data() -> Vec<f64> {
        // Twelve points at 5.0, three gross outliers.
        let mut data = vec![5.0; 12];
        data.extend_from_slice(&[50.0, -40.0, 120.0]);
        data
    }

    #[test]
    fn ransac_recovers_the_dominant_location() {
        let mut est = RobustEstimator::ransac_seeded(LocationEstimator, 99);
        est.set_correspondences(clustered_data()).unwrap();
        est.set_threshold(0.5).unwrap();
        est.set_keep_inliers(true).unwrap();

        let outcome = est.estimate().unwrap();
        assert!((outcome.model - 5.0).abs() < 1e-12);
        assert_eq!(outcome.inliers.unwrap().len(), 12);
        assert!(!est.is_locked());
    }

    #[test]
    fn estimate_without_data_is_not_ready() {
        let mut est = RobustEstimator::ransac_seeded(LocationEstimator, 1);
        assert!(!est.is_ready());
        assert!(matches!(
            est.estimate(),
            Err(EstimatorError::NotReady(_))
        ));
    }

    #[test]
    fn prosac_without_quality_scores_is_not_ready() {
        let mut est = RobustEstimator::prosac_seeded(LocationEstimator, 1);
        est.set_correspondences(clustered_data()).unwrap();
        assert!(!est.is_ready());
        assert!(matches!(est.estimate(), Err(EstimatorError::NotReady(_))));

        let n = est.correspondences().len();
        est.set_quality_scores(Some(vec![1.0; n])).unwrap();
        assert!(est.is_ready());
    }

    #[test]
    fn all_degenerate_samples_terminate_with_no_valid_model() {
        let mut est = RobustEstimator::ransac_seeded(DegenerateEstimator, 7);
        est.set_correspondences(vec![1.0, 2.0, 3.0]).unwrap();
        est.set_max_iterations(5).unwrap();
        assert!(matches!(est.estimate(), Err(EstimatorError::NoValidModel)));
        assert!(!est.is_locked());
    }

    #[test]
    fn undersized_store_is_rejected_and_previous_kept() {
        let mut est = RobustEstimator::ransac_seeded(LocationEstimator, 1);
        est.set_correspondences(vec![1.0, 2.0]).unwrap();

        assert_eq!(
            est.set_correspondences(Vec::new()),
            Err(EstimatorError::TooFewCorrespondences { needed: 1, got: 0 })
        );
        assert_eq!(est.correspondences(), &[1.0, 2.0]);
    }

    #[test]
    fn quality_score_length_is_validated() {
        let mut est = RobustEstimator::ransac_seeded(LocationEstimator, 1);
        est.set_correspondences(vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(
            est.set_quality_scores(Some(vec![1.0])),
            Err(EstimatorError::LengthMismatch {
                scores: 1,
                points: 3
            })
        );
        assert!(est.quality_scores().is_none());

        est.set_quality_scores(Some(vec![3.0, 2.0, 1.0])).unwrap();
        assert_eq!(est.quality_scores(), Some(&[3.0, 2.0, 1.0][..]));
        est.set_quality_scores(None).unwrap();
        assert!(est.quality_scores().is_none());
    }

    #[derive(Debug, PartialEq)]
    enum Event {
        Start,
        End,
        Iteration(usize),
        Progress,
    }

    struct Recorder {
        events: Rc<RefCell<Vec<Event>>>,
        saw_unlocked: Rc<RefCell<bool>>,
    }

    impl EstimationListener for Recorder {
        fn on_estimation_start(&mut self, control: &mut dyn EstimatorControl) {
            if !control.is_locked() {
                *self.saw_unlocked.borrow_mut() = true;
            }
            // Mutators must be rejected for the whole run.
            assert_eq!(control.set_confidence(0.5), Err(EstimatorError::Locked));
            assert_eq!(control.set_threshold(9.0), Err(EstimatorError::Locked));
            self.events.borrow_mut().push(Event::Start);
        }

        fn on_estimation_end(&mut self, control: &mut dyn EstimatorControl) {
            if !control.is_locked() {
                *self.saw_unlocked.borrow_mut() = true;
            }
            self.events.borrow_mut().push(Event::End);
        }

        fn on_iteration(&mut self, control: &mut dyn EstimatorControl, iteration: usize) {
            if !control.is_locked() {
                *self.saw_unlocked.borrow_mut() = true;
            }
            assert_eq!(control.set_max_iterations(1), Err(EstimatorError::Locked));
            self.events.borrow_mut().push(Event::Iteration(iteration));
        }

        fn on_progress_change(&mut self, _control: &mut dyn EstimatorControl, _progress: f64) {
            self.events.borrow_mut().push(Event::Progress);
        }
    }

    #[test]
    fn listener_sees_ordered_events_and_a_locked_estimator() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let saw_unlocked = Rc::new(RefCell::new(false));

        let mut est = RobustEstimator::ransac_seeded(LocationEstimator, 3);
        est.set_correspondences(clustered_data()).unwrap();
        est.set_threshold(0.5).unwrap();
        est.set_listener(Box::new(Recorder {
            events: Rc::clone(&events),
            saw_unlocked: Rc::clone(&saw_unlocked),
        }))
        .unwrap();

        est.estimate().unwrap();
        assert!(!est.is_locked());
        assert!(!*saw_unlocked.borrow(), "callback observed an unlocked phase");

        let events = events.borrow();
        assert_eq!(events.first(), Some(&Event::Start));
        assert_eq!(events.last(), Some(&Event::End));
        assert_eq!(
            events.iter().filter(|e| matches!(e, Event::Start)).count(),
            1
        );
        assert_eq!(events.iter().filter(|e| matches!(e, Event::End)).count(), 1);

        let iterations: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                Event::Iteration(i) => Some(*i),
                _ => None,
            })
            .collect();
        assert!(!iterations.is_empty());
        assert_eq!(iterations[0], 1, "iteration indices are 1-based");
        assert!(iterations.windows(2).all(|w| w[1] == w[0] + 1));
    }

    #[test]
    fn end_event_fires_on_failure_too() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let saw_unlocked = Rc::new(RefCell::new(false));

        let mut est = RobustEstimator::ransac_seeded(DegenerateEstimator, 3);
        est.set_correspondences(vec![1.0, 2.0, 3.0]).unwrap();
        est.set_max_iterations(3).unwrap();
        est.set_listener(Box::new(Recorder {
            events: Rc::clone(&events),
            saw_unlocked: Rc::clone(&saw_unlocked),
        }))
        .unwrap();

        assert!(matches!(est.estimate(), Err(EstimatorError::NoValidModel)));
        assert!(!est.is_locked());

        let events = events.borrow();
        assert_eq!(events.first(), Some(&Event::Start));
        assert_eq!(events.last(), Some(&Event::End));
    }

    #[test]
    fn realized_iterations_respect_the_budget() {
        let mut est = RobustEstimator::ransac_seeded(LocationEstimator, 17);
        est.set_correspondences(clustered_data()).unwrap();
        est.set_threshold(0.5).unwrap();
        est.set_max_iterations(200).unwrap();

        let outcome = est.estimate().unwrap();
        assert!(outcome.iterations <= 200);
        // With a 12/15 inlier ratio and sample size 1 the adaptive bound
        // collapses far below the maximum.
        assert!(outcome.iterations < 20);
    }

    #[test]
    fn keep_flags_control_the_outcome_payload() {
        let mut est = RobustEstimator::msac_seeded(LocationEstimator, 5);
        est.set_correspondences(clustered_data()).unwrap();
        est.set_threshold(0.5).unwrap();

        let bare = est.estimate().unwrap();
        assert!(bare.inliers.is_none());
        assert!(bare.residuals.is_none());
        assert!(bare.covariance.is_none());

        est.set_keep_inliers(true).unwrap();
        est.set_keep_residuals(true).unwrap();
        let full = est.estimate().unwrap();
        assert_eq!(full.inliers.unwrap().len(), 12);
        assert_eq!(full.residuals.unwrap().len(), 15);
    }

    #[test]
    fn lmeds_stops_early_on_noiseless_data() {
        let mut est = RobustEstimator::lmeds_seeded(LocationEstimator, 11);
        est.set_correspondences(vec![5.0; 20]).unwrap();
        est.set_max_iterations(1000).unwrap();

        let outcome = est.estimate().unwrap();
        assert!((outcome.model - 5.0).abs() < 1e-12);
        assert!(outcome.iterations < 1000, "stop threshold did not fire");
    }

    #[test]
    fn promeds_runs_with_quality_scores() {
        let mut est = RobustEstimator::promeds_seeded(LocationEstimator, 13);
        let data = clustered_data();
        let scores: Vec<f64> = data.iter().map(|v| 1.0 / (1.0 + (v - 5.0).abs())).collect();
        est.set_correspondences(data).unwrap();
        est.set_quality_scores(Some(scores)).unwrap();

        let outcome = est.estimate().unwrap();
        assert!((outcome.model - 5.0).abs() < 1e-12);
    }
}
