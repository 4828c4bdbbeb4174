//! # robustfit: robust model estimation
//!
//! `robustfit` fits models to correspondence sets contaminated by
//! outliers. One generic engine drives the classic robust estimation
//! variants (RANSAC, MSAC, LMedS, PROSAC and PROMedS) by combining a
//! sampling strategy with a consensus-scoring strategy; everything a
//! concrete geometric model needs lives behind a single adapter trait.
//!
//! ## Quick start
//!
//! ```rust
//! use nalgebra::Point2;
//! use robustfit::{estimate_circle, Method};
//!
//! // Points on a circle of radius 2 around the origin.
//! let points: Vec<Point2<f64>> = (0..32)
//!     .map(|i| {
//!         let angle = i as f64 * std::f64::consts::TAU / 32.0;
//!         Point2::new(2.0 * angle.cos(), 2.0 * angle.sin())
//!     })
//!     .collect();
//!
//! let outcome = estimate_circle(&points, Method::Ransac, 0.05, None, None).unwrap();
//! assert!((outcome.model.radius - 2.0).abs() < 1e-6);
//! ```
//!
//! ## Driving the engine directly
//!
//! The one-shot functions cover the bundled line/circle adapters. For
//! listeners, diagnostic retention, refinement or reuse across calls,
//! build a [`RobustEstimator`] and configure it while idle:
//!
//! ```rust
//! use nalgebra::Point2;
//! use robustfit::estimators::CircleEstimator;
//! use robustfit::RobustEstimator;
//!
//! let mut estimator = RobustEstimator::msac(CircleEstimator::new());
//! estimator.set_threshold(0.01).unwrap();
//! estimator.set_keep_inliers(true).unwrap();
//!
//! let points: Vec<Point2<f64>> = (0..64)
//!     .map(|i| {
//!         let angle = i as f64 * std::f64::consts::TAU / 64.0;
//!         Point2::new(5.0 + angle.cos(), -1.0 + angle.sin())
//!     })
//!     .collect();
//! estimator.set_correspondences(points).unwrap();
//!
//! let outcome = estimator.estimate().unwrap();
//! assert_eq!(outcome.inliers.unwrap().len(), 64);
//! ```
//!
//! ## Custom models
//!
//! Implement [`ModelEstimator`](core::ModelEstimator) to plug any model
//! family into every variant:
//!
//! ```rust
//! use robustfit::core::ModelEstimator;
//!
//! /// Scalar offset model fitted from a single observation.
//! struct OffsetEstimator;
//!
//! impl ModelEstimator for OffsetEstimator {
//!     type Datum = f64;
//!     type Model = f64;
//!
//!     fn sample_size(&self) -> usize {
//!         1
//!     }
//!
//!     fn estimate(&self, data: &[f64], sample: &[usize]) -> Vec<f64> {
//!         vec![data[sample[0]]]
//!     }
//!
//!     fn residual(&self, model: &f64, datum: &f64) -> f64 {
//!         (model - datum).abs()
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - [`engine`]: the generic estimation loop and its variant aliases
//! - [`core`]: the adapter, sampler, scoring and listener contracts
//! - [`samplers`]: uniform and PROSAC sample selectors
//! - [`scoring`]: RANSAC, MSAC and LMedS consensus rules
//! - [`refine`]: Levenberg–Marquardt refinement with covariance
//! - [`estimators`]: bundled line and circle adapters
//! - [`api`]: one-shot estimation functions

pub mod api;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod estimators;
pub mod iteration;
pub mod lock;
pub mod refine;
pub mod samplers;
pub mod scoring;
pub mod utils;

pub use api::{estimate_circle, estimate_line};
pub use config::{DegeneracyPolicy, EstimatorConfig, Method};
pub use core::{
    ConsensusScoring, EstimationListener, EstimatorControl, ModelEstimator, Sampler,
};
pub use engine::{
    EstimationOutcome, LmedsEstimator, MsacEstimator, PromedsEstimator, ProsacEstimator,
    RansacEstimator, RobustEstimator,
};
pub use error::EstimatorError;
pub use refine::{RefinedModel, RefinementOptions};
