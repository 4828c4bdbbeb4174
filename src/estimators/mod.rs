//! Bundled reference adapters.
//!
//! Two small geometric models, a 2D line and a circle, implement
//! [`ModelEstimator`](crate::core::ModelEstimator) so the engine is
//! usable and testable out of the box. Heavier geometry (homographies,
//! cameras, quadrics) is expected to live in downstream crates that
//! implement the same trait.

pub mod circle;
pub mod line;

pub use circle::{Circle, CircleEstimator};
pub use line::{Line2D, LineEstimator};
