//! Sampling strategies for the estimation engine.
//!
//! Both samplers draw minimal-size index subsets through the shared
//! [`Sampler`](crate::core::Sampler) trait: uniformly at random for
//! RANSAC/MSAC/LMedS, or through PROSAC's quality-ranked growing window.

pub mod prosac;
pub mod uniform;

pub use prosac::ProsacSampler;
pub use uniform::UniformRandomSampler;
