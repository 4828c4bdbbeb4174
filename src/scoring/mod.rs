//! Consensus scoring strategies.
//!
//! Each strategy turns the residual vector of a candidate model into a
//! comparable score plus its consensus set, through the shared
//! [`ConsensusScoring`](crate::core::ConsensusScoring) trait. PROSAC
//! reuses the RANSAC (or MSAC) rule and PROMedS the LMedS rule; quality
//! scores bias sampling only and never enter a score.

pub mod lmeds;
pub mod msac;
pub mod ransac;

pub use lmeds::{LmedsScoring, MedianScore};
pub use msac::{MsacScoring, TruncatedLossScore};
pub use ransac::{InlierCountScore, RansacScoring};
