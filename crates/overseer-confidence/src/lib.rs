//! # overseer-confidence
//!
//! Adapts a base confidence score for a remediation strategy using the
//! outcomes of past decisions made in similar contexts.
//!
//! Contexts are bucketed into a pattern signature. Outcomes sharing the
//! signature and strategy feed a Beta posterior weighted by recency and
//! by how accurate each past prediction was. The posterior mean is
//! blended with the base score (history never exceeds 80% influence),
//! then scaled by a global calibration factor and a bounded per-strategy
//! adjustment, and clamped to [0.01, 0.99].

pub mod beta;
pub mod calibration;
pub mod engine;
pub mod features;
pub mod store;
pub mod tracker;

pub use engine::{AdaptedConfidence, AdaptiveConfidenceEngine};
pub use features::ContextFeatures;
pub use tracker::StrategyPerformance;
