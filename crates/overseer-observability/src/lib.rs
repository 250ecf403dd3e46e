//! # overseer-observability
//!
//! Tracing subscriber setup, span macros and structured events, health
//! report aggregation, and degradation tracking.

pub mod degradation;
pub mod health;
pub mod tracing_setup;

pub use degradation::{DegradationTracker, TrackedDegradation};
pub use health::HealthReporter;
