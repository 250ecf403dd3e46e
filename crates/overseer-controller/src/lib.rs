//! # overseer-controller
//!
//! The supervisory state machine. A single run loop consumes watchdog
//! events from one queue, decides whether to intervene, drives bounded
//! remediation, and falls back to snapshot rollback when remediation
//! fails. Every call into a dependent component runs under its own
//! timeout; a timeout is a failed step, never a crash.
//!
//! The loop stops only in [`ControllerState::Error`](overseer_core::ControllerState::Error).

pub mod abort;
pub mod builder;
pub mod classify;
pub mod controller;
pub mod health;
mod intervention;
pub mod probes;
pub mod stats;
mod timeouts;

pub use abort::AbortHandle;
pub use builder::ControllerBuilder;
pub use controller::{Collaborators, Controller};
pub use health::{HealthMonitor, HealthVerdict};
pub use probes::{ConfidenceProbe, RecallProbe};
pub use stats::{ControllerStats, RunSummary};
