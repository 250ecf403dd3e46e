//! # overseer-core
//!
//! Foundation crate for the overseer supervisor.
//! Defines all types, traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::OverseerConfig;
pub use errors::{OverseerError, OverseerResult};
pub use models::{
    ControllerState, DecisionContext, DecisionOutcome, ErrorEvent, OutcomeKind, Severity,
    StageTransition, StrategicDecision, StreamSource,
};
