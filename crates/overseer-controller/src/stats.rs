use serde::Serialize;

use overseer_core::models::{ControllerState, StateChange};

/// Running counters kept by the controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ControllerStats {
    pub iterations: u64,
    pub transitions: u64,
    pub events_received: u64,
    pub interventions: u64,
    pub remediations_succeeded: u64,
    pub remediations_failed: u64,
    pub escalations: u64,
    pub rollbacks: u64,
    pub rollbacks_failed: u64,
    pub health_checks: u64,
    pub restarts: u64,
    pub aborts: u64,
}

/// Returned by `Controller::run` once the loop halts.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub final_state: ControllerState,
    pub stats: ControllerStats,
    pub last_change: Option<StateChange>,
}
